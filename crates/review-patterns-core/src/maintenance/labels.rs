//! Slug sanitation and deterministic fallback labels.

use chrono::Utc;

use crate::types::GeneratedLabel;

/// Maximum slug length after sanitation.
const MAX_SLUG_LEN: usize = 60;

/// Maximum characters kept from a sample in a fallback description.
const MAX_FALLBACK_DESCRIPTION: usize = 120;

/// Normalize free text into a kebab-case slug.
///
/// Non-alphanumeric runs collapse to single hyphens; output is lowercase,
/// trimmed of hyphens, and capped at 60 characters. Empty input yields an
/// empty string.
///
/// # Example
///
/// ```
/// use review_patterns_core::maintenance::labels::kebab_slug;
///
/// assert_eq!(kebab_slug("Missing HTTP timeouts!"), "missing-http-timeouts");
/// ```
pub fn kebab_slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len().min(MAX_SLUG_LEN));
    let mut last_was_hyphen = true;
    for c in text.chars() {
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
        if c.is_ascii_alphanumeric() {
            slug.extend(c.to_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Deterministic label used when the generator fails or returns an
/// unusable slug: a timestamp-based slug plus a truncated first sample.
pub fn fallback_label(samples: &[String]) -> GeneratedLabel {
    let slug = format!("pattern-{}", Utc::now().format("%Y%m%d%H%M%S"));
    let description = samples
        .first()
        .map(|s| truncate(s, MAX_FALLBACK_DESCRIPTION))
        .unwrap_or_else(|| "Unlabeled review pattern".to_string());
    GeneratedLabel { slug, description }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kebab_slug_normalizes_punctuation_and_case() {
        assert_eq!(kebab_slug("Use `?` instead of unwrap()"), "use-instead-of-unwrap");
        assert_eq!(kebab_slug("  spaces   everywhere "), "spaces-everywhere");
        assert_eq!(kebab_slug(""), "");
    }

    #[test]
    fn kebab_slug_caps_length() {
        let long = "word ".repeat(50);
        assert!(kebab_slug(&long).len() <= 60);
    }

    #[test]
    fn fallback_label_uses_first_sample() {
        let samples = vec!["Always check the error return".to_string()];
        let label = fallback_label(&samples);
        assert!(label.slug.starts_with("pattern-"));
        assert_eq!(label.description, "Always check the error return");
    }

    #[test]
    fn fallback_label_truncates_long_samples() {
        let samples = vec!["x".repeat(500)];
        let label = fallback_label(&samples);
        assert!(label.description.chars().count() <= 123);
        assert!(label.description.ends_with("..."));
    }

    #[test]
    fn fallback_label_handles_empty_samples() {
        let label = fallback_label(&[]);
        assert_eq!(label.description, "Unlabeled review pattern");
    }
}
