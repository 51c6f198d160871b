//! Label generator stubs.

use async_trait::async_trait;

use crate::error::{PatternError, PatternResult};
use crate::maintenance::labels::kebab_slug;
use crate::traits::LabelGenerator;
use crate::types::GeneratedLabel;

/// Derives a label directly from the first sample text.
///
/// Slug is the kebab-case of the first six words; description is the first
/// sample verbatim. Good enough for tests and offline development.
#[derive(Debug, Clone, Default)]
pub struct StaticLabelGenerator;

#[async_trait]
impl LabelGenerator for StaticLabelGenerator {
    async fn generate_label(&self, samples: &[String]) -> PatternResult<GeneratedLabel> {
        let first = samples.first().cloned().unwrap_or_default();
        let head: String = first.split_whitespace().take(6).collect::<Vec<_>>().join(" ");
        let slug = kebab_slug(&head);
        if slug.is_empty() {
            return Err(PatternError::LabelError(
                "no usable sample text".to_string(),
            ));
        }
        Ok(GeneratedLabel {
            slug,
            description: first,
        })
    }
}

/// Always fails; exercises the orchestrator's fallback-label path.
#[derive(Debug, Clone, Default)]
pub struct FailingLabelGenerator;

#[async_trait]
impl LabelGenerator for FailingLabelGenerator {
    async fn generate_label(&self, _samples: &[String]) -> PatternResult<GeneratedLabel> {
        Err(PatternError::LabelError(
            "stub generator configured to fail".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_generator_builds_kebab_slug_from_first_sample() {
        let samples = vec!["Prefer bounded channels for backpressure here".to_string()];
        let label = StaticLabelGenerator.generate_label(&samples).await.unwrap();
        assert_eq!(label.slug, "prefer-bounded-channels-for-backpressure-here");
        assert_eq!(label.description, samples[0]);
    }

    #[tokio::test]
    async fn static_generator_errors_on_empty_samples() {
        assert!(StaticLabelGenerator.generate_label(&[]).await.is_err());
    }

    #[tokio::test]
    async fn failing_generator_always_errors() {
        let samples = vec!["anything".to_string()];
        assert!(FailingLabelGenerator.generate_label(&samples).await.is_err());
    }
}
