//! Cluster label generation seam.

use async_trait::async_trait;

use crate::error::PatternResult;
use crate::types::GeneratedLabel;

/// Generates a human-readable label for a cluster from representative
/// sample texts.
///
/// Implementations should tolerate malformed upstream output where they
/// can; the orchestrator applies a deterministic fallback label on any
/// error, so a failing generator degrades the label quality, never the run.
#[async_trait]
pub trait LabelGenerator: Send + Sync {
    async fn generate_label(&self, samples: &[String]) -> PatternResult<GeneratedLabel>;
}
