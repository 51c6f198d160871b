//! Configuration for cluster maintenance and pattern matching.

use serde::{Deserialize, Serialize};

use crate::clustering::ClusterError;
use crate::clustering::DensityParams;

/// Tunables for the maintenance orchestrator.
///
/// Defaults reflect the production cadence: a rolling 6-month embedding
/// corpus, merge at cosine 0.5, and retirement after 60 quiet days.
///
/// # Example
///
/// ```
/// use review_patterns_core::config::MaintenanceConfig;
///
/// let config = MaintenanceConfig::default();
/// assert_eq!(config.embedding_window_days, 180);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    /// Density clustering parameters for discovery.
    pub density: DensityParams,

    /// Rolling window of embeddings loaded per run, in days.
    pub embedding_window_days: i64,

    /// Minimum cosine similarity for merging into an existing cluster.
    pub merge_similarity_threshold: f32,

    /// Fixed probability recorded for merged assignments.
    pub merge_confidence: f32,

    /// Target dimensionality for the reducer pass (capped at pool size - 1).
    pub reduced_dims: usize,

    /// Neighbor count hint passed to the reducer.
    pub reducer_neighbors: usize,

    /// Representative samples requested per label generation.
    pub max_label_samples: usize,

    /// Relative membership drift that triggers label regeneration.
    pub label_drift_threshold: f32,

    /// Trailing window used for retirement decisions, in days.
    pub retirement_window_days: i64,

    /// Minimum recent assignments for a cluster to stay active.
    pub min_recent_assignments: usize,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            density: DensityParams::new(3),
            embedding_window_days: 180,
            merge_similarity_threshold: 0.5,
            merge_confidence: 0.8,
            reduced_dims: 15,
            reducer_neighbors: 15,
            max_label_samples: 5,
            label_drift_threshold: 0.2,
            retirement_window_days: 60,
            min_recent_assignments: 3,
        }
    }
}

impl MaintenanceConfig {
    /// Set density clustering parameters.
    #[must_use]
    pub fn with_density(mut self, density: DensityParams) -> Self {
        self.density = density;
        self
    }

    /// Set the merge similarity threshold.
    #[must_use]
    pub fn with_merge_similarity_threshold(mut self, threshold: f32) -> Self {
        self.merge_similarity_threshold = threshold;
        self
    }

    /// Set the embedding window in days.
    #[must_use]
    pub fn with_embedding_window_days(mut self, days: i64) -> Self {
        self.embedding_window_days = days;
        self
    }

    /// Set the retirement window in days.
    #[must_use]
    pub fn with_retirement_window_days(mut self, days: i64) -> Self {
        self.retirement_window_days = days;
        self
    }

    /// Set the minimum recent assignments for retirement.
    #[must_use]
    pub fn with_min_recent_assignments(mut self, count: usize) -> Self {
        self.min_recent_assignments = count;
        self
    }

    /// Validate configuration.
    ///
    /// # Errors
    ///
    /// Returns `ClusterError::InvalidParameter` on out-of-range values.
    pub fn validate(&self) -> Result<(), ClusterError> {
        self.density.validate()?;

        if self.embedding_window_days <= 0 {
            return Err(ClusterError::invalid_parameter(
                "embedding_window_days must be positive",
            ));
        }
        if !(0.0..=1.0).contains(&self.merge_similarity_threshold) {
            return Err(ClusterError::invalid_parameter(format!(
                "merge_similarity_threshold must be in [0, 1], got {}",
                self.merge_similarity_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.merge_confidence) {
            return Err(ClusterError::invalid_parameter(format!(
                "merge_confidence must be in [0, 1], got {}",
                self.merge_confidence
            )));
        }
        if self.reduced_dims == 0 {
            return Err(ClusterError::invalid_parameter(
                "reduced_dims must be >= 1",
            ));
        }
        if self.label_drift_threshold < 0.0 {
            return Err(ClusterError::invalid_parameter(
                "label_drift_threshold must be non-negative",
            ));
        }
        if self.retirement_window_days <= 0 {
            return Err(ClusterError::invalid_parameter(
                "retirement_window_days must be positive",
            ));
        }
        Ok(())
    }
}

/// Tunables for the pattern matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Weight applied to centroid cosine similarity.
    pub similarity_weight: f32,

    /// Weight applied to file-path Jaccard overlap.
    pub overlap_weight: f32,

    /// Minimum combined score for a cluster to survive.
    pub min_combined_score: f32,

    /// Floor for the recency weight.
    pub min_recency_weight: f32,

    /// Trailing window used for recency statistics, in days.
    pub recency_window_days: i64,

    /// Minimum recent assignments for a cluster to be considered.
    pub min_recent_assignments: usize,

    /// Maximum matches returned.
    pub max_matches: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            similarity_weight: 0.6,
            overlap_weight: 0.4,
            min_combined_score: 0.3,
            min_recency_weight: 0.5,
            recency_window_days: 60,
            min_recent_assignments: 3,
            max_matches: 3,
        }
    }
}

impl MatcherConfig {
    /// Set the minimum combined score.
    #[must_use]
    pub fn with_min_combined_score(mut self, score: f32) -> Self {
        self.min_combined_score = score;
        self
    }

    /// Set the maximum number of matches returned.
    #[must_use]
    pub fn with_max_matches(mut self, max: usize) -> Self {
        self.max_matches = max;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ClusterError> {
        if self.similarity_weight < 0.0 || self.overlap_weight < 0.0 {
            return Err(ClusterError::invalid_parameter(
                "score weights must be non-negative",
            ));
        }
        if self.recency_window_days <= 0 {
            return Err(ClusterError::invalid_parameter(
                "recency_window_days must be positive",
            ));
        }
        if self.max_matches == 0 {
            return Err(ClusterError::invalid_parameter("max_matches must be >= 1"));
        }
        Ok(())
    }
}
