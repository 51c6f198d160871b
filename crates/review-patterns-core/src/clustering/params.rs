//! Parameters for the density clustering algorithm.

use serde::{Deserialize, Serialize};

use super::error::ClusterError;

/// Parameters for HDBSCAN-style density clustering.
///
/// `min_samples` defaults to `min_cluster_size` when not set, which is the
/// conventional choice for excess-of-mass extraction.
///
/// # Example
///
/// ```
/// use review_patterns_core::clustering::DensityParams;
///
/// let params = DensityParams::new(5);
/// assert_eq!(params.min_cluster_size, 5);
/// assert_eq!(params.effective_min_samples(), 5);
///
/// let params = DensityParams::new(5).with_min_samples(3);
/// assert_eq!(params.effective_min_samples(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DensityParams {
    /// Minimum number of points to form a cluster.
    pub min_cluster_size: usize,

    /// Minimum samples for core-distance computation.
    /// Defaults to `min_cluster_size` when `None`.
    pub min_samples: Option<usize>,
}

impl DensityParams {
    /// Create parameters with the given minimum cluster size.
    pub fn new(min_cluster_size: usize) -> Self {
        Self {
            min_cluster_size,
            min_samples: None,
        }
    }

    /// Set minimum samples.
    ///
    /// Value is NOT automatically clamped - use validate() to check.
    #[must_use]
    pub fn with_min_samples(mut self, samples: usize) -> Self {
        self.min_samples = Some(samples);
        self
    }

    /// Minimum samples actually used by the algorithm.
    #[inline]
    pub fn effective_min_samples(&self) -> usize {
        self.min_samples.unwrap_or(self.min_cluster_size)
    }

    /// Validate parameters.
    ///
    /// # Errors
    ///
    /// Returns `ClusterError::InvalidParameter` if:
    /// - min_cluster_size < 2
    /// - min_samples == Some(0)
    pub fn validate(&self) -> Result<(), ClusterError> {
        if self.min_cluster_size < 2 {
            return Err(ClusterError::invalid_parameter(format!(
                "min_cluster_size must be >= 2, got {}; at least 2 points are required to form a cluster",
                self.min_cluster_size
            )));
        }

        if self.min_samples == Some(0) {
            return Err(ClusterError::invalid_parameter(
                "min_samples must be >= 1; at least 1 neighbor is required for core-distance computation",
            ));
        }

        Ok(())
    }
}

impl Default for DensityParams {
    fn default() -> Self {
        Self::new(3)
    }
}
