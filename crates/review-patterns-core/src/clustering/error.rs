//! Error types for clustering operations.

use thiserror::Error;

/// Error type for density clustering.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// A clustering parameter failed validation.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Input points do not share a single dimension.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// An input value was NaN or infinite.
    #[error("Non-finite input: point {point} component {component}")]
    NonFiniteInput { point: usize, component: usize },
}

impl ClusterError {
    /// Create an invalid-parameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }

    /// Create a dimension-mismatch error.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }
}
