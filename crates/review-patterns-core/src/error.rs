//! Error types and result aliases for the review-patterns engine.

use thiserror::Error;
use uuid::Uuid;

use crate::clustering::ClusterError;

/// Error type for review-pattern engine operations.
///
/// # Examples
///
/// ```rust
/// use review_patterns_core::error::PatternError;
/// use uuid::Uuid;
///
/// fn lookup_cluster(id: Uuid) -> Result<(), PatternError> {
///     Err(PatternError::ClusterNotFound { id })
/// }
///
/// assert!(lookup_cluster(Uuid::nil()).is_err());
/// ```
#[derive(Debug, Error)]
pub enum PatternError {
    /// A requested cluster was not found.
    #[error("Cluster not found: {id}")]
    ClusterNotFound { id: Uuid },

    /// Embedding vector dimension does not match expected size.
    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A field value failed validation constraints.
    #[error("Validation error: {field} - {message}")]
    ValidationError { field: String, message: String },

    /// An error occurred during storage operations.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// The dimensionality reducer failed.
    #[error("Reduction error: {0}")]
    ReductionError(String),

    /// The label generator failed.
    #[error("Label generation error: {0}")]
    LabelError(String),

    /// Density clustering failed.
    #[error("Clustering error: {0}")]
    Clustering(#[from] ClusterError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PatternError {
    /// Create a validation error for a named field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a storage error from any displayable source.
    pub fn storage(message: impl std::fmt::Display) -> Self {
        Self::StorageError(message.to_string())
    }
}

/// Result alias for review-pattern engine operations.
pub type PatternResult<T> = Result<T, PatternError>;
