//! Density clustering for review-comment embeddings.
//!
//! # Key Types
//!
//! - [`DensityParams`]: algorithm configuration (min cluster size, min
//!   samples)
//! - [`ClusteringResult`]: per-point labels and probabilities plus the
//!   cluster count
//! - [`ClusterError`]: error type for clustering operations
//! - [`cluster`]: the algorithm entry point

pub mod error;
pub mod hdbscan;
pub mod params;

pub use error::ClusterError;
pub use hdbscan::{cluster, ClusteringResult, NOISE};
pub use params::DensityParams;
