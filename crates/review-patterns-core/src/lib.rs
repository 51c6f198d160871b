//! Review-Pattern Clustering & Matching Engine
//!
//! Discovers recurring patterns in historical code-review feedback by
//! density-clustering comment embeddings, maintains those clusters
//! incrementally as new feedback arrives, and scores new change-sets
//! against the active cluster set to surface relevant precedent.
//!
//! # Architecture
//!
//! - [`similarity`]: vector primitives (cosine, mean, pairwise distance)
//! - [`clustering`]: HDBSCAN-style density clustering with
//!   excess-of-mass extraction
//! - [`maintenance`]: per-repo orchestration (merge, discovery, labeling,
//!   retirement) and interval scheduling
//! - [`matching`]: read-only precedent scoring for change-sets
//! - [`traits`]: collaborator seams (store, reducer, label generator)
//! - [`stubs`]: in-memory collaborator implementations for tests
//!
//! # Example
//!
//! ```
//! use review_patterns_core::clustering::{cluster, DensityParams};
//!
//! let points = vec![
//!     vec![0.0, 0.0], vec![0.1, 0.0], vec![0.0, 0.1],
//!     vec![9.0, 9.0], vec![9.1, 9.0], vec![9.0, 9.1],
//! ];
//! let result = cluster(&points, &DensityParams::new(3)).unwrap();
//! assert_eq!(result.cluster_count, 2);
//! ```

pub mod clustering;
pub mod config;
pub mod error;
pub mod maintenance;
pub mod matching;
pub mod similarity;
pub mod stubs;
pub mod traits;
pub mod types;

// Re-exports for convenience
pub use config::{MaintenanceConfig, MatcherConfig};
pub use error::{PatternError, PatternResult};
pub use maintenance::{MaintenanceOrchestrator, MaintenanceScheduler, SchedulerConfig};
pub use matching::PatternMatcher;
pub use types::{
    ClusterAssignment, ClusterRunState, CommentEmbedding, PatternMatch, ReviewCluster, RunStatus,
};
