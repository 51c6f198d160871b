//! Dimensionality reduction seam.

use crate::error::PatternResult;

/// Reduces embeddings into a lower-dimensional space that approximately
/// preserves local neighbor structure.
///
/// Implementations must return one output vector per input vector, in the
/// same order, and be deterministic for a fixed seed. The engine consumes
/// this as a black box; UMAP-style reducers and random projections both
/// qualify.
pub trait Reducer: Send + Sync {
    /// Reduce `points` to `target_dims` dimensions.
    ///
    /// `n_neighbors` hints how much local structure to preserve; reducers
    /// without a neighborhood notion may ignore it.
    fn reduce(
        &self,
        points: &[Vec<f32>],
        target_dims: usize,
        n_neighbors: usize,
    ) -> PatternResult<Vec<Vec<f32>>>;
}
