//! Deterministic random-projection reducer stub.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{PatternError, PatternResult};
use crate::traits::Reducer;

/// Seeded random-projection reducer.
///
/// Projects points through a dense matrix with entries drawn uniformly
/// from [-1, 1], scaled by `1/sqrt(target_dims)`. Random projection
/// approximately preserves pairwise distances (Johnson-Lindenstrauss), so
/// neighbor structure survives well enough for density clustering in
/// tests. Deterministic for a fixed seed.
#[derive(Debug, Clone)]
pub struct RandomProjectionReducer {
    seed: u64,
}

impl RandomProjectionReducer {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl Default for RandomProjectionReducer {
    fn default() -> Self {
        Self::new(42)
    }
}

impl Reducer for RandomProjectionReducer {
    fn reduce(
        &self,
        points: &[Vec<f32>],
        target_dims: usize,
        _n_neighbors: usize,
    ) -> PatternResult<Vec<Vec<f32>>> {
        if target_dims == 0 {
            return Err(PatternError::ReductionError(
                "target_dims must be >= 1".to_string(),
            ));
        }
        let Some(first) = points.first() else {
            return Ok(Vec::new());
        };
        let dim = first.len();
        if points.iter().any(|p| p.len() != dim) {
            return Err(PatternError::ReductionError(
                "input points disagree on dimension".to_string(),
            ));
        }

        // Already low-dimensional: pass through unchanged.
        if target_dims >= dim {
            return Ok(points.to_vec());
        }

        let mut rng = ChaCha8Rng::seed_from_u64(
            self.seed ^ ((dim as u64) << 32) ^ target_dims as u64,
        );
        let scale = 1.0 / (target_dims as f32).sqrt();
        let projection: Vec<Vec<f32>> = (0..target_dims)
            .map(|_| (0..dim).map(|_| rng.gen_range(-1.0..1.0) * scale).collect())
            .collect();

        Ok(points
            .iter()
            .map(|p| {
                projection
                    .iter()
                    .map(|row| row.iter().zip(p.iter()).map(|(r, x)| r * x).sum())
                    .collect()
            })
            .collect())
    }
}
