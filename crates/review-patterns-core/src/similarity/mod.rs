//! Vector primitives shared by clustering, maintenance, and matching.
//!
//! All functions guard against zero norms, mismatched dimensions, and
//! non-finite intermediate values so callers never observe NaN/Infinity.

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 for mismatched dimensions or zero-norm inputs.
///
/// # Example
///
/// ```
/// use review_patterns_core::similarity::cosine_similarity;
///
/// let v = vec![1.0, 2.0, 3.0];
/// assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let result = dot / (norm_a.sqrt() * norm_b.sqrt());
    if result.is_finite() {
        result.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Compute the element-wise mean of a set of vectors.
///
/// Vectors shorter than the first vector's dimension are skipped.
/// Returns an empty vector for empty input.
pub fn mean_vector(vectors: &[Vec<f32>]) -> Vec<f32> {
    let Some(first) = vectors.first() else {
        return Vec::new();
    };
    let dim = first.len();

    let mut sum = vec![0.0f64; dim];
    let mut count = 0usize;
    for v in vectors {
        if v.len() != dim {
            continue;
        }
        for (s, &x) in sum.iter_mut().zip(v.iter()) {
            *s += x as f64;
        }
        count += 1;
    }

    if count == 0 {
        return vec![0.0; dim];
    }

    sum.iter().map(|s| (s / count as f64) as f32).collect()
}

/// Euclidean distance between two points, computed in f64.
///
/// Mismatched dimensions pair up to the shorter length; the caller is
/// expected to feed same-dimension points.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = *x as f64 - *y as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Full pairwise Euclidean distance matrix for `points`.
///
/// Symmetric with a zero diagonal; `matrix[i][j]` is the distance between
/// points i and j.
pub fn pairwise_distances(points: &[Vec<f32>]) -> Vec<Vec<f64>> {
    let n = points.len();
    let mut matrix = vec![vec![0.0f64; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = euclidean_distance(&points[i], &points[j]);
            matrix[i][j] = d;
            matrix[j][i] = d;
        }
    }
    matrix
}
