//! HDBSCAN-style density clustering with excess-of-mass cluster extraction.
//!
//! The pipeline:
//!
//! 1. Core distance per point (Euclidean distance to the min_samples-th
//!    nearest neighbor).
//! 2. Mutual reachability distance: `max(core(a), core(b), d(a, b))`.
//! 3. Minimum spanning tree over the complete mutual-reachability graph
//!    (Prim's algorithm).
//! 4. Single-linkage hierarchy from MST edges in ascending weight order,
//!    `lambda = 1 / weight`.
//! 5. Condensed tree: splits where both sides reach `min_cluster_size` are
//!    kept; smaller sides fall out as point departures at the split lambda.
//! 6. Stability selection: a cluster is selected when its own stability
//!    meets or exceeds the sum of its children's, processed bottom-up.
//! 7. Point assignment to the nearest selected ancestor with a clipped
//!    lambda-ratio membership probability.
//! 8. Clusters that realize fewer than `min_cluster_size` members are
//!    demoted to noise and the surviving labels densely renumbered.
//!
//! Ties on equal MST weights resolve by ascending point index, so output is
//! deterministic for a fixed input ordering. Lambda math runs in f64; the
//! public surface stays f32 like the rest of the crate.

use serde::{Deserialize, Serialize};

use crate::similarity::pairwise_distances;

use super::error::ClusterError;
use super::params::DensityParams;

/// Label assigned to points that belong to no cluster.
pub const NOISE: i32 = -1;

/// Flat clustering output.
///
/// `labels[i]` is `NOISE` (-1) or a dense cluster id in `0..cluster_count`;
/// `probabilities[i]` is the membership strength in `[0, 1]` (0.0 for
/// noise).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringResult {
    pub labels: Vec<i32>,
    pub probabilities: Vec<f32>,
    pub cluster_count: usize,
}

impl ClusteringResult {
    fn empty() -> Self {
        Self {
            labels: Vec::new(),
            probabilities: Vec::new(),
            cluster_count: 0,
        }
    }

    fn all_noise(n: usize) -> Self {
        Self {
            labels: vec![NOISE; n],
            probabilities: vec![0.0; n],
            cluster_count: 0,
        }
    }
}

/// Run density clustering over `points`.
///
/// # Errors
///
/// Returns `ClusterError::InvalidParameter` for invalid params,
/// `ClusterError::DimensionMismatch` when points disagree on dimension, and
/// `ClusterError::NonFiniteInput` for NaN/Infinity components.
///
/// # Example
///
/// ```
/// use review_patterns_core::clustering::{cluster, DensityParams};
///
/// let points: Vec<Vec<f32>> = (0..5)
///     .map(|i| vec![i as f32 * 0.01, 0.0])
///     .chain((0..5).map(|i| vec![10.0 + i as f32 * 0.01, 10.0]))
///     .collect();
/// let result = cluster(&points, &DensityParams::new(3)).unwrap();
/// assert_eq!(result.cluster_count, 2);
/// ```
pub fn cluster(
    points: &[Vec<f32>],
    params: &DensityParams,
) -> Result<ClusteringResult, ClusterError> {
    params.validate()?;
    validate_points(points)?;

    let n = points.len();
    let k = params.min_cluster_size;
    if n == 0 {
        return Ok(ClusteringResult::empty());
    }
    if n < k {
        return Ok(ClusteringResult::all_noise(n));
    }

    let min_samples = params.effective_min_samples();
    let distances = pairwise_distances(points);
    let core = core_distances(&distances, min_samples);
    let mst = minimum_spanning_tree(&distances, &core);
    let hierarchy = single_linkage(n, mst);
    let condensed = condense(n, &hierarchy, k);
    let selected = select_clusters(&condensed);
    Ok(assign(n, k, &condensed, &selected))
}

fn validate_points(points: &[Vec<f32>]) -> Result<(), ClusterError> {
    let Some(first) = points.first() else {
        return Ok(());
    };
    let dim = first.len();
    for (i, p) in points.iter().enumerate() {
        if p.len() != dim {
            return Err(ClusterError::dimension_mismatch(dim, p.len()));
        }
        for (j, &v) in p.iter().enumerate() {
            if !v.is_finite() {
                return Err(ClusterError::NonFiniteInput {
                    point: i,
                    component: j,
                });
            }
        }
    }
    Ok(())
}

/// Core distance per point: distance to the `min_samples`-th nearest
/// neighbor (self excluded), clamped to the farthest neighbor when there
/// are fewer neighbors than `min_samples`.
fn core_distances(distances: &[Vec<f64>], min_samples: usize) -> Vec<f64> {
    let n = distances.len();
    let mut core = vec![0.0f64; n];
    if n < 2 {
        return core;
    }

    let mut neighbors = Vec::with_capacity(n - 1);
    for i in 0..n {
        neighbors.clear();
        for j in 0..n {
            if j != i {
                neighbors.push(distances[i][j]);
            }
        }
        neighbors.sort_unstable_by(|a, b| a.total_cmp(b));
        let idx = min_samples.saturating_sub(1).min(neighbors.len() - 1);
        core[i] = neighbors[idx];
    }
    core
}

#[derive(Debug, Clone, Copy)]
struct MstEdge {
    a: usize,
    b: usize,
    weight: f64,
}

/// Prim's algorithm over the complete mutual-reachability graph.
///
/// Candidates are scanned in ascending index order and only strict
/// improvements replace the best edge, so equal-weight ties resolve
/// deterministically.
fn minimum_spanning_tree(distances: &[Vec<f64>], core: &[f64]) -> Vec<MstEdge> {
    let n = distances.len();
    let mut edges = Vec::with_capacity(n.saturating_sub(1));
    if n < 2 {
        return edges;
    }

    let reach = |a: usize, b: usize| distances[a][b].max(core[a]).max(core[b]);

    let mut in_tree = vec![false; n];
    let mut best = vec![f64::INFINITY; n];
    let mut best_from = vec![0usize; n];

    in_tree[0] = true;
    for j in 1..n {
        best[j] = reach(0, j);
    }

    for _ in 1..n {
        let mut next = usize::MAX;
        let mut next_weight = f64::INFINITY;
        for (j, &w) in best.iter().enumerate() {
            if !in_tree[j] && w < next_weight {
                next = j;
                next_weight = w;
            }
        }

        in_tree[next] = true;
        edges.push(MstEdge {
            a: best_from[next],
            b: next,
            weight: next_weight,
        });

        for j in 0..n {
            if !in_tree[j] {
                let w = reach(next, j);
                if w < best[j] {
                    best[j] = w;
                    best_from[j] = next;
                }
            }
        }
    }

    edges.sort_by(|x, y| x.weight.total_cmp(&y.weight));
    edges
}

/// Internal node of the single-linkage hierarchy.
///
/// Arena ids: original points occupy 0..N-1, internal merge nodes occupy
/// N..2N-2 in creation order; the last node is the root.
#[derive(Debug, Clone, Copy)]
struct HierarchyNode {
    left: usize,
    right: usize,
    lambda: f64,
    size: usize,
}

/// Build the single-linkage hierarchy from MST edges in ascending weight
/// order using array-backed union-find with path compression.
fn single_linkage(n: usize, edges: Vec<MstEdge>) -> Vec<HierarchyNode> {
    let capacity = 2 * n - 1;
    let mut parent: Vec<usize> = (0..capacity).collect();
    let mut nodes: Vec<HierarchyNode> = Vec::with_capacity(n.saturating_sub(1));

    fn find(parent: &mut [usize], mut x: usize) -> usize {
        while parent[x] != x {
            parent[x] = parent[parent[x]];
            x = parent[x];
        }
        x
    }

    for edge in edges {
        let ra = find(&mut parent, edge.a);
        let rb = find(&mut parent, edge.b);
        debug_assert_ne!(ra, rb, "MST edges never join an existing component");

        let size = |id: usize, nodes: &[HierarchyNode]| {
            if id < n {
                1
            } else {
                nodes[id - n].size
            }
        };
        let merged = size(ra, &nodes) + size(rb, &nodes);
        let lambda = if edge.weight > 0.0 {
            1.0 / edge.weight
        } else {
            f64::INFINITY
        };

        let new_id = n + nodes.len();
        nodes.push(HierarchyNode {
            left: ra,
            right: rb,
            lambda,
            size: merged,
        });
        parent[ra] = new_id;
        parent[rb] = new_id;
    }

    nodes
}

/// A cluster in the condensed tree.
#[derive(Debug, Clone)]
struct CondensedCluster {
    parent: Option<usize>,
    children: Vec<usize>,
    lambda_birth: f64,
    /// Point-departure events: (point id, lambda at departure).
    departures: Vec<(usize, f64)>,
}

impl CondensedCluster {
    fn new(parent: Option<usize>, lambda_birth: f64) -> Self {
        Self {
            parent,
            children: Vec::new(),
            lambda_birth,
            departures: Vec::new(),
        }
    }
}

/// Condense the hierarchy: keep splits where both sides reach `k`, let
/// smaller sides fall out as departures attached to the surviving cluster.
fn condense(n: usize, hierarchy: &[HierarchyNode], k: usize) -> Vec<CondensedCluster> {
    let mut condensed = vec![CondensedCluster::new(None, 0.0)];
    if hierarchy.is_empty() {
        // Single point: it departs from the root at infinite density.
        if n == 1 {
            condensed[0].departures.push((0, f64::INFINITY));
        }
        return condensed;
    }

    let subtree_size = |id: usize| if id < n { 1 } else { hierarchy[id - n].size };
    let root = n + hierarchy.len() - 1;

    // (hierarchy node id, condensed cluster the subtree currently feeds)
    let mut stack = vec![(root, 0usize)];
    while let Some((node_id, cluster)) = stack.pop() {
        if node_id < n {
            // A surviving side can only be a leaf when k == 1; fold the
            // point into the current cluster at its parent's lambda.
            let lambda = condensed[cluster].lambda_birth;
            condensed[cluster].departures.push((node_id, lambda));
            continue;
        }

        let node = hierarchy[node_id - n];
        let left_size = subtree_size(node.left);
        let right_size = subtree_size(node.right);

        if left_size >= k && right_size >= k {
            let left_cluster = condensed.len();
            condensed.push(CondensedCluster::new(Some(cluster), node.lambda));
            let right_cluster = condensed.len();
            condensed.push(CondensedCluster::new(Some(cluster), node.lambda));
            condensed[cluster].children.push(left_cluster);
            condensed[cluster].children.push(right_cluster);
            stack.push((node.left, left_cluster));
            stack.push((node.right, right_cluster));
        } else if left_size >= k {
            drop_leaves(n, hierarchy, node.right, node.lambda, &mut condensed[cluster]);
            stack.push((node.left, cluster));
        } else if right_size >= k {
            drop_leaves(n, hierarchy, node.left, node.lambda, &mut condensed[cluster]);
            stack.push((node.right, cluster));
        } else {
            drop_leaves(n, hierarchy, node.left, node.lambda, &mut condensed[cluster]);
            drop_leaves(n, hierarchy, node.right, node.lambda, &mut condensed[cluster]);
        }
    }

    condensed
}

/// Record every leaf under `node_id` as departing `cluster` at `lambda`.
fn drop_leaves(
    n: usize,
    hierarchy: &[HierarchyNode],
    node_id: usize,
    lambda: f64,
    cluster: &mut CondensedCluster,
) {
    let mut stack = vec![node_id];
    while let Some(id) = stack.pop() {
        if id < n {
            cluster.departures.push((id, lambda));
        } else {
            let node = hierarchy[id - n];
            stack.push(node.left);
            stack.push(node.right);
        }
    }
}

/// Lambda persistence with both-infinite guarded to 0 so stability sums
/// never produce NaN on zero-distance merges.
fn lambda_gap(departure: f64, birth: f64) -> f64 {
    if departure.is_infinite() && birth.is_infinite() {
        0.0
    } else {
        (departure - birth).max(0.0)
    }
}

/// Excess-of-mass selection over the condensed tree.
///
/// Processes clusters bottom-up (children have larger arena indices than
/// their parents); a parent that meets or exceeds the sum of its resolved
/// children is selected and flattens all descendants.
fn select_clusters(condensed: &[CondensedCluster]) -> Vec<bool> {
    let len = condensed.len();
    let mut stability = vec![0.0f64; len];
    for (i, c) in condensed.iter().enumerate() {
        stability[i] = c
            .departures
            .iter()
            .map(|&(_, lambda)| lambda_gap(lambda, c.lambda_birth))
            .sum();
    }

    let mut selected = vec![false; len];
    let mut resolved = vec![0.0f64; len];

    for i in (0..len).rev() {
        let c = &condensed[i];
        if c.children.is_empty() {
            selected[i] = true;
            resolved[i] = stability[i];
            continue;
        }

        let child_sum: f64 = c.children.iter().map(|&ch| resolved[ch]).sum();
        if stability[i] >= child_sum {
            selected[i] = true;
            resolved[i] = stability[i];
            deselect_descendants(condensed, i, &mut selected);
        } else {
            resolved[i] = child_sum;
        }
    }

    selected
}

fn deselect_descendants(condensed: &[CondensedCluster], root: usize, selected: &mut [bool]) {
    let mut stack: Vec<usize> = condensed[root].children.clone();
    while let Some(id) = stack.pop() {
        selected[id] = false;
        stack.extend(condensed[id].children.iter().copied());
    }
}

/// Assign each point to its nearest selected ancestor and compute the
/// clipped lambda-ratio probability; demote undersized clusters to noise
/// and densely renumber the survivors.
fn assign(
    n: usize,
    k: usize,
    condensed: &[CondensedCluster],
    selected: &[bool],
) -> ClusteringResult {
    // Each point departs exactly once; map it to the first selected cluster
    // on the path from its departure cluster up to the root.
    let mut point_cluster = vec![usize::MAX; n];
    let mut point_lambda = vec![0.0f64; n];
    for (id, c) in condensed.iter().enumerate() {
        for &(point, lambda) in &c.departures {
            let mut cursor = Some(id);
            while let Some(cur) = cursor {
                if selected[cur] {
                    point_cluster[point] = cur;
                    point_lambda[point] = lambda;
                    break;
                }
                cursor = condensed[cur].parent;
            }
        }
    }

    // Realized member counts and per-cluster max departure lambda.
    let mut counts = vec![0usize; condensed.len()];
    let mut max_lambda = vec![0.0f64; condensed.len()];
    for p in 0..n {
        let c = point_cluster[p];
        if c != usize::MAX {
            counts[c] += 1;
            if point_lambda[p] > max_lambda[c] {
                max_lambda[c] = point_lambda[p];
            }
        }
    }

    // Densely renumber clusters that realized at least k members.
    let mut dense_label = vec![NOISE; condensed.len()];
    let mut cluster_count = 0usize;
    for (id, &is_selected) in selected.iter().enumerate() {
        if is_selected && counts[id] >= k {
            dense_label[id] = cluster_count as i32;
            cluster_count += 1;
        }
    }

    let mut labels = vec![NOISE; n];
    let mut probabilities = vec![0.0f32; n];
    for p in 0..n {
        let c = point_cluster[p];
        if c == usize::MAX || dense_label[c] == NOISE {
            continue;
        }
        labels[p] = dense_label[c];

        let birth = condensed[c].lambda_birth;
        let denominator = max_lambda[c] - birth;
        let probability = if denominator <= 0.0 || !denominator.is_finite() {
            1.0
        } else {
            let numerator = lambda_gap(point_lambda[p], birth);
            (numerator / denominator).clamp(0.0, 1.0)
        };
        probabilities[p] = probability as f32;
    }

    ClusteringResult {
        labels,
        probabilities,
        cluster_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tight_group(cx: f32, cy: f32, count: usize) -> Vec<Vec<f32>> {
        (0..count)
            .map(|i| vec![cx + i as f32 * 0.05, cy + (i % 2) as f32 * 0.05])
            .collect()
    }

    #[test]
    fn empty_input_yields_empty_result() {
        let result = cluster(&[], &DensityParams::new(3)).unwrap();
        assert!(result.labels.is_empty());
        assert!(result.probabilities.is_empty());
        assert_eq!(result.cluster_count, 0);
    }

    #[test]
    fn fewer_points_than_min_cluster_size_is_all_noise() {
        let points = vec![vec![0.0, 0.0], vec![1.0, 1.0]];
        let result = cluster(&points, &DensityParams::new(3)).unwrap();
        assert_eq!(result.cluster_count, 0);
        assert!(result.labels.iter().all(|&l| l == NOISE));
        assert!(result.probabilities.iter().all(|&p| p == 0.0));
    }

    #[test]
    fn three_separated_groups_form_three_clusters() {
        let mut points = tight_group(0.0, 0.0, 5);
        points.extend(tight_group(10.0, 10.0, 5));
        points.extend(tight_group(20.0, 0.0, 5));

        let result = cluster(&points, &DensityParams::new(3)).unwrap();
        assert_eq!(result.cluster_count, 3);
        assert!(
            result.labels.iter().all(|&l| l != NOISE),
            "tight groups leave no noise: {:?}",
            result.labels
        );

        // Every within-group pair shares a label; no cross-group collisions.
        for group in 0..3 {
            let base = result.labels[group * 5];
            for i in 0..5 {
                assert_eq!(result.labels[group * 5 + i], base);
            }
        }
        assert_ne!(result.labels[0], result.labels[5]);
        assert_ne!(result.labels[5], result.labels[10]);
        assert_ne!(result.labels[0], result.labels[10]);
    }

    #[test]
    fn far_outliers_are_labeled_noise() {
        let mut points = tight_group(0.0, 0.0, 5);
        points.extend(tight_group(10.0, 10.0, 5));
        points.push(vec![50.0, -40.0]);
        points.push(vec![-45.0, 55.0]);
        points.push(vec![90.0, 90.0]);

        let result = cluster(&points, &DensityParams::new(3)).unwrap();
        assert_eq!(result.cluster_count, 2);
        for i in 10..13 {
            assert_eq!(result.labels[i], NOISE, "outlier {} must be noise", i);
            assert_eq!(result.probabilities[i], 0.0);
        }
    }

    #[test]
    fn probabilities_stay_in_unit_interval() {
        let mut points = tight_group(0.0, 0.0, 8);
        points.extend(tight_group(5.0, 5.0, 8));
        points.push(vec![100.0, 100.0]);

        let result = cluster(&points, &DensityParams::new(4)).unwrap();
        for (label, probability) in result.labels.iter().zip(&result.probabilities) {
            assert!((0.0..=1.0).contains(probability));
            if *label == NOISE {
                assert_eq!(*probability, 0.0);
            }
        }
    }

    #[test]
    fn single_tight_group_is_one_cluster() {
        let points = tight_group(1.0, 1.0, 6);
        let result = cluster(&points, &DensityParams::new(3)).unwrap();
        assert_eq!(result.cluster_count, 1);
        assert!(result.labels.iter().all(|&l| l == 0));
    }

    #[test]
    fn duplicate_points_do_not_produce_nan() {
        let points = vec![vec![1.0, 1.0]; 6];
        let result = cluster(&points, &DensityParams::new(3)).unwrap();
        assert!(result.probabilities.iter().all(|p| p.is_finite()));
        assert_eq!(result.cluster_count, 1);
    }

    #[test]
    fn rejects_mismatched_dimensions() {
        let points = vec![vec![0.0, 0.0], vec![1.0], vec![2.0, 2.0]];
        let result = cluster(&points, &DensityParams::new(2));
        assert!(matches!(
            result,
            Err(ClusterError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn rejects_non_finite_components() {
        let points = vec![vec![0.0, 0.0], vec![f32::NAN, 1.0], vec![2.0, 2.0]];
        let result = cluster(&points, &DensityParams::new(2));
        assert!(matches!(result, Err(ClusterError::NonFiniteInput { .. })));
    }

    #[test]
    fn rejects_invalid_params() {
        let points = vec![vec![0.0], vec![1.0]];
        assert!(cluster(&points, &DensityParams::new(1)).is_err());
    }

    #[test]
    fn deterministic_for_fixed_input_order() {
        let mut points = tight_group(0.0, 0.0, 5);
        points.extend(tight_group(8.0, 8.0, 5));

        let first = cluster(&points, &DensityParams::new(3)).unwrap();
        let second = cluster(&points, &DensityParams::new(3)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn min_samples_override_is_honored() {
        let mut points = tight_group(0.0, 0.0, 5);
        points.extend(tight_group(10.0, 10.0, 5));

        let result = cluster(
            &points,
            &DensityParams::new(3).with_min_samples(2),
        )
        .unwrap();
        assert_eq!(result.cluster_count, 2);
    }
}
