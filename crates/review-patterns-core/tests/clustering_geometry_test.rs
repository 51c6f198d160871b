//! Geometry tests for the density clustering algorithm.
//!
//! These verify the documented end-to-end behavior on small 2-D
//! configurations: tight well-separated groups become clusters, far
//! outliers become noise, undersized inputs are all noise, and
//! probabilities stay in the unit interval.

use review_patterns_core::clustering::{cluster, ClusteringResult, DensityParams, NOISE};

fn group_of_five(cx: f32, cy: f32) -> Vec<Vec<f32>> {
    // Five points within a radius of ~0.3 around the center.
    vec![
        vec![cx, cy],
        vec![cx + 0.2, cy],
        vec![cx, cy + 0.2],
        vec![cx - 0.2, cy + 0.1],
        vec![cx + 0.1, cy - 0.2],
    ]
}

fn run(points: &[Vec<f32>], k: usize) -> ClusteringResult {
    cluster(points, &DensityParams::new(k)).expect("clustering must succeed on valid input")
}

#[test]
fn three_tight_groups_yield_three_clusters_and_no_noise() {
    let mut points = group_of_five(0.0, 0.0);
    points.extend(group_of_five(10.0, 10.0));
    points.extend(group_of_five(20.0, 0.0));

    let result = run(&points, 3);

    assert_eq!(result.cluster_count, 3, "expected exactly 3 clusters");
    assert!(
        result.labels.iter().all(|&l| l != NOISE),
        "no point may be noise: {:?}",
        result.labels
    );

    // Every within-group pair shares a label.
    for g in 0..3 {
        let base = result.labels[g * 5];
        for i in 1..5 {
            assert_eq!(
                result.labels[g * 5 + i],
                base,
                "group {} split across labels",
                g
            );
        }
    }

    // No cross-group label collisions.
    let g0 = result.labels[0];
    let g1 = result.labels[5];
    let g2 = result.labels[10];
    assert_ne!(g0, g1);
    assert_ne!(g1, g2);
    assert_ne!(g0, g2);

    println!("[PASS] three_tight_groups_yield_three_clusters_and_no_noise");
}

#[test]
fn far_outliers_become_noise() {
    let mut points = group_of_five(0.0, 0.0);
    points.extend(group_of_five(10.0, 10.0));
    points.push(vec![60.0, -50.0]);
    points.push(vec![-55.0, 70.0]);
    points.push(vec![120.0, 120.0]);

    let result = run(&points, 3);

    assert_eq!(result.cluster_count, 2);
    for i in 10..13 {
        assert_eq!(result.labels[i], NOISE, "outlier {} not noise", i);
        assert_eq!(result.probabilities[i], 0.0);
    }
    for i in 0..10 {
        assert_ne!(result.labels[i], NOISE, "group point {} lost to noise", i);
    }

    println!("[PASS] far_outliers_become_noise");
}

#[test]
fn fewer_points_than_min_cluster_size_all_noise() {
    let points = vec![vec![0.0, 0.0], vec![0.1, 0.1], vec![0.2, 0.0]];
    let result = run(&points, 5);

    assert_eq!(result.cluster_count, 0);
    assert!(result.labels.iter().all(|&l| l == NOISE));
    assert!(result.probabilities.iter().all(|&p| p == 0.0));

    println!("[PASS] fewer_points_than_min_cluster_size_all_noise");
}

#[test]
fn non_noise_probabilities_are_in_unit_interval() {
    let mut points = group_of_five(0.0, 0.0);
    points.extend(group_of_five(6.0, 6.0));
    points.extend(group_of_five(12.0, 0.0));
    points.push(vec![200.0, 200.0]);

    let result = run(&points, 3);

    for (i, (&label, &p)) in result.labels.iter().zip(&result.probabilities).enumerate() {
        assert!(
            (0.0..=1.0).contains(&p),
            "probability[{}] out of range: {}",
            i,
            p
        );
        if label == NOISE {
            assert_eq!(p, 0.0);
        }
    }

    println!("[PASS] non_noise_probabilities_are_in_unit_interval");
}

#[test]
fn labels_are_densely_numbered_from_zero() {
    let mut points = group_of_five(0.0, 0.0);
    points.extend(group_of_five(15.0, 15.0));

    let result = run(&points, 3);

    let mut seen: Vec<i32> = result
        .labels
        .iter()
        .copied()
        .filter(|&l| l != NOISE)
        .collect();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen, (0..result.cluster_count as i32).collect::<Vec<_>>());

    println!("[PASS] labels_are_densely_numbered_from_zero");
}

#[test]
fn higher_dimensional_groups_cluster_too() {
    // Two bundles of 6 points in 8-D, far apart along different axes.
    let mut points: Vec<Vec<f32>> = Vec::new();
    for i in 0..6 {
        let mut a = vec![0.0f32; 8];
        a[0] = 10.0 + i as f32 * 0.05;
        a[1] = i as f32 * 0.03;
        points.push(a);
    }
    for i in 0..6 {
        let mut b = vec![0.0f32; 8];
        b[4] = -10.0 - i as f32 * 0.05;
        b[5] = i as f32 * 0.03;
        points.push(b);
    }

    let result = run(&points, 3);
    assert_eq!(result.cluster_count, 2);
    assert!(result.labels.iter().all(|&l| l != NOISE));

    println!("[PASS] higher_dimensional_groups_cluster_too");
}
