//! End-to-end tests for the pattern matcher over the in-memory store.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use review_patterns_core::config::MatcherConfig;
use review_patterns_core::matching::PatternMatcher;
use review_patterns_core::stubs::InMemoryPatternStore;
use review_patterns_core::traits::PatternStore;
use review_patterns_core::types::{ClusterAssignment, CommentEmbedding, ReviewCluster};

const REPO: &str = "acme/widgets";

fn matcher(store: Arc<InMemoryPatternStore>) -> PatternMatcher {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    PatternMatcher::new(store, MatcherConfig::default())
}

/// Seed an active cluster plus `texts.len()` fresh assignments, one per
/// text, with descending probabilities starting at 0.9.
async fn seed_cluster(
    store: &InMemoryPatternStore,
    slug: &str,
    centroid: Vec<f32>,
    files: &[&str],
    texts: &[&str],
    age_days: i64,
) -> ReviewCluster {
    let mut cluster = ReviewCluster::new(REPO, slug, format!("label for {}", slug), centroid, texts.len());
    cluster.file_paths = files.iter().map(|f| f.to_string()).collect();
    let cluster = store.upsert_cluster(cluster).await.unwrap();

    for (i, text) in texts.iter().enumerate() {
        let comment = CommentEmbedding {
            id: Uuid::new_v4(),
            embedding: vec![0.0; 4],
            file_path: files.first().map(|f| f.to_string()),
            text: text.to_string(),
            created_at: Utc::now() - Duration::days(age_days),
        };
        store.insert_comment(REPO, comment.clone()).await;
        store
            .write_assignments(vec![ClusterAssignment::new(
                cluster.id,
                comment.id,
                0.9 - i as f32 * 0.1,
            )])
            .await
            .unwrap();
    }
    cluster
}

#[tokio::test]
async fn missing_query_embedding_matches_nothing() {
    let store = Arc::new(InMemoryPatternStore::new());
    seed_cluster(
        &store,
        "some-pattern",
        vec![1.0, 0.0, 0.0, 0.0],
        &["src/lib.rs"],
        &["a", "b", "c"],
        1,
    )
    .await;

    let matches = matcher(Arc::clone(&store))
        .find_matches(None, &["src/lib.rs".to_string()], REPO)
        .await;
    assert!(matches.is_empty());
    println!("[PASS] missing_query_embedding_matches_nothing");
}

#[tokio::test]
async fn no_active_clusters_matches_nothing() {
    let store = Arc::new(InMemoryPatternStore::new());
    let matches = matcher(Arc::clone(&store))
        .find_matches(Some(&[1.0, 0.0, 0.0, 0.0]), &[], REPO)
        .await;
    assert!(matches.is_empty());
    println!("[PASS] no_active_clusters_matches_nothing");
}

#[tokio::test]
async fn identical_query_surfaces_cluster_with_representative_sample() {
    let store = Arc::new(InMemoryPatternStore::new());
    seed_cluster(
        &store,
        "missing-timeouts",
        vec![1.0, 0.0, 0.0, 0.0],
        &["src/client.rs", "src/http.rs"],
        &[
            "Add a timeout to this client call",
            "No deadline on the outbound request",
            "This can hang forever without a timeout",
        ],
        1,
    )
    .await;

    let matches = matcher(Arc::clone(&store))
        .find_matches(
            Some(&[1.0, 0.0, 0.0, 0.0]),
            &["src/client.rs".to_string()],
            REPO,
        )
        .await;

    assert_eq!(matches.len(), 1);
    let m = &matches[0];
    assert_eq!(m.slug, "missing-timeouts");
    assert!((m.similarity_score - 1.0).abs() < 1e-5);
    assert!((m.file_path_overlap - 0.5).abs() < 1e-5, "1 of 2 files shared");
    assert!(m.combined_score > 0.3);
    assert_eq!(
        m.representative_sample.as_deref(),
        Some("Add a timeout to this client call"),
        "sample comes from the highest-probability assignment"
    );
    println!("[PASS] identical_query_surfaces_cluster_with_representative_sample");
}

#[tokio::test]
async fn cluster_with_too_few_recent_assignments_is_skipped() {
    let store = Arc::new(InMemoryPatternStore::new());
    // Perfect similarity, but only two recent assignments.
    seed_cluster(
        &store,
        "sparse-pattern",
        vec![1.0, 0.0, 0.0, 0.0],
        &["src/lib.rs"],
        &["one", "two"],
        1,
    )
    .await;

    let matches = matcher(Arc::clone(&store))
        .find_matches(Some(&[1.0, 0.0, 0.0, 0.0]), &[], REPO)
        .await;
    assert!(matches.is_empty());
    println!("[PASS] cluster_with_too_few_recent_assignments_is_skipped");
}

#[tokio::test]
async fn assignments_outside_recency_window_do_not_count() {
    let store = Arc::new(InMemoryPatternStore::new());
    seed_cluster(
        &store,
        "dormant-pattern",
        vec![1.0, 0.0, 0.0, 0.0],
        &["src/lib.rs"],
        &["one", "two", "three"],
        70,
    )
    .await;

    let matches = matcher(Arc::clone(&store))
        .find_matches(Some(&[1.0, 0.0, 0.0, 0.0]), &[], REPO)
        .await;
    assert!(matches.is_empty());
    println!("[PASS] assignments_outside_recency_window_do_not_count");
}

#[tokio::test]
async fn results_are_ranked_and_capped_at_three() {
    let store = Arc::new(InMemoryPatternStore::new());
    let texts = ["a", "b", "c"];
    let centroids: [(&str, Vec<f32>); 5] = [
        ("exact", vec![1.0, 0.0, 0.0, 0.0]),
        ("close", vec![1.0, 0.3, 0.0, 0.0]),
        ("diagonal", vec![1.0, 1.0, 0.0, 0.0]),
        ("oblique", vec![0.5, 1.0, 0.0, 0.0]),
        ("orthogonal", vec![0.0, 1.0, 0.0, 0.0]),
    ];
    for (slug, centroid) in centroids {
        seed_cluster(&store, slug, centroid, &[], &texts, 1).await;
    }

    let matches = matcher(Arc::clone(&store))
        .find_matches(Some(&[1.0, 0.0, 0.0, 0.0]), &[], REPO)
        .await;

    // "oblique" lands just under the score floor, "orthogonal" well under.
    assert_eq!(matches.len(), 3);
    assert_eq!(matches[0].slug, "exact");
    assert_eq!(matches[1].slug, "close");
    assert_eq!(matches[2].slug, "diagonal");
    assert!(matches[0].combined_score >= matches[1].combined_score);
    assert!(matches[1].combined_score >= matches[2].combined_score);
    for m in &matches {
        assert!(m.combined_score >= 0.3);
    }
    println!("[PASS] results_are_ranked_and_capped_at_three");
}

#[tokio::test]
async fn file_overlap_breaks_similarity_ties() {
    let store = Arc::new(InMemoryPatternStore::new());
    let texts = ["a", "b", "c"];
    seed_cluster(
        &store,
        "shared-files",
        vec![1.0, 0.0, 0.0, 0.0],
        &["src/handler.rs"],
        &texts,
        1,
    )
    .await;
    seed_cluster(
        &store,
        "other-files",
        vec![1.0, 0.0, 0.0, 0.0],
        &["src/unrelated.rs"],
        &texts,
        1,
    )
    .await;

    let matches = matcher(Arc::clone(&store))
        .find_matches(
            Some(&[1.0, 0.0, 0.0, 0.0]),
            &["src/handler.rs".to_string()],
            REPO,
        )
        .await;

    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].slug, "shared-files");
    assert!(matches[0].combined_score > matches[1].combined_score);
    assert!(matches[0].file_path_overlap > 0.0);
    assert_eq!(matches[1].file_path_overlap, 0.0);
    println!("[PASS] file_overlap_breaks_similarity_ties");
}

#[tokio::test]
async fn stale_activity_is_floored_not_zeroed() {
    let store = Arc::new(InMemoryPatternStore::new());
    // Mean assignment age of 48 days gives a raw recency weight of 0.2,
    // which the floor lifts to 0.5.
    seed_cluster(
        &store,
        "aging-pattern",
        vec![1.0, 0.0, 0.0, 0.0],
        &["src/lib.rs"],
        &["a", "b", "c"],
        48,
    )
    .await;

    let matches = matcher(Arc::clone(&store))
        .find_matches(
            Some(&[1.0, 0.0, 0.0, 0.0]),
            &["src/lib.rs".to_string()],
            REPO,
        )
        .await;

    assert_eq!(matches.len(), 1);
    // (0.6 * 1.0 + 0.4 * 1.0) * 0.5
    assert!((matches[0].combined_score - 0.5).abs() < 1e-3);
    println!("[PASS] stale_activity_is_floored_not_zeroed");
}

#[tokio::test]
async fn retired_clusters_are_invisible_to_matching() {
    let store = Arc::new(InMemoryPatternStore::new());
    let cluster = seed_cluster(
        &store,
        "retired-pattern",
        vec![1.0, 0.0, 0.0, 0.0],
        &["src/lib.rs"],
        &["a", "b", "c"],
        1,
    )
    .await;
    store.retire_cluster(cluster.id).await.unwrap();

    let matches = matcher(Arc::clone(&store))
        .find_matches(Some(&[1.0, 0.0, 0.0, 0.0]), &[], REPO)
        .await;
    assert!(matches.is_empty());
    println!("[PASS] retired_clusters_are_invisible_to_matching");
}

#[tokio::test]
async fn store_failure_fails_open_to_empty() {
    let store = Arc::new(InMemoryPatternStore::new());
    seed_cluster(
        &store,
        "some-pattern",
        vec![1.0, 0.0, 0.0, 0.0],
        &["src/lib.rs"],
        &["a", "b", "c"],
        1,
    )
    .await;
    store.set_failing(true);

    let matches = matcher(Arc::clone(&store))
        .find_matches(Some(&[1.0, 0.0, 0.0, 0.0]), &[], REPO)
        .await;
    assert!(matches.is_empty());
    println!("[PASS] store_failure_fails_open_to_empty");
}
