//! Read-only pattern matching for incoming change-sets.
//!
//! Scores one query embedding plus a changed-file set against the active
//! cluster set and returns the top matches. Every internal failure is
//! logged and converted to an empty result; this path must never block the
//! review pipeline that calls it.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, warn};

use crate::config::MatcherConfig;
use crate::error::PatternResult;
use crate::similarity::cosine_similarity;
use crate::traits::PatternStore;
use crate::types::{PatternMatch, ReviewCluster};

/// Scores change-sets against the active cluster set.
///
/// Issues no writes and is safe to invoke concurrently and arbitrarily
/// often.
pub struct PatternMatcher {
    store: Arc<dyn PatternStore>,
    config: MatcherConfig,
}

impl PatternMatcher {
    pub fn new(store: Arc<dyn PatternStore>, config: MatcherConfig) -> Self {
        Self { store, config }
    }

    /// Rank active clusters against a query embedding and changed files.
    ///
    /// `None` query yields `[]` immediately. Results are sorted by combined
    /// score descending and capped at the configured maximum. Failures are
    /// logged and converted to `[]`, never propagated.
    pub async fn find_matches(
        &self,
        query: Option<&[f32]>,
        changed_files: &[String],
        repo: &str,
    ) -> Vec<PatternMatch> {
        let Some(query) = query else {
            return Vec::new();
        };

        match self.find_matches_inner(query, changed_files, repo).await {
            Ok(matches) => matches,
            Err(e) => {
                warn!(repo, error = %e, "pattern matching failed, returning no matches");
                Vec::new()
            }
        }
    }

    async fn find_matches_inner(
        &self,
        query: &[f32],
        changed_files: &[String],
        repo: &str,
    ) -> PatternResult<Vec<PatternMatch>> {
        let clusters = self.store.active_clusters(repo).await?;
        if clusters.is_empty() {
            return Ok(Vec::new());
        }

        let query_files: HashSet<&str> = changed_files.iter().map(String::as_str).collect();
        let since = Utc::now() - Duration::days(self.config.recency_window_days);

        let mut scored: Vec<PatternMatch> = Vec::new();
        for cluster_ref in &clusters {
            if cluster_ref.centroid.is_empty() {
                continue;
            }

            let similarity = cosine_similarity(query, &cluster_ref.centroid);
            let overlap = jaccard_overlap(&query_files, cluster_ref);

            let activity = self
                .store
                .recent_assignment_activity(cluster_ref.id, since)
                .await?;
            if activity.count < self.config.min_recent_assignments {
                continue;
            }
            let mean_age = activity
                .mean_age_days
                .unwrap_or(self.config.recency_window_days as f32);
            let recency_weight = (1.0 - mean_age / self.config.recency_window_days as f32)
                .max(self.config.min_recency_weight);

            let combined = (self.config.similarity_weight * similarity
                + self.config.overlap_weight * overlap)
                * recency_weight;
            if combined < self.config.min_combined_score {
                continue;
            }

            scored.push(PatternMatch {
                cluster_id: cluster_ref.id,
                slug: cluster_ref.slug.clone(),
                label: cluster_ref.label.clone(),
                member_count: cluster_ref.member_count,
                similarity_score: similarity,
                file_path_overlap: overlap,
                combined_score: combined,
                representative_sample: None,
            });
        }

        scored.sort_by(|a, b| b.combined_score.total_cmp(&a.combined_score));
        scored.truncate(self.config.max_matches);

        for matched in &mut scored {
            matched.representative_sample = self.representative_sample(matched.cluster_id).await?;
        }

        debug!(repo, matches = scored.len(), "pattern matching complete");
        Ok(scored)
    }

    /// Text of the cluster's single highest-probability assignment.
    async fn representative_sample(&self, cluster_id: uuid::Uuid) -> PatternResult<Option<String>> {
        let assignments = self.store.assignments_by_cluster(cluster_id).await?;
        let Some(top) = assignments.first() else {
            return Ok(None);
        };
        self.store.comment_text(top.review_comment_id).await
    }
}

/// Jaccard overlap between the query's files and a cluster's files.
fn jaccard_overlap(query_files: &HashSet<&str>, cluster_ref: &ReviewCluster) -> f32 {
    if query_files.is_empty() || cluster_ref.file_paths.is_empty() {
        return 0.0;
    }
    let intersection = cluster_ref
        .file_paths
        .iter()
        .filter(|p| query_files.contains(p.as_str()))
        .count();
    let union = query_files.len() + cluster_ref.file_paths.len() - intersection;
    if union == 0 {
        0.0
    } else {
        intersection as f32 / union as f32
    }
}
