//! Domain types for review-pattern clusters, assignments, and run state.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// ReviewCluster
// =============================================================================

/// A recurring review-feedback pattern discovered by clustering.
///
/// Created only by cluster discovery; mutated by merges, relabeling, and
/// retirement; never deleted. A retired cluster is excluded from matching
/// and future merges but kept for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewCluster {
    /// Unique identifier.
    pub id: Uuid,
    /// Repository this cluster belongs to.
    pub repo_id: String,
    /// Kebab-case identifier, unique per repo.
    pub slug: String,
    /// Free-text description of the pattern.
    pub label: String,
    /// Mean embedding of the members; dimension equals the embedding
    /// dimension.
    pub centroid: Vec<f32>,
    /// Number of member comments.
    pub member_count: usize,
    /// Member count snapshot taken when the label was last generated.
    /// Used to detect membership drift.
    pub member_count_at_label: usize,
    /// File paths touched by member comments.
    pub file_paths: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub label_updated_at: DateTime<Utc>,
    /// Freezes slug and label forever.
    pub pinned: bool,
    /// Excluded from matching and merge candidates; never hard-deleted.
    pub retired: bool,
}

impl ReviewCluster {
    /// Create a fresh cluster as produced by discovery.
    pub fn new(
        repo_id: impl Into<String>,
        slug: impl Into<String>,
        label: impl Into<String>,
        centroid: Vec<f32>,
        member_count: usize,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            repo_id: repo_id.into(),
            slug: slug.into(),
            label: label.into(),
            centroid,
            member_count,
            member_count_at_label: member_count,
            file_paths: BTreeSet::new(),
            created_at: now,
            updated_at: now,
            label_updated_at: now,
            pinned: false,
            retired: false,
        }
    }

    /// Relative membership drift since the label was generated.
    ///
    /// Returns `None` when no snapshot exists (`member_count_at_label` 0).
    pub fn label_drift(&self) -> Option<f32> {
        if self.member_count_at_label == 0 {
            return None;
        }
        let snapshot = self.member_count_at_label as f32;
        Some((self.member_count as f32 - snapshot).abs() / snapshot)
    }
}

// =============================================================================
// ClusterAssignment
// =============================================================================

/// Membership of one review comment in one cluster.
///
/// At most one row exists per `(cluster_id, review_comment_id)`; writes are
/// idempotent no-ops on conflict. Assignments are never mutated, only
/// superseded by idempotent re-writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    pub cluster_id: Uuid,
    /// Foreign reference into the external comment corpus.
    pub review_comment_id: Uuid,
    /// Membership strength in `[0, 1]`.
    pub probability: f32,
    pub assigned_at: DateTime<Utc>,
}

impl ClusterAssignment {
    /// Create an assignment timestamped now, with the probability clamped
    /// into `[0, 1]`.
    pub fn new(cluster_id: Uuid, review_comment_id: Uuid, probability: f32) -> Self {
        Self {
            cluster_id,
            review_comment_id,
            probability: probability.clamp(0.0, 1.0),
            assigned_at: Utc::now(),
        }
    }
}

// =============================================================================
// ClusterRunState
// =============================================================================

/// Status of a maintenance run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RunStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Pending => write!(f, "Pending"),
            RunStatus::Running => write!(f, "Running"),
            RunStatus::Completed => write!(f, "Completed"),
            RunStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// Bookkeeping for one repo's maintenance pipeline.
///
/// Scoped per repo and upserted by `repo_id`; persisted unconditionally at
/// the end of every run, including failed ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterRunState {
    pub repo_id: String,
    pub last_run_at: DateTime<Utc>,
    pub clusters_discovered: usize,
    pub comments_processed: usize,
    pub labels_generated: usize,
    pub status: RunStatus,
    pub error_message: Option<String>,
}

impl ClusterRunState {
    /// Fresh state for a run that is starting now.
    pub fn started(repo_id: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            last_run_at: Utc::now(),
            clusters_discovered: 0,
            comments_processed: 0,
            labels_generated: 0,
            status: RunStatus::Running,
            error_message: None,
        }
    }

    /// Mark the run completed.
    pub fn completed(mut self) -> Self {
        self.status = RunStatus::Completed;
        self.error_message = None;
        self
    }

    /// Mark the run failed with the captured message.
    pub fn failed(mut self, message: impl Into<String>) -> Self {
        self.status = RunStatus::Failed;
        self.error_message = Some(message.into());
        self
    }
}

// =============================================================================
// CommentEmbedding
// =============================================================================

/// A raw embedding row read from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentEmbedding {
    /// Id of the source review comment.
    pub id: Uuid,
    pub embedding: Vec<f32>,
    /// File the comment was attached to, when known.
    pub file_path: Option<String>,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// PatternMatch
// =============================================================================

/// One ranked match returned by the pattern matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub cluster_id: Uuid,
    pub slug: String,
    pub label: String,
    pub member_count: usize,
    /// Cosine similarity between the query and the cluster centroid.
    pub similarity_score: f32,
    /// Jaccard overlap between query file paths and cluster file paths.
    pub file_path_overlap: f32,
    /// Recency-weighted blend of similarity and overlap.
    pub combined_score: f32,
    /// Text of the cluster's highest-probability assignment.
    pub representative_sample: Option<String>,
}

/// A generated cluster label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedLabel {
    /// Kebab-case identifier.
    pub slug: String,
    /// Human-readable description.
    pub description: String,
}
