//! Persistence trait for clusters, assignments, and run state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::PatternResult;
use crate::types::{ClusterAssignment, ClusterRunState, CommentEmbedding, ReviewCluster};

/// Recent-assignment activity for one cluster.
///
/// Counts assignments whose source comments fall inside the query window,
/// excluding soft-deleted comments.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AssignmentActivity {
    pub count: usize,
    /// Mean age of the counted comments in days; `None` when count is 0.
    pub mean_age_days: Option<f32>,
}

/// Durable CRUD for clusters, assignments, and run state.
///
/// Implementations must be safe for concurrent use; the engine issues
/// fire-and-forget writes inside loops and tolerates partial failure, so
/// individual operations should be independently atomic but need no
/// cross-call transaction.
#[async_trait]
pub trait PatternStore: Send + Sync {
    /// Create or update a cluster keyed by `(repo_id, slug)`.
    ///
    /// When the existing cluster is pinned, label fields (`slug`, `label`,
    /// `label_updated_at`) are preserved even if the caller supplies new
    /// values.
    async fn upsert_cluster(&self, cluster: ReviewCluster) -> PatternResult<ReviewCluster>;

    /// Non-retired clusters for a repo.
    async fn active_clusters(&self, repo_id: &str) -> PatternResult<Vec<ReviewCluster>>;

    /// Mark a cluster retired. Retired clusters are never hard-deleted.
    async fn retire_cluster(&self, id: Uuid) -> PatternResult<()>;

    /// Replace a cluster's label, slug, and snapshot count.
    /// No-op when the cluster is pinned; errors when another cluster in
    /// the repo already holds `slug`.
    async fn update_cluster_label(
        &self,
        id: Uuid,
        slug: &str,
        label: &str,
        member_count_at_label: usize,
    ) -> PatternResult<()>;

    /// Pin a cluster's label, freezing slug and label forever.
    async fn pin_cluster_label(&self, id: Uuid, slug: &str, label: &str) -> PatternResult<()>;

    /// Idempotent assignment insert; conflicts on
    /// `(cluster_id, review_comment_id)` are ignored.
    async fn write_assignments(&self, assignments: Vec<ClusterAssignment>) -> PatternResult<()>;

    /// Assignments for a cluster, ordered by probability descending.
    async fn assignments_by_cluster(&self, id: Uuid) -> PatternResult<Vec<ClusterAssignment>>;

    /// Assignment activity for a cluster since `since`, excluding
    /// soft-deleted comments.
    async fn recent_assignment_activity(
        &self,
        id: Uuid,
        since: DateTime<Utc>,
    ) -> PatternResult<AssignmentActivity>;

    /// Text of a review comment, when it exists and is not soft-deleted.
    async fn comment_text(&self, comment_id: Uuid) -> PatternResult<Option<String>>;

    /// Embedding rows for a repo created at or after `since`, newest first,
    /// excluding soft-deleted and stale comments.
    async fn embeddings_since(
        &self,
        repo_id: &str,
        since: DateTime<Utc>,
    ) -> PatternResult<Vec<CommentEmbedding>>;

    /// Run state for a repo, if one has been persisted.
    async fn run_state(&self, repo_id: &str) -> PatternResult<Option<ClusterRunState>>;

    /// Upsert a repo's run state.
    async fn save_run_state(&self, state: ClusterRunState) -> PatternResult<()>;

    /// Repos known to the store, for the scheduler to iterate.
    async fn active_repos(&self) -> PatternResult<Vec<String>>;
}
