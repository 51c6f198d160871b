//! In-memory stub implementation of PatternStore.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{PatternError, PatternResult};
use crate::traits::{AssignmentActivity, PatternStore};
use crate::types::{ClusterAssignment, ClusterRunState, CommentEmbedding, ReviewCluster};

/// A review comment held by the stub, with the soft-delete and staleness
/// flags the real corpus carries.
#[derive(Debug, Clone)]
struct StoredComment {
    repo_id: String,
    row: CommentEmbedding,
    deleted: bool,
    stale: bool,
}

#[derive(Debug, Default)]
struct Inner {
    clusters: HashMap<Uuid, ReviewCluster>,
    assignments: HashMap<(Uuid, Uuid), ClusterAssignment>,
    comments: HashMap<Uuid, StoredComment>,
    run_states: HashMap<String, ClusterRunState>,
}

/// In-memory store for tests and local development.
///
/// Uses HashMaps under a tokio RwLock for concurrent access. The
/// `set_failing` switch turns every operation into a storage error;
/// `set_failing_upserts` and `set_failing_activity` fail only cluster
/// writes and activity reads so partial-failure paths can be exercised.
#[derive(Debug, Default)]
pub struct InMemoryPatternStore {
    inner: RwLock<Inner>,
    failing: AtomicBool,
    failing_upserts: AtomicBool,
    failing_activity: AtomicBool,
}

impl InMemoryPatternStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with a storage error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Fail only `upsert_cluster` calls.
    pub fn set_failing_upserts(&self, failing: bool) {
        self.failing_upserts.store(failing, Ordering::SeqCst);
    }

    /// Fail only `recent_assignment_activity` calls.
    pub fn set_failing_activity(&self, failing: bool) {
        self.failing_activity.store(failing, Ordering::SeqCst);
    }

    fn check_failing(&self) -> PatternResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(PatternError::StorageError(
                "stub store configured to fail".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    fn check_switch(&self, switch: &AtomicBool, operation: &str) -> PatternResult<()> {
        if switch.load(Ordering::SeqCst) {
            Err(PatternError::StorageError(format!(
                "stub store configured to fail {}",
                operation
            )))
        } else {
            Ok(())
        }
    }

    /// Insert a review comment with its embedding.
    pub async fn insert_comment(&self, repo_id: &str, row: CommentEmbedding) {
        let mut inner = self.inner.write().await;
        inner.comments.insert(
            row.id,
            StoredComment {
                repo_id: repo_id.to_string(),
                row,
                deleted: false,
                stale: false,
            },
        );
    }

    /// Soft-delete a comment; it stays in the corpus but is excluded from
    /// reads and activity counts.
    pub async fn soft_delete_comment(&self, id: Uuid) {
        let mut inner = self.inner.write().await;
        if let Some(comment) = inner.comments.get_mut(&id) {
            comment.deleted = true;
        }
    }

    /// Mark a comment stale; stale comments are excluded from embedding
    /// reads but still count toward assignment activity.
    pub async fn mark_comment_stale(&self, id: Uuid) {
        let mut inner = self.inner.write().await;
        if let Some(comment) = inner.comments.get_mut(&id) {
            comment.stale = true;
        }
    }

    /// Total assignment rows held, for idempotency assertions.
    pub async fn assignment_count(&self) -> usize {
        self.inner.read().await.assignments.len()
    }

    /// Fetch a cluster by id regardless of retirement.
    pub async fn cluster(&self, id: Uuid) -> Option<ReviewCluster> {
        self.inner.read().await.clusters.get(&id).cloned()
    }
}

#[async_trait]
impl PatternStore for InMemoryPatternStore {
    async fn upsert_cluster(&self, mut cluster: ReviewCluster) -> PatternResult<ReviewCluster> {
        self.check_failing()?;
        self.check_switch(&self.failing_upserts, "upsert_cluster")?;
        let mut inner = self.inner.write().await;

        // Resolve the existing row by id first, then by (repo, slug).
        let existing_id = if inner.clusters.contains_key(&cluster.id) {
            Some(cluster.id)
        } else {
            inner
                .clusters
                .values()
                .find(|c| c.repo_id == cluster.repo_id && c.slug == cluster.slug)
                .map(|c| c.id)
        };

        if let Some(id) = existing_id {
            let existing = inner
                .clusters
                .get(&id)
                .cloned()
                .ok_or(PatternError::ClusterNotFound { id })?;
            cluster.id = existing.id;
            cluster.created_at = existing.created_at;
            if existing.pinned {
                cluster.slug = existing.slug;
                cluster.label = existing.label;
                cluster.label_updated_at = existing.label_updated_at;
                cluster.member_count_at_label = existing.member_count_at_label;
                cluster.pinned = true;
            }
        }
        cluster.updated_at = Utc::now();
        inner.clusters.insert(cluster.id, cluster.clone());
        Ok(cluster)
    }

    async fn active_clusters(&self, repo_id: &str) -> PatternResult<Vec<ReviewCluster>> {
        self.check_failing()?;
        let inner = self.inner.read().await;
        let mut clusters: Vec<ReviewCluster> = inner
            .clusters
            .values()
            .filter(|c| c.repo_id == repo_id && !c.retired)
            .cloned()
            .collect();
        clusters.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(clusters)
    }

    async fn retire_cluster(&self, id: Uuid) -> PatternResult<()> {
        self.check_failing()?;
        let mut inner = self.inner.write().await;
        let cluster = inner
            .clusters
            .get_mut(&id)
            .ok_or(PatternError::ClusterNotFound { id })?;
        cluster.retired = true;
        cluster.updated_at = Utc::now();
        Ok(())
    }

    async fn update_cluster_label(
        &self,
        id: Uuid,
        slug: &str,
        label: &str,
        member_count_at_label: usize,
    ) -> PatternResult<()> {
        self.check_failing()?;
        let mut inner = self.inner.write().await;
        let existing = inner
            .clusters
            .get(&id)
            .ok_or(PatternError::ClusterNotFound { id })?;
        if existing.pinned {
            return Ok(());
        }
        let repo_id = existing.repo_id.clone();
        // Slug stays unique per repo even through relabeling.
        if inner
            .clusters
            .values()
            .any(|c| c.id != id && c.repo_id == repo_id && c.slug == slug)
        {
            return Err(PatternError::validation(
                "slug",
                format!("slug '{}' already taken in repo {}", slug, repo_id),
            ));
        }
        if let Some(cluster) = inner.clusters.get_mut(&id) {
            cluster.slug = slug.to_string();
            cluster.label = label.to_string();
            cluster.member_count_at_label = member_count_at_label;
            let now = Utc::now();
            cluster.label_updated_at = now;
            cluster.updated_at = now;
        }
        Ok(())
    }

    async fn pin_cluster_label(&self, id: Uuid, slug: &str, label: &str) -> PatternResult<()> {
        self.check_failing()?;
        let mut inner = self.inner.write().await;
        let cluster = inner
            .clusters
            .get_mut(&id)
            .ok_or(PatternError::ClusterNotFound { id })?;
        cluster.slug = slug.to_string();
        cluster.label = label.to_string();
        cluster.pinned = true;
        let now = Utc::now();
        cluster.label_updated_at = now;
        cluster.updated_at = now;
        Ok(())
    }

    async fn write_assignments(&self, assignments: Vec<ClusterAssignment>) -> PatternResult<()> {
        self.check_failing()?;
        let mut inner = self.inner.write().await;
        for assignment in assignments {
            let key = (assignment.cluster_id, assignment.review_comment_id);
            // Idempotent: first write wins, conflicts are no-ops.
            inner.assignments.entry(key).or_insert(assignment);
        }
        Ok(())
    }

    async fn assignments_by_cluster(&self, id: Uuid) -> PatternResult<Vec<ClusterAssignment>> {
        self.check_failing()?;
        let inner = self.inner.read().await;
        let mut rows: Vec<ClusterAssignment> = inner
            .assignments
            .values()
            .filter(|a| a.cluster_id == id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.probability.total_cmp(&a.probability));
        Ok(rows)
    }

    async fn recent_assignment_activity(
        &self,
        id: Uuid,
        since: DateTime<Utc>,
    ) -> PatternResult<AssignmentActivity> {
        self.check_failing()?;
        self.check_switch(&self.failing_activity, "recent_assignment_activity")?;
        let inner = self.inner.read().await;
        let now = Utc::now();
        let mut count = 0usize;
        let mut age_sum_days = 0.0f64;
        for assignment in inner.assignments.values() {
            if assignment.cluster_id != id {
                continue;
            }
            let Some(comment) = inner.comments.get(&assignment.review_comment_id) else {
                continue;
            };
            if comment.deleted || comment.row.created_at < since {
                continue;
            }
            count += 1;
            age_sum_days += (now - comment.row.created_at).num_seconds() as f64 / 86_400.0;
        }
        let mean_age_days = if count > 0 {
            Some((age_sum_days / count as f64) as f32)
        } else {
            None
        };
        Ok(AssignmentActivity {
            count,
            mean_age_days,
        })
    }

    async fn comment_text(&self, comment_id: Uuid) -> PatternResult<Option<String>> {
        self.check_failing()?;
        let inner = self.inner.read().await;
        Ok(inner
            .comments
            .get(&comment_id)
            .filter(|c| !c.deleted)
            .map(|c| c.row.text.clone()))
    }

    async fn embeddings_since(
        &self,
        repo_id: &str,
        since: DateTime<Utc>,
    ) -> PatternResult<Vec<CommentEmbedding>> {
        self.check_failing()?;
        let inner = self.inner.read().await;
        let mut rows: Vec<CommentEmbedding> = inner
            .comments
            .values()
            .filter(|c| {
                c.repo_id == repo_id && !c.deleted && !c.stale && c.row.created_at >= since
            })
            .map(|c| c.row.clone())
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn run_state(&self, repo_id: &str) -> PatternResult<Option<ClusterRunState>> {
        self.check_failing()?;
        let inner = self.inner.read().await;
        Ok(inner.run_states.get(repo_id).cloned())
    }

    async fn save_run_state(&self, state: ClusterRunState) -> PatternResult<()> {
        self.check_failing()?;
        let mut inner = self.inner.write().await;
        inner.run_states.insert(state.repo_id.clone(), state);
        Ok(())
    }

    async fn active_repos(&self) -> PatternResult<Vec<String>> {
        self.check_failing()?;
        let inner = self.inner.read().await;
        let mut repos: Vec<String> = inner
            .comments
            .values()
            .map(|c| c.repo_id.clone())
            .collect();
        repos.sort();
        repos.dedup();
        Ok(repos)
    }
}
