//! Per-repo cluster maintenance pipeline.
//!
//! One `run(repo)` executes, strictly in order: load embeddings,
//! incremental merge into existing clusters, density-clustering discovery
//! over the unmerged pool, label regeneration for drifted clusters,
//! retirement of quiet clusters, and unconditional run-state persistence.
//! The method never propagates an error to its caller; failures become
//! `RunStatus::Failed` in the returned state.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clustering::{cluster, DensityParams};
use crate::config::MaintenanceConfig;
use crate::error::PatternResult;
use crate::similarity::{cosine_similarity, mean_vector};
use crate::traits::{LabelGenerator, PatternStore, Reducer};
use crate::types::{ClusterAssignment, ClusterRunState, CommentEmbedding, ReviewCluster};

use super::labels::{fallback_label, kebab_slug};
use super::locks::RunLocks;

/// Orchestrates cluster maintenance for review-comment embeddings.
///
/// Safe to share behind `Arc`; runs for the same repo serialize on a keyed
/// lock, runs for different repos do not contend.
pub struct MaintenanceOrchestrator {
    store: Arc<dyn PatternStore>,
    reducer: Arc<dyn Reducer>,
    labeler: Arc<dyn LabelGenerator>,
    config: MaintenanceConfig,
    run_locks: RunLocks,
}

impl MaintenanceOrchestrator {
    pub fn new(
        store: Arc<dyn PatternStore>,
        reducer: Arc<dyn Reducer>,
        labeler: Arc<dyn LabelGenerator>,
        config: MaintenanceConfig,
    ) -> Self {
        Self {
            store,
            reducer,
            labeler,
            config,
            run_locks: RunLocks::new(),
        }
    }

    /// The store this orchestrator persists through.
    pub fn store(&self) -> Arc<dyn PatternStore> {
        Arc::clone(&self.store)
    }

    /// Execute one maintenance run for `repo`.
    ///
    /// Always returns a terminal `ClusterRunState`; internal failures are
    /// captured as `RunStatus::Failed` with the error message. The state is
    /// persisted unconditionally, including on failure.
    pub async fn run(&self, repo: &str) -> ClusterRunState {
        let lock = self.run_locks.lock_for(repo);
        let _guard = lock.lock().await;

        info!(repo, "starting cluster maintenance run");
        let mut state = ClusterRunState::started(repo);

        // run_inner fills counters in place so a mid-run failure still
        // reports how far the run got.
        state = match self.run_inner(repo, &mut state).await {
            Ok(()) => {
                info!(
                    repo,
                    clusters_discovered = state.clusters_discovered,
                    comments_processed = state.comments_processed,
                    labels_generated = state.labels_generated,
                    "maintenance run completed"
                );
                state.completed()
            }
            Err(e) => {
                warn!(repo, error = %e, "maintenance run failed");
                state.failed(e.to_string())
            }
        };
        state.last_run_at = Utc::now();

        if let Err(e) = self.store.save_run_state(state.clone()).await {
            warn!(repo, error = %e, "failed to persist run state");
        }
        state
    }

    async fn run_inner(
        &self,
        repo: &str,
        state: &mut ClusterRunState,
    ) -> PatternResult<()> {
        let k = self.config.density.min_cluster_size;
        let since = Utc::now() - Duration::days(self.config.embedding_window_days);

        let embeddings = self.store.embeddings_since(repo, since).await?;
        state.comments_processed = embeddings.len();
        debug!(repo, count = embeddings.len(), "loaded embedding window");

        // Undersized corpus is a successful zero-cluster run, not an error.
        if embeddings.len() < k {
            return Ok(());
        }

        let mut clusters = self.store.active_clusters(repo).await?;
        let already_assigned = self.assigned_comment_ids(&clusters).await?;

        // ---- Incremental merge -------------------------------------------
        let mut pool: Vec<&CommentEmbedding> = Vec::new();
        let mut merges: HashMap<Uuid, Vec<&CommentEmbedding>> = HashMap::new();

        for row in &embeddings {
            if already_assigned.contains(&row.id) {
                continue;
            }
            let best = clusters
                .iter()
                .filter(|c| !c.centroid.is_empty())
                .map(|c| (c.id, cosine_similarity(&row.embedding, &c.centroid)))
                .max_by(|a, b| a.1.total_cmp(&b.1));

            match best {
                Some((id, sim)) if sim >= self.config.merge_similarity_threshold => {
                    merges.entry(id).or_default().push(row);
                }
                _ => pool.push(row),
            }
        }

        for cluster_ref in clusters.iter_mut() {
            let Some(members) = merges.remove(&cluster_ref.id) else {
                continue;
            };
            self.merge_into_existing(cluster_ref, &members).await;
        }

        // ---- Discovery ----------------------------------------------------
        if pool.len() >= k {
            state.clusters_discovered = self
                .discover_clusters(repo, &pool, &clusters, &mut state.labels_generated)
                .await;
        } else {
            debug!(repo, pool = pool.len(), "unassigned pool below minimum, skipping discovery");
        }

        // ---- Label regeneration ------------------------------------------
        let drifted: Vec<&ReviewCluster> = clusters
            .iter()
            .filter(|c| !c.pinned && c.member_count_at_label > 0)
            .filter(|c| {
                c.label_drift()
                    .is_some_and(|drift| drift > self.config.label_drift_threshold)
            })
            .collect();
        if !drifted.is_empty() {
            // Fresh slug set so regenerated labels never collide with each
            // other or with clusters discovered this run.
            let mut taken_slugs: HashSet<String> = self
                .store
                .active_clusters(repo)
                .await?
                .into_iter()
                .map(|c| c.slug)
                .collect();
            for cluster_ref in drifted {
                if self.regenerate_label(cluster_ref, &mut taken_slugs).await {
                    state.labels_generated += 1;
                }
            }
        }

        // ---- Retirement ---------------------------------------------------
        let retirement_since = Utc::now() - Duration::days(self.config.retirement_window_days);
        let active = self.store.active_clusters(repo).await?;
        for cluster_ref in &active {
            let activity = self
                .store
                .recent_assignment_activity(cluster_ref.id, retirement_since)
                .await?;
            if activity.count < self.config.min_recent_assignments {
                info!(
                    repo,
                    cluster = %cluster_ref.slug,
                    recent = activity.count,
                    "retiring quiet cluster"
                );
                if let Err(e) = self.store.retire_cluster(cluster_ref.id).await {
                    warn!(cluster = %cluster_ref.id, error = %e, "failed to retire cluster");
                }
            }
        }

        Ok(())
    }

    /// Comment ids already assigned to any of the given clusters. Skipping
    /// them keeps reruns over the same window from inflating member counts;
    /// the idempotent assignment writes already make the rows themselves
    /// safe.
    async fn assigned_comment_ids(
        &self,
        clusters: &[ReviewCluster],
    ) -> PatternResult<HashSet<Uuid>> {
        let mut assigned = HashSet::new();
        for cluster_ref in clusters {
            for assignment in self.store.assignments_by_cluster(cluster_ref.id).await? {
                assigned.insert(assignment.review_comment_id);
            }
        }
        Ok(assigned)
    }

    /// Fold new members into an existing cluster.
    ///
    /// The centroid becomes the mean of {old centroid} and the new member
    /// embeddings, with the old centroid counted as exactly one point
    /// regardless of its true weight. This biases the mean toward recent
    /// batches; intentional, see DESIGN.md.
    async fn merge_into_existing(
        &self,
        cluster_ref: &mut ReviewCluster,
        members: &[&CommentEmbedding],
    ) {
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(members.len() + 1);
        vectors.push(cluster_ref.centroid.clone());
        vectors.extend(members.iter().map(|m| m.embedding.clone()));
        cluster_ref.centroid = mean_vector(&vectors);
        cluster_ref.member_count += members.len();
        cluster_ref
            .file_paths
            .extend(members.iter().filter_map(|m| m.file_path.clone()));

        debug!(
            cluster = %cluster_ref.slug,
            merged = members.len(),
            member_count = cluster_ref.member_count,
            "merged embeddings into existing cluster"
        );

        // Fire-and-forget writes: partial failure is reconciled next run.
        if let Err(e) = self.store.upsert_cluster(cluster_ref.clone()).await {
            warn!(cluster = %cluster_ref.id, error = %e, "failed to persist merged cluster");
        }
        let assignments: Vec<ClusterAssignment> = members
            .iter()
            .map(|m| ClusterAssignment::new(cluster_ref.id, m.id, self.config.merge_confidence))
            .collect();
        if let Err(e) = self.store.write_assignments(assignments).await {
            warn!(cluster = %cluster_ref.id, error = %e, "failed to write merge assignments");
        }
    }

    /// Reduce the unassigned pool and run density clustering over it;
    /// persist each discovered cluster with its label and assignments.
    /// Returns the number of clusters persisted.
    async fn discover_clusters(
        &self,
        repo: &str,
        pool: &[&CommentEmbedding],
        existing: &[ReviewCluster],
        labels_generated: &mut usize,
    ) -> usize {
        let k = self.config.density.min_cluster_size;
        let target_dims = self.config.reduced_dims.min(pool.len() - 1).max(1);
        let points: Vec<Vec<f32>> = pool.iter().map(|m| m.embedding.clone()).collect();

        let reduced = match self
            .reducer
            .reduce(&points, target_dims, self.config.reducer_neighbors)
        {
            Ok(reduced) => reduced,
            Err(e) => {
                warn!(repo, error = %e, "reducer failed, skipping discovery this run");
                return 0;
            }
        };

        let result = match cluster(&reduced, &DensityParams::new(k)) {
            Ok(result) => result,
            Err(e) => {
                warn!(repo, error = %e, "density clustering failed, skipping discovery");
                return 0;
            }
        };
        if result.cluster_count == 0 {
            debug!(repo, "no dense regions in unassigned pool");
            return 0;
        }

        // Group pool members per discovered label.
        let mut groups: HashMap<i32, Vec<(usize, f32)>> = HashMap::new();
        for (idx, (&label, &probability)) in
            result.labels.iter().zip(&result.probabilities).enumerate()
        {
            if label >= 0 {
                groups.entry(label).or_default().push((idx, probability));
            }
        }

        let mut taken_slugs: HashSet<String> = existing.iter().map(|c| c.slug.clone()).collect();
        let mut persisted = 0usize;
        let mut labels: Vec<i32> = groups.keys().copied().collect();
        labels.sort_unstable();

        for label in labels {
            let mut members = groups.remove(&label).unwrap_or_default();
            // Highest-probability members are the representative samples.
            members.sort_by(|a, b| b.1.total_cmp(&a.1));
            let samples: Vec<String> = members
                .iter()
                .take(self.config.max_label_samples)
                .map(|&(idx, _)| pool[idx].text.clone())
                .collect();

            let generated = self.label_or_fallback(&samples).await;
            let slug = unique_slug(&generated.slug, &mut taken_slugs);

            // Centroid from the original, pre-reduction embeddings.
            let originals: Vec<Vec<f32>> = members
                .iter()
                .map(|&(idx, _)| pool[idx].embedding.clone())
                .collect();
            let mut new_cluster = ReviewCluster::new(
                repo,
                slug,
                generated.description.clone(),
                mean_vector(&originals),
                members.len(),
            );
            new_cluster.file_paths = members
                .iter()
                .filter_map(|&(idx, _)| pool[idx].file_path.clone())
                .collect::<BTreeSet<String>>();

            let saved = match self.store.upsert_cluster(new_cluster).await {
                Ok(saved) => saved,
                Err(e) => {
                    warn!(repo, error = %e, "failed to persist discovered cluster");
                    continue;
                }
            };
            *labels_generated += 1;

            let assignments: Vec<ClusterAssignment> = members
                .iter()
                .map(|&(idx, probability)| {
                    ClusterAssignment::new(saved.id, pool[idx].id, probability)
                })
                .collect();
            if let Err(e) = self.store.write_assignments(assignments).await {
                warn!(cluster = %saved.id, error = %e, "failed to write discovery assignments");
            }

            info!(
                repo,
                cluster = %saved.slug,
                members = members.len(),
                "discovered new review pattern"
            );
            persisted += 1;
        }

        persisted
    }

    /// Regenerate a drifted cluster's label from its top assignments,
    /// deduplicating the slug against `taken_slugs` so the per-repo slug
    /// uniqueness invariant survives relabeling. Returns true when a label
    /// was written.
    async fn regenerate_label(
        &self,
        cluster_ref: &ReviewCluster,
        taken_slugs: &mut HashSet<String>,
    ) -> bool {
        let samples = match self.representative_samples(cluster_ref.id).await {
            Ok(samples) => samples,
            Err(e) => {
                warn!(cluster = %cluster_ref.id, error = %e, "failed to load samples for relabel");
                return false;
            }
        };
        if samples.is_empty() {
            return false;
        }

        let generated = self.label_or_fallback(&samples).await;
        // A cluster may keep its own slug; only other clusters collide.
        taken_slugs.remove(&cluster_ref.slug);
        let slug = unique_slug(&generated.slug, taken_slugs);
        match self
            .store
            .update_cluster_label(
                cluster_ref.id,
                &slug,
                &generated.description,
                cluster_ref.member_count,
            )
            .await
        {
            Ok(()) => {
                info!(cluster = %slug, "regenerated drifted cluster label");
                true
            }
            Err(e) => {
                warn!(cluster = %cluster_ref.id, error = %e, "failed to update cluster label");
                taken_slugs.insert(cluster_ref.slug.clone());
                false
            }
        }
    }

    /// Texts of the cluster's highest-probability assignments.
    async fn representative_samples(&self, cluster_id: Uuid) -> PatternResult<Vec<String>> {
        let assignments = self.store.assignments_by_cluster(cluster_id).await?;
        let mut samples = Vec::with_capacity(self.config.max_label_samples);
        for assignment in assignments.iter().take(self.config.max_label_samples) {
            if let Some(text) = self.store.comment_text(assignment.review_comment_id).await? {
                samples.push(text);
            }
        }
        Ok(samples)
    }

    /// Ask the label generator, falling back to a deterministic label on
    /// any error or unusable slug.
    async fn label_or_fallback(&self, samples: &[String]) -> crate::types::GeneratedLabel {
        match self.labeler.generate_label(samples).await {
            Ok(generated) => {
                let slug = kebab_slug(&generated.slug);
                if slug.is_empty() {
                    warn!("label generator returned unusable slug, using fallback");
                    fallback_label(samples)
                } else {
                    crate::types::GeneratedLabel {
                        slug,
                        description: generated.description,
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "label generation failed, using fallback");
                fallback_label(samples)
            }
        }
    }
}

/// Resolve a slug collision by appending a numeric suffix.
fn unique_slug(candidate: &str, taken: &mut HashSet<String>) -> String {
    let base = if candidate.is_empty() {
        "review-pattern"
    } else {
        candidate
    };
    let mut slug = base.to_string();
    let mut suffix = 2usize;
    while taken.contains(&slug) {
        slug = format!("{}-{}", base, suffix);
        suffix += 1;
    }
    taken.insert(slug.clone());
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_slug_appends_suffix_on_collision() {
        let mut taken: HashSet<String> = ["use-timeouts".to_string()].into_iter().collect();
        assert_eq!(unique_slug("use-timeouts", &mut taken), "use-timeouts-2");
        assert_eq!(unique_slug("use-timeouts", &mut taken), "use-timeouts-3");
        assert_eq!(unique_slug("fresh", &mut taken), "fresh");
    }

    #[test]
    fn unique_slug_replaces_empty_candidate() {
        let mut taken = HashSet::new();
        assert_eq!(unique_slug("", &mut taken), "review-pattern");
    }
}
