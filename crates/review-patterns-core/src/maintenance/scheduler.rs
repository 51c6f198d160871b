//! Interval scheduling for maintenance runs.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::types::ClusterRunState;

use super::orchestrator::MaintenanceOrchestrator;

/// Scheduler cadence configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Interval between maintenance cycles.
    pub interval: Duration,
    /// Delay before the first cycle, staggering startup load.
    pub startup_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            // Weekly cadence.
            interval: Duration::from_secs(7 * 24 * 60 * 60),
            startup_delay: Duration::from_secs(60),
        }
    }
}

impl SchedulerConfig {
    /// Set the cycle interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the startup delay.
    #[must_use]
    pub fn with_startup_delay(mut self, delay: Duration) -> Self {
        self.startup_delay = delay;
        self
    }
}

/// Drives the orchestrator on a periodic timer.
///
/// Each cycle iterates the store's repos sequentially; `run` never
/// propagates errors, so one repo's failure never blocks the rest.
pub struct MaintenanceScheduler {
    orchestrator: Arc<MaintenanceOrchestrator>,
    config: SchedulerConfig,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl MaintenanceScheduler {
    pub fn new(orchestrator: Arc<MaintenanceOrchestrator>, config: SchedulerConfig) -> Self {
        Self {
            orchestrator,
            config,
            handle: Mutex::new(None),
        }
    }

    /// Start the periodic task. Idempotent: a second call while running is
    /// a no-op.
    pub fn start(&self) {
        let mut handle = self.handle.lock();
        if handle.is_some() {
            debug!("scheduler already running");
            return;
        }

        let orchestrator = Arc::clone(&self.orchestrator);
        let config = self.config.clone();
        *handle = Some(tokio::spawn(async move {
            tokio::time::sleep(config.startup_delay).await;
            let mut ticker = tokio::time::interval(config.interval);
            loop {
                ticker.tick().await;
                run_cycle(&orchestrator).await;
            }
        }));
        info!(
            interval_secs = self.config.interval.as_secs(),
            "maintenance scheduler started"
        );
    }

    /// Stop the periodic task. A run already in flight is not interrupted
    /// mid-step by callers that use `run_now` concurrently; the aborted
    /// task itself stops at the next await point.
    pub fn stop(&self) {
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
            info!("maintenance scheduler stopped");
        }
    }

    /// Whether the periodic task is active.
    pub fn is_running(&self) -> bool {
        self.handle.lock().is_some()
    }

    /// Run one repo immediately on the identical code path the timer uses.
    pub async fn run_now(&self, repo: &str) -> ClusterRunState {
        self.orchestrator.run(repo).await
    }
}

impl Drop for MaintenanceScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
        }
    }
}

/// One scheduler cycle: iterate repos sequentially.
async fn run_cycle(orchestrator: &MaintenanceOrchestrator) {
    let repos = match orchestrator.store().active_repos().await {
        Ok(repos) => repos,
        Err(e) => {
            warn!(error = %e, "failed to list repos, skipping cycle");
            return;
        }
    };

    debug!(repos = repos.len(), "maintenance cycle starting");
    for repo in repos {
        // run() is failure-isolated per repo: it records errors in the
        // persisted run state instead of propagating them.
        let state = orchestrator.run(&repo).await;
        debug!(repo, status = %state.status, "repo maintenance finished");
    }
}
