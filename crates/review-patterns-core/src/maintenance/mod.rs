//! Cluster maintenance: the per-repo pipeline, label helpers, per-repo
//! run locks, and the interval scheduler.
//!
//! # Key Types
//!
//! - [`MaintenanceOrchestrator`]: fetch, merge, discover, relabel, retire,
//!   persist run state
//! - [`MaintenanceScheduler`]: `start`/`stop`/`run_now` over the
//!   orchestrator
//! - [`RunLocks`]: keyed locks serializing concurrent runs per repo

pub mod labels;
pub mod locks;
pub mod orchestrator;
pub mod scheduler;

pub use locks::RunLocks;
pub use orchestrator::MaintenanceOrchestrator;
pub use scheduler::{MaintenanceScheduler, SchedulerConfig};
