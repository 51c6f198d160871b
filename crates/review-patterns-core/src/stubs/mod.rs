//! In-memory stub implementations of the collaborator traits.
//!
//! Used by the test suites and for local development; none of these are
//! production backends.

pub mod labeler_stub;
pub mod reducer_stub;
pub mod store_stub;

pub use labeler_stub::{FailingLabelGenerator, StaticLabelGenerator};
pub use reducer_stub::RandomProjectionReducer;
pub use store_stub::InMemoryPatternStore;
