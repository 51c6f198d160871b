//! Collaborator traits: persistence, dimensionality reduction, and label
//! generation.

pub mod labeler;
pub mod reducer;
pub mod store;

pub use labeler::LabelGenerator;
pub use reducer::Reducer;
pub use store::{AssignmentActivity, PatternStore};
