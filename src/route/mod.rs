//! Routing records through a laid-out tree.

pub mod classifier;
pub mod rule;
pub mod summary;
