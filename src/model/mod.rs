//! Passenger records and the classification tree description.

pub mod record;
pub mod tree;
