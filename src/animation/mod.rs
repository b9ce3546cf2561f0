//! Token motion, leaf slot packing and the run state machine.

pub mod driver;
pub mod slots;
pub mod token;
