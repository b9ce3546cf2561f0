pub mod core;
pub mod error;
pub(crate) mod fs;
pub(crate) mod math;
