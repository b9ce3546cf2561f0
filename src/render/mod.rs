//! Drawing surfaces and the per-frame scene.

pub mod cpu;
pub mod scene;
pub mod surface;
pub(crate) mod text;
