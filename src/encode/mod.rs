//! Frame sinks: in memory, numbered PNG files, or MP4 through the system `ffmpeg`.

pub mod ffmpeg;
pub mod sink;
