use std::path::PathBuf;

use anyhow::Context as _;

use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{TreeflowError, TreeflowResult};
use crate::render::cpu::FrameRGBA;

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkConfig {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
}

/// Consumer of rendered frames.
///
/// `push_frame` is called in strictly increasing `FrameIndex` order between `begin` and `end`.
pub trait FrameSink: Send {
    fn begin(&mut self, cfg: SinkConfig) -> TreeflowResult<()>;
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> TreeflowResult<()>;
    fn end(&mut self) -> TreeflowResult<()>;
}

/// Rejects frames that do not belong to the stream a sink was started with.
#[derive(Clone, Debug, Default)]
pub(crate) struct FrameGuard {
    last: Option<FrameIndex>,
}

impl FrameGuard {
    /// Checks `frame` against the sink's size and the previously accepted index.
    pub(crate) fn admit(
        &mut self,
        sink: &str,
        cfg: &SinkConfig,
        idx: FrameIndex,
        frame: &FrameRGBA,
    ) -> TreeflowResult<()> {
        if self.last.is_some_and(|last| idx.0 <= last.0) {
            return Err(TreeflowError::encode(format!(
                "{sink} sink received frame {} out of order",
                idx.0
            )));
        }
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(TreeflowError::validation(format!(
                "{sink} sink expects {}x{} frames, got {}x{}",
                cfg.width, cfg.height, frame.width, frame.height
            )));
        }
        self.last = Some(idx);
        Ok(())
    }
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
    ended: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg.clone()
    }

    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> TreeflowResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> TreeflowResult<()> {
        if self.cfg.is_none() {
            return Err(TreeflowError::encode("in-memory sink not started"));
        }
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> TreeflowResult<()> {
        self.ended = true;
        Ok(())
    }
}

/// Writes each frame as `<dir>/<prefix><index:05>.png`.
#[derive(Debug)]
pub struct PngSequenceSink {
    dir: PathBuf,
    prefix: String,
    cfg: Option<SinkConfig>,
    guard: FrameGuard,
    written: usize,
}

impl PngSequenceSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            prefix: "frame_".to_string(),
            cfg: None,
            guard: FrameGuard::default(),
            written: 0,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn frame_path(&self, idx: FrameIndex) -> PathBuf {
        self.dir.join(format!("{}{:05}.png", self.prefix, idx.0))
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

impl FrameSink for PngSequenceSink {
    fn begin(&mut self, cfg: SinkConfig) -> TreeflowResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(TreeflowError::validation(
                "png sink width/height must be non-zero",
            ));
        }
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create output dir '{}'", self.dir.display()))?;
        self.cfg = Some(cfg);
        self.guard = FrameGuard::default();
        self.written = 0;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> TreeflowResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| TreeflowError::encode("png sink not started"))?;
        self.guard.admit("png", cfg, idx, frame)?;
        frame.save_png(&self.frame_path(idx))?;
        self.written += 1;
        Ok(())
    }

    fn end(&mut self) -> TreeflowResult<()> {
        if self.cfg.take().is_none() {
            return Err(TreeflowError::encode("png sink not started"));
        }
        tracing::debug!(frames = self.written, dir = %self.dir.display(), "png sequence written");
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
