use std::io::{Read as _, Write as _};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use crate::config::VizConfig;
use crate::encode::sink::{FrameGuard, FrameSink, SinkConfig};
use crate::foundation::core::{FrameIndex, Rgba8};
use crate::foundation::error::{TreeflowError, TreeflowResult};
use crate::foundation::fs::ensure_parent_dir;
use crate::foundation::math::mul_div255_u16;
use crate::render::cpu::FrameRGBA;

/// Options for [`FfmpegSink`] MP4 output.
#[derive(Clone, Debug, PartialEq)]
pub struct FfmpegSinkOpts {
    pub out_path: PathBuf,
    /// Overwrite the output file if it already exists.
    pub overwrite: bool,
    /// Canvas color that translucent pixels are composited onto.
    pub background: Rgba8,
    /// libx264 constant rate factor; lower is higher quality.
    pub crf: u8,
}

impl FfmpegSinkOpts {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            background: Rgba8::WHITE,
            crf: 20,
        }
    }

    /// Output options matching the visualizer's own background.
    pub fn from_config(out_path: impl Into<PathBuf>, cfg: &VizConfig) -> Self {
        Self {
            background: cfg.palette.background,
            ..Self::new(out_path)
        }
    }
}

/// Arguments for an ffmpeg run reading packed `rgb24` frames from stdin.
pub(crate) fn encoder_args(cfg: &SinkConfig, opts: &FfmpegSinkOpts) -> Vec<String> {
    let mut args: Vec<String> = vec![
        (if opts.overwrite { "-y" } else { "-n" }).into(),
        "-loglevel".into(),
        "error".into(),
        "-f".into(),
        "rawvideo".into(),
        "-pix_fmt".into(),
        "rgb24".into(),
        "-video_size".into(),
        format!("{}x{}", cfg.width, cfg.height),
        // Input rate must precede `-i`.
        "-framerate".into(),
        format!("{}/{}", cfg.fps.num, cfg.fps.den),
        "-i".into(),
        "pipe:0".into(),
        "-an".into(),
        "-c:v".into(),
        "libx264".into(),
        "-crf".into(),
        opts.crf.to_string(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        "-movflags".into(),
        "+faststart".into(),
    ];
    args.push(opts.out_path.display().to_string());
    args
}

/// A running `ffmpeg` with its stdin open and its stderr collected on a side thread.
struct EncoderProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    stderr: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
}

impl EncoderProcess {
    fn spawn(args: &[String]) -> TreeflowResult<Self> {
        let mut child = Command::new("ffmpeg")
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| TreeflowError::encode(format!("cannot start ffmpeg: {e}")))?;
        let stdin = child.stdin.take();
        let stderr = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || -> std::io::Result<Vec<u8>> {
                let mut bytes = Vec::new();
                pipe.read_to_end(&mut bytes)?;
                Ok(bytes)
            })
        });
        if stdin.is_none() {
            return Err(TreeflowError::encode("ffmpeg stdin is not piped"));
        }
        Ok(Self {
            child,
            stdin,
            stderr,
        })
    }

    fn write(&mut self, bytes: &[u8]) -> TreeflowResult<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| TreeflowError::encode("ffmpeg input already closed"))?;
        stdin
            .write_all(bytes)
            .map_err(|e| TreeflowError::encode(format!("ffmpeg stopped reading frames: {e}")))
    }

    /// Close stdin and wait for the encoder; a failed exit carries ffmpeg's own message.
    fn finish(mut self) -> TreeflowResult<()> {
        drop(self.stdin.take());
        let status = self
            .child
            .wait()
            .map_err(|e| TreeflowError::encode(format!("waiting for ffmpeg: {e}")))?;
        let log = match self.stderr.take().map(JoinHandle::join) {
            Some(Ok(Ok(bytes))) => String::from_utf8_lossy(&bytes).trim().to_string(),
            Some(Ok(Err(e))) => format!("<stderr unreadable: {e}>"),
            Some(Err(_)) => "<stderr reader panicked>".to_string(),
            None => String::new(),
        };
        if status.success() {
            if !log.is_empty() {
                tracing::warn!(%log, "ffmpeg reported problems");
            }
            return Ok(());
        }
        Err(TreeflowError::encode(format!("ffmpeg exited with {status}: {log}")))
    }
}

/// Streams frames into the system `ffmpeg` as an H.264 MP4.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,
    process: Option<EncoderProcess>,
    cfg: Option<SinkConfig>,
    guard: FrameGuard,
    rgb: Vec<u8>,
    written: u64,
}

impl FfmpegSink {
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            process: None,
            cfg: None,
            guard: FrameGuard::default(),
            rgb: Vec::new(),
            written: 0,
        }
    }

    /// Frames handed to ffmpeg since the last `begin`.
    pub fn written(&self) -> u64 {
        self.written
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> TreeflowResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(TreeflowError::validation("mp4 frame size must be non-zero"));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(TreeflowError::validation(format!(
                "mp4 output needs an even canvas, got {}x{}",
                cfg.width, cfg.height
            )));
        }
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(TreeflowError::validation(format!(
                "'{}' exists and overwrite is off",
                self.opts.out_path.display()
            )));
        }
        ensure_parent_dir(&self.opts.out_path)?;
        let Some(version) = ffmpeg_version() else {
            return Err(TreeflowError::encode(
                "MP4 output needs `ffmpeg` on PATH; write a PNG directory instead",
            ));
        };

        let process = EncoderProcess::spawn(&encoder_args(&cfg, &self.opts))?;
        tracing::debug!(
            %version,
            out = %self.opts.out_path.display(),
            width = cfg.width,
            height = cfg.height,
            "ffmpeg encoder started"
        );
        self.rgb = Vec::with_capacity(cfg.width as usize * cfg.height as usize * 3);
        self.process = Some(process);
        self.cfg = Some(cfg);
        self.guard = FrameGuard::default();
        self.written = 0;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> TreeflowResult<()> {
        let (Some(cfg), Some(process)) = (self.cfg.as_ref(), self.process.as_mut()) else {
            return Err(TreeflowError::encode("mp4 sink not started"));
        };
        self.guard.admit("mp4", cfg, idx, frame)?;
        composite_rgb(frame, self.opts.background, &mut self.rgb)?;
        process.write(&self.rgb)?;
        self.written += 1;
        Ok(())
    }

    fn end(&mut self) -> TreeflowResult<()> {
        let process = self
            .process
            .take()
            .ok_or_else(|| TreeflowError::encode("mp4 sink not started"))?;
        self.cfg = None;
        process.finish()?;
        tracing::info!(
            frames = self.written,
            out = %self.opts.out_path.display(),
            "mp4 written"
        );
        Ok(())
    }
}

/// Composite `frame` onto an opaque `bg` and pack the result as RGB triples into `out`.
fn composite_rgb(frame: &FrameRGBA, bg: Rgba8, out: &mut Vec<u8>) -> TreeflowResult<()> {
    if frame.data.len() != frame.width as usize * frame.height as usize * 4 {
        return Err(TreeflowError::validation(
            "frame buffer does not hold width*height rgba pixels",
        ));
    }
    out.clear();
    let under = [bg.r, bg.g, bg.b];
    for px in frame.data.chunks_exact(4) {
        let alpha = px[3];
        let uncovered = u16::from(255 - alpha);
        for (channel, below) in px[..3].iter().zip(under) {
            // Straight color is scaled by coverage first so both layouts share one blend.
            let above = if frame.premultiplied {
                u16::from(*channel)
            } else {
                mul_div255_u16(u16::from(*channel), u16::from(alpha))
            };
            let blended = above + mul_div255_u16(u16::from(below), uncovered);
            out.push(blended.min(255) as u8);
        }
    }
    Ok(())
}

/// First line of `ffmpeg -version`, or `None` when ffmpeg cannot be run.
pub fn ffmpeg_version() -> Option<String> {
    let output = Command::new("ffmpeg")
        .arg("-version")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout);
    Some(text.lines().next().unwrap_or("ffmpeg").trim().to_string())
}

pub fn is_ffmpeg_on_path() -> bool {
    ffmpeg_version().is_some()
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
