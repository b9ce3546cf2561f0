use crate::{
    animation::driver::{AnimationDriver, StartOutcome},
    encode::sink::{FrameSink, SinkConfig},
    foundation::core::{Fps, FrameIndex},
    foundation::error::{TreeflowError, TreeflowResult},
    render::cpu::{CpuSurface, FrameRGBA},
    render::scene::{Theme, draw_driver},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimateOpts {
    /// Copies of the final frame appended after the run ends.
    pub hold_frames: u64,
    /// Abort with an error once this many frames were produced.
    pub max_frames: Option<u64>,
}

impl Default for AnimateOpts {
    fn default() -> Self {
        Self {
            hold_frames: 30,
            max_frames: None,
        }
    }
}

/// Summary of a rendered run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    pub frames_total: u64,
    pub records_settled: usize,
    /// `false` when there was nothing to animate and only the static tree was emitted.
    pub animated: bool,
}

/// Start `driver` and stream one frame per tick into `sink` until the run completes.
///
/// An empty held-out subset still yields the static tree so the output is never empty.
#[tracing::instrument(skip_all, fields(fps_num = fps.num, fps_den = fps.den))]
pub fn animate(
    driver: &mut AnimationDriver,
    surface: &mut CpuSurface,
    theme: &Theme,
    fps: Fps,
    sink: &mut dyn FrameSink,
    opts: AnimateOpts,
) -> TreeflowResult<RunStats> {
    let animated = match driver.start()? {
        StartOutcome::Started { .. } => true,
        StartOutcome::NoTestData => false,
        StartOutcome::AlreadyRunning => {
            return Err(TreeflowError::validation(
                "animate needs an idle driver; a run is already active",
            ));
        }
    };

    sink.begin(SinkConfig {
        width: surface.width(),
        height: surface.height(),
        fps,
    })?;

    let dt = fps.frame_duration();
    let mut next = 0u64;
    let mut push = |frame: &FrameRGBA, sink: &mut dyn FrameSink| -> TreeflowResult<()> {
        if let Some(max) = opts.max_frames
            && next >= max
        {
            return Err(TreeflowError::validation(format!(
                "animation exceeded max_frames ({max})"
            )));
        }
        sink.push_frame(FrameIndex(next), frame)?;
        next += 1;
        Ok(())
    };

    while driver.is_running() {
        draw_driver(surface, driver, theme)?;
        let frame = surface.snapshot();
        push(&frame, sink)?;
        driver.tick(dt)?;
    }

    draw_driver(surface, driver, theme)?;
    let last = surface.snapshot();
    for _ in 0..=opts.hold_frames {
        push(&last, sink)?;
    }
    sink.end()?;

    let stats = RunStats {
        frames_total: next,
        records_settled: driver.registry().settled_count(),
        animated,
    };
    tracing::info!(
        frames = stats.frames_total,
        settled = stats.records_settled,
        "animation rendered"
    );
    Ok(stats)
}

/// Run `driver` to completion without drawing. Returns the number of ticks taken.
pub fn run_headless(driver: &mut AnimationDriver, fps: Fps) -> TreeflowResult<u64> {
    let dt = fps.frame_duration();
    let mut ticks = 0u64;
    if let StartOutcome::AlreadyRunning = driver.start()? {
        return Err(TreeflowError::validation("driver is already running"));
    }
    while driver.is_running() {
        driver.tick(dt)?;
        ticks += 1;
    }
    Ok(ticks)
}
