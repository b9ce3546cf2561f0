use std::collections::VecDeque;
use std::time::Duration;

use rand::Rng as _;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom as _;

use crate::{
    animation::slots::{LeafSlotRegistry, SettledToken, SlotIndex},
    animation::token::{Token, step_toward},
    config::VizConfig,
    foundation::core::{Canvas, Point, Rgba8},
    foundation::error::{TreeflowError, TreeflowResult},
    layout::tree_layout::{NodeId, PositionedTree},
    model::record::Passenger,
    route::classifier::classify,
};

/// Token speed and the waits between moves.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Distance covered per tick while traveling.
    pub speed_px: f64,
    /// Pause at every intermediate waypoint.
    pub dwell_ms: u64,
    /// Gap between a token settling and the next one spawning.
    pub inter_record_ms: u64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            speed_px: 18.0,
            dwell_ms: 250,
            inter_record_ms: 180,
        }
    }
}

impl MotionConfig {
    pub fn dwell(&self) -> Duration {
        Duration::from_millis(self.dwell_ms)
    }

    pub fn inter_record(&self) -> Duration {
        Duration::from_millis(self.inter_record_ms)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Traveling { waypoint: usize },
    Paused { waypoint: usize, remaining: Duration },
    /// The last token settled; counting down before the next spawn.
    Settled { remaining: Duration },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartOutcome {
    Started { records: usize },
    /// The held-out subset is empty; nothing changed.
    NoTestData,
    /// A run is already active; the trigger was ignored.
    AlreadyRunning,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Idle,
    Moved,
    Arrived { waypoint: usize },
    Waiting,
    Settled { record_id: u32, leaf: NodeId, slot: SlotIndex },
    Spawned { record_id: u32 },
    /// The run ended on this tick and the completion callback fired.
    Finished,
}

/// Moves held-out records through the tree one token at a time.
///
/// The driver never sleeps: the caller advances it with [`AnimationDriver::tick`] once per
/// frame, passing the wall time the frame represents.
pub struct AnimationDriver {
    tree: PositionedTree,
    registry: LeafSlotRegistry,
    held_out: Vec<Passenger>,
    queue: VecDeque<Passenger>,
    rng: SmallRng,
    motion: MotionConfig,
    canvas: Canvas,
    placeholder: Rgba8,
    fallback_branch: Rgba8,
    phase: Phase,
    token: Option<Token>,
    on_complete: Option<Box<dyn FnMut()>>,
    completed_runs: usize,
}

impl std::fmt::Debug for AnimationDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationDriver")
            .field("phase", &self.phase)
            .field("held_out", &self.held_out.len())
            .field("queued", &self.queue.len())
            .field("token", &self.token)
            .field("completed_runs", &self.completed_runs)
            .finish_non_exhaustive()
    }
}

impl AnimationDriver {
    pub fn new(tree: PositionedTree, held_out: Vec<Passenger>, cfg: &VizConfig) -> Self {
        let registry = LeafSlotRegistry::new(&tree, cfg.slots, cfg.leaf_radius);
        Self {
            tree,
            registry,
            held_out,
            queue: VecDeque::new(),
            rng: cfg.rng(),
            motion: cfg.motion,
            canvas: cfg.canvas,
            placeholder: cfg.palette.token,
            fallback_branch: cfg.palette.split,
            phase: Phase::Idle,
            token: None,
            on_complete: None,
            completed_runs: 0,
        }
    }

    pub fn with_rng(mut self, rng: SmallRng) -> Self {
        self.rng = rng;
        self
    }

    /// Called once every time a run finishes normally.
    pub fn on_complete(mut self, callback: impl FnMut() + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub fn tree(&self) -> &PositionedTree {
        &self.tree
    }

    pub fn registry(&self) -> &LeafSlotRegistry {
        &self.registry
    }

    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn held_out(&self) -> &[Passenger] {
        &self.held_out
    }

    /// Records not yet spawned in the current run.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn completed_runs(&self) -> usize {
        self.completed_runs
    }

    pub fn is_running(&self) -> bool {
        self.phase != Phase::Idle
    }

    #[tracing::instrument(skip(self), fields(records = self.held_out.len()))]
    pub fn start(&mut self) -> TreeflowResult<StartOutcome> {
        if self.is_running() {
            tracing::debug!("run already active, ignoring trigger");
            return Ok(StartOutcome::AlreadyRunning);
        }
        if self.held_out.is_empty() {
            tracing::warn!("no test data to animate");
            return Ok(StartOutcome::NoTestData);
        }

        self.registry.reset();
        let mut order = self.held_out.clone();
        order.shuffle(&mut self.rng);
        self.queue = order.into();

        let records = self.queue.len();
        if let Err(e) = self.spawn_next() {
            self.abort();
            return Err(e);
        }
        tracing::info!(records, "run started");
        Ok(StartOutcome::Started { records })
    }

    /// Advance by one tick. A routing failure aborts the run and leaves the driver idle.
    pub fn tick(&mut self, elapsed: Duration) -> TreeflowResult<TickOutcome> {
        let outcome = self.advance(elapsed);
        if outcome.is_err() {
            self.abort();
        }
        outcome
    }

    /// Stop any active run and clear every settled token without firing the callback.
    pub fn reset(&mut self) {
        self.abort();
        self.registry.reset();
    }

    fn abort(&mut self) {
        self.phase = Phase::Idle;
        self.token = None;
        self.queue.clear();
    }

    fn advance(&mut self, elapsed: Duration) -> TreeflowResult<TickOutcome> {
        match self.phase {
            Phase::Idle => Ok(TickOutcome::Idle),
            Phase::Traveling { .. } => self.travel(),
            Phase::Paused { waypoint, remaining } => {
                let left = remaining.saturating_sub(elapsed);
                if left.is_zero() {
                    let token = self.token.as_mut().ok_or_else(missing_token)?;
                    token.target = waypoint + 1;
                    self.phase = Phase::Traveling {
                        waypoint: token.target,
                    };
                } else {
                    self.phase = Phase::Paused {
                        waypoint,
                        remaining: left,
                    };
                }
                Ok(TickOutcome::Waiting)
            }
            Phase::Settled { remaining } => {
                let left = remaining.saturating_sub(elapsed);
                if !left.is_zero() {
                    self.phase = Phase::Settled { remaining: left };
                    return Ok(TickOutcome::Waiting);
                }
                if self.queue.is_empty() {
                    self.finish();
                    return Ok(TickOutcome::Finished);
                }
                let record_id = self.spawn_next()?;
                Ok(TickOutcome::Spawned { record_id })
            }
        }
    }

    fn travel(&mut self) -> TreeflowResult<TickOutcome> {
        let speed = self.motion.speed_px;
        let token = self.token.as_mut().ok_or_else(missing_token)?;
        let to = token.current_target().ok_or_else(missing_token)?;
        let (position, arrived) = step_toward(token.position, to, speed);
        token.position = position;
        if !arrived {
            return Ok(TickOutcome::Moved);
        }

        let waypoint = token.target;
        if waypoint == 1
            && let Some(color) = token.decision_color
        {
            token.color = color;
        }
        if !token.is_final_target() {
            self.phase = Phase::Paused {
                waypoint,
                remaining: self.motion.dwell(),
            };
            return Ok(TickOutcome::Arrived { waypoint });
        }

        let token = self.token.take().ok_or_else(missing_token)?;
        self.registry.settle(SettledToken {
            record_id: token.record_id,
            leaf: token.leaf,
            slot: token.slot,
            position: token.position,
            color: token.color,
        })?;
        tracing::debug!(
            record = token.record_id,
            leaf = token.leaf.0,
            slot = token.slot.0,
            "token settled"
        );
        self.phase = Phase::Settled {
            remaining: self.motion.inter_record(),
        };
        Ok(TickOutcome::Settled {
            record_id: token.record_id,
            leaf: token.leaf,
            slot: token.slot,
        })
    }

    fn spawn_next(&mut self) -> TreeflowResult<u32> {
        let record = self
            .queue
            .pop_front()
            .ok_or_else(|| TreeflowError::validation("no record left to spawn"))?;
        let route = classify(&record, &self.tree)?;
        let slot = self.registry.allocate(route.leaf)?;
        let mut waypoints = route.path;
        if let Some(last) = waypoints.last_mut() {
            *last = self.registry.slot_position(route.leaf, slot)?;
        }
        let decision_color = route
            .nodes
            .get(1)
            .and_then(|id| self.tree.node(*id))
            .map(|n| n.branch_color.unwrap_or(self.fallback_branch));

        let width = f64::from(self.canvas.width);
        let x = if width > 0.0 {
            self.rng.random_range(0.0..width)
        } else {
            0.0
        };
        self.token = Some(Token {
            record_id: record.id,
            position: Point::new(x, 0.0),
            color: self.placeholder,
            leaf: route.leaf,
            slot,
            decision_color,
            waypoints,
            target: 0,
        });
        self.phase = Phase::Traveling { waypoint: 0 };
        Ok(record.id)
    }

    fn finish(&mut self) {
        self.abort();
        self.completed_runs += 1;
        tracing::info!(
            settled = self.registry.settled_count(),
            "run complete"
        );
        if let Some(callback) = self.on_complete.as_mut() {
            callback();
        }
    }
}

fn missing_token() -> TreeflowError {
    TreeflowError::Other(anyhow::anyhow!("driver is moving but holds no token"))
}

#[cfg(test)]
#[path = "../../tests/unit/animation/driver.rs"]
mod tests;
