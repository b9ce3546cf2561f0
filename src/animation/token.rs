use crate::{
    animation::slots::SlotIndex,
    foundation::core::{Point, Rgba8},
    layout::tree_layout::NodeId,
};

/// The single record currently moving through the tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub record_id: u32,
    pub position: Point,
    pub color: Rgba8,
    pub leaf: NodeId,
    pub slot: SlotIndex,
    /// Color taken on once the first decision resolves.
    pub decision_color: Option<Rgba8>,
    /// Root position first, reserved slot position last.
    pub waypoints: Vec<Point>,
    /// Index into `waypoints` of the point currently being approached.
    pub target: usize,
}

impl Token {
    pub fn current_target(&self) -> Option<Point> {
        self.waypoints.get(self.target).copied()
    }

    pub fn is_final_target(&self) -> bool {
        self.target + 1 >= self.waypoints.len()
    }
}

/// Move `from` at most `speed` toward `to`. Returns the new point and whether it arrived.
///
/// Within one step the point snaps exactly onto `to`.
pub fn step_toward(from: Point, to: Point, speed: f64) -> (Point, bool) {
    let delta = to - from;
    let dist = delta.hypot();
    if dist < speed || dist == 0.0 {
        return (to, true);
    }
    (from + delta * (speed / dist), false)
}
