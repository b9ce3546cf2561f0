use std::collections::BTreeMap;

use crate::{
    foundation::core::{Point, Rgba8},
    foundation::error::{TreeflowError, TreeflowResult},
    layout::tree_layout::{NodeId, PositionedTree},
};

/// Geometry of the packed dot grid drawn beneath each leaf.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SlotGrid {
    pub columns: usize,
    pub dot_radius: f64,
    pub gap: f64,
    /// Horizontal offset of column 0 from the leaf center.
    pub left_offset: f64,
    /// Distance between the leaf's bottom edge and row 0.
    pub top_margin: f64,
}

impl Default for SlotGrid {
    fn default() -> Self {
        Self {
            columns: 7,
            dot_radius: 10.0,
            gap: 6.0,
            left_offset: -36.0,
            top_margin: 18.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotIndex(pub usize);

impl SlotGrid {
    pub fn pitch(&self) -> f64 {
        self.dot_radius * 2.0 + self.gap
    }

    /// `(row, column)` of a slot; rows fill left to right before wrapping.
    pub fn cell(&self, index: SlotIndex) -> (usize, usize) {
        let cols = self.columns.max(1);
        (index.0 / cols, index.0 % cols)
    }

    pub fn position(&self, leaf: Point, leaf_radius: f64, index: SlotIndex) -> Point {
        let (row, col) = self.cell(index);
        Point::new(
            leaf.x + self.left_offset + (col as f64) * self.pitch(),
            leaf.y + leaf_radius + self.top_margin + (row as f64) * self.pitch(),
        )
    }
}

/// A token that reached its slot and is drawn as a static dot from then on.
#[derive(Clone, Debug, PartialEq)]
pub struct SettledToken {
    pub record_id: u32,
    /// Leaf the record was routed to.
    pub leaf: NodeId,
    pub slot: SlotIndex,
    pub position: Point,
    pub color: Rgba8,
}

#[derive(Clone, Debug, PartialEq)]
struct LeafSlots {
    anchor: Point,
    next: usize,
    settled: Vec<SettledToken>,
}

/// Append-only slot bookkeeping for every leaf of one tree.
///
/// A leaf is identified by where it is drawn. Leaves of different subtrees that land on the
/// same coordinates share one grid and one counter, so their dots pack together instead of
/// being drawn over each other.
#[derive(Clone, Debug, PartialEq)]
pub struct LeafSlotRegistry {
    grid: SlotGrid,
    leaf_radius: f64,
    /// Leaf id to its index in `grids`.
    anchors: BTreeMap<NodeId, usize>,
    grids: Vec<LeafSlots>,
}

impl LeafSlotRegistry {
    pub fn new(tree: &PositionedTree, grid: SlotGrid, leaf_radius: f64) -> Self {
        let mut anchors = BTreeMap::new();
        let mut grids: Vec<LeafSlots> = Vec::new();
        for leaf in tree.leaves() {
            let index = match grids.iter().position(|g| same_spot(g.anchor, leaf.position)) {
                Some(index) => index,
                None => {
                    grids.push(LeafSlots {
                        anchor: leaf.position,
                        next: 0,
                        settled: Vec::new(),
                    });
                    grids.len() - 1
                }
            };
            anchors.insert(leaf.id, index);
        }
        Self {
            grid,
            leaf_radius,
            anchors,
            grids,
        }
    }

    pub fn grid(&self) -> &SlotGrid {
        &self.grid
    }

    /// Number of distinct leaf positions, which is the number of slot grids.
    pub fn grid_count(&self) -> usize {
        self.grids.len()
    }

    /// Whether `a` and `b` pack their tokens into the same grid.
    pub fn shares_grid(&self, a: NodeId, b: NodeId) -> bool {
        match (self.anchors.get(&a), self.anchors.get(&b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// Forget every allocation and settled token.
    pub fn reset(&mut self) {
        for slots in &mut self.grids {
            slots.next = 0;
            slots.settled.clear();
        }
    }

    pub fn allocate(&mut self, leaf: NodeId) -> TreeflowResult<SlotIndex> {
        let slots = self.slots_mut(leaf)?;
        let index = SlotIndex(slots.next);
        slots.next += 1;
        Ok(index)
    }

    pub fn slot_position(&self, leaf: NodeId, index: SlotIndex) -> TreeflowResult<Point> {
        let slots = self.slots(leaf)?;
        Ok(self.grid.position(slots.anchor, self.leaf_radius, index))
    }

    pub fn settle(&mut self, token: SettledToken) -> TreeflowResult<()> {
        let leaf = token.leaf;
        let slots = self.slots_mut(leaf)?;
        if token.slot.0 >= slots.next {
            return Err(TreeflowError::validation(format!(
                "slot {} at leaf {leaf:?} was never allocated",
                token.slot.0
            )));
        }
        slots.settled.push(token);
        Ok(())
    }

    /// Tokens packed beneath `leaf`, including those of any leaf drawn at the same spot.
    pub fn settled(&self, leaf: NodeId) -> &[SettledToken] {
        self.slots(leaf)
            .map(|s| s.settled.as_slice())
            .unwrap_or(&[])
    }

    pub fn iter_settled(&self) -> impl Iterator<Item = &SettledToken> + '_ {
        self.grids.iter().flat_map(|s| s.settled.iter())
    }

    pub fn settled_count(&self) -> usize {
        self.grids.iter().map(|s| s.settled.len()).sum()
    }

    fn slots(&self, leaf: NodeId) -> TreeflowResult<&LeafSlots> {
        self.anchors
            .get(&leaf)
            .and_then(|i| self.grids.get(*i))
            .ok_or_else(|| unknown_leaf(leaf))
    }

    fn slots_mut(&mut self, leaf: NodeId) -> TreeflowResult<&mut LeafSlots> {
        self.anchors
            .get(&leaf)
            .and_then(|i| self.grids.get_mut(*i))
            .ok_or_else(|| unknown_leaf(leaf))
    }
}

fn same_spot(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6
}

fn unknown_leaf(leaf: NodeId) -> TreeflowError {
    TreeflowError::validation(format!("{leaf:?} is not a leaf of this tree"))
}

#[cfg(test)]
#[path = "../../tests/unit/animation/slots.rs"]
mod tests;
