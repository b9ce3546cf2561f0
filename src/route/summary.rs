use std::collections::BTreeMap;

use crate::{
    foundation::error::TreeflowResult,
    layout::tree_layout::{NodeId, PositionedKind, PositionedTree},
    model::record::Passenger,
    route::classifier::classify,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LeafTally {
    pub routed: usize,
    /// Records whose outcome matches the leaf's predicted outcome.
    pub correct: usize,
}

/// Per-leaf counts of where a set of records lands.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RouteSummary {
    pub per_leaf: BTreeMap<NodeId, LeafTally>,
}

impl RouteSummary {
    pub fn collect(records: &[Passenger], tree: &PositionedTree) -> TreeflowResult<Self> {
        let mut per_leaf: BTreeMap<NodeId, LeafTally> =
            tree.leaves().map(|l| (l.id, LeafTally::default())).collect();
        for record in records {
            let route = classify(record, tree)?;
            let predicted = tree.node(route.leaf).and_then(|n| match n.kind {
                PositionedKind::Leaf { outcome, .. } => Some(outcome),
                PositionedKind::Split { .. } => None,
            });
            let tally = per_leaf.entry(route.leaf).or_default();
            tally.routed += 1;
            if predicted == Some(record.outcome) {
                tally.correct += 1;
            }
        }
        Ok(Self { per_leaf })
    }

    pub fn total(&self) -> usize {
        self.per_leaf.values().map(|t| t.routed).sum()
    }

    /// Share of records predicted correctly; `None` when nothing was routed.
    pub fn accuracy(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let correct: usize = self.per_leaf.values().map(|t| t.correct).sum();
        Some(correct as f64 / total as f64)
    }
}
