use crate::{
    foundation::core::Point,
    foundation::error::{TreeflowError, TreeflowResult},
    layout::tree_layout::{NodeId, PositionedKind, PositionedTree},
    model::record::Passenger,
};

/// Where a record ends up and how it gets there.
#[derive(Clone, Debug, PartialEq)]
pub struct Route {
    pub leaf: NodeId,
    /// Visited nodes, root first, leaf last.
    pub nodes: Vec<NodeId>,
    /// Positions of `nodes`, in the same order.
    pub path: Vec<Point>,
}

impl Route {
    /// Number of decisions taken (edges traversed).
    pub fn steps(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}

/// Walk `tree` from the root, applying each split's rule to `record`.
pub fn classify(record: &Passenger, tree: &PositionedTree) -> TreeflowResult<Route> {
    let mut nodes = Vec::new();
    let mut path = Vec::new();
    let mut current = PositionedTree::ROOT;

    loop {
        let node = tree.node(current).ok_or_else(|| {
            TreeflowError::no_matching_branch(format!("node {current:?} is not in the tree"))
        })?;
        nodes.push(current);
        path.push(node.position);

        let rule = match node.kind {
            PositionedKind::Leaf { .. } => {
                return Ok(Route {
                    leaf: current,
                    nodes,
                    path,
                });
            }
            PositionedKind::Split { rule } => rule,
        };

        let tag = rule.branch_tag(record);
        current = tree
            .children(current)
            .find(|c| c.branch_value.as_deref() == Some(tag.as_ref()))
            .map(|c| c.id)
            .ok_or_else(|| {
                TreeflowError::no_matching_branch(format!(
                    "passenger {} has {:?} '{tag}' at '{}' but no branch matches",
                    record.id,
                    rule.attribute(),
                    node.label
                ))
            })?;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/route/classifier.rs"]
mod tests;
