use crate::{
    foundation::core::{Point, Rgba8},
    foundation::error::{TreeflowError, TreeflowResult},
    model::record::Outcome,
    model::tree::{Branch, TreeNode},
    route::rule::SplitRule,
};

/// Fixed pitch between siblings (`horizontal`) and between depth levels (`vertical`).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LayoutSpacing {
    pub horizontal: f64,
    pub vertical: f64,
}

impl Default for LayoutSpacing {
    fn default() -> Self {
        Self {
            horizontal: 180.0,
            vertical: 120.0,
        }
    }
}

impl LayoutSpacing {
    /// Both pitches must be positive or siblings (or depth levels) collapse onto one line.
    pub fn validate(&self) -> TreeflowResult<()> {
        for (name, value) in [
            ("layout.horizontal", self.horizontal),
            ("layout.vertical", self.vertical),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(TreeflowError::validation(format!(
                    "{name} must be finite and > 0"
                )));
            }
        }
        Ok(())
    }
}

/// Index of a node inside a [`PositionedTree`]. The root is always `NodeId(0)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

#[derive(Clone, Debug, PartialEq)]
pub enum PositionedKind {
    Split { rule: SplitRule },
    Leaf { outcome: Outcome, color: Option<Rgba8> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct PositionedNode {
    pub id: NodeId,
    pub label: String,
    pub kind: PositionedKind,
    pub position: Point,
    pub depth: usize,
    /// Back-link for traversal; `None` only for the root.
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Tag of the edge leading into this node.
    pub branch_value: Option<String>,
    pub branch_color: Option<Rgba8>,
}

impl PositionedNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, PositionedKind::Leaf { .. })
    }
}

/// A laid-out tree stored as a pre-order arena.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionedTree {
    nodes: Vec<PositionedNode>,
}

impl PositionedTree {
    pub const ROOT: NodeId = NodeId(0);

    #[cfg(test)]
    pub(crate) fn from_nodes(nodes: Vec<PositionedNode>) -> Self {
        Self { nodes }
    }

    pub fn root(&self) -> &PositionedNode {
        &self.nodes[0]
    }

    pub fn node(&self, id: NodeId) -> Option<&PositionedNode> {
        self.nodes.get(id.0)
    }

    pub fn nodes(&self) -> &[PositionedNode] {
        &self.nodes
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &PositionedNode> + '_ {
        self.node(id)
            .into_iter()
            .flat_map(|n| n.children.iter())
            .filter_map(|c| self.node(*c))
    }

    pub fn leaves(&self) -> impl Iterator<Item = &PositionedNode> + '_ {
        self.nodes.iter().filter(|n| n.is_leaf())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Lay `tree` out with its root at `root`.
///
/// Children of a node with `n` children are centered under it:
/// `x_i = parent.x - horizontal * (n - 1) / 2 + i * horizontal`, `y = parent.y + vertical`.
/// Every split node's routing rule is compiled here, so a tree that cannot route some
/// attribute value fails now rather than mid-animation.
#[tracing::instrument(skip(tree))]
pub fn layout_tree(
    tree: &TreeNode,
    root: Point,
    spacing: LayoutSpacing,
) -> TreeflowResult<PositionedTree> {
    spacing.validate()?;
    tree.validate()?;
    let mut builder = Builder {
        spacing,
        nodes: Vec::with_capacity(tree.leaf_count() * 2),
    };
    builder.place(tree, root, 0, None, None)?;
    tracing::debug!(nodes = builder.nodes.len(), "tree laid out");
    Ok(PositionedTree {
        nodes: builder.nodes,
    })
}

struct Builder {
    spacing: LayoutSpacing,
    nodes: Vec<PositionedNode>,
}

impl Builder {
    fn place(
        &mut self,
        node: &TreeNode,
        at: Point,
        depth: usize,
        parent: Option<NodeId>,
        via: Option<&Branch>,
    ) -> TreeflowResult<NodeId> {
        let id = NodeId(self.nodes.len());
        let kind = match node {
            TreeNode::Split(s) => PositionedKind::Split {
                rule: SplitRule::compile(s.split, s.children.iter().map(|b| b.value.as_str()))?,
            },
            TreeNode::Leaf(l) => PositionedKind::Leaf {
                outcome: l.outcome,
                color: l.color,
            },
        };
        self.nodes.push(PositionedNode {
            id,
            label: node.label().to_string(),
            kind,
            position: at,
            depth,
            parent,
            children: Vec::new(),
            branch_value: via.map(|b| b.value.clone()),
            branch_color: via.and_then(|b| b.color),
        });

        if let TreeNode::Split(split) = node {
            let n = split.children.len();
            let x0 = at.x - self.spacing.horizontal * (n.saturating_sub(1) as f64) / 2.0;
            let y = at.y + self.spacing.vertical;
            for (i, branch) in split.children.iter().enumerate() {
                let child_at = Point::new(x0 + (i as f64) * self.spacing.horizontal, y);
                let child = self.place(&branch.node, child_at, depth + 1, Some(id), Some(branch))?;
                self.nodes[id.0].children.push(child);
            }
        }
        Ok(id)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/tree_layout.rs"]
pub(crate) mod tests;
