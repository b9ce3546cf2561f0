use crate::{
    config::Palette,
    foundation::core::Rgba8,
    foundation::error::{TreeflowError, TreeflowResult},
    model::record::Outcome,
    route::rule::SplitRule,
};

/// Record attribute a split node tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum SplitAttribute {
    /// Categorical: `"male"` / `"female"`.
    Sex,
    /// Ordinal passenger class `1..=3`.
    Pclass,
    /// Numeric age, split at a cut advertised by the branch tags.
    Age,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
/// Declarative decision tree node.
///
/// A node is either an internal split or a terminal leaf. The JSON form is the one used by
/// the `tree` field of the config file:
///
/// ```json
/// { "label": "Sex", "split": "Sex", "children": [
///     { "value": "female", "node": { "label": "Survive", "outcome": 1 } },
///     { "value": "male",   "node": { "label": "Die",     "outcome": 0 } } ] }
/// ```
pub enum TreeNode {
    /// Internal decision node.
    Split(SplitNode),
    /// Terminal outcome node.
    Leaf(LeafNode),
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SplitNode {
    pub label: String,
    pub split: SplitAttribute,
    pub children: Vec<Branch>,
}

/// Labeled edge from a split node to one child.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Branch {
    /// Branch tag matched against the record's attribute value.
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba8>,
    pub node: TreeNode,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeafNode {
    pub label: String,
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba8>,
}

impl Branch {
    pub fn new(value: impl Into<String>, node: TreeNode) -> Self {
        Self {
            value: value.into(),
            color: None,
            node,
        }
    }

    pub fn with_color(mut self, color: Rgba8) -> Self {
        self.color = Some(color);
        self
    }
}

impl TreeNode {
    pub fn split(label: impl Into<String>, split: SplitAttribute, children: Vec<Branch>) -> Self {
        Self::Split(SplitNode {
            label: label.into(),
            split,
            children,
        })
    }

    pub fn leaf(label: impl Into<String>, outcome: Outcome) -> Self {
        Self::Leaf(LeafNode {
            label: label.into(),
            outcome,
            color: None,
        })
    }

    pub fn colored_leaf(label: impl Into<String>, outcome: Outcome, color: Rgba8) -> Self {
        Self::Leaf(LeafNode {
            label: label.into(),
            outcome,
            color: Some(color),
        })
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Split(s) => &s.label,
            Self::Leaf(l) => &l.label,
        }
    }

    /// Number of edges on the longest root-to-leaf route.
    pub fn depth(&self) -> usize {
        match self {
            Self::Leaf(_) => 0,
            Self::Split(s) => 1 + s.children.iter().map(|b| b.node.depth()).max().unwrap_or(0),
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Split(s) => s.children.iter().map(|b| b.node.leaf_count()).sum(),
        }
    }

    /// Check that every split node routes every possible attribute value to a child.
    pub fn validate(&self) -> TreeflowResult<()> {
        self.validate_at("root")
    }

    fn validate_at(&self, at: &str) -> TreeflowResult<()> {
        let Self::Split(split) = self else {
            return Ok(());
        };
        if split.children.is_empty() {
            return Err(TreeflowError::malformed_tree(format!(
                "split node '{}' at {at} has no children",
                split.label
            )));
        }
        SplitRule::compile(split.split, split.children.iter().map(|b| b.value.as_str()))
            .map_err(|e| match e {
                TreeflowError::MalformedTree(msg) => TreeflowError::malformed_tree(format!(
                    "split node '{}' at {at}: {msg}",
                    split.label
                )),
                other => other,
            })?;
        for branch in &split.children {
            branch
                .node
                .validate_at(&format!("{at}/{}", branch.value))?;
        }
        Ok(())
    }

    /// The classic Titanic tree: Sex, then class and age.
    pub fn titanic(palette: &Palette) -> Self {
        use Outcome::{Died, Survived};
        use SplitAttribute::{Age, Pclass, Sex};

        let survive = || TreeNode::colored_leaf("Survive", Survived, palette.survive);
        let die = || TreeNode::colored_leaf("Die", Died, palette.die);
        let edge = |value: &str, node: TreeNode| Branch::new(value, node).with_color(palette.split);

        let female = TreeNode::split(
            "Pclass",
            Pclass,
            vec![
                edge("1", survive()),
                edge("2", survive()),
                edge(
                    "3",
                    TreeNode::split("Age", Age, vec![edge("<20", survive()), edge("20+", die())]),
                ),
            ],
        );
        let male = TreeNode::split(
            "Age",
            Age,
            vec![
                edge("<10", survive()),
                edge(
                    "10+",
                    TreeNode::split(
                        "Pclass",
                        Pclass,
                        vec![edge("1", survive()), edge("2", die()), edge("3", die())],
                    ),
                ),
            ],
        );

        TreeNode::split(
            "Sex",
            Sex,
            vec![
                Branch::new("female", female).with_color(palette.female),
                Branch::new("male", male).with_color(palette.male),
            ],
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/tree.rs"]
mod tests;
