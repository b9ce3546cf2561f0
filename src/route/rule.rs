use std::borrow::Cow;
use std::collections::BTreeSet;

use crate::{
    foundation::error::{TreeflowError, TreeflowResult},
    model::record::{Passenger, PassengerClass, Sex},
    model::tree::SplitAttribute,
};

/// Compiled routing predicate for one split node.
///
/// Compiling checks that the node's branch tags cover every value the attribute can take,
/// so a compiled rule always yields a tag that one of the node's children carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitRule {
    /// `Sex`: the branch tag is the literal category.
    Categorical,
    /// `Pclass`: literal class tags, or `{1,2} -> "1"`, `{3} -> "3"` when the node only has two
    /// children.
    Ordinal { collapsed: bool },
    /// `Age`: branch tags `"<cut"` and `"cut+"`.
    Threshold { cut: u32 },
}

impl SplitRule {
    pub fn compile<'a>(
        attribute: SplitAttribute,
        tags: impl IntoIterator<Item = &'a str>,
    ) -> TreeflowResult<Self> {
        let tags: Vec<&str> = tags.into_iter().collect();
        let unique: BTreeSet<&str> = tags.iter().copied().collect();
        if unique.len() != tags.len() {
            return Err(TreeflowError::malformed_tree("duplicate branch tags"));
        }

        match attribute {
            SplitAttribute::Sex => {
                expect_exact(&unique, Sex::ALL.iter().map(|s| s.as_tag()))?;
                Ok(Self::Categorical)
            }
            SplitAttribute::Pclass => {
                let collapsed = tags.len() == 2;
                let rule = Self::Ordinal { collapsed };
                let expected: BTreeSet<&str> = PassengerClass::ALL
                    .iter()
                    .map(|&c| rule.class_tag(c))
                    .collect();
                expect_exact(&unique, expected.into_iter())?;
                Ok(rule)
            }
            SplitAttribute::Age => {
                let cut = tags
                    .iter()
                    .find_map(|t| t.strip_prefix('<'))
                    .ok_or_else(|| TreeflowError::malformed_tree("age split has no '<N' branch"))?;
                let cut: u32 = cut.trim().parse().map_err(|_| {
                    TreeflowError::malformed_tree(format!("age cut '{cut}' is not an integer"))
                })?;
                let rule = Self::Threshold { cut };
                let expected = [rule.age_tag(0), rule.age_tag(cut)];
                expect_exact(&unique, expected.iter().map(|s| s.as_ref()))?;
                Ok(rule)
            }
        }
    }

    pub fn attribute(self) -> SplitAttribute {
        match self {
            Self::Categorical => SplitAttribute::Sex,
            Self::Ordinal { .. } => SplitAttribute::Pclass,
            Self::Threshold { .. } => SplitAttribute::Age,
        }
    }

    /// The branch tag this record selects at a node governed by this rule.
    pub fn branch_tag(self, record: &Passenger) -> Cow<'static, str> {
        match self {
            Self::Categorical => Cow::Borrowed(record.sex.as_tag()),
            Self::Ordinal { .. } => Cow::Borrowed(self.class_tag(record.class)),
            Self::Threshold { .. } => self.age_tag(record.age),
        }
    }

    fn class_tag(self, class: PassengerClass) -> &'static str {
        match (self, class) {
            (Self::Ordinal { collapsed: true }, PassengerClass::First | PassengerClass::Second) => {
                "1"
            }
            (Self::Ordinal { collapsed: true }, PassengerClass::Third) => "3",
            (_, c) => c.as_tag(),
        }
    }

    fn age_tag(self, age: u32) -> Cow<'static, str> {
        let Self::Threshold { cut } = self else {
            return Cow::Borrowed("");
        };
        if age < cut {
            Cow::Owned(format!("<{cut}"))
        } else {
            Cow::Owned(format!("{cut}+"))
        }
    }
}

fn expect_exact<'a>(
    got: &BTreeSet<&str>,
    expected: impl Iterator<Item = &'a str>,
) -> TreeflowResult<()> {
    let expected: BTreeSet<&str> = expected.collect();
    if let Some(missing) = expected.iter().find(|t| !got.contains(*t)) {
        return Err(TreeflowError::malformed_tree(format!(
            "no branch for value '{missing}'"
        )));
    }
    if let Some(extra) = got.iter().find(|t| !expected.contains(*t)) {
        return Err(TreeflowError::malformed_tree(format!(
            "branch tag '{extra}' can never match"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/route/rule.rs"]
mod tests;
