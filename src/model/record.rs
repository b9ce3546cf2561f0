use std::path::Path;

use rand::Rng;
use rand::seq::SliceRandom as _;

use crate::foundation::error::{TreeflowError, TreeflowResult};

/// Binary outcome carried by records and predicted by leaves.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum Outcome {
    Died,
    Survived,
}

impl TryFrom<u8> for Outcome {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Died),
            1 => Ok(Self::Survived),
            other => Err(format!("outcome must be 0 or 1, got {other}")),
        }
    }
}

impl From<Outcome> for u8 {
    fn from(value: Outcome) -> Self {
        match value {
            Outcome::Died => 0,
            Outcome::Survived => 1,
        }
    }
}

/// Two-valued categorical attribute.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub const ALL: [Self; 2] = [Self::Male, Self::Female];

    pub fn as_tag(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

/// Ordinal passenger class in `1..=3`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum PassengerClass {
    First,
    Second,
    Third,
}

impl PassengerClass {
    pub const ALL: [Self; 3] = [Self::First, Self::Second, Self::Third];

    pub fn as_tag(self) -> &'static str {
        match self {
            Self::First => "1",
            Self::Second => "2",
            Self::Third => "3",
        }
    }
}

impl TryFrom<u8> for PassengerClass {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::First),
            2 => Ok(Self::Second),
            3 => Ok(Self::Third),
            other => Err(format!("Pclass must be 1, 2 or 3, got {other}")),
        }
    }
}

impl From<PassengerClass> for u8 {
    fn from(value: PassengerClass) -> Self {
        match value {
            PassengerClass::First => 1,
            PassengerClass::Second => 2,
            PassengerClass::Third => 3,
        }
    }
}

/// One passenger record, field names as they appear in the data file.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Passenger {
    #[serde(rename = "PassengerId")]
    pub id: u32,
    #[serde(rename = "Survived")]
    pub outcome: Outcome,
    #[serde(rename = "Pclass")]
    pub class: PassengerClass,
    #[serde(rename = "Sex")]
    pub sex: Sex,
    #[serde(rename = "Age")]
    pub age: u32,
}

/// The ordered, read-only passenger table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    records: Vec<Passenger>,
}

/// Result of partitioning a dataset into train and held-out subsets.
#[derive(Clone, Debug, Default)]
pub struct Holdout {
    pub train: Vec<Passenger>,
    pub test: Vec<Passenger>,
}

impl Dataset {
    pub fn new(records: Vec<Passenger>) -> TreeflowResult<Self> {
        let mut seen = std::collections::HashSet::with_capacity(records.len());
        for r in &records {
            if !seen.insert(r.id) {
                return Err(TreeflowError::data_source(format!(
                    "duplicate PassengerId {}",
                    r.id
                )));
            }
        }
        Ok(Self { records })
    }

    #[tracing::instrument]
    pub fn load(path: &Path) -> TreeflowResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            TreeflowError::data_source(format!("read dataset '{}': {e}", path.display()))
        })?;
        let ds = Self::from_json_str(&text)?;
        tracing::debug!(records = ds.len(), "dataset loaded");
        Ok(ds)
    }

    pub fn from_json_str(text: &str) -> TreeflowResult<Self> {
        let records: Vec<Passenger> = serde_json::from_str(text)
            .map_err(|e| TreeflowError::data_source(format!("parse dataset JSON: {e}")))?;
        Self::new(records)
    }

    pub fn records(&self) -> &[Passenger] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Shuffle a copy of the records and cut it so that `holdout_fraction` of them
    /// (rounded down to the train side) form the held-out subset.
    pub fn split_holdout<R: Rng + ?Sized>(
        &self,
        holdout_fraction: f64,
        rng: &mut R,
    ) -> TreeflowResult<Holdout> {
        if !holdout_fraction.is_finite() || !(0.0..=1.0).contains(&holdout_fraction) {
            return Err(TreeflowError::validation(
                "holdout_fraction must be within [0, 1]",
            ));
        }
        let mut shuffled = self.records.clone();
        shuffled.shuffle(rng);
        // Epsilon keeps e.g. 200 * (1.0 - 0.2) from flooring to 159.
        let cut = ((shuffled.len() as f64) * (1.0 - holdout_fraction) + 1e-9).floor() as usize;
        let test = shuffled.split_off(cut.min(shuffled.len()));
        Ok(Holdout {
            train: shuffled,
            test,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/record.rs"]
mod tests;
