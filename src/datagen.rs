//! Synthetic passenger table shaped like the Titanic manifest.

use std::path::Path;

use anyhow::Context as _;
use rand::Rng;

use crate::{
    foundation::error::{TreeflowError, TreeflowResult},
    foundation::fs::ensure_parent_dir,
    model::record::{Outcome, Passenger, PassengerClass, Sex},
};

pub const DEFAULT_PASSENGERS: usize = 200;
pub const MIN_AGE: u32 = 1;
pub const MAX_AGE: u32 = 70;

/// Chance of survival for a passenger of the given sex and class.
pub fn survival_probability(sex: Sex, class: PassengerClass) -> f64 {
    match (sex, class) {
        (Sex::Female, PassengerClass::First | PassengerClass::Second) => 0.85,
        (Sex::Female, PassengerClass::Third) => 0.7,
        (Sex::Male, PassengerClass::First) => 0.4,
        (Sex::Male, _) => 0.2,
    }
}

/// `count` passengers with ids `1..=count`; sex, class and age drawn uniformly.
pub fn generate<R: Rng + ?Sized>(count: usize, rng: &mut R) -> TreeflowResult<Vec<Passenger>> {
    let count_u32 = u32::try_from(count)
        .map_err(|_| TreeflowError::validation("passenger count exceeds u32"))?;
    Ok((1..=count_u32)
        .map(|id| {
            let sex = Sex::ALL[rng.random_range(0..Sex::ALL.len())];
            let class = PassengerClass::ALL[rng.random_range(0..PassengerClass::ALL.len())];
            let age = rng.random_range(MIN_AGE..=MAX_AGE);
            let outcome = if rng.random_bool(survival_probability(sex, class)) {
                Outcome::Survived
            } else {
                Outcome::Died
            };
            Passenger {
                id,
                outcome,
                class,
                sex,
                age,
            }
        })
        .collect())
}

/// Write `records` as a pretty-printed JSON array.
#[tracing::instrument(skip(records), fields(records = records.len()))]
pub fn write_json(records: &[Passenger], path: &Path) -> TreeflowResult<()> {
    let json = serde_json::to_string_pretty(records)
        .map_err(|e| TreeflowError::serde(format!("encode passengers: {e}")))?;
    ensure_parent_dir(path)?;
    std::fs::write(path, json).with_context(|| format!("write '{}'", path.display()))?;
    Ok(())
}
