use super::*;
use rand::SeedableRng as _;
use rand::rngs::SmallRng;

const SAMPLE: &str = r#"[
  { "PassengerId": 1, "Survived": 1, "Pclass": 1, "Sex": "female", "Age": 29 },
  { "PassengerId": 2, "Survived": 0, "Pclass": 3, "Sex": "male", "Age": 25 },
  { "PassengerId": 3, "Survived": 1, "Pclass": 2, "Sex": "male", "Age": 5 }
]"#;

#[test]
fn parses_data_file_field_names() {
    let ds = Dataset::from_json_str(SAMPLE).unwrap();
    assert_eq!(ds.len(), 3);
    let p = &ds.records()[1];
    assert_eq!(p.id, 2);
    assert_eq!(p.outcome, Outcome::Died);
    assert_eq!(p.class, PassengerClass::Third);
    assert_eq!(p.sex, Sex::Male);
    assert_eq!(p.age, 25);
}

#[test]
fn rejects_out_of_range_class_and_outcome() {
    let bad_class =
        r#"[{ "PassengerId": 1, "Survived": 1, "Pclass": 4, "Sex": "female", "Age": 3 }]"#;
    let err = Dataset::from_json_str(bad_class).unwrap_err();
    assert!(matches!(err, TreeflowError::DataSource(_)));

    let bad_outcome =
        r#"[{ "PassengerId": 1, "Survived": 2, "Pclass": 1, "Sex": "female", "Age": 3 }]"#;
    assert!(Dataset::from_json_str(bad_outcome).is_err());
}

#[test]
fn rejects_duplicate_ids() {
    let dup = r#"[
      { "PassengerId": 7, "Survived": 1, "Pclass": 1, "Sex": "female", "Age": 3 },
      { "PassengerId": 7, "Survived": 0, "Pclass": 2, "Sex": "male", "Age": 30 }
    ]"#;
    let err = Dataset::from_json_str(dup).unwrap_err();
    assert!(err.to_string().contains("duplicate PassengerId 7"));
}

#[test]
fn missing_file_is_a_data_source_error() {
    let err = Dataset::load(Path::new("target/definitely/not/here.json")).unwrap_err();
    assert!(matches!(err, TreeflowError::DataSource(_)));
}

#[test]
fn holdout_split_partitions_without_replacement() {
    let records = (1..=200)
        .map(|id| Passenger {
            id,
            outcome: Outcome::Died,
            class: PassengerClass::Second,
            sex: Sex::Male,
            age: id % 70,
        })
        .collect();
    let ds = Dataset::new(records).unwrap();
    let mut rng = SmallRng::seed_from_u64(7);
    let split = ds.split_holdout(0.2, &mut rng).unwrap();
    assert_eq!(split.train.len(), 160);
    assert_eq!(split.test.len(), 40);

    let mut ids: Vec<u32> = split
        .train
        .iter()
        .chain(split.test.iter())
        .map(|p| p.id)
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=200).collect::<Vec<_>>());
}

#[test]
fn holdout_fraction_is_validated() {
    let ds = Dataset::from_json_str(SAMPLE).unwrap();
    let mut rng = SmallRng::seed_from_u64(1);
    assert!(ds.split_holdout(1.5, &mut rng).is_err());
    assert!(ds.split_holdout(f64::NAN, &mut rng).is_err());
    let all_train = ds.split_holdout(0.0, &mut rng).unwrap();
    assert!(all_train.test.is_empty());
}
