use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;

use super::*;
use crate::layout::tree_layout::layout_tree;
use crate::model::record::{Outcome, PassengerClass, Sex};

const FRAME: Duration = Duration::from_millis(16);

fn passenger(id: u32, sex: Sex, class: PassengerClass, age: u32) -> Passenger {
    Passenger {
        id,
        outcome: Outcome::Died,
        class,
        sex,
        age,
    }
}

fn config() -> VizConfig {
    VizConfig {
        seed: Some(7),
        ..VizConfig::default()
    }
}

fn driver(records: Vec<Passenger>) -> AnimationDriver {
    let cfg = config();
    let tree = layout_tree(&cfg.tree(), cfg.root_position(), cfg.layout).unwrap();
    AnimationDriver::new(tree, records, &cfg)
}

fn mixed(n: u32) -> Vec<Passenger> {
    (1..=n)
        .map(|id| {
            let sex = if id % 2 == 0 { Sex::Female } else { Sex::Male };
            let class = PassengerClass::ALL[(id % 3) as usize];
            passenger(id, sex, class, (id * 7) % 70 + 1)
        })
        .collect()
}

/// Tick until the run ends, returning record ids in settle order.
fn run_to_end(driver: &mut AnimationDriver) -> Vec<u32> {
    let mut settled = Vec::new();
    for _ in 0..200_000 {
        match driver.tick(FRAME).unwrap() {
            TickOutcome::Settled { record_id, .. } => settled.push(record_id),
            TickOutcome::Finished => return settled,
            TickOutcome::Idle => panic!("driver went idle without finishing"),
            _ => {}
        }
    }
    panic!("run did not finish");
}

#[test]
fn empty_holdout_reports_no_test_data() {
    let mut d = driver(Vec::new());
    assert_eq!(d.start().unwrap(), StartOutcome::NoTestData);
    assert_eq!(d.phase(), Phase::Idle);
    assert!(d.token().is_none());
    assert_eq!(d.tick(FRAME).unwrap(), TickOutcome::Idle);
    assert_eq!(d.registry().settled_count(), 0);
}

#[test]
fn second_trigger_during_run_is_ignored() {
    let mut d = driver(mixed(3));
    assert_eq!(d.start().unwrap(), StartOutcome::Started { records: 3 });
    let before = d.token().cloned();
    assert_eq!(d.start().unwrap(), StartOutcome::AlreadyRunning);
    assert_eq!(d.token().cloned(), before);
    assert_eq!(d.queued(), 2);
}

#[test]
fn token_spawns_on_top_edge_in_placeholder_color() {
    let mut d = driver(mixed(1));
    d.start().unwrap();
    let token = d.token().unwrap();
    assert_eq!(token.position.y, 0.0);
    assert!((0.0..1100.0).contains(&token.position.x));
    assert_eq!(token.color, config().palette.token);
    assert_eq!(token.waypoints[0], d.tree().root().position);
}

#[test]
fn last_waypoint_is_the_reserved_slot() {
    let mut d = driver(vec![passenger(1, Sex::Female, PassengerClass::First, 29)]);
    d.start().unwrap();
    let token = d.token().unwrap().clone();
    assert_eq!(token.waypoints.len(), 3);
    let slot = d.registry().slot_position(token.leaf, token.slot).unwrap();
    assert_eq!(*token.waypoints.last().unwrap(), slot);
}

#[test]
fn every_record_settles_once_and_callback_fires_once() {
    let fired = Rc::new(Cell::new(0));
    let counter = Rc::clone(&fired);
    let mut d = driver(mixed(12)).on_complete(move || counter.set(counter.get() + 1));

    d.start().unwrap();
    let order = run_to_end(&mut d);

    assert_eq!(order.len(), 12);
    assert_eq!(order.iter().collect::<HashSet<_>>().len(), 12);
    assert_eq!(d.registry().settled_count(), 12);
    assert_eq!(d.phase(), Phase::Idle);
    assert_eq!(fired.get(), 1);
    assert_eq!(d.completed_runs(), 1);

    let mut spots = HashSet::new();
    for t in d.registry().iter_settled() {
        assert!(spots.insert((t.position.x.to_bits(), t.position.y.to_bits())));
        assert_eq!(t.position, d.registry().slot_position(t.leaf, t.slot).unwrap());
    }
}

#[test]
fn at_most_one_token_is_ever_in_flight() {
    let mut d = driver(mixed(5));
    d.start().unwrap();
    let mut in_flight_ids = Vec::new();
    loop {
        if let Some(t) = d.token() {
            if in_flight_ids.last() != Some(&t.record_id) {
                in_flight_ids.push(t.record_id);
            }
        }
        if d.tick(FRAME).unwrap() == TickOutcome::Finished {
            break;
        }
    }
    // Each record appears as the sole token exactly once, in sequence.
    assert_eq!(in_flight_ids.len(), 5);
    assert_eq!(in_flight_ids.iter().collect::<HashSet<_>>().len(), 5);
}

#[test]
fn token_takes_branch_color_at_first_decision() {
    let cfg = config();
    let mut d = driver(vec![passenger(1, Sex::Female, PassengerClass::Third, 15)]);
    d.start().unwrap();

    let mut seen_root_pause = false;
    loop {
        match d.tick(FRAME).unwrap() {
            TickOutcome::Arrived { waypoint: 0 } => {
                seen_root_pause = true;
                assert_eq!(d.token().unwrap().color, cfg.palette.token);
            }
            TickOutcome::Arrived { waypoint: 1 } => {
                assert_eq!(d.token().unwrap().color, cfg.palette.female);
                break;
            }
            TickOutcome::Finished => panic!("never reached the first decision"),
            _ => {}
        }
    }
    assert!(seen_root_pause);
}

#[test]
fn pauses_last_for_the_configured_dwell() {
    let mut d = driver(vec![passenger(1, Sex::Male, PassengerClass::Second, 5)]);
    d.start().unwrap();
    while !matches!(d.tick(FRAME).unwrap(), TickOutcome::Arrived { .. }) {}
    let mut waits = 0;
    while d.tick(Duration::from_millis(50)).unwrap() == TickOutcome::Waiting {
        waits += 1;
        if matches!(d.phase(), Phase::Traveling { .. }) {
            break;
        }
    }
    // 250 ms of dwell at 50 ms per tick.
    assert_eq!(waits, 5);
}

#[test]
fn restart_clears_previous_tokens() {
    let mut d = driver(mixed(4));
    d.start().unwrap();
    run_to_end(&mut d);
    assert_eq!(d.registry().settled_count(), 4);

    assert_eq!(d.start().unwrap(), StartOutcome::Started { records: 4 });
    assert_eq!(d.registry().settled_count(), 0);
    run_to_end(&mut d);
    assert_eq!(d.registry().settled_count(), 4);
    assert_eq!(d.completed_runs(), 2);
}

#[test]
fn reset_stops_without_completion() {
    let fired = Rc::new(Cell::new(false));
    let flag = Rc::clone(&fired);
    let mut d = driver(mixed(3)).on_complete(move || flag.set(true));
    d.start().unwrap();
    for _ in 0..10 {
        d.tick(FRAME).unwrap();
    }
    d.reset();
    assert_eq!(d.phase(), Phase::Idle);
    assert!(d.token().is_none());
    assert!(!fired.get());
}

#[test]
fn fixed_seed_reproduces_processing_order() {
    let mut a = driver(mixed(10));
    let mut b = driver(mixed(10));
    a.start().unwrap();
    b.start().unwrap();
    assert_eq!(run_to_end(&mut a), run_to_end(&mut b));
}

#[test]
fn eighth_token_at_one_leaf_wraps_to_second_row() {
    let records = (1..=8)
        .map(|id| passenger(id, Sex::Female, PassengerClass::First, 30))
        .collect();
    let mut d = driver(records);
    d.start().unwrap();
    run_to_end(&mut d);

    let leaf = d
        .registry()
        .iter_settled()
        .map(|t| t.leaf)
        .next()
        .unwrap();
    let settled = d.registry().settled(leaf);
    assert_eq!(settled.len(), 8);
    let first = settled.iter().find(|t| t.slot == SlotIndex(0)).unwrap();
    let eighth = settled.iter().find(|t| t.slot == SlotIndex(7)).unwrap();
    assert_eq!(eighth.position.x, first.position.x);
    assert_eq!(eighth.position.y, first.position.y + 26.0);
}

#[test]
fn records_at_coincident_leaves_settle_on_distinct_spots() {
    // Young third-class woman and adult first-class man end on leaves drawn at one spot.
    let records = vec![
        passenger(1, Sex::Female, PassengerClass::Third, 15),
        passenger(2, Sex::Male, PassengerClass::First, 40),
        passenger(3, Sex::Female, PassengerClass::Third, 12),
        passenger(4, Sex::Male, PassengerClass::First, 55),
    ];
    let mut d = driver(records);
    d.start().unwrap();
    run_to_end(&mut d);

    let settled: Vec<_> = d.registry().iter_settled().cloned().collect();
    assert_eq!(settled.len(), 4);
    let leaves: HashSet<_> = settled.iter().map(|t| t.leaf).collect();
    assert_eq!(leaves.len(), 2);
    let mut slots: Vec<_> = settled.iter().map(|t| t.slot.0).collect();
    slots.sort_unstable();
    assert_eq!(slots, [0, 1, 2, 3]);
    for (i, a) in settled.iter().enumerate() {
        for b in &settled[i + 1..] {
            assert!(a.position.distance(b.position) >= 2.0 * d.registry().grid().dot_radius);
        }
    }
}
