use std::time::Duration;

use super::*;
use crate::foundation::core::Rgba8;
use crate::layout::tree_layout::layout_tree;
use crate::model::record::{Outcome, Passenger, PassengerClass, Sex};
use crate::render::surface::{DrawCommand, RecordingSurface};

fn laid_out(cfg: &VizConfig) -> PositionedTree {
    layout_tree(&cfg.tree(), cfg.root_position(), cfg.layout).unwrap()
}

fn passenger(id: u32) -> Passenger {
    Passenger {
        id,
        outcome: Outcome::Survived,
        class: PassengerClass::Second,
        sex: Sex::Female,
        age: 40,
    }
}

#[test]
fn static_tree_draws_every_node_link_and_label() {
    let cfg = VizConfig::default();
    let tree = laid_out(&cfg);
    let mut surface = RecordingSurface::new();
    surface.clear(Rgba8::WHITE).unwrap();
    draw_tree(&mut surface, &tree, &Theme::from_config(&cfg)).unwrap();

    let lines = surface
        .commands()
        .iter()
        .filter(|c| matches!(c, DrawCommand::Line { .. }))
        .count();
    assert_eq!(surface.circles().count(), 13);
    assert_eq!(lines, 12);
    // 13 node labels plus 12 branch labels.
    assert_eq!(surface.texts().count(), 25);
    assert!(surface.texts().any(|t| t == "female"));
    assert!(surface.texts().any(|t| t == "<10"));
}

#[test]
fn root_is_drawn_after_its_subtrees() {
    let cfg = VizConfig::default();
    let tree = laid_out(&cfg);
    let mut surface = RecordingSurface::new();
    draw_tree(&mut surface, &tree, &Theme::from_config(&cfg)).unwrap();

    let (last_center, last_radius, _) = surface.circles().last().unwrap();
    assert_eq!(last_center, tree.root().position);
    assert_eq!(last_radius, cfg.node_radius);
}

#[test]
fn leaves_use_their_own_color_and_radius() {
    let cfg = VizConfig::default();
    let tree = laid_out(&cfg);
    let mut surface = RecordingSurface::new();
    draw_tree(&mut surface, &tree, &Theme::from_config(&cfg)).unwrap();

    let leaf_discs: Vec<_> = surface
        .circles()
        .filter(|(_, r, _)| *r == cfg.leaf_radius)
        .collect();
    assert_eq!(leaf_discs.len(), 8);
    assert!(
        leaf_discs
            .iter()
            .all(|(_, _, fill)| *fill == cfg.palette.survive || *fill == cfg.palette.die)
    );
}

#[test]
fn redraw_of_unchanged_state_is_identical() {
    let cfg = VizConfig {
        seed: Some(3),
        ..VizConfig::default()
    };
    let theme = Theme::from_config(&cfg);
    let mut driver = AnimationDriver::new(laid_out(&cfg), (1..=3).map(passenger).collect(), &cfg);
    driver.start().unwrap();
    for _ in 0..40 {
        driver.tick(Duration::from_millis(16)).unwrap();
    }

    let mut a = RecordingSurface::new();
    let mut b = RecordingSurface::new();
    draw_driver(&mut a, &driver, &theme).unwrap();
    draw_driver(&mut a, &driver, &theme).unwrap();
    draw_driver(&mut b, &driver, &theme).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.commands()[0], DrawCommand::Clear(cfg.palette.background));
}

#[test]
fn in_flight_token_is_drawn_last_with_outline() {
    let cfg = VizConfig {
        seed: Some(11),
        ..VizConfig::default()
    };
    let theme = Theme::from_config(&cfg);
    let mut driver = AnimationDriver::new(laid_out(&cfg), vec![passenger(1)], &cfg);
    driver.start().unwrap();

    let mut surface = RecordingSurface::new();
    draw_driver(&mut surface, &driver, &theme).unwrap();
    let token = driver.token().unwrap();
    assert_eq!(
        surface.commands().last(),
        Some(&DrawCommand::Circle {
            center: token.position,
            radius: cfg.slots.dot_radius,
            fill: cfg.palette.token,
            stroke: Some(Stroke {
                color: cfg.palette.dot_stroke,
                width: 2.0,
            }),
        })
    );
}

#[test]
fn settled_tokens_stay_drawn_after_the_run() {
    let cfg = VizConfig {
        seed: Some(5),
        ..VizConfig::default()
    };
    let theme = Theme::from_config(&cfg);
    let mut driver = AnimationDriver::new(laid_out(&cfg), (1..=4).map(passenger).collect(), &cfg);
    driver.start().unwrap();
    while driver.is_running() {
        driver.tick(Duration::from_millis(16)).unwrap();
    }

    let mut surface = RecordingSurface::new();
    draw_driver(&mut surface, &driver, &theme).unwrap();
    let dots = surface
        .circles()
        .filter(|(_, r, _)| *r == cfg.slots.dot_radius)
        .count();
    assert_eq!(dots, 4);
}

#[test]
fn reset_then_redraw_twice_yields_the_bare_static_frame() {
    let cfg = VizConfig {
        seed: Some(8),
        ..VizConfig::default()
    };
    let theme = Theme::from_config(&cfg);
    let mut driver = AnimationDriver::new(laid_out(&cfg), (1..=5).map(passenger).collect(), &cfg);
    driver.start().unwrap();
    while driver.is_running() {
        driver.tick(Duration::from_millis(16)).unwrap();
    }
    assert_eq!(driver.registry().settled_count(), 5);

    driver.reset();
    let mut first = RecordingSurface::new();
    let mut second = RecordingSurface::new();
    draw_driver(&mut first, &driver, &theme).unwrap();
    draw_driver(&mut second, &driver, &theme).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first
            .circles()
            .filter(|(_, r, _)| *r == cfg.slots.dot_radius)
            .count(),
        0
    );

    let fresh = AnimationDriver::new(laid_out(&cfg), (1..=5).map(passenger).collect(), &cfg);
    let mut untouched = RecordingSurface::new();
    draw_driver(&mut untouched, &fresh, &theme).unwrap();
    assert_eq!(first, untouched);
}
