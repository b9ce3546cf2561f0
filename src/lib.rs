//! treeflow animates records flowing through a classification tree.
//!
//! A [`TreeNode`] description is laid out into a [`PositionedTree`], every record is routed to a
//! leaf with [`classify`], and an [`AnimationDriver`] moves one token at a time along its route
//! into a packed slot beneath the leaf. Frames are drawn through the [`RenderSurface`] trait and
//! can be rasterized with [`CpuSurface`] and streamed into a [`FrameSink`].
#![forbid(unsafe_code)]

pub mod animation;
pub mod config;
pub mod datagen;
pub mod encode;
mod foundation;
pub mod layout;
pub mod model;
pub mod pipeline;
pub mod render;
pub mod route;

pub use crate::foundation::core::{Canvas, Fps, FrameIndex, Point, Rgba8, Vec2};
pub use crate::foundation::error::{TreeflowError, TreeflowResult};

pub use crate::animation::driver::{
    AnimationDriver, MotionConfig, Phase, StartOutcome, TickOutcome,
};
pub use crate::animation::slots::{LeafSlotRegistry, SettledToken, SlotGrid, SlotIndex};
pub use crate::animation::token::Token;
pub use crate::config::{Palette, VizConfig};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, ffmpeg_version, is_ffmpeg_on_path};
pub use crate::encode::sink::{FrameSink, InMemorySink, PngSequenceSink, SinkConfig};
pub use crate::layout::tree_layout::{
    LayoutSpacing, NodeId, PositionedKind, PositionedNode, PositionedTree, layout_tree,
};
pub use crate::model::record::{Dataset, Holdout, Outcome, Passenger, PassengerClass, Sex};
pub use crate::model::tree::{Branch, LeafNode, SplitAttribute, SplitNode, TreeNode};
pub use crate::pipeline::{AnimateOpts, RunStats, animate, run_headless};
pub use crate::render::cpu::{CpuSurface, FrameRGBA};
pub use crate::render::scene::{Theme, draw_driver, draw_frame, draw_tree};
pub use crate::render::surface::{
    DrawCommand, RecordingSurface, RenderSurface, Stroke, TextAlign, TextStyle,
};
pub use crate::route::classifier::{Route, classify};
pub use crate::route::rule::SplitRule;
pub use crate::route::summary::{LeafTally, RouteSummary};
