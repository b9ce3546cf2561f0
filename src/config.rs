use std::path::{Path, PathBuf};

use anyhow::Context as _;
use rand::SeedableRng as _;
use rand::rngs::SmallRng;

use crate::{
    animation::driver::MotionConfig,
    animation::slots::SlotGrid,
    foundation::core::{Canvas, Fps, Point, Rgba8},
    foundation::error::{TreeflowError, TreeflowResult},
    layout::tree_layout::LayoutSpacing,
    model::tree::TreeNode,
};

/// Display colors for nodes, branches and tokens.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Palette {
    pub male: Rgba8,
    pub female: Rgba8,
    pub survive: Rgba8,
    pub die: Rgba8,
    pub split: Rgba8,
    pub leaf: Rgba8,
    /// Placeholder fill of a token before its first decision resolves.
    pub token: Rgba8,
    pub background: Rgba8,
    pub split_label: Rgba8,
    pub leaf_label: Rgba8,
    pub dot_stroke: Rgba8,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            male: Rgba8::rgb(0x3b, 0x82, 0xf6),
            female: Rgba8::rgb(0xf4, 0x72, 0xb6),
            survive: Rgba8::rgb(0x22, 0xc5, 0x5e),
            die: Rgba8::rgb(0xef, 0x44, 0x44),
            split: Rgba8::rgb(0x25, 0x63, 0xeb),
            leaf: Rgba8::rgb(0xe5, 0xe7, 0xeb),
            token: Rgba8::rgb(0xfb, 0xbf, 0x24),
            background: Rgba8::WHITE,
            split_label: Rgba8::WHITE,
            leaf_label: Rgba8::rgb(0x22, 0x22, 0x22),
            dot_stroke: Rgba8::WHITE,
        }
    }
}

/// Everything the visualizer needs besides the dataset.
///
/// Every field has a default, so an empty JSON object is a valid config file.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct VizConfig {
    pub canvas: Canvas,
    pub fps: Fps,
    /// Vertical position of the root node; the root is centered horizontally.
    pub root_y: f64,
    pub layout: LayoutSpacing,
    pub node_radius: f64,
    pub leaf_radius: f64,
    pub motion: MotionConfig,
    pub slots: SlotGrid,
    pub palette: Palette,
    /// Share of records reserved for animation.
    pub holdout_fraction: f64,
    /// Fixes the split, shuffle and spawn positions when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// TTF/OTF font used for labels by the raster surface.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
    /// Custom tree; the built-in Titanic tree is used when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree: Option<TreeNode>,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            fps: Fps::default(),
            root_y: 90.0,
            layout: LayoutSpacing::default(),
            node_radius: 38.0,
            leaf_radius: 44.0,
            motion: MotionConfig::default(),
            slots: SlotGrid::default(),
            palette: Palette::default(),
            holdout_fraction: 0.2,
            seed: None,
            font_path: None,
            tree: None,
        }
    }
}

impl VizConfig {
    pub fn from_path(path: &Path) -> TreeflowResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_str(&text)
            .map_err(|e| TreeflowError::serde(format!("parse config '{}': {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> TreeflowResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(TreeflowError::validation("canvas width/height must be > 0"));
        }
        Fps::new(self.fps.num, self.fps.den)?;
        self.layout.validate()?;
        for (name, value) in [
            ("root_y", self.root_y),
            ("slots.gap", self.slots.gap),
            ("slots.top_margin", self.slots.top_margin),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(TreeflowError::validation(format!(
                    "{name} must be finite and >= 0"
                )));
            }
        }
        for (name, value) in [
            ("node_radius", self.node_radius),
            ("leaf_radius", self.leaf_radius),
            ("slots.dot_radius", self.slots.dot_radius),
            ("motion.speed_px", self.motion.speed_px),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(TreeflowError::validation(format!(
                    "{name} must be finite and > 0"
                )));
            }
        }
        if !self.slots.left_offset.is_finite() {
            return Err(TreeflowError::validation("slots.left_offset must be finite"));
        }
        if self.slots.columns == 0 {
            return Err(TreeflowError::validation("slots.columns must be > 0"));
        }
        if !self.holdout_fraction.is_finite() || !(0.0..=1.0).contains(&self.holdout_fraction) {
            return Err(TreeflowError::validation(
                "holdout_fraction must be within [0, 1]",
            ));
        }
        if let Some(tree) = &self.tree {
            tree.validate()?;
        }
        Ok(())
    }

    pub fn tree(&self) -> TreeNode {
        self.tree
            .clone()
            .unwrap_or_else(|| TreeNode::titanic(&self.palette))
    }

    pub fn root_position(&self) -> Point {
        Point::new(f64::from(self.canvas.width) / 2.0, self.root_y)
    }

    /// Seeded when `seed` is set, otherwise drawn from the OS.
    pub fn rng(&self) -> SmallRng {
        match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
