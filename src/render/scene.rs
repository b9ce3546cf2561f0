use crate::{
    animation::driver::AnimationDriver,
    animation::slots::LeafSlotRegistry,
    animation::token::Token,
    config::{Palette, VizConfig},
    foundation::core::{Point, Rgba8},
    foundation::error::TreeflowResult,
    layout::tree_layout::{NodeId, PositionedKind, PositionedTree},
    render::surface::{RenderSurface, Stroke, TextAlign, TextStyle},
};

/// Sizes and colors used to draw a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Theme {
    pub palette: Palette,
    pub node_radius: f64,
    pub leaf_radius: f64,
    pub dot_radius: f64,
    pub link_width: f64,
    pub node_stroke_width: f64,
    pub dot_stroke_width: f64,
    pub split_label_px: f32,
    pub leaf_label_px: f32,
    pub branch_label_px: f32,
    /// Branch labels sit this far above the midpoint of their link.
    pub branch_label_lift: f64,
}

impl Theme {
    pub fn from_config(cfg: &VizConfig) -> Self {
        Self {
            palette: cfg.palette,
            node_radius: cfg.node_radius,
            leaf_radius: cfg.leaf_radius,
            dot_radius: cfg.slots.dot_radius,
            link_width: 3.0,
            node_stroke_width: 3.0,
            dot_stroke_width: 2.0,
            split_label_px: 15.0,
            leaf_label_px: 13.0,
            branch_label_px: 12.0,
            branch_label_lift: 8.0,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_config(&VizConfig::default())
    }
}

/// Draw links, branch labels and nodes. Each subtree is drawn before its parent node so node
/// discs cover the link ends.
pub fn draw_tree(
    surface: &mut dyn RenderSurface,
    tree: &PositionedTree,
    theme: &Theme,
) -> TreeflowResult<()> {
    if tree.is_empty() {
        return Ok(());
    }
    draw_subtree(surface, tree, PositionedTree::ROOT, theme)
}

fn draw_subtree(
    surface: &mut dyn RenderSurface,
    tree: &PositionedTree,
    id: NodeId,
    theme: &Theme,
) -> TreeflowResult<()> {
    let Some(node) = tree.node(id) else {
        return Ok(());
    };
    for child in tree.children(id) {
        let color = child.branch_color.unwrap_or(theme.palette.split);
        surface.draw_line(
            Point::new(node.position.x, node.position.y + theme.node_radius),
            Point::new(child.position.x, child.position.y - theme.node_radius),
            color,
            theme.link_width,
        )?;
        if let Some(value) = &child.branch_value {
            let mid = node.position.midpoint(child.position);
            surface.draw_text(
                Point::new(mid.x, mid.y - theme.branch_label_lift),
                value,
                &TextStyle {
                    color,
                    size_px: theme.branch_label_px,
                    align: TextAlign::Center,
                },
            )?;
        }
        draw_subtree(surface, tree, child.id, theme)?;
    }

    let (radius, fill, label) = match &node.kind {
        PositionedKind::Split { .. } => (
            theme.node_radius,
            theme.palette.split,
            TextStyle {
                color: theme.palette.split_label,
                size_px: theme.split_label_px,
                align: TextAlign::Center,
            },
        ),
        PositionedKind::Leaf { color, .. } => (
            theme.leaf_radius,
            color.unwrap_or(theme.palette.leaf),
            TextStyle {
                color: theme.palette.leaf_label,
                size_px: theme.leaf_label_px,
                align: TextAlign::Center,
            },
        ),
    };
    surface.fill_circle(
        node.position,
        radius,
        fill,
        Some(Stroke {
            color: fill,
            width: theme.node_stroke_width,
        }),
    )?;
    surface.draw_text(node.position, &node.label, &label)
}

pub fn draw_settled(
    surface: &mut dyn RenderSurface,
    registry: &LeafSlotRegistry,
    theme: &Theme,
) -> TreeflowResult<()> {
    for token in registry.iter_settled() {
        draw_dot(surface, token.position, token.color, theme)?;
    }
    Ok(())
}

pub fn draw_token(
    surface: &mut dyn RenderSurface,
    token: &Token,
    theme: &Theme,
) -> TreeflowResult<()> {
    draw_dot(surface, token.position, token.color, theme)
}

fn draw_dot(
    surface: &mut dyn RenderSurface,
    at: Point,
    color: Rgba8,
    theme: &Theme,
) -> TreeflowResult<()> {
    surface.fill_circle(
        at,
        theme.dot_radius,
        color,
        Some(Stroke {
            color: theme.palette.dot_stroke,
            width: theme.dot_stroke_width,
        }),
    )
}

/// Full redraw: clear, static tree, settled tokens, then the token in flight.
pub fn draw_frame(
    surface: &mut dyn RenderSurface,
    tree: &PositionedTree,
    registry: &LeafSlotRegistry,
    token: Option<&Token>,
    theme: &Theme,
) -> TreeflowResult<()> {
    surface.clear(theme.palette.background)?;
    draw_tree(surface, tree, theme)?;
    draw_settled(surface, registry, theme)?;
    if let Some(token) = token {
        draw_token(surface, token, theme)?;
    }
    Ok(())
}

/// [`draw_frame`] for the driver's current state.
pub fn draw_driver(
    surface: &mut dyn RenderSurface,
    driver: &AnimationDriver,
    theme: &Theme,
) -> TreeflowResult<()> {
    draw_frame(
        surface,
        driver.tree(),
        driver.registry(),
        driver.token(),
        theme,
    )
}

#[cfg(test)]
#[path = "../../tests/unit/render/scene.rs"]
mod tests;
