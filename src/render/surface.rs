use crate::{
    foundation::core::{Point, Rgba8},
    foundation::error::TreeflowResult,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAlign {
    /// `at` is the left edge of the text, vertically centered.
    Start,
    /// `at` is the center of the text box.
    Center,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub color: Rgba8,
    pub size_px: f32,
    pub align: TextAlign,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub color: Rgba8,
    pub width: f64,
}

/// Minimal 2D drawing target. Coordinates are canvas pixels, y pointing down.
pub trait RenderSurface {
    fn clear(&mut self, color: Rgba8) -> TreeflowResult<()>;

    /// Fill a circle, optionally outlined. The stroke is centered on the circle's edge.
    fn fill_circle(
        &mut self,
        center: Point,
        radius: f64,
        fill: Rgba8,
        stroke: Option<Stroke>,
    ) -> TreeflowResult<()>;

    fn draw_line(&mut self, from: Point, to: Point, color: Rgba8, width: f64)
    -> TreeflowResult<()>;

    fn draw_text(&mut self, at: Point, text: &str, style: &TextStyle) -> TreeflowResult<()>;
}

/// One recorded call on a [`RecordingSurface`].
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clear(Rgba8),
    Circle {
        center: Point,
        radius: f64,
        fill: Rgba8,
        stroke: Option<Stroke>,
    },
    Line {
        from: Point,
        to: Point,
        color: Rgba8,
        width: f64,
    },
    Text {
        at: Point,
        text: String,
        style: TextStyle,
    },
}

/// Surface that keeps the commands of the current frame instead of rasterizing them.
///
/// `clear` starts a new frame, so `commands()` always describes exactly one redraw.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordingSurface {
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn circles(&self) -> impl Iterator<Item = (Point, f64, Rgba8)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Circle {
                center,
                radius,
                fill,
                ..
            } => Some((*center, *radius, *fill)),
            _ => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl RenderSurface for RecordingSurface {
    fn clear(&mut self, color: Rgba8) -> TreeflowResult<()> {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear(color));
        Ok(())
    }

    fn fill_circle(
        &mut self,
        center: Point,
        radius: f64,
        fill: Rgba8,
        stroke: Option<Stroke>,
    ) -> TreeflowResult<()> {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            fill,
            stroke,
        });
        Ok(())
    }

    fn draw_line(
        &mut self,
        from: Point,
        to: Point,
        color: Rgba8,
        width: f64,
    ) -> TreeflowResult<()> {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            color,
            width,
        });
        Ok(())
    }

    fn draw_text(&mut self, at: Point, text: &str, style: &TextStyle) -> TreeflowResult<()> {
        self.commands.push(DrawCommand::Text {
            at,
            text: text.to_string(),
            style: *style,
        });
        Ok(())
    }
}
