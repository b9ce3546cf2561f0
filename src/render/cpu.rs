use std::path::Path;

use anyhow::Context as _;
use vello_cpu::kurbo::Shape as _;

use crate::{
    config::VizConfig,
    foundation::core::{Point, Rgba8},
    foundation::error::{TreeflowError, TreeflowResult},
    render::surface::{RenderSurface, Stroke, TextAlign, TextStyle},
    render::text::{LabelFont, TextBrushRgba8},
};

/// A rendered frame as RGBA8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Straight-alpha copy of the pixel data.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        if self.premultiplied {
            for px in out.chunks_exact_mut(4) {
                let a = u16::from(px[3]);
                if a == 0 || a == 255 {
                    continue;
                }
                for c in &mut px[..3] {
                    *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
                }
            }
        }
        out
    }

    pub fn save_png(&self, path: &Path) -> TreeflowResult<()> {
        image::save_buffer_with_format(
            path,
            &self.to_straight_rgba8(),
            self.width,
            self.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}

/// [`RenderSurface`] rasterized on the CPU with `vello_cpu`.
///
/// Labels are drawn only when a font was supplied; without one `draw_text` is a no-op.
pub struct CpuSurface {
    width: u16,
    height: u16,
    ctx: vello_cpu::RenderContext,
    font: Option<LabelFont>,
}

impl std::fmt::Debug for CpuSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("font", &self.font)
            .finish_non_exhaustive()
    }
}

impl CpuSurface {
    pub fn new(width: u32, height: u32) -> TreeflowResult<Self> {
        let w: u16 = width
            .try_into()
            .map_err(|_| TreeflowError::render("surface width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| TreeflowError::render("surface height exceeds u16"))?;
        if w == 0 || h == 0 {
            return Err(TreeflowError::render("surface width/height must be > 0"));
        }
        Ok(Self {
            width: w,
            height: h,
            ctx: vello_cpu::RenderContext::new(w, h),
            font: None,
        })
    }

    /// Surface sized to the configured canvas, with the configured label font if any.
    pub fn from_config(cfg: &VizConfig) -> TreeflowResult<Self> {
        let surface = Self::new(cfg.canvas.width, cfg.canvas.height)?;
        match &cfg.font_path {
            Some(path) => surface.with_font_path(path),
            None => Ok(surface),
        }
    }

    pub fn with_font_path(mut self, path: &Path) -> TreeflowResult<Self> {
        self.font = Some(LabelFont::from_path(path)?);
        Ok(self)
    }

    pub fn with_font_bytes(mut self, bytes: Vec<u8>) -> TreeflowResult<Self> {
        self.font = Some(LabelFont::from_bytes(bytes)?);
        Ok(self)
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn width(&self) -> u32 {
        u32::from(self.width)
    }

    pub fn height(&self) -> u32 {
        u32::from(self.height)
    }

    /// Rasterize everything drawn since the last `clear`.
    pub fn snapshot(&mut self) -> FrameRGBA {
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut pixmap);
        FrameRGBA {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        }
    }

    fn fill_disc(&mut self, center: Point, radius: f64, color: Rgba8) {
        if radius <= 0.0 {
            return;
        }
        let circle = vello_cpu::kurbo::Circle::new(to_cpu_point(center), radius);
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(paint(color));
        self.ctx.fill_path(&circle.to_path(0.1));
    }
}

impl RenderSurface for CpuSurface {
    fn clear(&mut self, color: Rgba8) -> TreeflowResult<()> {
        self.ctx.reset();
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(paint(color));
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.width),
            f64::from(self.height),
        ));
        Ok(())
    }

    fn fill_circle(
        &mut self,
        center: Point,
        radius: f64,
        fill: Rgba8,
        stroke: Option<Stroke>,
    ) -> TreeflowResult<()> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(TreeflowError::render("circle radius must be finite and >= 0"));
        }
        // A centered stroke is an outer disc in the stroke color under a shrunken fill disc.
        match stroke {
            Some(s) if s.width > 0.0 => {
                let half = s.width / 2.0;
                self.fill_disc(center, radius + half, s.color);
                self.fill_disc(center, radius - half, fill);
            }
            _ => self.fill_disc(center, radius, fill),
        }
        Ok(())
    }

    fn draw_line(
        &mut self,
        from: Point,
        to: Point,
        color: Rgba8,
        width: f64,
    ) -> TreeflowResult<()> {
        let d = to - from;
        let len = d.hypot();
        if len == 0.0 || width <= 0.0 {
            return Ok(());
        }
        let n = vello_cpu::kurbo::Vec2::new(-d.y, d.x) * (width / 2.0 / len);
        let (a, b) = (to_cpu_point(from), to_cpu_point(to));

        let mut quad = vello_cpu::kurbo::BezPath::new();
        quad.move_to(a + n);
        quad.line_to(b + n);
        quad.line_to(b - n);
        quad.line_to(a - n);
        quad.close_path();

        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(paint(color));
        self.ctx.fill_path(&quad);
        Ok(())
    }

    fn draw_text(&mut self, at: Point, text: &str, style: &TextStyle) -> TreeflowResult<()> {
        let Some(font) = self.font.as_mut() else {
            return Ok(());
        };
        if text.is_empty() {
            return Ok(());
        }
        let c = style.color;
        let layout = font.layout(
            text,
            style.size_px,
            TextBrushRgba8 {
                r: c.r,
                g: c.g,
                b: c.b,
                a: c.a,
            },
        )?;

        let (w, h) = (f64::from(layout.width()), f64::from(layout.height()));
        let x = match style.align {
            TextAlign::Start => at.x,
            TextAlign::Center => at.x - w / 2.0,
        };
        let y = at.y - h / 2.0;
        self.ctx
            .set_transform(vello_cpu::kurbo::Affine::translate((x, y)));

        let font_data = font.font().clone();
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                self.ctx
                    .glyph_run(&font_data)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        Ok(())
    }
}

fn paint(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn to_cpu_point(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
