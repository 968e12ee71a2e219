//! Drawing-surface abstraction for the manual redraw.
//!
//! Mirrors the subset of a Canvas2D context the painter needs. Coordinates
//! are document units after the surface's own transform; text is drawn with
//! a top baseline.

use crate::error::RenderResult;
use crate::export::ExportPayload;
use kurbo::{Affine, BezPath, Point, Rect};
use lc_core::color::Color;
use lc_core::geometry::approx_text_width;
use lc_core::model::ExportFormat;

/// Drop shadow applied to subsequent fills.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowSpec {
    pub offset_x: f64,
    pub offset_y: f64,
    pub blur: f64,
    /// CSS color.
    pub color: String,
}

impl ShadowSpec {
    pub fn new(offset_x: f64, offset_y: f64, blur: f64, color: impl Into<String>) -> Self {
        Self {
            offset_x,
            offset_y,
            blur,
            color: color.into(),
        }
    }
}

pub trait DrawContext {
    fn save(&mut self);
    fn restore(&mut self);
    /// Post-multiply the current transform.
    fn transform(&mut self, affine: Affine);

    fn set_global_alpha(&mut self, alpha: f64);
    /// CSS filter string, `"none"` to clear.
    fn set_filter(&mut self, filter: &str);
    fn set_shadow(&mut self, shadow: Option<&ShadowSpec>);
    fn set_fill_color(&mut self, css: &str);
    /// Linear gradient from `start` to `end` with `(offset, color)` stops.
    fn set_fill_linear_gradient(&mut self, start: Point, end: Point, stops: &[(f64, Color)]);
    fn set_stroke(&mut self, css: &str, width: f64);
    /// CSS font shorthand, e.g. `italic 700 48px Inter`.
    fn set_font(&mut self, font: &str);

    fn fill_rect(&mut self, rect: Rect);
    fn fill_path(&mut self, path: &BezPath);
    /// Intersect the clip region with `path` until the matching `restore`.
    fn clip_path(&mut self, path: &BezPath);

    /// Draw the image at `src` stretched into `rect`.
    fn draw_image(&mut self, src: &str, rect: Rect) -> RenderResult<()>;
    fn fill_text(&mut self, text: &str, x: f64, y: f64);
    fn stroke_text(&mut self, text: &str, x: f64, y: f64);
    /// Advance width of `text` in the current font.
    fn measure_text(&mut self, text: &str) -> f64;
}

/// A drawing surface that can also encode its pixels.
pub trait RasterSurface: DrawContext {
    /// Device-pixel size.
    fn size(&self) -> (u32, u32);
    fn encode(&mut self, format: ExportFormat, quality: f32) -> RenderResult<ExportPayload>;
}

/// Pixel size from a CSS font shorthand (`700 48px Inter` → 48).
pub fn font_px(font: &str) -> f64 {
    font.split_whitespace()
        .find_map(|tok| tok.strip_suffix("px")?.parse::<f64>().ok())
        .unwrap_or(16.0)
}

// ─── Recorder ────────────────────────────────────────────────────────────

/// One recorded call on a `Recorder`.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Save,
    Restore,
    Transform([f64; 6]),
    GlobalAlpha(f64),
    Filter(String),
    Shadow(Option<ShadowSpec>),
    FillColor(String),
    FillGradient {
        start: Point,
        end: Point,
        stops: Vec<(f64, Color)>,
    },
    Stroke(String, f64),
    Font(String),
    FillRect(Rect),
    FillPath(Rect),
    Clip(Rect),
    Image(String, Rect),
    FillText(String, f64, f64),
    StrokeText(String, f64, f64),
}

/// A `DrawContext` that records calls instead of drawing. Paths are kept
/// as their bounding boxes. Text is measured with `approx_text_width`.
#[derive(Debug, Default)]
pub struct Recorder {
    pub ops: Vec<DrawOp>,
    font: String,
    /// Image sources that fail to draw.
    pub missing_images: Vec<String>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn images(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Image(src, _) => Some(src.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::FillText(t, _, _) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&DrawOp) -> bool) -> usize {
        self.ops.iter().filter(|op| pred(op)).count()
    }
}

impl DrawContext for Recorder {
    fn save(&mut self) {
        self.ops.push(DrawOp::Save);
    }

    fn restore(&mut self) {
        self.ops.push(DrawOp::Restore);
    }

    fn transform(&mut self, affine: Affine) {
        self.ops.push(DrawOp::Transform(affine.as_coeffs()));
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.ops.push(DrawOp::GlobalAlpha(alpha));
    }

    fn set_filter(&mut self, filter: &str) {
        self.ops.push(DrawOp::Filter(filter.to_string()));
    }

    fn set_shadow(&mut self, shadow: Option<&ShadowSpec>) {
        self.ops.push(DrawOp::Shadow(shadow.cloned()));
    }

    fn set_fill_color(&mut self, css: &str) {
        self.ops.push(DrawOp::FillColor(css.to_string()));
    }

    fn set_fill_linear_gradient(&mut self, start: Point, end: Point, stops: &[(f64, Color)]) {
        self.ops.push(DrawOp::FillGradient {
            start,
            end,
            stops: stops.to_vec(),
        });
    }

    fn set_stroke(&mut self, css: &str, width: f64) {
        self.ops.push(DrawOp::Stroke(css.to_string(), width));
    }

    fn set_font(&mut self, font: &str) {
        self.font = font.to_string();
        self.ops.push(DrawOp::Font(font.to_string()));
    }

    fn fill_rect(&mut self, rect: Rect) {
        self.ops.push(DrawOp::FillRect(rect));
    }

    fn fill_path(&mut self, path: &BezPath) {
        use kurbo::Shape;
        self.ops.push(DrawOp::FillPath(path.bounding_box()));
    }

    fn clip_path(&mut self, path: &BezPath) {
        use kurbo::Shape;
        self.ops.push(DrawOp::Clip(path.bounding_box()));
    }

    fn draw_image(&mut self, src: &str, rect: Rect) -> RenderResult<()> {
        if self.missing_images.iter().any(|m| m == src) {
            return Err(crate::error::RenderError::surface(format!(
                "image not loaded: {src}"
            )));
        }
        self.ops.push(DrawOp::Image(src.to_string(), rect));
        Ok(())
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        self.ops.push(DrawOp::FillText(text.to_string(), x, y));
    }

    fn stroke_text(&mut self, text: &str, x: f64, y: f64) {
        self.ops.push(DrawOp::StrokeText(text.to_string(), x, y));
    }

    fn measure_text(&mut self, text: &str) -> f64 {
        approx_text_width(text, font_px(&self.font) as f32) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_px_reads_shorthand() {
        assert_eq!(font_px("italic small-caps 700 48px Inter"), 48.0);
        assert_eq!(font_px("bold 12.5px \"Fira Sans\""), 12.5);
        assert_eq!(font_px("Inter"), 16.0);
    }

    #[test]
    fn recorder_measures_with_current_font() {
        let mut r = Recorder::new();
        r.set_font("700 20px Inter");
        assert!((r.measure_text("abcd") - 44.0).abs() < 1e-4);
    }
}
