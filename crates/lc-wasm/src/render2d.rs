//! Canvas2D drawing surface.
//!
//! Implements the manual-redraw `DrawContext` over an HTML `<canvas>` so the
//! painter in `lc-render` can rasterize a document in the browser. Images
//! must be registered up front as loaded `HtmlImageElement`s; the canvas API
//! cannot wait for a network fetch mid-paint.

use kurbo::{Affine, BezPath, PathEl, Point, Rect};
use lc_core::color::Color;
use lc_core::model::ExportFormat;
use lc_render::context::{DrawContext, RasterSurface, ShadowSpec};
use lc_render::error::{RenderError, RenderResult};
use lc_render::export::ExportPayload;
use std::collections::HashMap;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

pub struct CanvasSurface<'a> {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    images: &'a HashMap<String, HtmlImageElement>,
}

impl<'a> CanvasSurface<'a> {
    pub fn new(canvas: HtmlCanvasElement, images: &'a HashMap<String, HtmlImageElement>) -> RenderResult<Self> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| RenderError::surface(js_message(&e)))?
            .ok_or_else(|| RenderError::surface("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| RenderError::surface("not a 2d context"))?;
        ctx.set_text_baseline("top");
        Ok(Self { canvas, ctx, images })
    }

    /// A detached canvas of `width`×`height` device pixels.
    pub fn offscreen(width: u32, height: u32, images: &'a HashMap<String, HtmlImageElement>) -> RenderResult<Self> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| RenderError::surface("no document"))?;
        let canvas = document
            .create_element("canvas")
            .map_err(|e| RenderError::surface(js_message(&e)))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| RenderError::surface("created element is not a canvas"))?;
        canvas.set_width(width);
        canvas.set_height(height);
        Self::new(canvas, images)
    }

    fn trace(&self, path: &BezPath) {
        self.ctx.begin_path();
        for el in path.elements() {
            match *el {
                PathEl::MoveTo(p) => self.ctx.move_to(p.x, p.y),
                PathEl::LineTo(p) => self.ctx.line_to(p.x, p.y),
                PathEl::QuadTo(c, p) => self.ctx.quadratic_curve_to(c.x, c.y, p.x, p.y),
                PathEl::CurveTo(c1, c2, p) => self.ctx.bezier_curve_to(c1.x, c1.y, c2.x, c2.y, p.x, p.y),
                PathEl::ClosePath => self.ctx.close_path(),
            }
        }
    }
}

pub(crate) fn js_message(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{value:?}"))
}

impl DrawContext for CanvasSurface<'_> {
    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn transform(&mut self, affine: Affine) {
        let [a, b, c, d, e, f] = affine.as_coeffs();
        if let Err(err) = self.ctx.transform(a, b, c, d, e, f) {
            log::warn!("canvas transform failed: {}", js_message(&err));
        }
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.ctx.set_global_alpha(alpha);
    }

    fn set_filter(&mut self, filter: &str) {
        self.ctx.set_filter(filter);
    }

    fn set_shadow(&mut self, shadow: Option<&ShadowSpec>) {
        match shadow {
            Some(s) => {
                self.ctx.set_shadow_offset_x(s.offset_x);
                self.ctx.set_shadow_offset_y(s.offset_y);
                self.ctx.set_shadow_blur(s.blur);
                self.ctx.set_shadow_color(&s.color);
            }
            None => {
                self.ctx.set_shadow_offset_x(0.0);
                self.ctx.set_shadow_offset_y(0.0);
                self.ctx.set_shadow_blur(0.0);
                self.ctx.set_shadow_color("transparent");
            }
        }
    }

    fn set_fill_color(&mut self, css: &str) {
        self.ctx.set_fill_style_str(css);
    }

    fn set_fill_linear_gradient(&mut self, start: Point, end: Point, stops: &[(f64, Color)]) {
        let grad = self.ctx.create_linear_gradient(start.x, start.y, end.x, end.y);
        for (offset, color) in stops {
            let _ = grad.add_color_stop(*offset as f32, &color.to_css());
        }
        self.ctx.set_fill_style_canvas_gradient(&grad);
    }

    fn set_stroke(&mut self, css: &str, width: f64) {
        self.ctx.set_stroke_style_str(css);
        self.ctx.set_line_width(width);
    }

    fn set_font(&mut self, font: &str) {
        self.ctx.set_font(font);
    }

    fn fill_rect(&mut self, rect: Rect) {
        self.ctx.fill_rect(rect.x0, rect.y0, rect.width(), rect.height());
    }

    fn fill_path(&mut self, path: &BezPath) {
        self.trace(path);
        self.ctx.fill();
    }

    fn clip_path(&mut self, path: &BezPath) {
        self.trace(path);
        self.ctx.clip();
    }

    fn draw_image(&mut self, src: &str, rect: Rect) -> RenderResult<()> {
        let img = self
            .images
            .get(src)
            .ok_or_else(|| RenderError::surface(format!("image not registered: {}", short(src))))?;
        if !img.complete() || img.natural_width() == 0 {
            return Err(RenderError::surface(format!("image not loaded: {}", short(src))));
        }
        self.ctx
            .draw_image_with_html_image_element_and_dw_and_dh(img, rect.x0, rect.y0, rect.width(), rect.height())
            .map_err(|e| RenderError::surface(js_message(&e)))
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        let _ = self.ctx.fill_text(text, x, y);
    }

    fn stroke_text(&mut self, text: &str, x: f64, y: f64) {
        let _ = self.ctx.stroke_text(text, x, y);
    }

    fn measure_text(&mut self, text: &str) -> f64 {
        self.ctx.measure_text(text).map(|m| m.width()).unwrap_or(0.0)
    }
}

impl RasterSurface for CanvasSurface<'_> {
    fn size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    fn encode(&mut self, format: ExportFormat, quality: f32) -> RenderResult<ExportPayload> {
        if format == ExportFormat::Svg {
            return Err(RenderError::UnsupportedFormat(format.extension()));
        }
        let url = self
            .canvas
            .to_data_url_with_type_and_encoder_options(format.mime(), &JsValue::from_f64(quality as f64))
            .map_err(|e| RenderError::surface(js_message(&e)))?;
        Ok(ExportPayload::DataUrl(url))
    }
}

/// Data urls make for unreadable log lines.
fn short(src: &str) -> &str {
    match src.char_indices().nth(48) {
        Some((i, _)) => &src[..i],
        None => src,
    }
}
