//! SVG output surface.
//!
//! A `DrawContext` that writes SVG elements instead of pixels, so the
//! manual redraw can produce vector `svg` exports. Gradients, clips and
//! filters are collected into `<defs>`; each draw call becomes one element
//! carrying the current transform, opacity, clip and filter.

use crate::context::{DrawContext, RasterSurface, ShadowSpec, font_px};
use crate::error::{RenderError, RenderResult};
use crate::export::ExportPayload;
use kurbo::{Affine, BezPath, Point, Rect};
use lc_core::color::Color;
use lc_core::geometry::approx_text_width;
use lc_core::model::ExportFormat;
use std::fmt::Write as _;

#[derive(Debug, Clone)]
struct SvgState {
    transform: Affine,
    alpha: f64,
    filter: Option<String>,
    shadow: Option<ShadowSpec>,
    fill: String,
    stroke: (String, f64),
    font: String,
    clip: Option<String>,
}

impl Default for SvgState {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            alpha: 1.0,
            filter: None,
            shadow: None,
            fill: "#000000".into(),
            stroke: ("#000000".into(), 1.0),
            font: "400 16px Inter".into(),
            clip: None,
        }
    }
}

pub struct SvgSurface {
    width: f64,
    height: f64,
    defs: String,
    body: String,
    state: SvgState,
    stack: Vec<SvgState>,
    next_def: usize,
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn fmt_num(v: f64) -> String {
    let r = (v * 1000.0).round() / 1000.0;
    if r == r.trunc() {
        format!("{}", r as i64)
    } else {
        format!("{r}")
    }
}

impl SvgSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            defs: String::new(),
            body: String::new(),
            state: SvgState::default(),
            stack: Vec::new(),
            next_def: 0,
        }
    }

    fn def_id(&mut self, prefix: &str) -> String {
        self.next_def += 1;
        format!("{prefix}{}", self.next_def)
    }

    /// Shared attributes for the current state: transform, opacity, clip, filter.
    fn common_attrs(&mut self) -> String {
        let mut attrs = String::new();
        if self.state.transform != Affine::IDENTITY {
            let c = self.state.transform.as_coeffs();
            let _ = write!(
                attrs,
                " transform=\"matrix({} {} {} {} {} {})\"",
                fmt_num(c[0]),
                fmt_num(c[1]),
                fmt_num(c[2]),
                fmt_num(c[3]),
                fmt_num(c[4]),
                fmt_num(c[5])
            );
        }
        if self.state.alpha < 1.0 {
            let _ = write!(attrs, " opacity=\"{}\"", fmt_num(self.state.alpha));
        }
        if let Some(ref clip) = self.state.clip {
            let _ = write!(attrs, " clip-path=\"url(#{clip})\"");
        }
        if let Some(filter) = self.filter_ref() {
            let _ = write!(attrs, " filter=\"url(#{filter})\"");
        }
        attrs
    }

    /// Emit a `<filter>` for the current blur and shadow, if any.
    fn filter_ref(&mut self) -> Option<String> {
        let blur = self
            .state
            .filter
            .as_deref()
            .and_then(|f| f.strip_prefix("blur(")?.strip_suffix("px)")?.parse::<f64>().ok());
        let shadow = self.state.shadow.clone();
        if blur.is_none() && shadow.is_none() {
            return None;
        }
        let id = self.def_id("f");
        let _ = write!(self.defs, "<filter id=\"{id}\" x=\"-50%\" y=\"-50%\" width=\"200%\" height=\"200%\">");
        if let Some(s) = shadow {
            let _ = write!(
                self.defs,
                "<feDropShadow dx=\"{}\" dy=\"{}\" stdDeviation=\"{}\" flood-color=\"{}\"/>",
                fmt_num(s.offset_x),
                fmt_num(s.offset_y),
                fmt_num(s.blur / 2.0),
                escape(&s.color)
            );
        }
        if let Some(b) = blur {
            let _ = write!(self.defs, "<feGaussianBlur stdDeviation=\"{}\"/>", fmt_num(b));
        }
        self.defs.push_str("</filter>\n");
        Some(id)
    }

    fn push_element(&mut self, open: &str, rest: &str) {
        let attrs = self.common_attrs();
        let _ = writeln!(self.body, "  <{open}{attrs}{rest}");
    }

    /// Finished SVG document.
    pub fn finish(&self) -> String {
        let (w, h) = (fmt_num(self.width), fmt_num(self.height));
        let mut out = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n"
        );
        if !self.defs.is_empty() {
            out.push_str("<defs>\n");
            out.push_str(&self.defs);
            out.push_str("</defs>\n");
        }
        out.push_str(&self.body);
        out.push_str("</svg>\n");
        out
    }
}

impl DrawContext for SvgSurface {
    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(s) = self.stack.pop() {
            self.state = s;
        }
    }

    fn transform(&mut self, affine: Affine) {
        self.state.transform = self.state.transform * affine;
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.state.alpha = alpha;
    }

    fn set_filter(&mut self, filter: &str) {
        self.state.filter = (filter != "none").then(|| filter.to_string());
    }

    fn set_shadow(&mut self, shadow: Option<&ShadowSpec>) {
        self.state.shadow = shadow.cloned();
    }

    fn set_fill_color(&mut self, css: &str) {
        self.state.fill = escape(css);
    }

    fn set_fill_linear_gradient(&mut self, start: Point, end: Point, stops: &[(f64, Color)]) {
        let id = self.def_id("g");
        let _ = write!(
            self.defs,
            "<linearGradient id=\"{id}\" gradientUnits=\"userSpaceOnUse\" x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\">",
            fmt_num(start.x),
            fmt_num(start.y),
            fmt_num(end.x),
            fmt_num(end.y)
        );
        for (offset, color) in stops {
            let _ = write!(
                self.defs,
                "<stop offset=\"{}\" stop-color=\"{}\"/>",
                fmt_num(*offset),
                color.to_css()
            );
        }
        self.defs.push_str("</linearGradient>\n");
        self.state.fill = format!("url(#{id})");
    }

    fn set_stroke(&mut self, css: &str, width: f64) {
        self.state.stroke = (escape(css), width);
    }

    fn set_font(&mut self, font: &str) {
        self.state.font = font.to_string();
    }

    fn fill_rect(&mut self, rect: Rect) {
        let rest = format!(
            " x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\"/>",
            fmt_num(rect.x0),
            fmt_num(rect.y0),
            fmt_num(rect.width()),
            fmt_num(rect.height()),
            self.state.fill
        );
        self.push_element("rect", &rest);
    }

    fn fill_path(&mut self, path: &BezPath) {
        let rest = format!(" d=\"{}\" fill=\"{}\"/>", path.to_svg(), self.state.fill);
        self.push_element("path", &rest);
    }

    fn clip_path(&mut self, path: &BezPath) {
        // Resolved in the user space of the clipped element, which shares
        // the transform current at clip time.
        let id = self.def_id("c");
        let _ = writeln!(
            self.defs,
            "<clipPath id=\"{id}\" clipPathUnits=\"userSpaceOnUse\"><path d=\"{}\"/></clipPath>",
            path.to_svg()
        );
        self.state.clip = Some(id);
    }

    fn draw_image(&mut self, src: &str, rect: Rect) -> RenderResult<()> {
        let rest = format!(
            " href=\"{}\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"none\"/>",
            escape(src),
            fmt_num(rect.x0),
            fmt_num(rect.y0),
            fmt_num(rect.width()),
            fmt_num(rect.height())
        );
        self.push_element("image", &rest);
        Ok(())
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        let rest = format!(
            " x=\"{}\" y=\"{}\" style=\"font: {}\" fill=\"{}\" dominant-baseline=\"text-before-edge\">{}</text>",
            fmt_num(x),
            fmt_num(y),
            escape(&self.state.font),
            self.state.fill,
            escape(text)
        );
        self.push_element("text", &rest);
    }

    fn stroke_text(&mut self, text: &str, x: f64, y: f64) {
        let (color, width) = self.state.stroke.clone();
        let rest = format!(
            " x=\"{}\" y=\"{}\" style=\"font: {}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"{}\" dominant-baseline=\"text-before-edge\">{}</text>",
            fmt_num(x),
            fmt_num(y),
            escape(&self.state.font),
            fmt_num(width),
            escape(text)
        );
        self.push_element("text", &rest);
    }

    fn measure_text(&mut self, text: &str) -> f64 {
        approx_text_width(text, font_px(&self.state.font) as f32) as f64
    }
}

impl RasterSurface for SvgSurface {
    fn size(&self) -> (u32, u32) {
        (self.width.round() as u32, self.height.round() as u32)
    }

    fn encode(&mut self, format: ExportFormat, _quality: f32) -> RenderResult<ExportPayload> {
        match format {
            ExportFormat::Svg => Ok(ExportPayload::Bytes(self.finish().into_bytes())),
            other => Err(RenderError::UnsupportedFormat(other.extension())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::paint_document;
    use lc_core::id::ElementId;
    use lc_core::model::{CanvasElement, EditorDocument, ImageStylePatch, ElementUpdate};

    #[test]
    fn empty_document_is_a_white_rect() {
        let doc = EditorDocument::default();
        let mut svg = SvgSurface::new(1080.0, 1080.0);
        paint_document(&mut svg, &doc, 1.0).unwrap();
        let out = svg.finish();
        assert!(out.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
        assert!(out.contains("fill=\"rgba(255, 255, 255, 1)\""));
        assert!(!out.contains("<defs>"));
    }

    #[test]
    fn rounded_shadowed_image_emits_defs() {
        let mut el = CanvasElement::image(ElementId::intern("svg_img"), "Image 1", "a&b.png", 200.0, 100.0);
        ElementUpdate::Image(ImageStylePatch {
            border_radius: Some(12.0),
            shadow: Some("soft".into()),
            opacity: Some(50.0),
            ..Default::default()
        })
        .apply(&mut el);
        let mut doc = EditorDocument::default();
        doc.elements.push(el);

        let mut svg = SvgSurface::new(1080.0, 1080.0);
        paint_document(&mut svg, &doc, 1.0).unwrap();
        let out = svg.finish();
        assert!(out.contains("<clipPath id="));
        assert!(out.contains("<feDropShadow"));
        assert!(out.contains("href=\"a&amp;b.png\""));
        assert!(out.contains("opacity=\"0.5\""));
    }

    #[test]
    fn text_is_escaped() {
        let mut doc = EditorDocument::default();
        doc.elements
            .push(CanvasElement::text(ElementId::intern("svg_txt"), "Text 1", "<b>&"));
        let mut svg = SvgSurface::new(1080.0, 1080.0);
        paint_document(&mut svg, &doc, 1.0).unwrap();
        assert!(svg.finish().contains("&lt;b&gt;&amp;</text>"));
    }

    #[test]
    fn raster_formats_are_rejected() {
        let mut svg = SvgSurface::new(10.0, 10.0);
        assert!(matches!(
            svg.encode(ExportFormat::Png, 1.0),
            Err(RenderError::UnsupportedFormat("png"))
        ));
        assert!(svg.encode(ExportFormat::Svg, 1.0).is_ok());
    }
}
