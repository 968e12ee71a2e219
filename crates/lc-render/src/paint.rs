//! Document → `DrawContext` calls (manual redraw).
//!
//! Paints the background, then visible images, then visible text. This is
//! the fallback when whole-scene capture is unavailable, and the native path
//! for SVG output. Crop, 3D rotation, clip-path shapes and noise are not
//! reproduced here.

use crate::context::{DrawContext, RasterSurface, ShadowSpec};
use crate::error::RenderResult;
use crate::export::{ExportBlob, ExportOptions};
use crate::svg::SvgSurface;
use kurbo::{Affine, BezPath, Point, Rect, RoundedRect, Shape};
use lc_core::background::{Background, even_stop_offsets};
use lc_core::model::{CanvasElement, EditorDocument, ElementKind, ExportFormat, ImageStyle, TextEffect, TextStyle};
use lc_core::presets::{shadow_css, text_shadow_css};

const PATH_TOLERANCE: f64 = 0.1;
const LINE_HEIGHT: f64 = 1.2;

/// Paint `doc` at `ratio` device pixels per document unit.
pub fn paint_document<C: DrawContext + ?Sized>(ctx: &mut C, doc: &EditorDocument, ratio: f64) -> RenderResult<()> {
    let (w, h) = (doc.width() as f64, doc.height() as f64);
    ctx.save();
    ctx.transform(Affine::scale(ratio));

    paint_background(ctx, &doc.background, w, h);

    for el in doc.elements.iter().filter(|e| e.is_visible) {
        if let ElementKind::Image {
            src,
            natural_width,
            natural_height,
            style,
        } = &el.kind
        {
            paint_image(ctx, el, src, (*natural_width as f64, *natural_height as f64), style)?;
        }
    }
    for el in doc.elements.iter().filter(|e| e.is_visible) {
        if let ElementKind::Text { style } = &el.kind {
            paint_text(ctx, el, style);
        }
    }

    ctx.restore();
    Ok(())
}

/// Paint `doc` onto `surface` at the requested pixel ratio and encode it.
pub fn export_manual<S: RasterSurface + ?Sized>(
    surface: &mut S,
    doc: &EditorDocument,
    options: &ExportOptions,
) -> RenderResult<ExportBlob> {
    paint_document(surface, doc, options.pixel_ratio.value() as f64)?;
    let payload = surface.encode(options.format, options.quality.clamp(0.1, 1.0))?;
    log::debug!("manual export {} ({}x)", options.filename(), options.pixel_ratio.value());
    Ok(ExportBlob::new(options, payload))
}

/// Manual export with the surface picked by format. SVG is drawn natively;
/// raster formats go to the surface `raster` opens at the output size.
pub fn export_manual_with<S, F>(doc: &EditorDocument, options: &ExportOptions, raster: F) -> RenderResult<ExportBlob>
where
    S: RasterSurface,
    F: FnOnce(u32, u32) -> RenderResult<S>,
{
    let (w, h) = options.output_size((doc.width(), doc.height()), options.pixel_ratio.value());
    if options.format == ExportFormat::Svg {
        let mut svg = SvgSurface::new(w as f64, h as f64);
        return export_manual(&mut svg, doc, options);
    }
    let mut surface = raster(w, h)?;
    export_manual(&mut surface, doc, options)
}

// ─── Background ──────────────────────────────────────────────────────────

fn paint_background<C: DrawContext + ?Sized>(ctx: &mut C, descriptor: &str, w: f64, h: f64) {
    let full = Rect::new(0.0, 0.0, w, h);
    match Background::parse(descriptor) {
        Background::Solid(c) => {
            ctx.set_fill_color(&c.to_css());
            ctx.fill_rect(full);
        }
        Background::LinearGradient { angle_deg, stops } => {
            let (start, end) = gradient_line(angle_deg as f64, w, h);
            let offsets = even_stop_offsets(stops.len());
            let stops: Vec<_> = offsets
                .into_iter()
                .map(f64::from)
                .zip(stops)
                .collect();
            ctx.set_fill_linear_gradient(start, end, &stops);
            ctx.fill_rect(full);
        }
        Background::Image(url) => {
            ctx.set_fill_color("#ffffff");
            ctx.fill_rect(full);
            if let Err(e) = ctx.draw_image(&url, full) {
                log::warn!("background image skipped: {e}");
            }
        }
        Background::Unknown(raw) => {
            log::trace!("unrecognized background {raw:?}, painting white");
            ctx.set_fill_color("#ffffff");
            ctx.fill_rect(full);
        }
    }
}

/// CSS gradient line for `angle_deg` over a `w × h` box: through the
/// center, long enough that the corners land on the first and last stop.
pub fn gradient_line(angle_deg: f64, w: f64, h: f64) -> (Point, Point) {
    let rad = angle_deg.to_radians();
    let (dx, dy) = (rad.sin(), -rad.cos());
    let half = (w * dx.abs() + h * dy.abs()) / 2.0;
    let (cx, cy) = (w / 2.0, h / 2.0);
    (
        Point::new(cx - dx * half, cy - dy * half),
        Point::new(cx + dx * half, cy + dy * half),
    )
}

// ─── Images ──────────────────────────────────────────────────────────────

/// `translate(center) · rotate · scale(±s) · translate(-center)`.
pub fn element_transform(center: Point, rotate_deg: f64, sx: f64, sy: f64) -> Affine {
    Affine::translate(center.to_vec2())
        * Affine::rotate(rotate_deg.to_radians())
        * Affine::scale_non_uniform(sx, sy)
        * Affine::translate(-center.to_vec2())
}

/// Approximate a box-shadow preset by matching the pixel values in its CSS.
pub fn shadow_tier(token: &str) -> Option<ShadowSpec> {
    let css = shadow_css(token)?;
    let tiers = [
        ("50px", ShadowSpec::new(0.0, 25.0, 50.0, "rgba(0, 0, 0, 0.5)")),
        ("32px", ShadowSpec::new(0.0, 12.0, 32.0, "rgba(0, 0, 0, 0.4)")),
        ("30px", ShadowSpec::new(0.0, 0.0, 30.0, "rgba(99, 102, 241, 0.6)")),
        ("24px", ShadowSpec::new(0.0, 8.0, 24.0, "rgba(0, 0, 0, 0.25)")),
        ("12px", ShadowSpec::new(0.0, 4.0, 12.0, "rgba(0, 0, 0, 0.15)")),
    ];
    tiers
        .into_iter()
        .find(|(px, _)| css.contains(px))
        .map(|(_, spec)| spec)
}

fn rounded_rect_path(rect: Rect, radius: f64) -> BezPath {
    let r = radius.min(rect.width() / 2.0).min(rect.height() / 2.0).max(0.0);
    RoundedRect::from_rect(rect, r).to_path(PATH_TOLERANCE)
}

fn paint_image<C: DrawContext + ?Sized>(
    ctx: &mut C,
    el: &CanvasElement,
    src: &str,
    natural: (f64, f64),
    style: &ImageStyle,
) -> RenderResult<()> {
    let (x, y) = (el.position.x as f64, el.position.y as f64);
    let rect = Rect::new(x, y, x + natural.0, y + natural.1);
    let s = style.scale as f64 / 100.0;
    let sx = if style.flip_x { -s } else { s };
    let sy = if style.flip_y { -s } else { s };

    log::trace!("IMAGE {} {src} at ({x}, {y}) scale {s}", el.id);

    ctx.save();
    ctx.transform(element_transform(rect.center(), style.rotate as f64, sx, sy));
    ctx.set_global_alpha((style.opacity as f64 / 100.0).clamp(0.0, 1.0));
    if style.blur > 0.0 {
        ctx.set_filter(&format!("blur({}px)", style.blur));
    }

    let radius = style.border_radius as f64;
    let shadow = shadow_tier(&style.shadow);
    if radius > 0.0 {
        let path = rounded_rect_path(rect, radius);
        if let Some(ref spec) = shadow {
            // The clip below would cut the shadow off, so cast it from a filled
            // silhouette first.
            ctx.set_shadow(Some(spec));
            ctx.set_fill_color("#000000");
            ctx.fill_path(&path);
            ctx.set_shadow(None);
        }
        ctx.clip_path(&path);
    } else if let Some(ref spec) = shadow {
        ctx.set_shadow(Some(spec));
    }

    let drawn = ctx.draw_image(src, rect);
    ctx.restore();
    if let Err(e) = drawn {
        log::warn!("image {} skipped: {e}", el.id);
    }
    Ok(())
}

// ─── Text ────────────────────────────────────────────────────────────────

/// CSS font shorthand for a text style.
pub fn font_shorthand(style: &TextStyle) -> String {
    let mut font = String::new();
    if style.has_effect(TextEffect::Italic) {
        font.push_str("italic ");
    }
    if style.has_effect(TextEffect::SmallCaps) {
        font.push_str("small-caps ");
    }
    font.push_str(&format!(
        "{} {}px {}",
        style.font_weight, style.font_size, style.font_family
    ));
    font
}

fn text_shadow_tier(token: &str) -> Option<ShadowSpec> {
    text_shadow_css(token)?;
    let spec = match token {
        "soft" => ShadowSpec::new(0.0, 2.0, 4.0, "rgba(0, 0, 0, 0.3)"),
        "hard" => ShadowSpec::new(3.0, 3.0, 0.0, "rgba(0, 0, 0, 0.8)"),
        "neon" => ShadowSpec::new(0.0, 0.0, 20.0, "#0ff"),
        _ => ShadowSpec::new(0.0, 0.0, 8.0, "rgba(0, 0, 0, 0.6)"),
    };
    Some(spec)
}

/// Layout of a text layer: its box and the top of each line.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub rect: Rect,
    pub lines: Vec<(String, f64, f64)>,
}

pub fn layout_text<C: DrawContext + ?Sized>(ctx: &mut C, el: &CanvasElement, style: &TextStyle) -> TextLayout {
    let size = style.font_size as f64;
    let pad = style.padding as f64;
    let (x, y) = (el.position.x as f64, el.position.y as f64);
    let content = style.display_content();

    ctx.set_font(&font_shorthand(style));
    let mut lines = Vec::new();
    let mut max_w: f64 = 0.0;
    for (i, line) in content.split('\n').enumerate() {
        let w = ctx.measure_text(line);
        max_w = max_w.max(w);
        lines.push((line.to_string(), y + pad + i as f64 * size * LINE_HEIGHT, w));
    }
    let height = lines.len() as f64 * size * LINE_HEIGHT + pad * 2.0;
    TextLayout {
        rect: Rect::new(x, y, x + max_w + pad * 2.0, y + height),
        lines,
    }
}

fn paint_text<C: DrawContext + ?Sized>(ctx: &mut C, el: &CanvasElement, style: &TextStyle) {
    let size = style.font_size as f64;
    let pad = style.padding as f64;

    ctx.save();
    let layout = layout_text(ctx, el, style);
    ctx.transform(element_transform(layout.rect.center(), style.rotate as f64, 1.0, 1.0));

    if style.show_background {
        ctx.set_fill_color(&style.background_color);
        ctx.fill_path(&rounded_rect_path(layout.rect, style.border_radius as f64));
    }
    if style.has_effect(TextEffect::Blur) {
        ctx.set_filter("blur(2px)");
    }
    if let Some(spec) = text_shadow_tier(&style.text_shadow) {
        ctx.set_shadow(Some(&spec));
    }

    let x = layout.rect.x0 + pad;
    let outline = style.has_effect(TextEffect::Outline);
    let rule = (size / 16.0).max(1.0);
    for (line, top, width) in &layout.lines {
        log::trace!("TEXT {} {line:?} at ({x}, {top})", el.id);
        ctx.set_fill_color(&style.color);
        ctx.fill_text(line, x, *top);
        if outline {
            ctx.set_stroke("#000000", (size / 24.0).max(1.0));
            ctx.stroke_text(line, x, *top);
        }
        if style.has_effect(TextEffect::Underline) {
            ctx.fill_rect(Rect::new(x, top + size * 1.05, x + width, top + size * 1.05 + rule));
        }
        if style.has_effect(TextEffect::LineThrough) {
            ctx.fill_rect(Rect::new(x, top + size * 0.55, x + width, top + size * 0.55 + rule));
        }
    }
    ctx.restore();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{DrawOp, Recorder};
    use lc_core::id::ElementId;
    use lc_core::model::Position;

    fn doc_with(elements: Vec<CanvasElement>) -> EditorDocument {
        let mut doc = EditorDocument::default();
        doc.elements = elements;
        doc
    }

    #[test]
    fn draw_order_is_background_images_text() {
        let text = CanvasElement::text(ElementId::intern("pt_t"), "Text 1", "Hi");
        let img = CanvasElement::image(ElementId::intern("pt_i"), "Image 1", "a.png", 100.0, 50.0);
        let doc = doc_with(vec![text, img]);
        let mut rec = Recorder::new();
        paint_document(&mut rec, &doc, 1.0).unwrap();

        let first_fill = rec.ops.iter().position(|op| matches!(op, DrawOp::FillRect(_)));
        let image = rec.ops.iter().position(|op| matches!(op, DrawOp::Image(..)));
        let text = rec.ops.iter().position(|op| matches!(op, DrawOp::FillText(..)));
        assert!(first_fill < image && image < text);
    }

    #[test]
    fn hidden_elements_are_skipped() {
        let mut img = CanvasElement::image(ElementId::intern("pt_h"), "Image 1", "h.png", 10.0, 10.0);
        img.is_visible = false;
        let mut rec = Recorder::new();
        paint_document(&mut rec, &doc_with(vec![img]), 1.0).unwrap();
        assert!(rec.images().is_empty());
    }

    #[test]
    fn gradient_background_spreads_stops_evenly() {
        let mut doc = EditorDocument::default();
        doc.background = "linear-gradient(90deg, #000 10%, #888 20%, #fff 90%)".into();
        let mut rec = Recorder::new();
        paint_document(&mut rec, &doc, 1.0).unwrap();
        let stops = rec.ops.iter().find_map(|op| match op {
            DrawOp::FillGradient { stops, start, end } => Some((stops.clone(), *start, *end)),
            _ => None,
        });
        let (stops, start, end) = stops.unwrap();
        let offsets: Vec<f64> = stops.iter().map(|(o, _)| *o).collect();
        assert_eq!(offsets, vec![0.0, 0.5, 1.0]);
        assert!((start.x - 0.0).abs() < 1e-6 && (end.x - 1080.0).abs() < 1e-6);
    }

    #[test]
    fn shadow_tiers_match_preset_pixels() {
        assert_eq!(shadow_tier("dramatic").unwrap().blur, 50.0);
        assert_eq!(shadow_tier("hard").unwrap().blur, 32.0);
        assert_eq!(shadow_tier("soft").unwrap().blur, 12.0);
        assert!(shadow_tier("none").is_none());
    }

    #[test]
    fn transform_pivots_on_center() {
        let c = Point::new(50.0, 25.0);
        let t = element_transform(c, 90.0, 2.0, 2.0);
        let p = t * c;
        assert!((p.x - 50.0).abs() < 1e-9 && (p.y - 25.0).abs() < 1e-9);
    }

    #[test]
    fn text_effects_change_output() {
        let mut el = CanvasElement::text(ElementId::intern("pt_fx"), "Text 1", "ab\ncd")
            .with_position(Position::new(10.0, 20.0));
        if let ElementKind::Text { style } = &mut el.kind {
            style.toggle_effect(TextEffect::Uppercase);
            style.toggle_effect(TextEffect::Outline);
            style.toggle_effect(TextEffect::Underline);
            style.show_background = true;
        }
        let mut rec = Recorder::new();
        paint_document(&mut rec, &doc_with(vec![el]), 1.0).unwrap();

        assert_eq!(rec.texts(), vec!["AB", "CD"]);
        assert_eq!(rec.count(|op| matches!(op, DrawOp::StrokeText(..))), 2);
        // Second line sits one line-height below the first.
        let ys: Vec<f64> = rec
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::FillText(_, _, y) => Some(*y),
                _ => None,
            })
            .collect();
        assert!((ys[1] - ys[0] - 48.0 * 1.2).abs() < 1e-4);
        // Background box and underlines.
        assert_eq!(rec.count(|op| matches!(op, DrawOp::FillPath(_))), 1);
    }

    #[test]
    fn missing_image_does_not_abort() {
        let img = CanvasElement::image(ElementId::intern("pt_m"), "Image 1", "gone.png", 10.0, 10.0);
        let text = CanvasElement::text(ElementId::intern("pt_mt"), "Text 1", "still here");
        let mut rec = Recorder::new();
        rec.missing_images.push("gone.png".into());
        paint_document(&mut rec, &doc_with(vec![img, text]), 2.0).unwrap();
        assert_eq!(rec.texts(), vec!["still here"]);
    }
}
