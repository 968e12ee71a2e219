//! Live styled-scene description for DOM hosts.
//!
//! Each layer becomes a wrapper box (position, transform, opacity,
//! stacking), an optional crop container (inset and clipped to the crop),
//! and a content box. The same description is what a scene-capture
//! collaborator photographs, so it carries every style the manual
//! redraw drops (crop, 3D rotation, clip-path shapes, noise).

use lc_core::geometry::compute_visible_crop_region;
use lc_core::id::ElementId;
use lc_core::model::{CanvasElement, EditorDocument, ElementKind, ImageStyle, TextEffect, TextStyle};
use lc_core::presets::{clip_path_css, shadow_css, text_shadow_css};
use serde::Serialize;
use std::fmt::Write as _;

/// Highlight drawn around the selected layer.
pub const SELECTION_OUTLINE: &str = "2px solid #6366f1";

/// Ordered CSS declarations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Declarations(Vec<(&'static str, String)>);

impl Declarations {
    pub fn set(&mut self, prop: &'static str, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        match self.0.iter_mut().find(|(p, _)| *p == prop) {
            Some(slot) => slot.1 = value,
            None => self.0.push((prop, value)),
        }
        self
    }

    pub fn get(&self, prop: &str) -> Option<&str> {
        self.0.iter().find(|(p, _)| *p == prop).map(|(_, v)| v.as_str())
    }

    /// Inline `style` attribute text.
    pub fn to_css_string(&self) -> String {
        let mut out = String::new();
        for (prop, value) in &self.0 {
            if !out.is_empty() {
                out.push(' ');
            }
            let _ = write!(out, "{prop}: {value};");
        }
        out
    }
}

impl Serialize for Declarations {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_css_string())
    }
}

/// Styled description of one layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerCss {
    pub id: ElementId,
    pub z_index: usize,
    pub selected: bool,
    pub wrapper: Declarations,
    /// Clipping box inset by the crop (images only).
    pub crop_container: Option<Declarations>,
    pub content: Declarations,
    /// Opacity of the film-grain overlay, when noise is on.
    pub noise_opacity: Option<f32>,
}

/// CSS transform list. Scale is a percentage; flips negate an axis.
pub fn transform_css(scale_pct: f32, rotate: f32, rotate_x: f32, rotate_y: f32, flip_x: bool, flip_y: bool) -> String {
    let s = scale_pct / 100.0;
    let sx = if flip_x { -s } else { s };
    let sy = if flip_y { -s } else { s };
    let mut parts = Vec::new();
    if rotate != 0.0 {
        parts.push(format!("rotate({rotate}deg)"));
    }
    if rotate_x != 0.0 {
        parts.push(format!("rotateX({rotate_x}deg)"));
    }
    if rotate_y != 0.0 {
        parts.push(format!("rotateY({rotate_y}deg)"));
    }
    if sx != 1.0 || sy != 1.0 {
        parts.push(format!("scale({sx}, {sy})"));
    }
    if parts.is_empty() {
        "none".into()
    } else {
        parts.join(" ")
    }
}

pub fn image_filter_css(style: &ImageStyle) -> String {
    if style.blur > 0.0 {
        format!("blur({}px)", style.blur)
    } else {
        "none".into()
    }
}

/// Describe every layer of `doc`, bottom to top. The selected layer is
/// lifted above the others; capture clears the selection first so output
/// keeps true array order.
pub fn scene_css(doc: &EditorDocument) -> Vec<LayerCss> {
    let top = doc.elements.len() + 1;
    doc.elements
        .iter()
        .enumerate()
        .map(|(i, el)| {
            let selected = doc.is_selected(el.id);
            let z = if selected { top } else { i + 1 };
            layer_css(el, z, selected)
        })
        .collect()
}

pub fn layer_css(el: &CanvasElement, z_index: usize, selected: bool) -> LayerCss {
    let mut wrapper = Declarations::default();
    wrapper
        .set("position", "absolute")
        .set("left", format!("{}px", el.position.x))
        .set("top", format!("{}px", el.position.y))
        .set("transform-origin", "center")
        .set("z-index", z_index.to_string());
    if !el.is_visible {
        wrapper.set("display", "none");
    }
    if selected {
        wrapper.set("outline", SELECTION_OUTLINE);
    }

    match &el.kind {
        ElementKind::Image {
            natural_width,
            natural_height,
            style,
            ..
        } => {
            wrapper
                .set("width", format!("{natural_width}px"))
                .set("height", format!("{natural_height}px"));
            image_css(el.id, z_index, selected, wrapper, style)
        }
        ElementKind::Text { style } => text_css(el.id, z_index, selected, wrapper, style),
    }
}

fn image_css(id: ElementId, z_index: usize, selected: bool, mut wrapper: Declarations, style: &ImageStyle) -> LayerCss {
    wrapper
        .set(
            "transform",
            transform_css(style.scale, style.rotate, style.rotate_x, style.rotate_y, style.flip_x, style.flip_y),
        )
        .set("opacity", format!("{}", style.opacity / 100.0));
    if let Some(shadow) = shadow_css(&style.shadow) {
        wrapper.set("box-shadow", shadow);
    }
    if style.border_radius > 0.0 {
        wrapper.set("border-radius", format!("{}px", style.border_radius));
    }

    let region = compute_visible_crop_region(&style.crop);
    let mut container = Declarations::default();
    container
        .set("position", "absolute")
        .set(
            "inset",
            format!(
                "{}% {}% {}% {}%",
                style.crop.top, style.crop.right, style.crop.bottom, style.crop.left
            ),
        )
        .set("overflow", "hidden");
    if style.border_radius > 0.0 {
        container.set("border-radius", format!("{}px", style.border_radius));
    }
    if let Some(clip) = clip_path_css(&style.clip_path) {
        container.set("clip-path", clip);
    }

    let mut content = Declarations::default();
    content
        .set("position", "absolute")
        .set("left", format!("{}%", region.offset_left_pct))
        .set("top", format!("{}%", region.offset_top_pct))
        .set("width", format!("{}%", region.inner_width_pct))
        .set("height", format!("{}%", region.inner_height_pct))
        .set("object-fit", "fill")
        .set("filter", image_filter_css(style));

    LayerCss {
        id,
        z_index,
        selected,
        wrapper,
        crop_container: Some(container),
        content,
        noise_opacity: (style.noise > 0.0).then(|| style.noise / 100.0 * 0.5),
    }
}

fn text_css(id: ElementId, z_index: usize, selected: bool, mut wrapper: Declarations, style: &TextStyle) -> LayerCss {
    wrapper.set(
        "transform",
        transform_css(100.0, style.rotate, style.rotate_x, style.rotate_y, false, false),
    );

    let mut content = Declarations::default();
    content
        .set("font-size", format!("{}px", style.font_size))
        .set("font-family", style.font_family.clone())
        .set("font-weight", style.font_weight.to_string())
        .set("color", style.color.clone())
        .set("padding", format!("{}px", style.padding))
        .set("border-radius", format!("{}px", style.border_radius))
        .set("white-space", "pre")
        .set("line-height", "1.2");
    if style.show_background {
        content.set("background-color", style.background_color.clone());
    }
    if let Some(shadow) = text_shadow_css(&style.text_shadow) {
        content.set("text-shadow", shadow);
    }

    let decorations: Vec<&str> = [
        (TextEffect::Underline, "underline"),
        (TextEffect::LineThrough, "line-through"),
    ]
    .into_iter()
    .filter(|(e, _)| style.has_effect(*e))
    .map(|(_, css)| css)
    .collect();
    if !decorations.is_empty() {
        content.set("text-decoration", decorations.join(" "));
    }
    if style.has_effect(TextEffect::Italic) {
        content.set("font-style", "italic");
    }
    if style.has_effect(TextEffect::Uppercase) {
        content.set("text-transform", "uppercase");
    }
    if style.has_effect(TextEffect::SmallCaps) {
        content.set("font-variant", "small-caps");
    }
    if style.has_effect(TextEffect::Outline) {
        content.set("-webkit-text-stroke", "1px #000000");
    }
    if style.has_effect(TextEffect::Blur) {
        content.set("filter", "blur(2px)");
    }

    LayerCss {
        id,
        z_index,
        selected,
        wrapper,
        crop_container: None,
        content,
        noise_opacity: None,
    }
}
