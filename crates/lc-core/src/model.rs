//! Core data model for LayerCraft documents.
//!
//! A document is an ordered sequence of layers over a background. Array
//! order is z-order: later elements paint on top. Each layer is a
//! `CanvasElement`: a common base record (id, name, position, visibility,
//! lock) plus a per-variant payload (`ElementKind::Image` / `ElementKind::Text`).
//!
//! Positions are document-space units and name the top-left of the
//! element's *unscaled* box; scale and rotation apply about the box center.

use crate::id::ElementId;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

// ─── Geometry primitives ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// An axis-aligned box, e.g. the rendered bounds of a layer in client space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

// ─── Crop ────────────────────────────────────────────────────────────────

/// Minimum share of each axis (percent) that must stay visible after cropping.
pub const MIN_VISIBLE_PCT: f32 = 5.0;

/// Largest allowed sum of two opposite crop edges.
pub const MAX_OPPOSITE_CROP: f32 = 100.0 - MIN_VISIBLE_PCT;

/// Percentage trim from each edge of an image's source content.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Crop {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Crop {
    pub const NONE: Crop = Crop {
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
        left: 0.0,
    };

    pub const fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Whether `top+bottom ≤ 95` and `left+right ≤ 95` with every edge in [0, 100].
    pub fn is_valid(&self) -> bool {
        let edges = [self.top, self.right, self.bottom, self.left];
        edges.iter().all(|e| e.is_finite() && (0.0..=100.0).contains(e))
            && self.top + self.bottom <= MAX_OPPOSITE_CROP + f32::EPSILON * 100.0
            && self.left + self.right <= MAX_OPPOSITE_CROP + f32::EPSILON * 100.0
    }

    /// Clamp into the legal region. Each edge is clamped to [0, 95]; when an
    /// opposite pair still exceeds 95, `top`/`left` are kept and
    /// `bottom`/`right` give way.
    pub fn normalized(self) -> Self {
        let edge = |v: f32| {
            if v.is_finite() {
                v.clamp(0.0, MAX_OPPOSITE_CROP)
            } else {
                0.0
            }
        };
        let top = edge(self.top);
        let left = edge(self.left);
        let bottom = edge(self.bottom).min(MAX_OPPOSITE_CROP - top);
        let right = edge(self.right).min(MAX_OPPOSITE_CROP - left);
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

// ─── Styles ──────────────────────────────────────────────────────────────

/// Clamp a rotation in degrees to the editor's [-180, 180] range.
pub fn clamp_rotation(deg: f32) -> f32 {
    if deg.is_finite() {
        deg.clamp(-180.0, 180.0)
    } else {
        0.0
    }
}

/// Visual attributes of an image layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageStyle {
    /// Uniform scale in percent (100 = natural size).
    pub scale: f32,
    /// 0–100.
    pub opacity: f32,
    /// Gaussian blur radius in px.
    pub blur: f32,
    /// Film-grain strength, 0–100.
    pub noise: f32,
    pub border_radius: f32,
    /// Shadow preset token (see `presets::SHADOW_PRESETS`), or `"none"`.
    pub shadow: String,
    pub rotate: f32,
    pub rotate_x: f32,
    pub rotate_y: f32,
    /// Clip-path shape token (see `presets::CLIP_PATHS`), or `"none"`.
    pub clip_path: String,
    pub flip_x: bool,
    pub flip_y: bool,
    pub crop: Crop,
}

impl Default for ImageStyle {
    fn default() -> Self {
        default_image_style()
    }
}

/// Canonical initial attributes for a freshly placed image.
pub fn default_image_style() -> ImageStyle {
    ImageStyle {
        scale: 100.0,
        opacity: 100.0,
        blur: 0.0,
        noise: 0.0,
        border_radius: 0.0,
        shadow: "none".into(),
        rotate: 0.0,
        rotate_x: 0.0,
        rotate_y: 0.0,
        clip_path: "none".into(),
        flip_x: false,
        flip_y: false,
        crop: Crop::NONE,
    }
}

/// Independent text decoration toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextEffect {
    Outline,
    Underline,
    LineThrough,
    Italic,
    Uppercase,
    SmallCaps,
    Blur,
}

/// Set of active text effects. Usually zero to three entries.
pub type TextEffects = SmallVec<[TextEffect; 4]>;

/// Visual attributes of a text layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextStyle {
    pub content: String,
    pub font_size: f32,
    pub font_family: String,
    pub font_weight: u16,
    /// CSS color string.
    pub color: String,
    /// Text-shadow preset token, or `"none"`.
    pub text_shadow: String,
    pub border_radius: f32,
    pub padding: f32,
    pub background_color: String,
    pub show_background: bool,
    pub text_effects: TextEffects,
    pub rotate: f32,
    pub rotate_x: f32,
    pub rotate_y: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        default_text_style()
    }
}

/// Canonical initial attributes for a freshly added text layer.
pub fn default_text_style() -> TextStyle {
    TextStyle {
        content: "Your text here".into(),
        font_size: 48.0,
        font_family: "Inter".into(),
        font_weight: 700,
        color: "#ffffff".into(),
        text_shadow: "none".into(),
        border_radius: 8.0,
        padding: 16.0,
        background_color: "#000000".into(),
        show_background: false,
        text_effects: TextEffects::new(),
        rotate: 0.0,
        rotate_x: 0.0,
        rotate_y: 0.0,
    }
}

impl TextStyle {
    pub fn has_effect(&self, effect: TextEffect) -> bool {
        self.text_effects.contains(&effect)
    }

    /// Flip one effect on or off, leaving the others untouched.
    pub fn toggle_effect(&mut self, effect: TextEffect) {
        if let Some(pos) = self.text_effects.iter().position(|e| *e == effect) {
            self.text_effects.remove(pos);
        } else {
            self.text_effects.push(effect);
        }
    }

    /// Content as it should be painted (uppercase effect applied).
    pub fn display_content(&self) -> String {
        if self.has_effect(TextEffect::Uppercase) {
            self.content.to_uppercase()
        } else {
            self.content.clone()
        }
    }
}

// ─── Elements ────────────────────────────────────────────────────────────

/// Discriminant of `ElementKind`, also used to key per-type editor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Image,
    Text,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Image => "image",
            ElementType::Text => "text",
        }
    }
}

/// Per-variant payload of a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    Image {
        src: String,
        #[serde(rename = "naturalWidth")]
        natural_width: f32,
        #[serde(rename = "naturalHeight")]
        natural_height: f32,
        style: ImageStyle,
    },
    Text {
        style: TextStyle,
    },
}

/// A single positioned, styled layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasElement {
    pub id: ElementId,
    pub name: String,
    pub position: Position,
    pub is_visible: bool,
    pub is_locked: bool,
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl CanvasElement {
    pub fn image(
        id: ElementId,
        name: impl Into<String>,
        src: impl Into<String>,
        natural_width: f32,
        natural_height: f32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            position: Position::default(),
            is_visible: true,
            is_locked: false,
            kind: ElementKind::Image {
                src: src.into(),
                natural_width,
                natural_height,
                style: default_image_style(),
            },
        }
    }

    pub fn text(id: ElementId, name: impl Into<String>, content: impl Into<String>) -> Self {
        let mut style = default_text_style();
        style.content = content.into();
        Self {
            id,
            name: name.into(),
            position: Position::default(),
            is_visible: true,
            is_locked: false,
            kind: ElementKind::Text { style },
        }
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn element_type(&self) -> ElementType {
        match self.kind {
            ElementKind::Image { .. } => ElementType::Image,
            ElementKind::Text { .. } => ElementType::Text,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self.kind, ElementKind::Image { .. })
    }

    pub fn image_style(&self) -> Option<&ImageStyle> {
        match &self.kind {
            ElementKind::Image { style, .. } => Some(style),
            ElementKind::Text { .. } => None,
        }
    }

    pub fn text_style(&self) -> Option<&TextStyle> {
        match &self.kind {
            ElementKind::Text { style } => Some(style),
            ElementKind::Image { .. } => None,
        }
    }

    /// Natural (unscaled) size for images; `None` for text, whose box
    /// depends on font metrics.
    pub fn natural_size(&self) -> Option<(f32, f32)> {
        match &self.kind {
            ElementKind::Image {
                natural_width,
                natural_height,
                ..
            } => Some((*natural_width, *natural_height)),
            ElementKind::Text { .. } => None,
        }
    }

    /// Pull crop and rotations back into range. Every store write of a
    /// whole element goes through here.
    pub fn normalize(&mut self) {
        match &mut self.kind {
            ElementKind::Image { style, .. } => {
                style.crop = style.crop.normalized();
                style.rotate = clamp_rotation(style.rotate);
                style.rotate_x = clamp_rotation(style.rotate_x);
                style.rotate_y = clamp_rotation(style.rotate_y);
            }
            ElementKind::Text { style } => {
                style.rotate = clamp_rotation(style.rotate);
                style.rotate_x = clamp_rotation(style.rotate_x);
                style.rotate_y = clamp_rotation(style.rotate_y);
            }
        }
    }
}

// ─── Partial updates ─────────────────────────────────────────────────────

/// Partial image style. `Some` fields overwrite, `None` fields are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageStylePatch {
    pub scale: Option<f32>,
    pub opacity: Option<f32>,
    pub blur: Option<f32>,
    pub noise: Option<f32>,
    pub border_radius: Option<f32>,
    pub shadow: Option<String>,
    pub rotate: Option<f32>,
    pub rotate_x: Option<f32>,
    pub rotate_y: Option<f32>,
    pub clip_path: Option<String>,
    pub flip_x: Option<bool>,
    pub flip_y: Option<bool>,
    pub crop: Option<Crop>,
}

impl ImageStylePatch {
    /// Merge into `dst`, clamping every field into its legal range.
    pub fn apply(&self, dst: &mut ImageStyle) {
        if let Some(v) = self.scale {
            dst.scale = v.max(1.0);
        }
        if let Some(v) = self.opacity {
            dst.opacity = v.clamp(0.0, 100.0);
        }
        if let Some(v) = self.blur {
            dst.blur = v.max(0.0);
        }
        if let Some(v) = self.noise {
            dst.noise = v.clamp(0.0, 100.0);
        }
        if let Some(v) = self.border_radius {
            dst.border_radius = v.max(0.0);
        }
        if let Some(ref v) = self.shadow {
            dst.shadow = v.clone();
        }
        if let Some(v) = self.rotate {
            dst.rotate = clamp_rotation(v);
        }
        if let Some(v) = self.rotate_x {
            dst.rotate_x = clamp_rotation(v);
        }
        if let Some(v) = self.rotate_y {
            dst.rotate_y = clamp_rotation(v);
        }
        if let Some(ref v) = self.clip_path {
            dst.clip_path = v.clone();
        }
        if let Some(v) = self.flip_x {
            dst.flip_x = v;
        }
        if let Some(v) = self.flip_y {
            dst.flip_y = v;
        }
        if let Some(v) = self.crop {
            dst.crop = v.normalized();
        }
    }
}

/// Partial text style. `Some` fields overwrite; `toggle_effect` flips one
/// effect after `text_effects` (if any) is applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextStylePatch {
    pub content: Option<String>,
    pub font_size: Option<f32>,
    pub font_family: Option<String>,
    pub font_weight: Option<u16>,
    pub color: Option<String>,
    pub text_shadow: Option<String>,
    pub border_radius: Option<f32>,
    pub padding: Option<f32>,
    pub background_color: Option<String>,
    pub show_background: Option<bool>,
    pub text_effects: Option<TextEffects>,
    pub toggle_effect: Option<TextEffect>,
    pub rotate: Option<f32>,
    pub rotate_x: Option<f32>,
    pub rotate_y: Option<f32>,
}

impl TextStylePatch {
    pub fn apply(&self, dst: &mut TextStyle) {
        if let Some(ref v) = self.content {
            dst.content = v.clone();
        }
        if let Some(v) = self.font_size {
            dst.font_size = v.max(1.0);
        }
        if let Some(ref v) = self.font_family {
            dst.font_family = v.clone();
        }
        if let Some(v) = self.font_weight {
            dst.font_weight = v.clamp(100, 900);
        }
        if let Some(ref v) = self.color {
            dst.color = v.clone();
        }
        if let Some(ref v) = self.text_shadow {
            dst.text_shadow = v.clone();
        }
        if let Some(v) = self.border_radius {
            dst.border_radius = v.max(0.0);
        }
        if let Some(v) = self.padding {
            dst.padding = v.max(0.0);
        }
        if let Some(ref v) = self.background_color {
            dst.background_color = v.clone();
        }
        if let Some(v) = self.show_background {
            dst.show_background = v;
        }
        if let Some(ref v) = self.text_effects {
            let mut effects = TextEffects::new();
            for e in v {
                if !effects.contains(e) {
                    effects.push(*e);
                }
            }
            dst.text_effects = effects;
        }
        if let Some(effect) = self.toggle_effect {
            dst.toggle_effect(effect);
        }
        if let Some(v) = self.rotate {
            dst.rotate = clamp_rotation(v);
        }
        if let Some(v) = self.rotate_x {
            dst.rotate_x = clamp_rotation(v);
        }
        if let Some(v) = self.rotate_y {
            dst.rotate_y = clamp_rotation(v);
        }
    }
}

/// A partial update to one element: either a root field or a style patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementUpdate {
    Name(String),
    Position(Position),
    Visible(bool),
    Locked(bool),
    Source {
        src: String,
        #[serde(rename = "naturalWidth")]
        natural_width: f32,
        #[serde(rename = "naturalHeight")]
        natural_height: f32,
    },
    Image(ImageStylePatch),
    Text(TextStylePatch),
}

impl ElementUpdate {
    /// Apply to `element`. Returns `false` when the update does not fit the
    /// element's variant (e.g. a text patch sent to an image).
    pub fn apply(&self, element: &mut CanvasElement) -> bool {
        match (self, &mut element.kind) {
            (ElementUpdate::Name(name), _) => element.name = name.clone(),
            (ElementUpdate::Position(pos), _) => {
                if !pos.is_finite() {
                    return false;
                }
                element.position = *pos;
            }
            (ElementUpdate::Visible(v), _) => element.is_visible = *v,
            (ElementUpdate::Locked(v), _) => element.is_locked = *v,
            (
                ElementUpdate::Source {
                    src,
                    natural_width,
                    natural_height,
                },
                ElementKind::Image {
                    src: s,
                    natural_width: w,
                    natural_height: h,
                    ..
                },
            ) => {
                *s = src.clone();
                *w = *natural_width;
                *h = *natural_height;
            }
            (ElementUpdate::Image(patch), ElementKind::Image { style, .. }) => patch.apply(style),
            (ElementUpdate::Text(patch), ElementKind::Text { style }) => patch.apply(style),
            _ => return false,
        }
        true
    }
}

// ─── Document ────────────────────────────────────────────────────────────

/// Named canvas size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectRatio {
    pub name: String,
    pub width: f32,
    pub height: f32,
}

/// Smallest and largest custom canvas edge, in document units.
pub const MIN_CANVAS_EDGE: f32 = 16.0;
pub const MAX_CANVAS_EDGE: f32 = 8192.0;

impl AspectRatio {
    pub fn new(name: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
        }
    }

    /// A custom size, clamped to the supported canvas range.
    pub fn custom(width: f32, height: f32) -> Self {
        let edge = |v: f32| {
            if v.is_finite() {
                v.clamp(MIN_CANVAS_EDGE, MAX_CANVAS_EDGE)
            } else {
                MIN_CANVAS_EDGE
            }
        };
        Self::new("custom", edge(width), edge(height))
    }

    /// Look up a preset by name (see `presets::ASPECT_RATIOS`).
    pub fn preset(name: &str) -> Option<Self> {
        crate::presets::ASPECT_RATIOS
            .iter()
            .find(|(n, _, _)| *n == name)
            .map(|(n, w, h)| Self::new(*n, *w, *h))
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::new("1:1", 1080.0, 1080.0)
    }
}

/// Output encoding for export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
    Svg,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpeg",
            ExportFormat::Svg => "svg",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
            ExportFormat::Svg => "image/svg+xml",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "png" => Some(ExportFormat::Png),
            "jpeg" | "jpg" => Some(ExportFormat::Jpeg),
            "svg" => Some(ExportFormat::Svg),
            _ => None,
        }
    }
}

/// Z-order step for `reorder`. The layer panel lists layers in reverse array
/// order, so `Up` moves toward the end of the array (painted later).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReorderDirection {
    Up,
    Down,
    Top,
    Bottom,
}

/// The full editable scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorDocument {
    pub aspect_ratio: AspectRatio,
    /// Background descriptor: a CSS color, gradient, or `url(...)`.
    pub background: String,
    pub elements: Vec<CanvasElement>,
    pub selected_element_id: Option<ElementId>,
    pub is_cropping: bool,
    pub export_format: ExportFormat,
    /// 0.1 – 1.0, used by lossy formats.
    pub export_quality: f32,
}

pub const DEFAULT_BACKGROUND: &str = "#ffffff";
pub const DEFAULT_EXPORT_QUALITY: f32 = 0.95;

impl Default for EditorDocument {
    fn default() -> Self {
        Self::new(AspectRatio::default(), DEFAULT_BACKGROUND)
    }
}

impl EditorDocument {
    pub fn new(aspect_ratio: AspectRatio, background: impl Into<String>) -> Self {
        Self {
            aspect_ratio,
            background: background.into(),
            elements: Vec::new(),
            selected_element_id: None,
            is_cropping: false,
            export_format: ExportFormat::Png,
            export_quality: DEFAULT_EXPORT_QUALITY,
        }
    }

    pub fn width(&self) -> f32 {
        self.aspect_ratio.width
    }

    pub fn height(&self) -> f32 {
        self.aspect_ratio.height
    }

    pub fn center(&self) -> Position {
        Position::new(self.width() / 2.0, self.height() / 2.0)
    }

    pub fn index_of(&self, id: ElementId) -> Option<usize> {
        self.elements.iter().position(|e| e.id == id)
    }

    /// Ordinal position within the layer sequence (0 = bottom).
    pub fn z_index_of(&self, id: ElementId) -> Option<usize> {
        self.index_of(id)
    }

    pub fn get(&self, id: ElementId) -> Option<&CanvasElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut CanvasElement> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn selected(&self) -> Option<&CanvasElement> {
        self.selected_element_id.and_then(|id| self.get(id))
    }

    pub fn is_selected(&self, id: ElementId) -> bool {
        self.selected_element_id == Some(id)
    }

    /// Number of layers of the given type (used for default names).
    pub fn count_of(&self, kind: ElementType) -> usize {
        self.elements
            .iter()
            .filter(|e| e.element_type() == kind)
            .count()
    }
}
