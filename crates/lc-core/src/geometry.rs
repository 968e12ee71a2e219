//! Pure placement and crop math.
//!
//! Crop values are percentages of the image's own box. The visible region
//! is rendered by insetting a clipping container by the crop edges and
//! drawing the full image inside it, scaled up by the inverse of the
//! visible fraction so the visible pixels keep their on-screen size.

use crate::model::{Crop, MIN_VISIBLE_PCT, Position};
use serde::{Deserialize, Serialize};

// ─── Visible crop region ─────────────────────────────────────────────────

/// How to lay out a cropped image: the inner content box (percent of the
/// container) and its offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleCropRegion {
    pub width_factor: f32,
    pub height_factor: f32,
    /// Inner content width as a percent of the clipping container.
    pub inner_width_pct: f32,
    pub inner_height_pct: f32,
    /// Inner content offset (percent of the container), negative when cropped.
    pub offset_left_pct: f32,
    pub offset_top_pct: f32,
    /// Container inset from the element box, in percent.
    pub inset: Crop,
}

pub fn compute_visible_crop_region(crop: &Crop) -> VisibleCropRegion {
    let width_factor = 100.0 / (100.0 - crop.left - crop.right).max(1.0);
    let height_factor = 100.0 / (100.0 - crop.top - crop.bottom).max(1.0);
    VisibleCropRegion {
        width_factor,
        height_factor,
        inner_width_pct: width_factor * 100.0,
        inner_height_pct: height_factor * 100.0,
        offset_left_pct: crop.left * -width_factor,
        offset_top_pct: crop.top * -height_factor,
        inset: *crop,
    }
}

// ─── Crop handles ────────────────────────────────────────────────────────

/// Clamp one crop edge after a delta so the opposite edge keeps at least
/// `MIN_VISIBLE_PCT` visible.
pub fn clamp_crop_edge(current: f32, delta: f32, opposite: f32) -> f32 {
    let max = (100.0 - opposite - MIN_VISIBLE_PCT).max(0.0);
    (current + delta).clamp(0.0, max)
}

/// One of the eight resize handles shown while cropping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CropHandle {
    Top,
    Right,
    Bottom,
    Left,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Which crop edges a handle moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HandleEdges {
    pub top: bool,
    pub right: bool,
    pub bottom: bool,
    pub left: bool,
}

impl CropHandle {
    pub const ALL: [CropHandle; 8] = [
        CropHandle::Top,
        CropHandle::Right,
        CropHandle::Bottom,
        CropHandle::Left,
        CropHandle::TopLeft,
        CropHandle::TopRight,
        CropHandle::BottomLeft,
        CropHandle::BottomRight,
    ];

    pub fn edges(&self) -> HandleEdges {
        let mut e = HandleEdges::default();
        match self {
            CropHandle::Top => e.top = true,
            CropHandle::Right => e.right = true,
            CropHandle::Bottom => e.bottom = true,
            CropHandle::Left => e.left = true,
            CropHandle::TopLeft => (e.top, e.left) = (true, true),
            CropHandle::TopRight => (e.top, e.right) = (true, true),
            CropHandle::BottomLeft => (e.bottom, e.left) = (true, true),
            CropHandle::BottomRight => (e.bottom, e.right) = (true, true),
        }
        e
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "top" | "t" => Some(CropHandle::Top),
            "right" | "r" => Some(CropHandle::Right),
            "bottom" | "b" => Some(CropHandle::Bottom),
            "left" | "l" => Some(CropHandle::Left),
            "top-left" | "tl" => Some(CropHandle::TopLeft),
            "top-right" | "tr" => Some(CropHandle::TopRight),
            "bottom-left" | "bl" => Some(CropHandle::BottomLeft),
            "bottom-right" | "br" => Some(CropHandle::BottomRight),
            _ => None,
        }
    }
}

/// New crop for a handle dragged by `(dx_pct, dy_pct)` from `start`.
///
/// Left/top edges follow the pointer, right/bottom edges move against it:
/// dragging the right handle leftward (negative `dx_pct`) grows `right`.
/// Corner handles apply two independent edge clamps.
pub fn apply_crop_drag(start: &Crop, handle: CropHandle, dx_pct: f32, dy_pct: f32) -> Crop {
    let e = handle.edges();
    let mut out = *start;
    if e.left {
        out.left = clamp_crop_edge(start.left, dx_pct, start.right);
    }
    if e.right {
        out.right = clamp_crop_edge(start.right, -dx_pct, start.left);
    }
    if e.top {
        out.top = clamp_crop_edge(start.top, dy_pct, start.bottom);
    }
    if e.bottom {
        out.bottom = clamp_crop_edge(start.bottom, -dy_pct, start.top);
    }
    out
}

// ─── Placement ───────────────────────────────────────────────────────────

/// Initial scale percent for a new image: fit within the canvas, never
/// upscale, then leave a 10% margin.
pub fn fit_scale(natural: (f32, f32), canvas: (f32, f32)) -> f32 {
    let (nw, nh) = natural;
    let (cw, ch) = canvas;
    if nw <= 0.0 || nh <= 0.0 {
        return 90.0;
    }
    (cw / nw).min(ch / nh).min(1.0) * 90.0
}

/// Top-left that puts the center of an unscaled `natural` box at the
/// canvas center.
pub fn centered_position(natural: (f32, f32), canvas: (f32, f32)) -> Position {
    Position::new((canvas.0 - natural.0) / 2.0, (canvas.1 - natural.1) / 2.0)
}

/// Font-metric-free text width estimate.
pub fn approx_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * 0.55
}
