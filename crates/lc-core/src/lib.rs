pub mod background;
pub mod color;
pub mod geometry;
pub mod id;
pub mod model;
pub mod persist;
pub mod presets;
pub mod records;
pub mod validate;

pub use background::{Background, is_flat, parse_color};
pub use color::Color;
pub use geometry::{
    CropHandle, VisibleCropRegion, apply_crop_drag, approx_text_width, centered_position,
    clamp_crop_edge, compute_visible_crop_region, fit_scale,
};
pub use id::ElementId;
pub use model::*;
pub use persist::PersistError;
pub use records::{GalleryItem, PostMedia, PostStatus, ScheduledPost};
pub use validate::{Diagnostic, Severity, validate_document};
