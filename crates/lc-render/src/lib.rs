pub mod capture;
pub mod context;
pub mod css;
pub mod error;
pub mod export;
pub mod paint;
pub mod svg;

pub use capture::{CaptureRequest, SceneCapture, capture_with_retry};
pub use context::{DrawContext, DrawOp, RasterSurface, Recorder, ShadowSpec};
pub use css::{LayerCss, scene_css};
pub use error::{RenderError, RenderResult};
pub use export::{ExportBlob, ExportOptions, ExportPayload, PixelRatio};
pub use paint::{export_manual, export_manual_with, paint_document};
pub use svg::SvgSurface;
