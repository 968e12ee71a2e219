//! Whole-scene capture with a single degraded retry.
//!
//! The host photographs its live styled scene (see `css`) through a
//! `SceneCapture` collaborator. Large pixel ratios can exhaust the host's
//! canvas limits, so a failed attempt is retried once at `ratio - 1`.

use crate::error::{RenderError, RenderResult};
use crate::export::{ExportBlob, ExportOptions, ExportPayload, reduced_ratio};
use lc_core::background::Background;
use lc_core::model::{EditorDocument, ExportFormat};
use serde::Serialize;

/// One capture attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRequest {
    /// Logical size of the scene.
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: u32,
    pub format: ExportFormat,
    pub quality: f32,
    /// Only set for flat backgrounds; gradients and images are part of the
    /// captured scene itself.
    pub background_color: Option<String>,
}

pub trait SceneCapture {
    fn capture(&mut self, request: &CaptureRequest) -> RenderResult<ExportPayload>;
}

impl<F> SceneCapture for F
where
    F: FnMut(&CaptureRequest) -> RenderResult<ExportPayload>,
{
    fn capture(&mut self, request: &CaptureRequest) -> RenderResult<ExportPayload> {
        self(request)
    }
}

pub fn capture_request(doc: &EditorDocument, options: &ExportOptions, pixel_ratio: u32) -> CaptureRequest {
    CaptureRequest {
        width: doc.width().round() as u32,
        height: doc.height().round() as u32,
        pixel_ratio,
        format: options.format,
        quality: options.quality.clamp(0.1, 1.0),
        background_color: Background::parse(&doc.background)
            .is_flat()
            .then(|| doc.background.trim().to_string()),
    }
}

/// Capture `doc` (which the caller has already deselected). Tries the
/// requested ratio, then once more at `max(1, ratio - 1)`.
pub fn capture_with_retry(
    capture: &mut dyn SceneCapture,
    doc: &EditorDocument,
    options: &ExportOptions,
) -> RenderResult<ExportBlob> {
    let ratio = options.pixel_ratio.value();
    let first = capture.capture(&capture_request(doc, options, ratio));
    let payload = match first {
        Ok(p) => p,
        Err(e) => {
            let retry = reduced_ratio(ratio);
            log::warn!("scene capture at {ratio}x failed ({e}); retrying at {retry}x");
            capture
                .capture(&capture_request(doc, options, retry))
                .map_err(|e| RenderError::CaptureFailed {
                    attempts: 2,
                    reason: e.to_string(),
                })?
        }
    };
    log::debug!("captured scene as {}", options.filename());
    Ok(ExportBlob::new(options, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::PixelRatio;

    #[test]
    fn flat_background_is_forwarded() {
        let doc = EditorDocument::default();
        let req = capture_request(&doc, &ExportOptions::default(), 1);
        assert_eq!(req.background_color.as_deref(), Some("#ffffff"));

        let mut doc = EditorDocument::default();
        doc.background = "linear-gradient(#000, #fff)".into();
        let req = capture_request(&doc, &ExportOptions::default(), 1);
        assert_eq!(req.background_color, None);
    }

    #[test]
    fn failure_at_4x_retries_once_at_3x() {
        let doc = EditorDocument::default();
        let opts = ExportOptions {
            pixel_ratio: PixelRatio::X4,
            ..Default::default()
        };
        let mut seen = Vec::new();
        let mut cap = |req: &CaptureRequest| -> RenderResult<ExportPayload> {
            seen.push(req.pixel_ratio);
            if req.pixel_ratio == 4 {
                Err(RenderError::surface("canvas too large"))
            } else {
                Ok(ExportPayload::Bytes(vec![1, 2, 3]))
            }
        };
        let blob = capture_with_retry(&mut cap, &doc, &opts).unwrap();
        assert_eq!(seen, vec![4, 3]);
        assert_eq!(blob.filename, "layercraft-export.png");
    }

    #[test]
    fn second_failure_is_terminal() {
        let doc = EditorDocument::default();
        let mut calls = 0;
        let mut cap = |_: &CaptureRequest| -> RenderResult<ExportPayload> {
            calls += 1;
            Err(RenderError::surface("tainted canvas"))
        };
        let err = capture_with_retry(&mut cap, &doc, &ExportOptions::default()).unwrap_err();
        assert_eq!(calls, 2);
        assert!(matches!(err, RenderError::CaptureFailed { attempts: 2, .. }));
    }
}
