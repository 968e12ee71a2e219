//! Bringing new layers into a document.
//!
//! Uploaded bytes are sniffed for their natural size with the `image` crate
//! (header only, no full decode) and embedded as a data url. Hosts that
//! decode images themselves, and gallery picks, supply the dimensions
//! directly. Either way the new layer is centered on the canvas and scaled
//! to fit with a margin.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::ImageReader;
use lc_core::geometry::{approx_text_width, centered_position, fit_scale};
use lc_core::id::ElementId;
use lc_core::model::{CanvasElement, EditorDocument, ElementKind, ElementType, Position};
use lc_core::records::GalleryItem;
use std::io::Cursor;

#[derive(thiserror::Error, Debug)]
pub enum IngestError {
    #[error("could not read image: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("unrecognized image format")]
    UnknownFormat,
    #[error("image has no area ({width}x{height})")]
    EmptyImage { width: f32, height: f32 },
    #[error("image source is empty")]
    EmptySource,
}

/// Natural size of an encoded image and its mime type.
pub fn sniff(bytes: &[u8]) -> Result<((u32, u32), &'static str), IngestError> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let Some(format) = reader.format() else {
        return Err(IngestError::UnknownFormat);
    };
    let dims = reader.into_dimensions()?;
    Ok((dims, format.to_mime_type()))
}

/// A new image layer built from raw upload bytes.
pub fn image_from_bytes(doc: &EditorDocument, bytes: &[u8]) -> Result<CanvasElement, IngestError> {
    let ((w, h), mime) = sniff(bytes)?;
    let src = format!("data:{mime};base64,{}", STANDARD.encode(bytes));
    log::debug!("sniffed {mime} upload: {w}x{h}");
    place_image(doc, src, w as f32, h as f32)
}

/// A new image layer for a gallery pick whose size the host resolved.
pub fn image_from_gallery(
    doc: &EditorDocument,
    item: &GalleryItem,
    natural_width: f32,
    natural_height: f32,
) -> Result<CanvasElement, IngestError> {
    let mut el = place_image(doc, item.url.clone(), natural_width, natural_height)?;
    if !item.name.trim().is_empty() {
        el.name = item.name.clone();
    }
    Ok(el)
}

/// Centered, fit-scaled image layer named `Image <n>`.
pub fn place_image(
    doc: &EditorDocument,
    src: String,
    natural_width: f32,
    natural_height: f32,
) -> Result<CanvasElement, IngestError> {
    if src.trim().is_empty() {
        return Err(IngestError::EmptySource);
    }
    let valid = |v: f32| v.is_finite() && v > 0.0;
    if !valid(natural_width) || !valid(natural_height) {
        return Err(IngestError::EmptyImage {
            width: natural_width,
            height: natural_height,
        });
    }
    let natural = (natural_width, natural_height);
    let canvas = (doc.width(), doc.height());
    let name = format!("Image {}", doc.count_of(ElementType::Image) + 1);
    let mut el = CanvasElement::image(ElementId::fresh(ElementType::Image), name, src, natural_width, natural_height)
        .with_position(centered_position(natural, canvas));
    if let ElementKind::Image { style, .. } = &mut el.kind {
        style.scale = fit_scale(natural, canvas);
    }
    Ok(el)
}

/// Default text layer named `Text <n>`, roughly centered.
pub fn place_text(doc: &EditorDocument) -> CanvasElement {
    let name = format!("Text {}", doc.count_of(ElementType::Text) + 1);
    let mut el = CanvasElement::text(ElementId::fresh(ElementType::Text), name, "Your text here");
    if let Some(style) = el.text_style() {
        let w = approx_text_width(&style.content, style.font_size) + style.padding * 2.0;
        let h = style.font_size * 1.2 + style.padding * 2.0;
        let center = doc.center();
        el.position = Position::new(center.x - w / 2.0, center.y - h / 2.0);
    }
    el
}
