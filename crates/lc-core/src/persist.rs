//! Document save/load.
//!
//! JSON for human-readable saves and the host bridge, MessagePack for
//! compact binary saves. Loading validates and refuses documents that
//! break an invariant.

use crate::model::EditorDocument;
use crate::validate::{Diagnostic, Severity, has_errors, validate_document};

#[derive(thiserror::Error, Debug)]
pub enum PersistError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("msgpack encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("msgpack decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
    #[error("invalid document: {}", summarize(.0))]
    Invalid(Vec<Diagnostic>),
}

fn summarize(diags: &[Diagnostic]) -> String {
    diags
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .map(|d| d.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type PersistResult<T> = Result<T, PersistError>;

pub fn to_json(doc: &EditorDocument) -> PersistResult<String> {
    Ok(serde_json::to_string_pretty(doc)?)
}

pub fn from_json(text: &str) -> PersistResult<EditorDocument> {
    checked(serde_json::from_str(text)?)
}

pub fn to_msgpack(doc: &EditorDocument) -> PersistResult<Vec<u8>> {
    Ok(rmp_serde::to_vec_named(doc)?)
}

pub fn from_msgpack(bytes: &[u8]) -> PersistResult<EditorDocument> {
    checked(rmp_serde::from_slice(bytes)?)
}

fn checked(doc: EditorDocument) -> PersistResult<EditorDocument> {
    let diags = validate_document(&doc);
    if has_errors(&diags) {
        return Err(PersistError::Invalid(diags));
    }
    for d in &diags {
        log::warn!("loaded document: {} ({})", d.message, d.rule);
    }
    log::debug!("loaded document with {} elements", doc.elements.len());
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ElementId;
    use crate::model::{CanvasElement, Position, TextEffect};
    use pretty_assertions::assert_eq;

    fn sample() -> EditorDocument {
        let mut doc = EditorDocument::default();
        doc.background = "linear-gradient(135deg, #667eea, #764ba2)".into();
        doc.elements.push(
            CanvasElement::image(ElementId::intern("p_img"), "Image 1", "a.png", 640.0, 480.0)
                .with_position(Position::new(220.0, 300.0)),
        );
        let mut text = CanvasElement::text(ElementId::intern("p_txt"), "Text 1", "Hello");
        if let crate::model::ElementKind::Text { style } = &mut text.kind {
            style.toggle_effect(TextEffect::Underline);
        }
        doc.elements.push(text);
        doc.selected_element_id = Some(ElementId::intern("p_txt"));
        doc
    }

    #[test]
    fn json_save_and_load() {
        let doc = sample();
        let text = to_json(&doc).unwrap();
        assert!(text.contains("\"selectedElementId\": \"p_txt\""));
        assert_eq!(from_json(&text).unwrap(), doc);
    }

    #[test]
    fn msgpack_save_and_load() {
        let doc = sample();
        let bytes = to_msgpack(&doc).unwrap();
        assert_eq!(from_msgpack(&bytes).unwrap(), doc);
    }

    #[test]
    fn load_rejects_duplicate_ids() {
        let mut doc = sample();
        let dup = doc.elements[0].clone();
        doc.elements.push(dup);
        let text = serde_json::to_string(&doc).unwrap();
        let err = from_json(&text).unwrap_err();
        assert!(matches!(err, PersistError::Invalid(_)));
        assert!(err.to_string().contains("p_img"));
    }

    #[test]
    fn load_rejects_malformed_json() {
        assert!(matches!(from_json("{"), Err(PersistError::Json(_))));
    }
}
