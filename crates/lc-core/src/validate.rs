//! Structural diagnostics for LayerCraft documents.
//!
//! Reports invariant violations without modifying the document. Loading
//! rejects documents with any `Error` finding; `Warning`s are logged.

use crate::background::Background;
use crate::id::ElementId;
use crate::model::{EditorDocument, ElementKind};
use std::collections::HashSet;

// ─── Diagnostic types ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The document breaks an invariant and cannot be edited safely.
    Error,
    Warning,
}

/// A single finding.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// The element this diagnostic refers to, if any.
    pub element_id: Option<ElementId>,
    pub message: String,
    pub severity: Severity,
    /// Short rule identifier (e.g. "duplicate-id", "crop-range").
    pub rule: &'static str,
}

impl Diagnostic {
    fn error(element_id: Option<ElementId>, rule: &'static str, message: String) -> Self {
        Self {
            element_id,
            message,
            severity: Severity::Error,
            rule,
        }
    }

    fn warning(element_id: Option<ElementId>, rule: &'static str, message: String) -> Self {
        Self {
            element_id,
            message,
            severity: Severity::Warning,
            rule,
        }
    }
}

// ─── Public API ───────────────────────────────────────────────────────────

/// Run every rule over `doc`.
#[must_use]
pub fn validate_document(doc: &EditorDocument) -> Vec<Diagnostic> {
    let mut diags = Vec::new();
    check_duplicate_ids(doc, &mut diags);
    check_crops(doc, &mut diags);
    check_positions(doc, &mut diags);
    check_selection(doc, &mut diags);
    check_background(doc, &mut diags);
    diags
}

pub fn has_errors(diags: &[Diagnostic]) -> bool {
    diags.iter().any(|d| d.severity == Severity::Error)
}

// ─── Rules ────────────────────────────────────────────────────────────────

fn check_duplicate_ids(doc: &EditorDocument, diags: &mut Vec<Diagnostic>) {
    let mut seen = HashSet::new();
    for el in &doc.elements {
        if !seen.insert(el.id) {
            diags.push(Diagnostic::error(
                Some(el.id),
                "duplicate-id",
                format!("Element id `{}` appears more than once.", el.id),
            ));
        }
    }
}

fn check_crops(doc: &EditorDocument, diags: &mut Vec<Diagnostic>) {
    for el in &doc.elements {
        if let ElementKind::Image { style, .. } = &el.kind
            && !style.crop.is_valid()
        {
            diags.push(Diagnostic::error(
                Some(el.id),
                "crop-range",
                format!(
                    "Crop on `{}` leaves less than 5% visible or is out of range: {:?}",
                    el.id, style.crop
                ),
            ));
        }
    }
}

fn check_positions(doc: &EditorDocument, diags: &mut Vec<Diagnostic>) {
    for el in &doc.elements {
        if !el.position.is_finite() {
            diags.push(Diagnostic::error(
                Some(el.id),
                "position",
                format!("Element `{}` has a non-finite position.", el.id),
            ));
        }
    }
}

fn check_selection(doc: &EditorDocument, diags: &mut Vec<Diagnostic>) {
    let Some(sel) = doc.selected_element_id else {
        if doc.is_cropping {
            diags.push(Diagnostic::warning(
                None,
                "crop-without-selection",
                "Crop mode is on with nothing selected.".into(),
            ));
        }
        return;
    };
    match doc.get(sel) {
        None => diags.push(Diagnostic::warning(
            Some(sel),
            "dangling-selection",
            format!("Selection `{sel}` does not name an element."),
        )),
        Some(el) if doc.is_cropping && !el.is_image() => diags.push(Diagnostic::warning(
            Some(sel),
            "crop-on-text",
            format!("Crop mode is on but `{sel}` is not an image."),
        )),
        Some(_) => {}
    }
}

fn check_background(doc: &EditorDocument, diags: &mut Vec<Diagnostic>) {
    if let Background::Unknown(raw) = Background::parse(&doc.background) {
        diags.push(Diagnostic::warning(
            None,
            "background",
            format!("Background `{raw}` is not recognized and paints as white."),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CanvasElement, Crop, ElementUpdate, ImageStylePatch};

    fn image(id: &str) -> CanvasElement {
        CanvasElement::image(ElementId::intern(id), "Image", "a.png", 100.0, 100.0)
    }

    #[test]
    fn clean_document_has_no_findings() {
        let mut doc = EditorDocument::default();
        doc.elements.push(image("v_clean"));
        assert!(validate_document(&doc).is_empty());
    }

    #[test]
    fn duplicate_ids_are_errors() {
        let mut doc = EditorDocument::default();
        doc.elements.push(image("v_dup"));
        doc.elements.push(image("v_dup"));
        let diags = validate_document(&doc);
        assert!(has_errors(&diags));
        assert_eq!(diags[0].rule, "duplicate-id");
    }

    #[test]
    fn bad_crop_is_error_until_normalized() {
        let mut el = image("v_crop");
        if let ElementKind::Image { style, .. } = &mut el.kind {
            style.crop = Crop::new(50.0, 0.0, 50.0, 0.0);
        }
        let mut doc = EditorDocument::default();
        doc.elements.push(el);
        assert!(has_errors(&validate_document(&doc)));

        let id = doc.elements[0].id;
        ElementUpdate::Image(ImageStylePatch {
            crop: Some(Crop::new(50.0, 0.0, 50.0, 0.0)),
            ..Default::default()
        })
        .apply(doc.get_mut(id).unwrap());
        assert!(!has_errors(&validate_document(&doc)));
    }

    #[test]
    fn dangling_selection_warns() {
        let mut doc = EditorDocument::default();
        doc.selected_element_id = Some(ElementId::intern("v_ghost"));
        let diags = validate_document(&doc);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Warning);
    }
}
