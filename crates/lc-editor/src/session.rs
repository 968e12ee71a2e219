//! Pointer interaction state machine.
//!
//! The session turns pointer events into `SessionAction`s for the editor to
//! apply. It reads the document but never writes it. Client coordinates go
//! through a `CoordinateMapper`; crop-handle deltas stay in client space
//! because they are measured against the handle's on-screen ghost box.
//!
//! ```text
//!  Idle ──down(element, unlocked)──▶ Dragging ──up/cancel──▶ Idle
//!   │
//!   └──down(crop handle, cropping)──▶ CroppingEdge ──up/cancel──▶ Idle
//! ```

use crate::input::InputEvent;
use lc_core::geometry::{CropHandle, apply_crop_drag};
use lc_core::id::ElementId;
use lc_core::model::{Bounds, Crop, EditorDocument, Position};

// ─── Host seams ──────────────────────────────────────────────────────────

/// Maps client (viewport) pixels to document units.
///
/// `logical_width` is the document's current canvas width, read at every
/// event so a canvas resize never leaves the mapping stale.
pub trait CoordinateMapper {
    fn to_document(&self, client_x: f32, client_y: f32, logical_width: f32) -> Position;
}

/// The canvas element is rendered `rendered_width` CSS pixels wide with its
/// top-left at `origin`. `None` means shown at logical size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportMapper {
    pub origin_x: f32,
    pub origin_y: f32,
    pub rendered_width: Option<f32>,
}

impl ViewportMapper {
    pub fn new(origin_x: f32, origin_y: f32, rendered_width: f32) -> Self {
        Self {
            origin_x,
            origin_y,
            rendered_width: Some(rendered_width),
        }
    }

    pub fn identity() -> Self {
        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            rendered_width: None,
        }
    }

    /// Rendered pixels per document unit.
    pub fn scale(&self, logical_width: f32) -> f32 {
        let Some(rendered) = self.rendered_width else {
            return 1.0;
        };
        let s = rendered / logical_width;
        if s.is_finite() && s > 0.0 { s } else { 1.0 }
    }
}

impl CoordinateMapper for ViewportMapper {
    fn to_document(&self, client_x: f32, client_y: f32, logical_width: f32) -> Position {
        let s = self.scale(logical_width);
        Position::new((client_x - self.origin_x) / s, (client_y - self.origin_y) / s)
    }
}

/// Host pointer capture. The session acquires once per gesture and
/// releases exactly once.
pub trait PointerCapture {
    fn acquire(&mut self, pointer_id: i32);
    fn release(&mut self, pointer_id: i32);
}

/// Capture that does nothing, for hosts without the concept.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCapture;

impl PointerCapture for NoCapture {
    fn acquire(&mut self, _pointer_id: i32) {}
    fn release(&mut self, _pointer_id: i32) {}
}

// ─── State ───────────────────────────────────────────────────────────────

/// What the host hit-tested under a pointer-down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerTarget {
    Element(ElementId),
    /// One of the eight crop handles, with the client-space box of the
    /// crop ghost it belongs to.
    CropHandle {
        element: ElementId,
        handle: CropHandle,
        ghost: Bounds,
    },
    /// Empty canvas.
    Canvas,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Dragging {
        element: ElementId,
        pointer_id: i32,
        /// Document-space pointer minus element position at drag start.
        offset: Position,
    },
    CroppingEdge {
        element: ElementId,
        pointer_id: i32,
        handle: CropHandle,
        start_crop: Crop,
        start_pointer: (f32, f32),
        ghost: Bounds,
    },
}

/// Document writes requested by the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    Select(Option<ElementId>),
    /// Live drag write; never recorded in history.
    MoveElement { id: ElementId, position: Position },
    /// Intermediate crop during a handle drag.
    SetCrop { id: ElementId, crop: Crop },
}

pub struct InteractionSession {
    state: SessionState,
    mapper: Box<dyn CoordinateMapper>,
    capture: Box<dyn PointerCapture>,
}

impl Default for InteractionSession {
    fn default() -> Self {
        Self::new(Box::new(ViewportMapper::identity()), Box::new(NoCapture))
    }
}

impl InteractionSession {
    pub fn new(mapper: Box<dyn CoordinateMapper>, capture: Box<dyn PointerCapture>) -> Self {
        Self {
            state: SessionState::Idle,
            mapper,
            capture,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SessionState::Idle
    }

    /// Whether the gesture in progress acts on `id`.
    pub fn targets(&self, id: ElementId) -> bool {
        match self.state {
            SessionState::Dragging { element, .. } | SessionState::CroppingEdge { element, .. } => element == id,
            SessionState::Idle => false,
        }
    }

    /// Swap the mapper, e.g. after the canvas moved or was resized on screen.
    pub fn set_mapper(&mut self, mapper: Box<dyn CoordinateMapper>) {
        self.mapper = mapper;
    }

    pub fn set_capture(&mut self, capture: Box<dyn PointerCapture>) {
        self.end_gesture();
        self.capture = capture;
    }

    /// Dispatch a pointer event. `target` is only consulted on pointer-down.
    pub fn handle(
        &mut self,
        doc: &EditorDocument,
        event: &InputEvent,
        target: PointerTarget,
    ) -> Vec<SessionAction> {
        match *event {
            InputEvent::PointerDown {
                pointer_id,
                client_x,
                client_y,
            } => self.pointer_down(doc, pointer_id, client_x, client_y, target),
            InputEvent::PointerMove {
                pointer_id,
                client_x,
                client_y,
            } => self.pointer_move(doc, pointer_id, client_x, client_y),
            InputEvent::PointerUp { pointer_id, .. } | InputEvent::PointerCancel { pointer_id } => {
                self.pointer_up(pointer_id);
                Vec::new()
            }
            InputEvent::Key { .. } => Vec::new(),
        }
    }

    pub fn pointer_down(
        &mut self,
        doc: &EditorDocument,
        pointer_id: i32,
        client_x: f32,
        client_y: f32,
        target: PointerTarget,
    ) -> Vec<SessionAction> {
        if !self.is_idle() {
            log::trace!("pointer {pointer_id} down ignored: gesture in progress");
            return Vec::new();
        }
        match target {
            PointerTarget::Canvas => {
                if doc.selected_element_id.is_some() {
                    vec![SessionAction::Select(None)]
                } else {
                    Vec::new()
                }
            }
            PointerTarget::Element(id) => {
                let Some(el) = doc.get(id) else {
                    return Vec::new();
                };
                let mut actions = Vec::new();
                if !doc.is_selected(id) {
                    actions.push(SessionAction::Select(Some(id)));
                }
                if el.is_locked {
                    log::trace!("{id} is locked; no drag");
                    return actions;
                }
                let p = self.mapper.to_document(client_x, client_y, doc.width());
                let offset = Position::new(p.x - el.position.x, p.y - el.position.y);
                self.capture.acquire(pointer_id);
                self.state = SessionState::Dragging {
                    element: id,
                    pointer_id,
                    offset,
                };
                log::debug!("drag start {id}");
                actions
            }
            PointerTarget::CropHandle {
                element,
                handle,
                ghost,
            } => {
                if !doc.is_cropping {
                    return Vec::new();
                }
                let Some(style) = doc.get(element).and_then(|e| e.image_style()) else {
                    return Vec::new();
                };
                if ghost.width <= 0.0 || ghost.height <= 0.0 {
                    log::warn!("crop ghost for {element} has no area");
                    return Vec::new();
                }
                self.capture.acquire(pointer_id);
                self.state = SessionState::CroppingEdge {
                    element,
                    pointer_id,
                    handle,
                    start_crop: style.crop,
                    start_pointer: (client_x, client_y),
                    ghost,
                };
                log::debug!("crop start {element} {handle:?}");
                Vec::new()
            }
        }
    }

    pub fn pointer_move(
        &mut self,
        doc: &EditorDocument,
        pointer_id: i32,
        client_x: f32,
        client_y: f32,
    ) -> Vec<SessionAction> {
        match self.state {
            SessionState::Dragging {
                element,
                pointer_id: active,
                offset,
            } if active == pointer_id => {
                if !doc.contains(element) {
                    self.end_gesture();
                    return Vec::new();
                }
                let p = self.mapper.to_document(client_x, client_y, doc.width());
                let position = Position::new(p.x - offset.x, p.y - offset.y);
                log::trace!("drag {element} -> ({}, {})", position.x, position.y);
                vec![SessionAction::MoveElement {
                    id: element,
                    position,
                }]
            }
            SessionState::CroppingEdge {
                element,
                pointer_id: active,
                handle,
                start_crop,
                start_pointer,
                ghost,
            } if active == pointer_id => {
                if !doc.contains(element) {
                    self.end_gesture();
                    return Vec::new();
                }
                let dx_pct = (client_x - start_pointer.0) / ghost.width * 100.0;
                let dy_pct = (client_y - start_pointer.1) / ghost.height * 100.0;
                let crop = apply_crop_drag(&start_crop, handle, dx_pct, dy_pct);
                log::trace!("crop {element} -> {crop:?}");
                vec![SessionAction::SetCrop { id: element, crop }]
            }
            _ => Vec::new(),
        }
    }

    /// End the gesture owned by `pointer_id`. Other pointers are ignored.
    pub fn pointer_up(&mut self, pointer_id: i32) {
        let active = match self.state {
            SessionState::Dragging { pointer_id, .. }
            | SessionState::CroppingEdge { pointer_id, .. } => pointer_id,
            SessionState::Idle => return,
        };
        if active == pointer_id {
            self.end_gesture();
        }
    }

    /// Drop any gesture, releasing capture if one was held.
    pub fn end_gesture(&mut self) {
        match std::mem::take(&mut self.state) {
            SessionState::Dragging { pointer_id, .. }
            | SessionState::CroppingEdge { pointer_id, .. } => {
                self.capture.release(pointer_id);
                log::debug!("gesture end (pointer {pointer_id})");
            }
            SessionState::Idle => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lc_core::model::{CanvasElement, ElementUpdate, ImageStylePatch, MAX_OPPOSITE_CROP};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct CaptureLog(Rc<RefCell<Vec<String>>>);

    impl PointerCapture for CaptureLog {
        fn acquire(&mut self, pointer_id: i32) {
            self.0.borrow_mut().push(format!("acquire {pointer_id}"));
        }
        fn release(&mut self, pointer_id: i32) {
            self.0.borrow_mut().push(format!("release {pointer_id}"));
        }
    }

    fn doc_with_image(id: &str) -> EditorDocument {
        let mut doc = EditorDocument::default();
        doc.elements.push(
            CanvasElement::image(ElementId::intern(id), "Image 1", "a.png", 400.0, 200.0)
                .with_position(Position::new(100.0, 100.0)),
        );
        doc
    }

    fn session(log: &CaptureLog) -> InteractionSession {
        // Canvas shown at half size, offset by (10, 20).
        InteractionSession::new(
            Box::new(ViewportMapper::new(10.0, 20.0, 540.0)),
            Box::new(log.clone()),
        )
    }

    #[test]
    fn viewport_mapper_divides_by_display_scale() {
        let m = ViewportMapper::new(10.0, 20.0, 540.0);
        assert_eq!(m.to_document(60.0, 70.0, 1080.0), Position::new(100.0, 100.0));
        // Same on-screen size, twice the logical width.
        assert_eq!(m.to_document(60.0, 70.0, 2160.0), Position::new(200.0, 200.0));
        let degenerate = ViewportMapper::new(0.0, 0.0, 0.0);
        assert_eq!(degenerate.scale(0.0), 1.0);
        assert_eq!(ViewportMapper::identity().to_document(5.0, 6.0, 1080.0), Position::new(5.0, 6.0));
    }

    #[test]
    fn drag_keeps_grab_offset() {
        let log = CaptureLog::default();
        let mut s = session(&log);
        let doc = doc_with_image("sx_drag");
        let id = ElementId::intern("sx_drag");

        // Grab 10 document units inside the element's top-left.
        let actions = s.pointer_down(&doc, 1, 65.0, 75.0, PointerTarget::Element(id));
        assert_eq!(actions, vec![SessionAction::Select(Some(id))]);
        let actions = s.pointer_move(&doc, 1, 115.0, 75.0);
        assert_eq!(
            actions,
            vec![SessionAction::MoveElement {
                id,
                position: Position::new(200.0, 100.0)
            }]
        );
        // Foreign pointers do nothing.
        assert!(s.pointer_move(&doc, 2, 0.0, 0.0).is_empty());
        s.pointer_up(2);
        assert!(!s.is_idle());
        s.pointer_up(1);
        s.pointer_up(1);
        assert!(s.is_idle());
        assert_eq!(*log.0.borrow(), vec!["acquire 1", "release 1"]);
    }

    #[test]
    fn locked_element_selects_but_never_drags() {
        let log = CaptureLog::default();
        let mut s = session(&log);
        let mut doc = doc_with_image("sx_locked");
        doc.elements[0].is_locked = true;
        let id = ElementId::intern("sx_locked");
        let actions = s.pointer_down(&doc, 1, 65.0, 75.0, PointerTarget::Element(id));
        assert_eq!(actions, vec![SessionAction::Select(Some(id))]);
        assert!(s.is_idle());
        assert!(log.0.borrow().is_empty());
    }

    #[test]
    fn canvas_down_deselects() {
        let mut s = InteractionSession::default();
        let mut doc = doc_with_image("sx_canvas");
        assert!(s.pointer_down(&doc, 1, 0.0, 0.0, PointerTarget::Canvas).is_empty());
        doc.selected_element_id = Some(ElementId::intern("sx_canvas"));
        assert_eq!(
            s.pointer_down(&doc, 1, 0.0, 0.0, PointerTarget::Canvas),
            vec![SessionAction::Select(None)]
        );
    }

    #[test]
    fn crop_handle_requires_crop_mode() {
        let mut s = InteractionSession::default();
        let doc = doc_with_image("sx_nocrop");
        let target = PointerTarget::CropHandle {
            element: ElementId::intern("sx_nocrop"),
            handle: CropHandle::Right,
            ghost: Bounds::new(0.0, 0.0, 200.0, 100.0),
        };
        s.pointer_down(&doc, 1, 200.0, 50.0, target);
        assert!(s.is_idle());
    }

    #[test]
    fn right_handle_dragged_left_grows_right_crop() {
        let log = CaptureLog::default();
        let mut s = session(&log);
        let mut doc = doc_with_image("sx_crop");
        doc.is_cropping = true;
        let id = ElementId::intern("sx_crop");
        let ghost = Bounds::new(60.0, 70.0, 200.0, 100.0);
        s.pointer_down(
            &doc,
            7,
            260.0,
            120.0,
            PointerTarget::CropHandle {
                element: id,
                handle: CropHandle::Right,
                ghost,
            },
        );
        // 30% of the ghost width to the left.
        let actions = s.pointer_move(&doc, 7, 200.0, 120.0);
        let [SessionAction::SetCrop { crop, .. }] = actions.as_slice() else {
            panic!("expected one crop action, got {actions:?}");
        };
        assert!((crop.right - 30.0).abs() < 1e-3);
        assert_eq!(crop.left, 0.0);
        s.pointer_up(7);
        assert_eq!(*log.0.borrow(), vec!["acquire 7", "release 7"]);
    }

    #[test]
    fn crop_invariant_holds_every_step() {
        let mut s = InteractionSession::default();
        let mut doc = doc_with_image("sx_inv");
        doc.is_cropping = true;
        let id = ElementId::intern("sx_inv");
        ElementUpdate::Image(ImageStylePatch {
            crop: Some(Crop::new(0.0, 0.0, 0.0, 40.0)),
            ..Default::default()
        })
        .apply(&mut doc.elements[0]);
        s.pointer_down(
            &doc,
            1,
            100.0,
            100.0,
            PointerTarget::CropHandle {
                element: id,
                handle: CropHandle::TopRight,
                ghost: Bounds::new(0.0, 0.0, 100.0, 100.0),
            },
        );
        for step in 0..40 {
            let d = step as f32 * 7.0;
            for action in s.pointer_move(&doc, 1, 100.0 - d, 100.0 + d) {
                let SessionAction::SetCrop { crop, .. } = action else {
                    panic!("unexpected {action:?}");
                };
                assert!(crop.left + crop.right <= MAX_OPPOSITE_CROP + 1e-3);
                assert!(crop.top + crop.bottom <= MAX_OPPOSITE_CROP + 1e-3);
                assert!(crop.is_valid());
            }
        }
    }
}
