//! Integration tests: pointer sessions and shortcuts driving the editor.

use lc_core::geometry::CropHandle;
use lc_core::id::ElementId;
use lc_core::model::*;
use lc_editor::{
    Editor, EditorConfig, EditorTab, InputEvent, PointerCapture, PointerTarget, ShortcutAction, ViewportMapper,
    VirtualClock,
};
use lc_render::capture::{CaptureRequest, SceneCapture};
use lc_render::error::RenderResult;
use lc_render::export::{ExportPayload, PixelRatio};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Default)]
struct Captures(Rc<RefCell<Vec<(&'static str, i32)>>>);

impl PointerCapture for Captures {
    fn acquire(&mut self, pointer_id: i32) {
        self.0.borrow_mut().push(("acquire", pointer_id));
    }
    fn release(&mut self, pointer_id: i32) {
        self.0.borrow_mut().push(("release", pointer_id));
    }
}

/// The 1080-wide story shown 540px wide at client offset (100, 50).
fn story() -> (Editor, VirtualClock, Captures) {
    let clock = VirtualClock::new();
    let captures = Captures::default();
    let mut ed = Editor::with_clock(EditorConfig::default(), Box::new(clock.clone()));
    ed.load_json(include_str!("fixtures/story.json")).unwrap();
    ed.set_viewport(Box::new(ViewportMapper::new(100.0, 50.0, 540.0)));
    ed.set_pointer_capture(Box::new(captures.clone()));
    (ed, clock, captures)
}

fn id(s: &str) -> ElementId {
    ElementId::intern(s)
}

fn crop_of(ed: &Editor, s: &str) -> Crop {
    ed.document()
        .get(id(s))
        .and_then(|e| e.image_style())
        .map(|st| st.crop)
        .unwrap_or_default()
}

// ─── Dragging ───────────────────────────────────────────────────────────

#[test]
fn drag_moves_in_document_units_without_history() {
    let (mut ed, _clock, captures) = story();
    let caption = id("caption");
    // Caption top-left (96, 1580) is client (148, 840).
    ed.handle_pointer(&InputEvent::pointer_down(1, 150.0, 850.0), PointerTarget::Element(caption));
    assert_eq!(ed.document().selected_element_id, Some(caption));

    assert!(ed.handle_pointer(&InputEvent::pointer_move(1, 200.0, 800.0), PointerTarget::Canvas));
    assert_eq!(ed.document().get(caption).unwrap().position, Position::new(196.0, 1480.0));

    ed.handle_pointer(&InputEvent::pointer_up(1, 200.0, 800.0), PointerTarget::Canvas);
    assert!(ed.session().is_idle());
    assert!(!ed.has_pending_save());
    assert_eq!(ed.history().len(), 1);
    assert_eq!(*captures.0.borrow(), vec![("acquire", 1), ("release", 1)]);
}

#[test]
fn drag_follows_canvas_resize() {
    let (mut ed, _clock, _) = story();
    let caption = id("caption");
    // Same 540px on screen, now 2160 logical units wide: 0.25px per unit.
    assert!(ed.set_custom_size(2160.0, 3840.0));
    ed.handle_pointer(&InputEvent::pointer_down(1, 124.0, 445.0), PointerTarget::Element(caption));
    ed.handle_pointer(&InputEvent::pointer_move(1, 134.0, 455.0), PointerTarget::Canvas);
    assert_eq!(ed.document().get(caption).unwrap().position, Position::new(136.0, 1620.0));
}

#[test]
fn cancel_releases_capture_once() {
    let (mut ed, _clock, captures) = story();
    ed.handle_pointer(&InputEvent::pointer_down(4, 150.0, 850.0), PointerTarget::Element(id("caption")));
    ed.handle_pointer(&InputEvent::PointerCancel { pointer_id: 4 }, PointerTarget::Canvas);
    ed.handle_pointer(&InputEvent::pointer_up(4, 150.0, 850.0), PointerTarget::Canvas);
    assert_eq!(*captures.0.borrow(), vec![("acquire", 4), ("release", 4)]);
}

#[test]
fn locked_layer_never_moves() {
    let (mut ed, _clock, captures) = story();
    let badge = id("badge");
    let before = ed.document().get(badge).unwrap().position;
    ed.handle_pointer(&InputEvent::pointer_down(1, 515.0, 115.0), PointerTarget::Element(badge));
    ed.handle_pointer(&InputEvent::pointer_move(1, 300.0, 300.0), PointerTarget::Canvas);
    assert_eq!(ed.document().get(badge).unwrap().position, before);
    assert_eq!(ed.document().selected_element_id, Some(badge));
    assert!(captures.0.borrow().is_empty());
}

#[test]
fn canvas_click_deselects() {
    let (mut ed, _clock, _) = story();
    ed.select_element(Some(id("cover")));
    assert!(ed.handle_pointer(&InputEvent::pointer_down(1, 101.0, 51.0), PointerTarget::Canvas));
    assert_eq!(ed.document().selected_element_id, None);
}

#[test]
fn removing_dragged_element_ends_gesture() {
    let (mut ed, _clock, captures) = story();
    let caption = id("caption");
    ed.handle_pointer(&InputEvent::pointer_down(2, 150.0, 850.0), PointerTarget::Element(caption));
    assert!(ed.remove_element(caption));
    assert!(ed.session().is_idle());
    assert_eq!(*captures.0.borrow(), vec![("acquire", 2), ("release", 2)]);
}

// ─── Cropping ───────────────────────────────────────────────────────────

#[test]
fn right_handle_dragged_left_crops_thirty_percent() {
    let (mut ed, clock, _) = story();
    let cover = id("cover");
    ed.select_element(Some(cover));
    assert!(ed.set_cropping(true));

    let ghost = Bounds::new(120.0, 230.0, 450.0, 540.0);
    ed.handle_pointer(
        &InputEvent::pointer_down(9, 570.0, 500.0),
        PointerTarget::CropHandle {
            element: cover,
            handle: CropHandle::Right,
            ghost,
        },
    );
    for step in 1..=3 {
        let x = 570.0 - 45.0 * step as f32;
        ed.handle_pointer(&InputEvent::pointer_move(9, x, 500.0), PointerTarget::Canvas);
        let crop = crop_of(&ed, "cover");
        assert!((crop.right - 10.0 * step as f32).abs() < 1e-3);
        assert!(crop.is_valid());
    }
    ed.handle_pointer(&InputEvent::pointer_up(9, 435.0, 500.0), PointerTarget::Canvas);

    let crop = crop_of(&ed, "cover");
    assert!((crop.right - 30.0).abs() < 1e-3);
    assert_eq!(crop.left, 0.0);

    // Every step went through the debounced path: one snapshot total.
    assert!(ed.has_pending_save());
    clock.advance(2000);
    assert_eq!(ed.tick(), 1);
    assert_eq!(ed.history().len(), 2);
    assert!(ed.undo());
    assert_eq!(crop_of(&ed, "cover"), Crop::NONE);
}

#[test]
fn crop_invariant_survives_wild_corner_drag() {
    let (mut ed, _clock, _) = story();
    let cover = id("cover");
    ed.select_element(Some(cover));
    ed.set_cropping(true);
    ed.handle_pointer(
        &InputEvent::pointer_down(1, 120.0, 230.0),
        PointerTarget::CropHandle {
            element: cover,
            handle: CropHandle::TopLeft,
            ghost: Bounds::new(120.0, 230.0, 450.0, 540.0),
        },
    );
    for step in 0..60 {
        let d = step as f32 * 17.0;
        ed.handle_pointer(&InputEvent::pointer_move(1, 120.0 + d, 230.0 + d * 1.5), PointerTarget::Canvas);
        let crop = crop_of(&ed, "cover");
        assert!(crop.top + crop.bottom <= MAX_OPPOSITE_CROP + 1e-3, "step {step}: {crop:?}");
        assert!(crop.left + crop.right <= MAX_OPPOSITE_CROP + 1e-3, "step {step}: {crop:?}");
    }
}

#[test]
fn crop_handles_ignored_outside_crop_mode() {
    let (mut ed, _clock, captures) = story();
    let cover = id("cover");
    ed.select_element(Some(cover));
    ed.handle_pointer(
        &InputEvent::pointer_down(1, 570.0, 500.0),
        PointerTarget::CropHandle {
            element: cover,
            handle: CropHandle::Right,
            ghost: Bounds::new(120.0, 230.0, 450.0, 540.0),
        },
    );
    ed.handle_pointer(&InputEvent::pointer_move(1, 400.0, 500.0), PointerTarget::Canvas);
    assert_eq!(crop_of(&ed, "cover"), Crop::NONE);
    assert!(captures.0.borrow().is_empty());
}

#[test]
fn cropping_text_is_refused() {
    let (mut ed, _clock, _) = story();
    ed.select_element(Some(id("caption")));
    assert!(!ed.set_cropping(true));
    assert_eq!(ed.handle_key("c", false, false, false, false), Some(ShortcutAction::ToggleCrop));
    assert!(!ed.document().is_cropping);
}

// ─── Shortcuts ──────────────────────────────────────────────────────────

#[test]
fn shortcut_reorder_is_undoable() {
    let (mut ed, _clock, _) = story();
    let caption = id("caption");
    ed.select_element(Some(caption));
    assert_eq!(ed.handle_key("]", false, false, false, true), Some(ShortcutAction::BringForward));
    assert_eq!(ed.document().z_index_of(caption), Some(2));
    assert_eq!(ed.handle_key("z", true, false, false, false), Some(ShortcutAction::Undo));
    assert_eq!(ed.document().z_index_of(caption), Some(1));
    assert_eq!(ed.handle_key("Z", false, true, false, true), Some(ShortcutAction::Redo));
    assert_eq!(ed.document().z_index_of(caption), Some(2));
}

#[test]
fn export_shortcut_is_left_to_the_host() {
    let (mut ed, _clock, _) = story();
    let before = ed.document().clone();
    assert_eq!(ed.handle_key("e", false, false, false, true), Some(ShortcutAction::Export));
    assert_eq!(ed.document(), &before);
}

// ─── Export ─────────────────────────────────────────────────────────────

struct Snapshot;

impl SceneCapture for Snapshot {
    fn capture(&mut self, _request: &CaptureRequest) -> RenderResult<ExportPayload> {
        Ok(ExportPayload::DataUrl("data:image/png;base64,AAAA".into()))
    }
}

#[test]
fn export_from_export_tab_stays_there() {
    let (mut ed, _clock, _) = story();
    let cover = id("cover");
    ed.select_element(Some(cover));
    assert!(ed.set_cropping(true));
    assert!(ed.set_active_tab(EditorTab::Export));

    assert!(ed.export_capture(&mut Snapshot, PixelRatio::X2).is_ok());

    assert_eq!(ed.active_tab(), EditorTab::Export);
    assert_eq!(ed.document().selected_element_id, Some(cover));
    assert!(ed.document().is_cropping);
}
