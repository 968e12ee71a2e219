//! Integration tests: undo/redo history through the editor facade
//! (lc-editor ↔ lc-core).

use lc_core::id::ElementId;
use lc_core::model::*;
use lc_editor::{Editor, EditorConfig, VirtualClock};
use pretty_assertions::assert_eq;

fn story() -> (Editor, VirtualClock) {
    let _ = env_logger::builder().is_test(true).try_init();
    let clock = VirtualClock::new();
    let mut ed = Editor::with_clock(EditorConfig::default(), Box::new(clock.clone()));
    ed.load_json(include_str!("fixtures/story.json")).unwrap();
    (ed, clock)
}

fn font_size(ed: &Editor, id: &str) -> f32 {
    ed.document()
        .get(ElementId::intern(id))
        .and_then(|e| e.text_style())
        .map(|s| s.font_size)
        .unwrap_or(f32::NAN)
}

fn set_font_size(ed: &mut Editor, id: &str, size: f32) -> bool {
    ed.update_text_style(
        ElementId::intern(id),
        TextStylePatch {
            font_size: Some(size),
            ..Default::default()
        },
    )
}

// ─── Debounced saves ────────────────────────────────────────────────────

#[test]
fn font_size_edit_is_saved_after_quiet_window_and_undoable() {
    let (mut ed, clock) = story();
    let caption = ElementId::intern("caption");
    let before = ed.document().get(caption).unwrap().position;
    let start = ed.history().index();

    assert!(set_font_size(&mut ed, "caption", 64.0));
    clock.advance(1999);
    assert_eq!(ed.tick(), 0);
    assert_eq!(ed.history().index(), start);
    clock.advance(1);
    assert_eq!(ed.tick(), 1);
    assert_eq!(ed.history().index(), start + 1);

    assert!(ed.undo());
    assert_eq!(font_size(&ed, "caption"), 48.0);
    let el = ed.document().get(caption).unwrap();
    assert_eq!(el.id, caption);
    assert_eq!(el.position, before);
}

#[test]
fn rapid_edits_coalesce_into_one_snapshot() {
    let (mut ed, clock) = story();
    for size in [50.0, 56.0, 60.0, 70.0, 80.0] {
        set_font_size(&mut ed, "caption", size);
        clock.advance(500);
        assert_eq!(ed.tick(), 0);
    }
    clock.advance(2000);
    assert_eq!(ed.tick(), 1);
    assert_eq!(ed.history().len(), 2);
    let snap = ed.history().current();
    let caption = snap.elements.iter().find(|e| e.id.as_str() == "caption").unwrap();
    assert_eq!(caption.text_style().map(|s| s.font_size), Some(80.0));
}

#[test]
fn undo_commits_pending_edit_first() {
    let (mut ed, _clock) = story();
    set_font_size(&mut ed, "caption", 72.0);
    assert!(ed.has_pending_save());

    assert!(ed.undo());
    assert!(!ed.has_pending_save());
    assert_eq!(font_size(&ed, "caption"), 48.0);
    assert!(ed.can_redo());

    assert!(ed.redo());
    assert_eq!(font_size(&ed, "caption"), 72.0);
}

// ─── Immediate saves ────────────────────────────────────────────────────

#[test]
fn n_immediate_saves_then_full_undo_redo() {
    let clock = VirtualClock::new();
    let mut ed = Editor::with_clock(EditorConfig::default(), Box::new(clock));
    ed.add_text();
    ed.add_image("https://cdn.example.com/a.png", 600.0, 400.0).unwrap();
    ed.set_background("linear-gradient(90deg, #f00, #00f)");
    let first = ed.document().elements[0].id;
    ed.reorder_element(first, ReorderDirection::Top);

    let n = 4;
    assert_eq!(ed.history().index(), n);
    assert_eq!(ed.history().len(), n + 1);
    let final_elements = ed.document().elements.clone();
    let final_background = ed.document().background.clone();

    for _ in 0..n {
        assert!(ed.undo());
    }
    assert!(!ed.undo());
    assert!(ed.document().elements.is_empty());
    assert_eq!(ed.document().background, "#ffffff");

    for _ in 0..n {
        assert!(ed.redo());
    }
    assert!(!ed.redo());
    assert_eq!(ed.document().elements, final_elements);
    assert_eq!(ed.document().background, final_background);
}

#[test]
fn reorder_top_then_bottom_restores_order() {
    let (mut ed, _clock) = story();
    let cover = ElementId::intern("cover");
    let original: Vec<_> = ed.document().elements.iter().map(|e| e.id).collect();

    assert!(ed.reorder_element(cover, ReorderDirection::Top));
    assert_eq!(ed.document().z_index_of(cover), Some(2));
    assert!(ed.reorder_element(cover, ReorderDirection::Bottom));
    assert_eq!(ed.document().z_index_of(cover), Some(0));

    let order: Vec<_> = ed.document().elements.iter().map(|e| e.id).collect();
    assert_eq!(order, original);
    assert_eq!(ed.history().index(), 2);
}

#[test]
fn undo_restores_deleted_element_where_it_was() {
    let (mut ed, _clock) = story();
    let caption = ElementId::intern("caption");
    let pos = ed.document().get(caption).unwrap().position;
    ed.select_element(Some(caption));
    assert!(ed.remove_element(caption));
    assert_eq!(ed.document().selected_element_id, None);

    assert!(ed.undo());
    assert_eq!(ed.document().get(caption).map(|e| e.position), Some(pos));
    assert_eq!(ed.document().z_index_of(caption), Some(1));
}

// ─── Replay ─────────────────────────────────────────────────────────────

#[test]
fn replay_keeps_live_positions() {
    let (mut ed, clock) = story();
    let caption = ElementId::intern("caption");
    set_font_size(&mut ed, "caption", 64.0);
    clock.advance(2000);
    ed.tick();

    // Dragging is never recorded.
    assert!(ed.set_position(caption, Position::new(10.0, 20.0)));
    assert!(!ed.has_pending_save());

    assert!(ed.undo());
    assert_eq!(font_size(&ed, "caption"), 48.0);
    assert_eq!(ed.document().get(caption).unwrap().position, Position::new(10.0, 20.0));
    assert!(ed.redo());
    assert_eq!(font_size(&ed, "caption"), 64.0);
    assert_eq!(ed.document().get(caption).unwrap().position, Position::new(10.0, 20.0));
}

#[test]
fn replay_drops_selection_of_vanished_element() {
    let mut ed = Editor::with_clock(EditorConfig::default(), Box::new(VirtualClock::new()));
    let id = ed.add_text().unwrap();
    assert_eq!(ed.document().selected_element_id, Some(id));
    assert!(ed.undo());
    assert_eq!(ed.document().selected_element_id, None);
}

#[test]
fn reset_truncates_history() {
    let (mut ed, _clock) = story();
    ed.set_background("#222222");
    ed.add_text();
    assert!(ed.reset());
    assert_eq!(ed.history().len(), 1);
    assert!(!ed.can_undo());
    assert!(ed.document().elements.is_empty());
    assert_eq!(ed.document().aspect_ratio.name, "1:1");
}

#[test]
fn depth_limit_from_config() {
    let cfg = EditorConfig {
        max_history: 3,
        ..Default::default()
    };
    let mut ed = Editor::with_clock(cfg, Box::new(VirtualClock::new()));
    for i in 0..6 {
        ed.set_background(&format!("#00000{i}"));
    }
    assert_eq!(ed.history().len(), 3);
    assert!(ed.undo());
    assert!(ed.undo());
    assert!(!ed.undo());
    assert_eq!(ed.document().background, "#000003");
}
