//! Document store: the single owner of the editable scene.
//!
//! Every mutation goes through a method here. Each returns whether the
//! document changed; when it did, subscribers are notified with a
//! `DocumentChange` describing what moved. Unknown ids are no-ops.
//!
//! The store knows nothing about history or timers. The `Editor` facade
//! decides which writes become snapshots.

use lc_core::id::ElementId;
use lc_core::model::*;
use serde::{Deserialize, Serialize};

/// Side-panel tab of the editor chrome. Selection follows the tab of the
/// selected element's type unless the layer list is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorTab {
    #[default]
    Image,
    Text,
    Background,
    Layers,
    Export,
}

impl EditorTab {
    pub fn for_type(kind: ElementType) -> Self {
        match kind {
            ElementType::Image => EditorTab::Image,
            ElementType::Text => EditorTab::Text,
        }
    }
}

/// What a store write touched.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentChange {
    Added(ElementId),
    Updated(ElementId),
    Removed(ElementId),
    Reordered(ElementId),
    /// Live drag write.
    Moved(ElementId),
    Selection(Option<ElementId>),
    Cropping(bool),
    Background,
    Canvas,
    ExportSettings,
    Tab(EditorTab),
    /// Elements and background replaced wholesale (history replay).
    Replaced,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&DocumentChange, &EditorDocument)>;

/// Owns the document plus the editor-chrome state that travels with it.
pub struct DocumentStore {
    doc: EditorDocument,
    /// State restored by `reset()`.
    initial: EditorDocument,
    active_tab: EditorTab,
    last_image: Option<ElementId>,
    last_text: Option<ElementId>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new(EditorDocument::default())
    }
}

impl DocumentStore {
    pub fn new(initial: EditorDocument) -> Self {
        Self {
            doc: initial.clone(),
            initial,
            active_tab: EditorTab::default(),
            last_image: None,
            last_text: None,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn document(&self) -> &EditorDocument {
        &self.doc
    }

    pub fn active_tab(&self) -> EditorTab {
        self.active_tab
    }

    /// Most recently selected element of `kind`, if it still exists.
    pub fn last_selected(&self, kind: ElementType) -> Option<ElementId> {
        match kind {
            ElementType::Image => self.last_image,
            ElementType::Text => self.last_text,
        }
    }

    // ─── Observers ───────────────────────────────────────────────────────

    pub fn subscribe(&mut self, listener: impl FnMut(&DocumentChange, &EditorDocument) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        before != self.listeners.len()
    }

    fn notify(&mut self, change: DocumentChange) {
        log::trace!("store change: {change:?}");
        for (_, listener) in &mut self.listeners {
            listener(&change, &self.doc);
        }
    }

    // ─── Element lifecycle ───────────────────────────────────────────────

    /// Append `element` on top, select it and open its tab.
    pub fn add_element(&mut self, mut element: CanvasElement) -> bool {
        if self.doc.contains(element.id) {
            log::warn!("add_element: duplicate id {}", element.id);
            return false;
        }
        let id = element.id;
        let kind = element.element_type();
        log::debug!("add {} {id}", kind.as_str());
        element.normalize();
        self.doc.elements.push(element);
        self.doc.selected_element_id = Some(id);
        self.doc.is_cropping = false;
        self.remember_selection(id, kind);
        self.active_tab = EditorTab::for_type(kind);
        self.notify(DocumentChange::Added(id));
        true
    }

    pub fn update_element(&mut self, id: ElementId, update: &ElementUpdate) -> bool {
        let Some(el) = self.doc.get_mut(id) else {
            log::warn!("update_element: unknown id {id}");
            return false;
        };
        let before = el.clone();
        if !update.apply(el) {
            log::warn!("update_element: {update:?} does not apply to {id}");
            return false;
        }
        if *el == before {
            return false;
        }
        if matches!(update, ElementUpdate::Visible(false)) && self.doc.is_selected(id) {
            self.doc.is_cropping = false;
        }
        self.notify(DocumentChange::Updated(id));
        true
    }

    pub fn remove_element(&mut self, id: ElementId) -> bool {
        let Some(index) = self.doc.index_of(id) else {
            return false;
        };
        self.doc.elements.remove(index);
        if self.doc.is_selected(id) {
            self.doc.selected_element_id = None;
            self.doc.is_cropping = false;
        }
        self.forget(id);
        log::debug!("removed {id}");
        self.notify(DocumentChange::Removed(id));
        true
    }

    // ─── Z-order ─────────────────────────────────────────────────────────

    /// Step or jump `id` through the layer order. `Up` moves toward the end
    /// of the array (painted later).
    pub fn reorder_element(&mut self, id: ElementId, direction: ReorderDirection) -> bool {
        let Some(index) = self.doc.index_of(id) else {
            return false;
        };
        let last = self.doc.elements.len() - 1;
        let target = match direction {
            ReorderDirection::Up if index < last => index + 1,
            ReorderDirection::Down if index > 0 => index - 1,
            ReorderDirection::Top => last,
            ReorderDirection::Bottom => 0,
            _ => index,
        };
        self.move_index(id, index, target)
    }

    /// Move the element at array index `from` to array index `to`.
    pub fn move_element_to(&mut self, from: usize, to: usize) -> bool {
        let len = self.doc.elements.len();
        if from >= len || to >= len {
            log::warn!("move_element_to: {from} -> {to} out of range (len {len})");
            return false;
        }
        let id = self.doc.elements[from].id;
        self.move_index(id, from, to)
    }

    fn move_index(&mut self, id: ElementId, from: usize, to: usize) -> bool {
        if from == to {
            return false;
        }
        let el = self.doc.elements.remove(from);
        self.doc.elements.insert(to, el);
        log::debug!("reorder {id}: {from} -> {to}");
        self.notify(DocumentChange::Reordered(id));
        true
    }

    pub fn toggle_visibility(&mut self, id: ElementId) -> bool {
        let Some(visible) = self.doc.get(id).map(|e| e.is_visible) else {
            return false;
        };
        self.update_element(id, &ElementUpdate::Visible(!visible))
    }

    pub fn toggle_lock(&mut self, id: ElementId) -> bool {
        let Some(locked) = self.doc.get(id).map(|e| e.is_locked) else {
            return false;
        };
        self.update_element(id, &ElementUpdate::Locked(!locked))
    }

    // ─── Selection & modes ───────────────────────────────────────────────

    pub fn select_element(&mut self, id: Option<ElementId>) -> bool {
        if id == self.doc.selected_element_id {
            return false;
        }
        let kind = match id {
            Some(id) => match self.doc.get(id) {
                Some(el) => Some(el.element_type()),
                None => {
                    log::warn!("select_element: unknown id {id}");
                    return false;
                }
            },
            None => None,
        };
        self.doc.selected_element_id = id;
        self.doc.is_cropping = false;
        if let (Some(id), Some(kind)) = (id, kind) {
            self.remember_selection(id, kind);
            let tab = EditorTab::for_type(kind);
            if self.active_tab != EditorTab::Layers && self.active_tab != tab {
                self.active_tab = tab;
            }
        }
        self.notify(DocumentChange::Selection(id));
        true
    }

    /// Put back a selection and crop mode saved earlier, leaving the active
    /// tab alone. Used after export hides the selection feedback.
    pub fn restore_selection(&mut self, id: Option<ElementId>, cropping: bool) -> bool {
        let id = id.filter(|id| self.doc.contains(*id));
        let cropping = cropping && id.and_then(|id| self.doc.get(id)).is_some_and(CanvasElement::is_image);
        if id == self.doc.selected_element_id && cropping == self.doc.is_cropping {
            return false;
        }
        self.doc.selected_element_id = id;
        self.doc.is_cropping = cropping;
        self.notify(DocumentChange::Selection(id));
        if cropping {
            self.notify(DocumentChange::Cropping(true));
        }
        true
    }

    /// Enter or leave crop mode. Entering requires a selected image.
    pub fn set_cropping(&mut self, on: bool) -> bool {
        if on && !self.doc.selected().is_some_and(CanvasElement::is_image) {
            log::warn!("set_cropping: no image selected");
            return false;
        }
        if self.doc.is_cropping == on {
            return false;
        }
        self.doc.is_cropping = on;
        self.notify(DocumentChange::Cropping(on));
        true
    }

    pub fn set_active_tab(&mut self, tab: EditorTab) -> bool {
        if self.active_tab == tab {
            return false;
        }
        self.active_tab = tab;
        self.notify(DocumentChange::Tab(tab));
        true
    }

    fn remember_selection(&mut self, id: ElementId, kind: ElementType) {
        match kind {
            ElementType::Image => self.last_image = Some(id),
            ElementType::Text => self.last_text = Some(id),
        }
    }

    fn forget(&mut self, id: ElementId) {
        if self.last_image == Some(id) {
            self.last_image = None;
        }
        if self.last_text == Some(id) {
            self.last_text = None;
        }
    }

    // ─── Document settings ───────────────────────────────────────────────

    pub fn set_background(&mut self, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() || self.doc.background == value {
            return false;
        }
        self.doc.background = value.to_string();
        self.notify(DocumentChange::Background);
        true
    }

    pub fn set_aspect_ratio(&mut self, name: &str) -> bool {
        let Some(ratio) = AspectRatio::preset(name) else {
            log::warn!("set_aspect_ratio: unknown preset {name:?}");
            return false;
        };
        self.set_canvas(ratio)
    }

    pub fn set_custom_size(&mut self, width: f32, height: f32) -> bool {
        self.set_canvas(AspectRatio::custom(width, height))
    }

    fn set_canvas(&mut self, ratio: AspectRatio) -> bool {
        if self.doc.aspect_ratio == ratio {
            return false;
        }
        log::debug!("canvas {} {}x{}", ratio.name, ratio.width, ratio.height);
        self.doc.aspect_ratio = ratio;
        self.notify(DocumentChange::Canvas);
        true
    }

    pub fn set_export_format(&mut self, format: ExportFormat) -> bool {
        if self.doc.export_format == format {
            return false;
        }
        self.doc.export_format = format;
        self.notify(DocumentChange::ExportSettings);
        true
    }

    /// Clamped to [0.1, 1].
    pub fn set_export_quality(&mut self, quality: f32) -> bool {
        let quality = if quality.is_finite() {
            quality.clamp(0.1, 1.0)
        } else {
            DEFAULT_EXPORT_QUALITY
        };
        if self.doc.export_quality == quality {
            return false;
        }
        self.doc.export_quality = quality;
        self.notify(DocumentChange::ExportSettings);
        true
    }

    /// Back to the initial document. Always notifies.
    pub fn reset(&mut self) -> bool {
        self.doc = self.initial.clone();
        self.active_tab = EditorTab::default();
        self.last_image = None;
        self.last_text = None;
        log::debug!("document reset");
        self.notify(DocumentChange::Reset);
        true
    }

    // ─── Live and replay writes ──────────────────────────────────────────

    /// Positional write used while dragging.
    pub fn set_position(&mut self, id: ElementId, position: Position) -> bool {
        if !position.is_finite() {
            return false;
        }
        let Some(el) = self.doc.get_mut(id) else {
            return false;
        };
        if el.position == position {
            return false;
        }
        el.position = position;
        self.notify(DocumentChange::Moved(id));
        true
    }

    /// Swap in replayed content. Selection pointing at a vanished element
    /// is cleared, as is crop mode when the selection is no longer an image.
    pub fn replace_content(&mut self, mut elements: Vec<CanvasElement>, background: String) -> bool {
        elements.iter_mut().for_each(CanvasElement::normalize);
        self.doc.elements = elements;
        self.doc.background = background;
        if let Some(sel) = self.doc.selected_element_id
            && !self.doc.contains(sel)
        {
            self.doc.selected_element_id = None;
        }
        if !self.doc.selected().is_some_and(CanvasElement::is_image) {
            self.doc.is_cropping = false;
        }
        let live: Vec<ElementId> = self.doc.elements.iter().map(|e| e.id).collect();
        for id in [self.last_image, self.last_text].into_iter().flatten() {
            if !live.contains(&id) {
                self.forget(id);
            }
        }
        self.notify(DocumentChange::Replaced);
        true
    }

    /// Replace the whole document (loading a saved file).
    pub fn load(&mut self, mut doc: EditorDocument) -> bool {
        doc.elements.iter_mut().for_each(CanvasElement::normalize);
        self.doc = doc;
        self.last_image = None;
        self.last_text = None;
        if let Some(sel) = self.doc.selected() {
            let (id, kind) = (sel.id, sel.element_type());
            self.remember_selection(id, kind);
        }
        self.notify(DocumentChange::Replaced);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn id(s: &str) -> ElementId {
        ElementId::intern(s)
    }

    fn store_with(ids: &[&str]) -> DocumentStore {
        let mut store = DocumentStore::default();
        for s in ids {
            store.add_element(CanvasElement::text(id(s), *s, *s));
        }
        store
    }

    fn order(store: &DocumentStore) -> Vec<&str> {
        store.document().elements.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn add_selects_and_switches_tab() {
        let mut store = DocumentStore::default();
        assert!(store.add_element(CanvasElement::image(id("st_img"), "Image 1", "a.png", 10.0, 10.0)));
        assert_eq!(store.active_tab(), EditorTab::Image);
        store.add_element(CanvasElement::text(id("st_txt"), "Text 1", "hi"));
        assert_eq!(store.document().selected_element_id, Some(id("st_txt")));
        assert_eq!(store.active_tab(), EditorTab::Text);
        assert_eq!(store.last_selected(ElementType::Image), Some(id("st_img")));
    }

    fn over_cropped(name: &str) -> CanvasElement {
        let mut el = CanvasElement::image(id(name), "Image 1", "a.png", 10.0, 10.0);
        if let ElementKind::Image { style, .. } = &mut el.kind {
            style.crop = Crop::new(60.0, 0.0, 60.0, 0.0);
        }
        el
    }

    #[test]
    fn whole_element_writes_normalize_crop() {
        let mut store = DocumentStore::default();
        assert!(store.add_element(over_cropped("st_crop_add")));
        let crop = store.document().elements[0].image_style().unwrap().crop;
        assert!(crop.top + crop.bottom <= MAX_OPPOSITE_CROP);

        store.replace_content(vec![over_cropped("st_crop_replay")], "#000000".into());
        let crop = store.document().elements[0].image_style().unwrap().crop;
        assert!(crop.is_valid());
    }

    #[test]
    fn restoring_selection_keeps_the_tab() {
        let mut store = DocumentStore::default();
        store.add_element(CanvasElement::image(id("st_restore"), "Image 1", "a.png", 10.0, 10.0));
        store.set_cropping(true);
        store.set_active_tab(EditorTab::Export);
        store.select_element(None);
        assert!(store.restore_selection(Some(id("st_restore")), true));
        assert_eq!(store.active_tab(), EditorTab::Export);
        assert!(store.document().is_cropping);
        // A vanished element cannot come back.
        assert!(store.restore_selection(Some(id("st_restore_gone")), true));
        assert_eq!(store.document().selected_element_id, None);
        assert!(!store.document().is_cropping);
    }

    #[test]
    fn duplicate_add_is_rejected() {
        let mut store = store_with(&["st_dup"]);
        assert!(!store.add_element(CanvasElement::text(id("st_dup"), "again", "x")));
        assert_eq!(store.document().elements.len(), 1);
    }

    #[test]
    fn remove_clears_selection_crop_and_memory() {
        let mut store = DocumentStore::default();
        store.add_element(CanvasElement::image(id("st_rm"), "Image 1", "a.png", 10.0, 10.0));
        assert!(store.set_cropping(true));
        assert!(store.remove_element(id("st_rm")));
        let doc = store.document();
        assert_eq!(doc.selected_element_id, None);
        assert!(!doc.is_cropping);
        assert_eq!(store.last_selected(ElementType::Image), None);
        assert!(!store.remove_element(id("st_rm")));
    }

    #[test]
    fn reorder_steps_and_jumps() {
        let mut store = store_with(&["ro_a", "ro_b", "ro_c"]);
        assert!(store.reorder_element(id("ro_a"), ReorderDirection::Up));
        assert_eq!(order(&store), vec!["ro_b", "ro_a", "ro_c"]);
        assert!(store.reorder_element(id("ro_a"), ReorderDirection::Top));
        assert_eq!(order(&store), vec!["ro_b", "ro_c", "ro_a"]);
        assert!(!store.reorder_element(id("ro_a"), ReorderDirection::Up));
        assert!(store.reorder_element(id("ro_a"), ReorderDirection::Bottom));
        assert_eq!(order(&store), vec!["ro_a", "ro_b", "ro_c"]);
        assert!(!store.reorder_element(id("ro_a"), ReorderDirection::Down));
        assert!(!store.reorder_element(id("ro_missing"), ReorderDirection::Up));
    }

    #[test]
    fn move_to_splices() {
        let mut store = store_with(&["mv_a", "mv_b", "mv_c"]);
        assert!(store.move_element_to(0, 2));
        assert_eq!(order(&store), vec!["mv_b", "mv_c", "mv_a"]);
        assert!(!store.move_element_to(0, 3));
    }

    #[test]
    fn selection_leaves_crop_mode_and_respects_layers_tab() {
        let mut store = DocumentStore::default();
        store.add_element(CanvasElement::image(id("sel_img"), "Image 1", "a.png", 10.0, 10.0));
        store.add_element(CanvasElement::text(id("sel_txt"), "Text 1", "hi"));
        store.select_element(Some(id("sel_img")));
        store.set_cropping(true);
        store.set_active_tab(EditorTab::Layers);
        assert!(store.select_element(Some(id("sel_txt"))));
        assert!(!store.document().is_cropping);
        assert_eq!(store.active_tab(), EditorTab::Layers);
        assert!(!store.select_element(Some(id("sel_nope"))));
    }

    #[test]
    fn cropping_requires_selected_image() {
        let mut store = store_with(&["crop_txt"]);
        assert!(!store.set_cropping(true));
        assert!(!store.document().is_cropping);
    }

    #[test]
    fn export_quality_is_clamped() {
        let mut store = DocumentStore::default();
        store.set_export_quality(3.0);
        assert_eq!(store.document().export_quality, 1.0);
        store.set_export_quality(0.0);
        assert_eq!(store.document().export_quality, 0.1);
    }

    #[test]
    fn unknown_preset_is_ignored() {
        let mut store = DocumentStore::default();
        assert!(!store.set_aspect_ratio("golden"));
        assert!(store.set_aspect_ratio("9:16"));
        assert_eq!(store.document().height(), 1920.0);
    }

    #[test]
    fn wrong_variant_patch_is_noop() {
        let mut store = store_with(&["wv_txt"]);
        let patch = ElementUpdate::Image(ImageStylePatch {
            scale: Some(20.0),
            ..Default::default()
        });
        assert!(!store.update_element(id("wv_txt"), &patch));
    }

    #[test]
    fn subscribers_see_changes_until_unsubscribed() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut store = DocumentStore::default();
        let sink = Rc::clone(&seen);
        let sub = store.subscribe(move |change, _| sink.borrow_mut().push(change.clone()));
        store.set_background("#222");
        store.set_background("#222");
        assert!(store.unsubscribe(sub));
        store.set_background("#333");
        assert_eq!(*seen.borrow(), vec![DocumentChange::Background]);
    }

    #[test]
    fn replace_content_drops_dangling_selection() {
        let mut store = store_with(&["rc_a"]);
        assert!(store.replace_content(Vec::new(), "#000".into()));
        assert_eq!(store.document().selected_element_id, None);
        assert_eq!(store.last_selected(ElementType::Text), None);
        assert_eq!(store.document().background, "#000");
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut store = store_with(&["rs_a"]);
        store.set_background("#123456");
        store.reset();
        assert_eq!(store.document(), &EditorDocument::default());
        assert_eq!(store.active_tab(), EditorTab::Image);
    }
}
