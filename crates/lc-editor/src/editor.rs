//! The editor facade.
//!
//! `Editor` owns one document store, its history, the timer scheduler, the
//! pointer session and the config, and decides per operation how a write is
//! recorded:
//!
//! | Write                                              | History            |
//! |----------------------------------------------------|--------------------|
//! | add, upload, remove, reorder, background, source   | immediate snapshot |
//! | style patches, rename, crop-handle drags           | debounced snapshot |
//! | pointer drags, visibility, lock, selection, tabs   | none               |
//! | reset, load                                        | history restarts   |
//!
//! An immediate snapshot cancels the pending debounced one; it captures the
//! whole document anyway.

use crate::config::EditorConfig;
use crate::history::{HistoryManager, HistorySnapshot};
use crate::ingest::{self, IngestError};
use crate::input::InputEvent;
use crate::scheduler::{Clock, Scheduler, SystemClock, TimerKey};
use crate::session::{CoordinateMapper, InteractionSession, PointerCapture, PointerTarget, SessionAction};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::store::{DocumentChange, DocumentStore, EditorTab, SubscriptionId};
use lc_core::id::ElementId;
use lc_core::model::*;
use lc_core::persist::{self, PersistResult};
use lc_core::records::GalleryItem;
use lc_render::capture::{SceneCapture, capture_with_retry};
use lc_render::context::RasterSurface;
use lc_render::error::RenderResult;
use lc_render::export::{ExportBlob, ExportOptions, PixelRatio};
use lc_render::paint;

pub struct Editor {
    config: EditorConfig,
    store: DocumentStore,
    history: HistoryManager,
    scheduler: Scheduler<Editor>,
    session: InteractionSession,
    clock: Box<dyn Clock>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_clock(config, Box::new(SystemClock::default()))
    }

    pub fn with_clock(config: EditorConfig, clock: Box<dyn Clock>) -> Self {
        let mut initial = EditorDocument::new(config.aspect_ratio(), config.default_background.clone());
        initial.export_format = config.default_export_format;
        initial.export_quality = config.default_export_quality.clamp(0.1, 1.0);
        let history = HistoryManager::new(HistorySnapshot::capture(&initial), config.max_history);
        Self {
            store: DocumentStore::new(initial),
            history,
            scheduler: Scheduler::new(),
            session: InteractionSession::default(),
            clock,
            config,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn document(&self) -> &EditorDocument {
        self.store.document()
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn session(&self) -> &InteractionSession {
        &self.session
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn active_tab(&self) -> EditorTab {
        self.store.active_tab()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Whether a debounced snapshot is waiting for its quiet window.
    pub fn has_pending_save(&self) -> bool {
        self.scheduler.is_armed(TimerKey::HistorySave)
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&DocumentChange, &EditorDocument) + 'static) -> SubscriptionId {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    pub fn set_viewport(&mut self, mapper: Box<dyn CoordinateMapper>) {
        self.session.set_mapper(mapper);
    }

    pub fn set_pointer_capture(&mut self, capture: Box<dyn PointerCapture>) {
        self.session.set_capture(capture);
    }

    // ─── History policy ──────────────────────────────────────────────────

    fn save_now(&mut self) {
        self.scheduler.cancel(TimerKey::HistorySave);
        self.history.push(HistorySnapshot::capture(self.store.document()));
    }

    fn save_later(&mut self) {
        let now = self.clock.now_ms();
        self.scheduler.arm(
            TimerKey::HistorySave,
            now,
            self.config.history_quiet_window_ms,
            Box::new(Editor::commit_pending),
        );
    }

    fn commit_pending(&mut self) {
        let snap = HistorySnapshot::capture(self.store.document());
        if *self.history.current() == snap {
            log::trace!("debounced save skipped: no change");
            return;
        }
        self.history.push(snap);
    }

    /// Run the pending debounced save right away.
    pub fn flush(&mut self) -> bool {
        match self.scheduler.take(TimerKey::HistorySave) {
            Some(task) => {
                task(self);
                true
            }
            None => false,
        }
    }

    /// Run every timer that is due. Returns how many ran.
    pub fn tick(&mut self) -> usize {
        let due = self.scheduler.take_due(self.clock.now_ms());
        let n = due.len();
        for task in due {
            task(self);
        }
        n
    }

    pub fn undo(&mut self) -> bool {
        self.flush();
        if !self.history.undo() {
            return false;
        }
        self.replay();
        true
    }

    pub fn redo(&mut self) -> bool {
        self.flush();
        if !self.history.redo() {
            return false;
        }
        self.replay();
        true
    }

    fn replay(&mut self) {
        let doc = self.store.document();
        let elements = self.history.replay(&doc.elements, (doc.width(), doc.height()));
        let background = self.history.current().background.clone();
        self.store.replace_content(elements, background);
    }

    // ─── Element operations ──────────────────────────────────────────────

    pub fn add_element(&mut self, element: CanvasElement) -> bool {
        let changed = self.store.add_element(element);
        if changed {
            self.save_now();
        }
        changed
    }

    /// Add a default text layer and return its id.
    pub fn add_text(&mut self) -> Option<ElementId> {
        let el = ingest::place_text(self.store.document());
        let id = el.id;
        self.add_element(el).then_some(id)
    }

    /// Probe and place an uploaded image. Nothing changes on failure.
    pub fn upload_image(&mut self, bytes: &[u8]) -> Result<ElementId, IngestError> {
        let el = ingest::image_from_bytes(self.store.document(), bytes).inspect_err(|e| {
            log::warn!("image upload rejected: {e}");
        })?;
        Ok(self.insert_image(el))
    }

    /// Place an image the host already decoded.
    pub fn add_image(&mut self, src: &str, natural_width: f32, natural_height: f32) -> Result<ElementId, IngestError> {
        let el = ingest::place_image(self.store.document(), src.to_string(), natural_width, natural_height)
            .inspect_err(|e| log::warn!("image rejected: {e}"))?;
        Ok(self.insert_image(el))
    }

    pub fn add_gallery_image(
        &mut self,
        item: &GalleryItem,
        natural_width: f32,
        natural_height: f32,
    ) -> Result<ElementId, IngestError> {
        let el = ingest::image_from_gallery(self.store.document(), item, natural_width, natural_height)
            .inspect_err(|e| log::warn!("gallery image {} rejected: {e}", item.id))?;
        Ok(self.insert_image(el))
    }

    fn insert_image(&mut self, el: CanvasElement) -> ElementId {
        let id = el.id;
        self.add_element(el);
        id
    }

    pub fn update_element(&mut self, id: ElementId, update: &ElementUpdate) -> bool {
        let changed = self.store.update_element(id, update);
        if changed {
            match update {
                ElementUpdate::Source { .. } => self.save_now(),
                ElementUpdate::Visible(_) | ElementUpdate::Locked(_) => {}
                _ => self.save_later(),
            }
        }
        changed
    }

    pub fn update_image_style(&mut self, id: ElementId, patch: ImageStylePatch) -> bool {
        self.update_element(id, &ElementUpdate::Image(patch))
    }

    pub fn update_text_style(&mut self, id: ElementId, patch: TextStylePatch) -> bool {
        self.update_element(id, &ElementUpdate::Text(patch))
    }

    pub fn remove_element(&mut self, id: ElementId) -> bool {
        if self.session.targets(id) {
            self.session.end_gesture();
        }
        let changed = self.store.remove_element(id);
        if changed {
            self.save_now();
        }
        changed
    }

    pub fn reorder_element(&mut self, id: ElementId, direction: ReorderDirection) -> bool {
        let changed = self.store.reorder_element(id, direction);
        if changed {
            self.save_now();
        }
        changed
    }

    pub fn move_element_to(&mut self, from: usize, to: usize) -> bool {
        let changed = self.store.move_element_to(from, to);
        if changed {
            self.save_now();
        }
        changed
    }

    pub fn toggle_visibility(&mut self, id: ElementId) -> bool {
        self.store.toggle_visibility(id)
    }

    pub fn toggle_lock(&mut self, id: ElementId) -> bool {
        self.store.toggle_lock(id)
    }

    pub fn select_element(&mut self, id: Option<ElementId>) -> bool {
        self.store.select_element(id)
    }

    pub fn set_cropping(&mut self, on: bool) -> bool {
        self.store.set_cropping(on)
    }

    /// Live positional write. Not recorded.
    pub fn set_position(&mut self, id: ElementId, position: Position) -> bool {
        self.store.set_position(id, position)
    }

    // ─── Document settings ───────────────────────────────────────────────

    pub fn set_background(&mut self, value: &str) -> bool {
        let changed = self.store.set_background(value);
        if changed {
            self.save_now();
        }
        changed
    }

    pub fn set_aspect_ratio(&mut self, name: &str) -> bool {
        self.store.set_aspect_ratio(name)
    }

    pub fn set_custom_size(&mut self, width: f32, height: f32) -> bool {
        self.store.set_custom_size(width, height)
    }

    pub fn set_export_format(&mut self, format: ExportFormat) -> bool {
        self.store.set_export_format(format)
    }

    pub fn set_export_quality(&mut self, quality: f32) -> bool {
        self.store.set_export_quality(quality)
    }

    pub fn set_active_tab(&mut self, tab: EditorTab) -> bool {
        self.store.set_active_tab(tab)
    }

    /// Back to a blank document with a single history entry.
    pub fn reset(&mut self) -> bool {
        self.session.end_gesture();
        self.scheduler.cancel(TimerKey::HistorySave);
        self.store.reset();
        self.history.reset(HistorySnapshot::capture(self.store.document()));
        true
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Feed a pointer event. `target` is the host's hit-test result and is
    /// only read on pointer-down. Returns whether the document changed.
    pub fn handle_pointer(&mut self, event: &InputEvent, target: PointerTarget) -> bool {
        let actions = self.session.handle(self.store.document(), event, target);
        let mut changed = false;
        for action in actions {
            changed |= match action {
                SessionAction::Select(id) => self.store.select_element(id),
                SessionAction::MoveElement { id, position } => self.store.set_position(id, position),
                SessionAction::SetCrop { id, crop } => self.update_image_style(
                    id,
                    ImageStylePatch {
                        crop: Some(crop),
                        ..Default::default()
                    },
                ),
            };
        }
        changed
    }

    /// Resolve and run a keyboard shortcut. `Export` is returned for the
    /// host to act on; everything else is applied here.
    pub fn handle_key(&mut self, key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool) -> Option<ShortcutAction> {
        let action = ShortcutMap::resolve(key, ctrl, shift, alt, meta)?;
        let selected = self.store.document().selected_element_id;
        log::debug!("shortcut {key:?} -> {action:?}");
        match action {
            ShortcutAction::Undo => {
                self.undo();
            }
            ShortcutAction::Redo => {
                self.redo();
            }
            ShortcutAction::AddText => {
                self.add_text();
            }
            ShortcutAction::Export => {}
            ShortcutAction::Escape => {
                if self.store.document().is_cropping {
                    self.store.set_cropping(false);
                } else {
                    self.store.select_element(None);
                }
            }
            ShortcutAction::FinishCrop => {
                self.store.set_cropping(false);
            }
            ShortcutAction::ToggleCrop => {
                let on = self.store.document().is_cropping;
                self.store.set_cropping(!on);
            }
            _ => {
                let id = selected?;
                match action {
                    ShortcutAction::Delete => self.remove_element(id),
                    ShortcutAction::SendBackward => self.reorder_element(id, ReorderDirection::Down),
                    ShortcutAction::BringForward => self.reorder_element(id, ReorderDirection::Up),
                    ShortcutAction::SendToBack => self.reorder_element(id, ReorderDirection::Bottom),
                    ShortcutAction::BringToFront => self.reorder_element(id, ReorderDirection::Top),
                    ShortcutAction::ToggleVisibility => self.toggle_visibility(id),
                    ShortcutAction::ToggleLock => self.toggle_lock(id),
                    _ => false,
                };
            }
        }
        Some(action)
    }

    // ─── Export ──────────────────────────────────────────────────────────

    pub fn export_options(&self, pixel_ratio: PixelRatio) -> ExportOptions {
        let doc = self.store.document();
        ExportOptions {
            format: doc.export_format,
            quality: doc.export_quality,
            pixel_ratio,
            app_name: self.config.app_name.clone(),
        }
    }

    /// Whole-scene capture through the host. Selection feedback is hidden
    /// for the duration and restored afterwards, even on failure.
    pub fn export_capture(&mut self, capture: &mut dyn SceneCapture, pixel_ratio: PixelRatio) -> RenderResult<ExportBlob> {
        let options = self.export_options(pixel_ratio);
        self.with_selection_hidden(|doc| capture_with_retry(capture, doc, &options))
    }

    /// Manual redraw in the document's export format. SVG is drawn
    /// natively; raster formats paint onto the surface `raster` opens at the
    /// output size.
    pub fn export_manual_with<S, F>(&mut self, pixel_ratio: PixelRatio, raster: F) -> RenderResult<ExportBlob>
    where
        S: RasterSurface,
        F: FnOnce(u32, u32) -> RenderResult<S>,
    {
        let options = self.export_options(pixel_ratio);
        self.with_selection_hidden(|doc| paint::export_manual_with(doc, &options, raster))
    }

    fn with_selection_hidden<T>(&mut self, f: impl FnOnce(&EditorDocument) -> T) -> T {
        let selected = self.store.document().selected_element_id;
        let cropping = self.store.document().is_cropping;
        self.store.select_element(None);
        let out = f(self.store.document());
        self.store.restore_selection(selected, cropping);
        out
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    pub fn save_json(&self) -> PersistResult<String> {
        persist::to_json(self.store.document())
    }

    pub fn save_msgpack(&self) -> PersistResult<Vec<u8>> {
        persist::to_msgpack(self.store.document())
    }

    pub fn load_json(&mut self, text: &str) -> PersistResult<()> {
        let doc = persist::from_json(text)?;
        self.install(doc);
        Ok(())
    }

    pub fn load_msgpack(&mut self, bytes: &[u8]) -> PersistResult<()> {
        let doc = persist::from_msgpack(bytes)?;
        self.install(doc);
        Ok(())
    }

    fn install(&mut self, doc: EditorDocument) {
        self.session.end_gesture();
        self.scheduler.cancel(TimerKey::HistorySave);
        log::debug!("loaded document with {} layers", doc.elements.len());
        self.store.load(doc);
        self.history.reset(HistorySnapshot::capture(self.store.document()));
    }
}
