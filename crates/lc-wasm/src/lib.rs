//! WASM bridge for LayerCraft: exposes the editor engine to JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. The page owns the DOM scene
//! and calls into `LayerCanvas` for every edit; reads come back as JSON
//! strings, failures as `false` or `{"ok":false,"error":..}`.

mod render2d;

use lc_core::geometry::CropHandle;
use lc_core::id::ElementId;
use lc_core::model::{Bounds, ElementUpdate, ExportFormat, ReorderDirection};
use lc_core::records::{PostMedia, ScheduledPost};
use lc_editor::{
    Clock, DocumentChange, Editor, EditorConfig, EditorTab, InputEvent, PointerCapture, PointerTarget,
    ViewportMapper,
};
use lc_render::capture::{CaptureRequest, SceneCapture};
use lc_render::error::{RenderError, RenderResult};
use lc_render::export::{ExportBlob, ExportPayload, PixelRatio};
use render2d::{CanvasSurface, js_message};
use serde::Deserialize;
use std::collections::HashMap;
use wasm_bindgen::prelude::*;
use web_sys::HtmlImageElement;

// ─── Host adapters ───────────────────────────────────────────────────────

/// `Date.now()` in the browser.
struct JsClock;

impl Clock for JsClock {
    fn now_ms(&self) -> u64 {
        js_sys::Date::now() as u64
    }
}

fn host_clock() -> Box<dyn Clock> {
    if cfg!(target_arch = "wasm32") {
        Box::new(JsClock)
    } else {
        Box::new(lc_editor::SystemClock::default())
    }
}

/// Scene capture delegated to a JS function
/// `(request: string) => string` returning a data url.
struct JsCapture<'a>(&'a js_sys::Function);

impl SceneCapture for JsCapture<'_> {
    fn capture(&mut self, request: &CaptureRequest) -> RenderResult<ExportPayload> {
        let json = serde_json::to_string(request).map_err(|e| RenderError::surface(e.to_string()))?;
        let out = self
            .0
            .call1(&JsValue::NULL, &JsValue::from_str(&json))
            .map_err(|e| RenderError::surface(js_message(&e)))?;
        match out.as_string() {
            Some(url) if url.starts_with("data:") => Ok(ExportPayload::DataUrl(url)),
            _ => Err(RenderError::surface("capture did not return a data url")),
        }
    }
}

/// Pointer capture on the DOM element hosting the scene.
struct ElementCapture(web_sys::Element);

impl PointerCapture for ElementCapture {
    fn acquire(&mut self, pointer_id: i32) {
        if let Err(e) = self.0.set_pointer_capture(pointer_id) {
            log::warn!("setPointerCapture({pointer_id}) failed: {}", js_message(&e));
        }
    }

    fn release(&mut self, pointer_id: i32) {
        if let Err(e) = self.0.release_pointer_capture(pointer_id) {
            log::warn!("releasePointerCapture({pointer_id}) failed: {}", js_message(&e));
        }
    }
}

/// Hit-test result sent by the page on pointer-down.
///
/// `{}` is the empty canvas, `{"element":"id"}` a layer body, and
/// `{"element":"id","handle":"right","ghost":{..}}` a crop handle.
#[derive(Debug, Default, Deserialize)]
struct TargetSpec {
    element: Option<String>,
    handle: Option<String>,
    ghost: Option<Bounds>,
}

impl TargetSpec {
    fn resolve(self) -> PointerTarget {
        match (self.element, self.handle.as_deref().and_then(CropHandle::from_name), self.ghost) {
            (Some(id), Some(handle), Some(ghost)) => PointerTarget::CropHandle {
                element: ElementId::intern(&id),
                handle,
                ghost,
            },
            (Some(id), _, _) => PointerTarget::Element(ElementId::intern(&id)),
            _ => PointerTarget::Canvas,
        }
    }
}

fn parse_target(json: &str) -> PointerTarget {
    if json.trim().is_empty() {
        return PointerTarget::Canvas;
    }
    match serde_json::from_str::<TargetSpec>(json) {
        Ok(spec) => spec.resolve(),
        Err(e) => {
            log::warn!("bad pointer target {json:?}: {e}");
            PointerTarget::Canvas
        }
    }
}

fn change_kind(change: &DocumentChange) -> &'static str {
    match change {
        DocumentChange::Added(_) => "added",
        DocumentChange::Updated(_) => "updated",
        DocumentChange::Removed(_) => "removed",
        DocumentChange::Reordered(_) => "reordered",
        DocumentChange::Moved(_) => "moved",
        DocumentChange::Selection(_) => "selection",
        DocumentChange::Cropping(_) => "cropping",
        DocumentChange::Background => "background",
        DocumentChange::Canvas => "canvas",
        DocumentChange::ExportSettings => "export",
        DocumentChange::Tab(_) => "tab",
        DocumentChange::Replaced => "replaced",
        DocumentChange::Reset => "reset",
    }
}

fn export_json(result: RenderResult<ExportBlob>) -> String {
    match result {
        Ok(blob) => serde_json::json!({
            "ok": true,
            "filename": blob.filename,
            "mime": blob.mime,
            "dataUrl": blob.to_data_url(),
        })
        .to_string(),
        Err(e) => {
            log::warn!("export failed: {e}");
            serde_json::json!({ "ok": false, "error": e.to_string() }).to_string()
        }
    }
}

/// Attach a finished export to the post described by `post_json`.
fn post_json(post_json: &str, result: RenderResult<ExportBlob>) -> String {
    let post: ScheduledPost = match serde_json::from_str(post_json) {
        Ok(post) => post,
        Err(e) => {
            log::warn!("bad post record: {e}");
            return serde_json::json!({ "ok": false, "error": e.to_string() }).to_string();
        }
    };
    match result {
        Ok(blob) => {
            let post = post.with_media(PostMedia {
                data_url: blob.to_data_url(),
                filename: blob.filename,
                mime: blob.mime.to_string(),
            });
            serde_json::json!({ "ok": true, "post": post }).to_string()
        }
        Err(e) => {
            log::warn!("export for post failed: {e}");
            serde_json::json!({ "ok": false, "error": e.to_string() }).to_string()
        }
    }
}

fn pixel_ratio(ratio: u32) -> PixelRatio {
    PixelRatio::from_value(ratio).unwrap_or_else(|| {
        log::warn!("unsupported pixel ratio {ratio}; using 1x");
        PixelRatio::X1
    })
}

// ─── Controller ──────────────────────────────────────────────────────────

/// The main WASM-facing controller.
///
/// Holds the editor and the image elements the page has loaded for the
/// Canvas2D export path.
#[wasm_bindgen]
pub struct LayerCanvas {
    editor: Editor,
    images: HashMap<String, HtmlImageElement>,
}

#[wasm_bindgen]
impl LayerCanvas {
    /// Create a controller. `config_json` may be empty for defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Self {
        console_error_panic_hook_setup();

        let config = if config_json.trim().is_empty() {
            EditorConfig::default()
        } else {
            EditorConfig::from_json(config_json).unwrap_or_else(|e| {
                log::warn!("ignoring editor config: {e}");
                EditorConfig::default()
            })
        };
        Self {
            editor: Editor::with_clock(config, host_clock()),
            images: HashMap::new(),
        }
    }

    // ── Document ──

    pub fn get_document_json(&self) -> String {
        serde_json::to_string(self.editor.document()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Replace the document. Returns `false` if it fails to parse or validate.
    pub fn load_document_json(&mut self, json: &str) -> bool {
        match self.editor.load_json(json) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("load rejected: {e}");
                false
            }
        }
    }

    /// Compact binary save for local storage. Empty on encode failure.
    pub fn get_document_msgpack(&self) -> Vec<u8> {
        self.editor.save_msgpack().unwrap_or_else(|e| {
            log::warn!("binary save failed: {e}");
            Vec::new()
        })
    }

    pub fn load_document_msgpack(&mut self, bytes: &[u8]) -> bool {
        match self.editor.load_msgpack(bytes) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("load rejected: {e}");
                false
            }
        }
    }

    /// Styling for every layer of the live scene, bottom to top.
    pub fn get_layers_css_json(&self) -> String {
        serde_json::to_string(&lc_render::scene_css(self.editor.document())).unwrap_or_else(|_| "[]".to_string())
    }

    /// Invoke `callback(kind)` after every document change.
    pub fn on_change(&mut self, callback: js_sys::Function) {
        self.editor.subscribe(move |change, _| {
            let _ = callback.call1(&JsValue::NULL, &JsValue::from_str(change_kind(change)));
        });
    }

    // ── Layers ──

    /// Returns the new layer's id.
    pub fn add_text(&mut self) -> String {
        self.editor.add_text().map(|id| id.to_string()).unwrap_or_default()
    }

    /// Place an image the page already decoded. Returns the id or `""`.
    pub fn add_image(&mut self, src: &str, natural_width: f32, natural_height: f32) -> String {
        self.editor
            .add_image(src, natural_width, natural_height)
            .map(|id| id.to_string())
            .unwrap_or_default()
    }

    /// Place a gallery pick (`{id, name, url, thumbnailUrl}`) the page has
    /// loaded. Returns the id or `""`.
    pub fn add_gallery_image(&mut self, item_json: &str, natural_width: f32, natural_height: f32) -> String {
        let item: lc_core::GalleryItem = match serde_json::from_str(item_json) {
            Ok(item) => item,
            Err(e) => {
                log::warn!("bad gallery item: {e}");
                return String::new();
            }
        };
        self.editor
            .add_gallery_image(&item, natural_width, natural_height)
            .map(|id| id.to_string())
            .unwrap_or_default()
    }

    /// Probe and place raw upload bytes. Returns the id or `""`.
    pub fn upload_image(&mut self, bytes: &[u8]) -> String {
        self.editor.upload_image(bytes).map(|id| id.to_string()).unwrap_or_default()
    }

    /// Apply an `ElementUpdate` given as JSON, e.g. `{"text":{"fontSize":64}}`.
    pub fn update_element(&mut self, id: &str, update_json: &str) -> bool {
        let update: ElementUpdate = match serde_json::from_str(update_json) {
            Ok(u) => u,
            Err(e) => {
                log::warn!("bad update for {id}: {e}");
                return false;
            }
        };
        self.editor.update_element(ElementId::intern(id), &update)
    }

    pub fn remove_element(&mut self, id: &str) -> bool {
        self.editor.remove_element(ElementId::intern(id))
    }

    /// `direction` is `up`, `down`, `top` or `bottom`.
    pub fn reorder_element(&mut self, id: &str, direction: &str) -> bool {
        let Ok(direction) = serde_json::from_value::<ReorderDirection>(direction.into()) else {
            log::warn!("unknown reorder direction {direction:?}");
            return false;
        };
        self.editor.reorder_element(ElementId::intern(id), direction)
    }

    pub fn move_element_to(&mut self, from: usize, to: usize) -> bool {
        self.editor.move_element_to(from, to)
    }

    pub fn toggle_visibility(&mut self, id: &str) -> bool {
        self.editor.toggle_visibility(ElementId::intern(id))
    }

    pub fn toggle_lock(&mut self, id: &str) -> bool {
        self.editor.toggle_lock(ElementId::intern(id))
    }

    pub fn select_element(&mut self, id: Option<String>) -> bool {
        self.editor.select_element(id.as_deref().map(ElementId::intern))
    }

    pub fn get_selected_id(&self) -> String {
        self.editor
            .document()
            .selected_element_id
            .map(|id| id.to_string())
            .unwrap_or_default()
    }

    pub fn set_cropping(&mut self, on: bool) -> bool {
        self.editor.set_cropping(on)
    }

    // ── Document settings ──

    pub fn set_background(&mut self, value: &str) -> bool {
        self.editor.set_background(value)
    }

    pub fn set_aspect_ratio(&mut self, name: &str) -> bool {
        self.editor.set_aspect_ratio(name)
    }

    pub fn set_custom_size(&mut self, width: f32, height: f32) -> bool {
        self.editor.set_custom_size(width, height)
    }

    pub fn set_export_format(&mut self, name: &str) -> bool {
        match ExportFormat::from_name(name) {
            Some(format) => self.editor.set_export_format(format),
            None => false,
        }
    }

    pub fn set_export_quality(&mut self, quality: f32) -> bool {
        self.editor.set_export_quality(quality)
    }

    pub fn set_active_tab(&mut self, name: &str) -> bool {
        let Ok(tab) = serde_json::from_value::<EditorTab>(name.into()) else {
            return false;
        };
        self.editor.set_active_tab(tab)
    }

    pub fn get_active_tab(&self) -> String {
        serde_json::to_value(self.editor.active_tab())
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default()
    }

    pub fn reset(&mut self) -> bool {
        self.editor.reset()
    }

    // ── History ──

    pub fn undo(&mut self) -> bool {
        self.editor.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.editor.redo()
    }

    pub fn can_undo(&self) -> bool {
        self.editor.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.editor.can_redo()
    }

    /// Run due timers. Call from `requestAnimationFrame` or an interval.
    pub fn tick(&mut self) -> u32 {
        self.editor.tick() as u32
    }

    // ── Input ──

    /// The scene is drawn `rendered_width` CSS pixels wide with its
    /// top-left at `(origin_x, origin_y)` in client space.
    pub fn set_viewport(&mut self, origin_x: f32, origin_y: f32, rendered_width: f32) {
        self.editor
            .set_viewport(Box::new(ViewportMapper::new(origin_x, origin_y, rendered_width)));
    }

    pub fn set_capture_element(&mut self, element: web_sys::Element) {
        self.editor.set_pointer_capture(Box::new(ElementCapture(element)));
    }

    /// `target_json` is the page's hit test (see `TargetSpec`).
    /// Returns true if the document changed.
    pub fn handle_pointer_down(&mut self, pointer_id: i32, client_x: f32, client_y: f32, target_json: &str) -> bool {
        let target = parse_target(target_json);
        self.editor
            .handle_pointer(&InputEvent::pointer_down(pointer_id, client_x, client_y), target)
    }

    pub fn handle_pointer_move(&mut self, pointer_id: i32, client_x: f32, client_y: f32) -> bool {
        self.editor.handle_pointer(
            &InputEvent::pointer_move(pointer_id, client_x, client_y),
            PointerTarget::Canvas,
        )
    }

    pub fn handle_pointer_up(&mut self, pointer_id: i32, client_x: f32, client_y: f32) -> bool {
        self.editor
            .handle_pointer(&InputEvent::pointer_up(pointer_id, client_x, client_y), PointerTarget::Canvas)
    }

    pub fn handle_pointer_cancel(&mut self, pointer_id: i32) -> bool {
        self.editor
            .handle_pointer(&InputEvent::PointerCancel { pointer_id }, PointerTarget::Canvas)
    }

    /// Returns the resolved action name (e.g. `"undo"`), or `""`.
    pub fn handle_key(&mut self, key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool) -> String {
        self.editor
            .handle_key(key, ctrl, shift, alt, meta)
            .and_then(|a| serde_json::to_value(a).ok())
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default()
    }

    // ── Export ──

    /// Make a loaded `<img>` available to the Canvas2D export path.
    pub fn register_image(&mut self, src: &str, image: HtmlImageElement) {
        self.images.insert(src.to_string(), image);
    }

    pub fn forget_image(&mut self, src: &str) -> bool {
        self.images.remove(src).is_some()
    }

    /// Photograph the live scene through `capture(requestJson) -> dataUrl`.
    pub fn export_capture(&mut self, capture: &js_sys::Function, ratio: u32) -> String {
        let mut capture = JsCapture(capture);
        export_json(self.editor.export_capture(&mut capture, pixel_ratio(ratio)))
    }

    /// Capture the scene and attach it to a post record
    /// `{content, scheduledAt, platforms}` for the scheduling collaborator.
    pub fn export_post(&mut self, post: &str, capture: &js_sys::Function, ratio: u32) -> String {
        let mut capture = JsCapture(capture);
        post_json(post, self.editor.export_capture(&mut capture, pixel_ratio(ratio)))
    }

    /// Redraw the document in its export format: SVG natively, raster
    /// formats onto an offscreen canvas.
    pub fn export_manual(&mut self, ratio: u32) -> String {
        let images = &self.images;
        let result = self
            .editor
            .export_manual_with(pixel_ratio(ratio), |w, h| CanvasSurface::offscreen(w, h, images));
        export_json(result)
    }
}

/// Forward panics to `console.error` once per page.
fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("LayerCraft WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

/// Validate a document JSON without loading it. Returns a JSON array of
/// diagnostics.
#[wasm_bindgen]
pub fn validate(json: &str) -> String {
    match serde_json::from_str::<lc_core::model::EditorDocument>(json) {
        Ok(doc) => {
            let diags: Vec<_> = lc_core::validate_document(&doc)
                .into_iter()
                .map(|d| {
                    serde_json::json!({
                        "elementId": d.element_id.map(|id| id.to_string()),
                        "message": d.message,
                        "severity": match d.severity {
                            lc_core::Severity::Error => "error",
                            lc_core::Severity::Warning => "warning",
                        },
                        "rule": d.rule,
                    })
                })
                .collect();
            serde_json::Value::Array(diags).to_string()
        }
        Err(e) => serde_json::json!([{ "message": e.to_string(), "severity": "error", "rule": "parse" }]).to_string(),
    }
}
