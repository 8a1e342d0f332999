//! WASM bridge for the TorchLab canvas: exposes the editor session to
//! JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. The page owns the DOM, the
//! template palette, and the `requestAnimationFrame` loop; everything else
//! (hit testing, gestures, animation state, rendering) runs here.
//!
//! Frame loop contract: after any call, if `needs_frame()` returns true the
//! page schedules one animation frame that calls `tick(now)` and `render`.

mod render2d;

use std::cell::Cell;
use std::rc::Rc;
use tl_core::anim::FrameScheduler;
use tl_core::config::EditorConfig;
use tl_core::id::{ConnectionId, NodeId};
use tl_core::model::ParamValue;
use tl_editor::input::{Button, Modifiers};
use tl_editor::session::EditorSession;
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

/// Scheduler that only records that a frame was asked for.
struct RecordingScheduler(Rc<Cell<bool>>);

impl FrameScheduler for RecordingScheduler {
    fn request_frame(&mut self) {
        self.0.set(true);
    }
}

/// The main WASM-facing canvas controller.
#[wasm_bindgen]
pub struct TlCanvas {
    session: EditorSession,
    frame_requested: Rc<Cell<bool>>,
    width: f64,
    height: f64,
}

impl TlCanvas {
    fn build(config: EditorConfig, width: f64, height: f64) -> Self {
        console_error_panic_hook_setup();
        let frame_requested = Rc::new(Cell::new(false));
        let scheduler = RecordingScheduler(Rc::clone(&frame_requested));
        let mut session = EditorSession::new(config, Box::new(scheduler));
        session.set_view_size(width as f32, height as f32);
        Self {
            session,
            frame_requested,
            width,
            height,
        }
    }
}

#[wasm_bindgen]
impl TlCanvas {
    /// Create a canvas controller with default configuration.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64) -> Self {
        Self::build(EditorConfig::default(), width, height)
    }

    /// Create a canvas controller from a (partial) JSON configuration.
    /// Unknown or malformed configuration falls back to the defaults.
    pub fn with_config(config_json: &str, width: f64, height: f64) -> Self {
        let config = EditorConfig::from_json(config_json).unwrap_or_else(|e| {
            log::warn!("invalid editor config, using defaults: {e}");
            EditorConfig::default()
        });
        Self::build(config, width, height)
    }

    /// Render the canvas to a Canvas2D context.
    pub fn render(&self, ctx: &CanvasRenderingContext2d) {
        render2d::render_canvas(
            ctx,
            self.session.graph(),
            self.session.viewport().transform(),
            &self.session.overlay(),
            self.width,
            self.height,
            self.session.show_grid(),
            &render2d::CanvasTheme::default(),
        );
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.session.set_view_size(width as f32, height as f32);
    }

    // ─── Animation ───────────────────────────────────────────────────────

    /// Whether an animation frame was requested since the last call.
    pub fn needs_frame(&self) -> bool {
        self.frame_requested.replace(false)
    }

    /// Advance animations to `now_ms` (a `requestAnimationFrame` timestamp).
    pub fn tick(&mut self, now_ms: f64) -> bool {
        self.session.tick(now_ms)
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Handle a template dropped from the palette. Returns the new node id.
    pub fn drop_template(&mut self, payload: &str, x: f32, y: f32) -> Option<String> {
        self.session
            .drop_template(payload, x, y)
            .map(|id| id.as_str().to_string())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_down(
        &mut self,
        x: f32,
        y: f32,
        button: i16,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) {
        let mods = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        self.session.pointer_down(x, y, Button::from_dom(button), mods);
    }

    pub fn handle_pointer_move(
        &mut self,
        x: f32,
        y: f32,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) {
        let mods = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        self.session.pointer_move(x, y, mods);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_up(
        &mut self,
        x: f32,
        y: f32,
        button: i16,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) {
        let mods = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        self.session.pointer_up(x, y, Button::from_dom(button), mods);
    }

    pub fn handle_wheel(&mut self, x: f32, y: f32, delta_y: f32) {
        self.session.wheel(x, y, delta_y);
    }

    /// Handle a key press. Returns true if a shortcut consumed it.
    pub fn handle_key(
        &mut self,
        key: &str,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        let mods = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        self.session.handle_key(key, mods)
    }

    pub fn set_space_held(&mut self, held: bool) {
        self.session.set_space_held(held);
    }

    pub fn show_grid(&self) -> bool {
        self.session.show_grid()
    }

    pub fn set_show_grid(&mut self, show: bool) {
        self.session.set_show_grid(show);
    }

    /// Flip the background grid; returns the new state.
    pub fn toggle_grid(&mut self) -> bool {
        self.session.toggle_grid()
    }

    /// CSS cursor for the canvas element.
    pub fn cursor(&self) -> String {
        self.session.cursor().as_css().to_string()
    }

    // ─── View controls ───────────────────────────────────────────────────

    pub fn zoom_in(&mut self) -> bool {
        self.session.zoom_in()
    }

    pub fn zoom_out(&mut self) -> bool {
        self.session.zoom_out()
    }

    pub fn fit_view(&mut self) -> bool {
        self.session.fit_view()
    }

    pub fn reset_view(&mut self) {
        self.session.reset_view();
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.session.set_locked(locked);
    }

    pub fn is_locked(&self) -> bool {
        self.session.viewport().is_locked()
    }

    pub fn zoom_percent(&self) -> u32 {
        self.session.viewport().zoom_percent()
    }

    /// Current transform as `{"offsetX":…,"offsetY":…,"scale":…}`.
    pub fn transform_json(&self) -> String {
        serde_json::to_string(&self.session.viewport().transform())
            .unwrap_or_else(|_| "{}".to_string())
    }

    // ─── Graph edits ─────────────────────────────────────────────────────

    pub fn select_node(&mut self, id: Option<String>) {
        self.session.select_node(id.as_deref().map(NodeId::intern));
    }

    pub fn selected_id(&self) -> Option<String> {
        self.session.selected().map(|id| id.as_str().to_string())
    }

    /// The selected node with its live input/output counts, or `null`.
    pub fn selected_node_json(&self) -> String {
        let Some(node) = self.session.selected().and_then(|id| self.session.graph().node(id)) else {
            return "null".to_string();
        };
        let degree = self.session.degree(node.id);
        serde_json::json!({
            "node": node,
            "inputs": degree.inputs,
            "outputs": degree.outputs,
        })
        .to_string()
    }

    pub fn delete_node(&mut self, id: &str) -> bool {
        self.session.delete_node(NodeId::intern(id))
    }

    pub fn delete_selected(&mut self) -> bool {
        self.session.delete_selected()
    }

    pub fn delete_connection(&mut self, id: &str) -> bool {
        self.session.delete_connection(ConnectionId::intern(id))
    }

    pub fn clear(&mut self) {
        self.session.clear();
    }

    /// Set one parameter from a JSON value (`true`, `0.5`, `"[batch, 10]"`).
    /// Returns `{"ok":true}` or `{"ok":false,"error":"..."}`.
    pub fn set_param(&mut self, id: &str, name: &str, value_json: &str) -> String {
        let value: ParamValue = match serde_json::from_str(value_json) {
            Ok(v) => v,
            Err(e) => return error_json(e),
        };
        match self.session.set_param(NodeId::intern(id), name, value) {
            Ok(()) => r#"{"ok":true}"#.to_string(),
            Err(e) => error_json(e),
        }
    }

    // ─── Snapshot / stats ────────────────────────────────────────────────

    /// Replace the graph from a snapshot. Returns `{"ok":…}` like `set_param`.
    pub fn load_graph(&mut self, json: &str) -> String {
        match self.session.load_graph(json) {
            Ok(()) => r#"{"ok":true}"#.to_string(),
            Err(e) => error_json(e),
        }
    }

    pub fn export_graph(&self) -> String {
        self.session
            .export_graph()
            .to_json()
            .unwrap_or_else(|_| r#"{"nodes":[],"connections":[]}"#.to_string())
    }

    /// `{"layers":…,"connections":…}`
    pub fn stats_json(&self) -> String {
        serde_json::to_string(&self.session.stats()).unwrap_or_else(|_| "{}".to_string())
    }
}

fn error_json(e: impl std::fmt::Display) -> String {
    serde_json::json!({ "ok": false, "error": e.to_string() }).to_string()
}

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("TorchLab WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}
