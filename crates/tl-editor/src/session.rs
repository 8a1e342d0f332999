//! Editor session: the one object a host talks to.
//!
//! Owns the graph, the viewport, the gesture machine, and the selection.
//! Every host entry point (pointer, wheel, keys, toolbar buttons, drops,
//! snapshot I/O) goes through here, so the invariants between those parts
//! are kept in one place:
//!
//! - the selection never names a node that is gone or being deleted;
//! - the hovered connection is always live;
//! - a frame is requested whenever a tween is pending.

use crate::gesture::{CanvasAction, GestureMachine, GestureState};
use crate::input::{Button, InputEvent, Modifiers};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use tl_core::anim::{FrameScheduler, NoopScheduler};
use tl_core::config::EditorConfig;
use tl_core::error::{GraphError, ParamError};
use tl_core::graph::Graph;
use tl_core::id::{ConnectionId, NodeId};
use tl_core::model::{GraphSnapshot, GraphStats, LayerTemplate, NodeDegree, ParamValue, Point};
use tl_core::viewport::{Viewport, ZoomDirection};
use tl_render::hit::{Hit, hit_test};
use tl_render::paint::Overlay;

/// Pointer cursor the host should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Default,
    Grab,
    Grabbing,
    Move,
    Crosshair,
    Pointer,
}

impl Cursor {
    /// CSS `cursor` value.
    pub fn as_css(self) -> &'static str {
        match self {
            Cursor::Default => "default",
            Cursor::Grab => "grab",
            Cursor::Grabbing => "grabbing",
            Cursor::Move => "move",
            Cursor::Crosshair => "crosshair",
            Cursor::Pointer => "pointer",
        }
    }
}

pub struct EditorSession {
    graph: Graph,
    viewport: Viewport,
    gesture: GestureMachine,
    config: EditorConfig,
    selected: Option<NodeId>,
    hovered_connection: Option<ConnectionId>,
    /// Space is held: the host shows a grab cursor.
    space_held: bool,
    show_grid: bool,
    view_width: f32,
    view_height: f32,
    scheduler: Box<dyn FrameScheduler>,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default(), Box::new(NoopScheduler))
    }
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("graph", &self.graph)
            .field("viewport", &self.viewport)
            .field("gesture", &self.gesture)
            .field("selected", &self.selected)
            .finish_non_exhaustive()
    }
}

impl EditorSession {
    pub fn new(config: EditorConfig, scheduler: Box<dyn FrameScheduler>) -> Self {
        Self {
            graph: Graph::new(config),
            viewport: Viewport::new(config.canvas),
            gesture: GestureMachine::new(),
            config,
            selected: None,
            hovered_connection: None,
            space_held: false,
            show_grid: true,
            view_width: 0.0,
            view_height: 0.0,
            scheduler,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn gesture_state(&self) -> GestureState {
        self.gesture.state()
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn hovered_connection(&self) -> Option<ConnectionId> {
        self.hovered_connection
    }

    pub fn set_view_size(&mut self, width: f32, height: f32) {
        self.view_width = width;
        self.view_height = height;
    }

    /// Source anchor and live pointer of the in-progress connection line.
    pub fn temp_connection(&self) -> Option<(Point, Point)> {
        self.gesture
            .temp_connection()
            .map(|(source, pointer)| (source.position(), pointer))
    }

    /// Everything the painters need besides the graph and transform.
    pub fn overlay(&self) -> Overlay {
        Overlay {
            selected: self.selected,
            hovered_connection: self.hovered_connection,
            temp_connection: self.temp_connection(),
        }
    }

    pub fn cursor(&self) -> Cursor {
        match self.gesture.state() {
            GestureState::PanningViewport => Cursor::Grabbing,
            GestureState::DraggingNode { .. } => Cursor::Move,
            GestureState::ConnectingFrom { .. } => Cursor::Crosshair,
            GestureState::Idle if self.space_held && !self.viewport.is_locked() => Cursor::Grab,
            GestureState::Idle if self.hovered_connection.is_some() => Cursor::Pointer,
            GestureState::Idle => Cursor::Default,
        }
    }

    pub fn set_space_held(&mut self, held: bool) {
        self.space_held = held;
    }

    /// Whether the background dot grid is drawn. On by default.
    pub fn show_grid(&self) -> bool {
        self.show_grid
    }

    pub fn set_show_grid(&mut self, show: bool) {
        self.show_grid = show;
    }

    pub fn toggle_grid(&mut self) -> bool {
        self.show_grid = !self.show_grid;
        self.show_grid
    }

    // ─── Drop ────────────────────────────────────────────────────────────

    /// Create a node from a dragged template payload, centered on the screen
    /// point. Malformed payloads are ignored.
    pub fn drop_template(&mut self, payload: &str, sx: f32, sy: f32) -> Option<NodeId> {
        let template = match LayerTemplate::from_json(payload) {
            Ok(t) => t,
            Err(e) => {
                log::debug!("ignored drop payload: {e}");
                return None;
            }
        };
        let at = self.viewport.screen_to_canvas(sx, sy);
        if !at.is_finite() {
            return None;
        }
        let origin = Point::new(
            at.x - self.config.node_width / 2.0,
            at.y - self.config.node_height / 2.0,
        );
        Some(self.graph.add_node(&template, origin))
    }

    // ─── Pointer input ───────────────────────────────────────────────────

    pub fn pointer_down(&mut self, sx: f32, sy: f32, button: Button, modifiers: Modifiers) {
        self.handle_input(&InputEvent::PointerDown {
            x: sx,
            y: sy,
            button,
            modifiers,
        });
    }

    pub fn pointer_move(&mut self, sx: f32, sy: f32, modifiers: Modifiers) {
        self.handle_input(&InputEvent::PointerMove {
            x: sx,
            y: sy,
            modifiers,
        });
    }

    pub fn pointer_up(&mut self, sx: f32, sy: f32, button: Button, modifiers: Modifiers) {
        self.handle_input(&InputEvent::PointerUp {
            x: sx,
            y: sy,
            button,
            modifiers,
        });
    }

    pub fn wheel(&mut self, sx: f32, sy: f32, delta_y: f32) {
        self.handle_input(&InputEvent::Wheel { x: sx, y: sy, delta_y });
    }

    /// Route one event through the gesture machine and apply its actions.
    pub fn handle_input(&mut self, event: &InputEvent) {
        let (sx, sy) = event.position();
        let at = self.viewport.screen_to_canvas(sx, sy);
        let hit = match event {
            InputEvent::PointerDown { .. } | InputEvent::PointerUp { .. } => {
                hit_test(&self.graph, &self.config, self.hovered_connection, at.x, at.y)
            }
            InputEvent::PointerMove { .. } => {
                if self.gesture.state() == GestureState::Idle {
                    let hovered = self.hovered_connection;
                    let under = hit_test(&self.graph, &self.config, hovered, at.x, at.y);
                    self.hovered_connection = match under {
                        Hit::DeleteTarget(id) => Some(id),
                        _ => None,
                    };
                }
                Hit::Canvas
            }
            InputEvent::Wheel { .. } => Hit::Canvas,
        };

        let actions = self.gesture.handle(event, hit, &self.viewport);
        for action in actions {
            self.apply(action);
        }
    }

    fn apply(&mut self, action: CanvasAction) {
        log::trace!("apply {action:?}");
        match action {
            CanvasAction::SelectNode(id) => self.select_node(id),
            CanvasAction::BringToFront(id) => self.graph.bring_to_front(id),
            CanvasAction::MoveNode { id, x, y } => {
                self.graph.move_node(id, x, y);
            }
            CanvasAction::StartPan { x, y } => {
                self.viewport.start_pan(x, y);
            }
            CanvasAction::UpdatePan { x, y } => self.viewport.update_pan(x, y),
            CanvasAction::EndPan => self.viewport.end_pan(),
            CanvasAction::Zoom { direction, center } => {
                self.viewport.zoom(direction, Some(center));
            }
            CanvasAction::AddConnection { source, target } => {
                self.connect(source, target);
            }
            CanvasAction::DeleteConnection(id) => {
                self.delete_connection(id);
            }
        }
    }

    // ─── View controls ───────────────────────────────────────────────────

    fn view_center(&self) -> Point {
        Point::new(self.view_width / 2.0, self.view_height / 2.0)
    }

    /// Step the zoom in, keeping the view center fixed.
    pub fn zoom_in(&mut self) -> bool {
        let center = self.view_center();
        self.viewport.zoom(ZoomDirection::In, Some(center))
    }

    pub fn zoom_out(&mut self) -> bool {
        let center = self.view_center();
        self.viewport.zoom(ZoomDirection::Out, Some(center))
    }

    pub fn fit_view(&mut self) -> bool {
        self.viewport
            .fit_view(self.graph.nodes(), self.view_width, self.view_height)
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset_view();
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.viewport.set_locked(locked);
        if locked && self.gesture.state() == GestureState::PanningViewport {
            for action in self.gesture.cancel() {
                self.apply(action);
            }
        }
    }

    pub fn toggle_lock(&mut self) {
        self.set_locked(!self.viewport.is_locked());
    }

    // ─── Graph edits ─────────────────────────────────────────────────────

    /// Select a node, or clear the selection with `None`.
    /// Unknown and dying nodes clear it.
    pub fn select_node(&mut self, id: Option<NodeId>) {
        self.selected =
            id.filter(|id| self.graph.contains_node(*id) && !self.graph.is_pending_removal(*id));
    }

    /// Connect two nodes output → input. Rejections are silent no-ops.
    pub fn connect(&mut self, source: NodeId, target: NodeId) -> Option<ConnectionId> {
        let start = self.graph.node(source)?.output_anchor();
        let end = self.graph.node(target)?.input_anchor();
        let id = self.graph.add_connection(source, target, start, end)?;
        self.schedule();
        Some(id)
    }

    pub fn delete_connection(&mut self, id: ConnectionId) -> bool {
        let deleted = self.graph.delete_connection(id);
        if deleted {
            if self.hovered_connection == Some(id) {
                self.hovered_connection = None;
            }
            self.schedule();
        }
        deleted
    }

    pub fn delete_node(&mut self, id: NodeId) -> bool {
        let deleted = self.graph.delete_node(id);
        if deleted {
            if self.selected == Some(id) {
                self.selected = None;
            }
            self.drop_stale_hover();
            self.schedule();
        }
        deleted
    }

    pub fn delete_selected(&mut self) -> bool {
        match self.selected {
            Some(id) => self.delete_node(id),
            None => false,
        }
    }

    /// Animate every connection out, then drop every node.
    pub fn clear(&mut self) {
        self.gesture.cancel();
        self.viewport.end_pan();
        self.graph.clear();
        self.selected = None;
        self.hovered_connection = None;
        self.schedule();
    }

    pub fn set_param(
        &mut self,
        id: NodeId,
        name: &str,
        value: ParamValue,
    ) -> Result<(), ParamError> {
        self.graph.set_param(id, name, value)
    }

    // ─── Animation ───────────────────────────────────────────────────────

    /// Advance tweens to `now_ms`. Returns whether another frame is needed.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        let outcome = self.graph.tick(now_ms);
        if let Some(sel) = self.selected
            && outcome.removed_nodes.contains(&sel)
        {
            self.selected = None;
        }
        if let Some(hovered) = self.hovered_connection
            && outcome.purged.contains(&hovered)
        {
            self.hovered_connection = None;
        }
        if outcome.needs_frame {
            self.scheduler.request_frame();
        }
        outcome.needs_frame
    }

    fn schedule(&mut self) {
        if self.graph.is_animating() {
            self.scheduler.request_frame();
        }
    }

    fn drop_stale_hover(&mut self) {
        if let Some(id) = self.hovered_connection
            && self.graph.connection(id).is_none_or(|c| !c.is_live())
        {
            self.hovered_connection = None;
        }
    }

    // ─── Snapshot / stats ────────────────────────────────────────────────

    /// Replace the graph. On error the session is left untouched.
    pub fn load_graph(&mut self, json: &str) -> Result<(), GraphError> {
        self.graph.load_json(json)?;
        self.gesture.cancel();
        self.viewport.end_pan();
        self.selected = None;
        self.hovered_connection = None;
        Ok(())
    }

    pub fn export_graph(&self) -> GraphSnapshot {
        self.graph.export()
    }

    pub fn stats(&self) -> GraphStats {
        self.graph.stats()
    }

    pub fn degree(&self, id: NodeId) -> NodeDegree {
        self.graph.degree(id)
    }

    // ─── Keyboard ────────────────────────────────────────────────────────

    /// Resolve and run a shortcut. Returns whether the key was consumed.
    pub fn handle_key(&mut self, key: &str, modifiers: Modifiers) -> bool {
        let Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        } = modifiers;
        let Some(action) = ShortcutMap::resolve(key, ctrl, shift, alt, meta) else {
            return false;
        };
        log::debug!("shortcut {key:?} -> {action:?}");
        match action {
            ShortcutAction::ZoomIn => {
                self.zoom_in();
            }
            ShortcutAction::ZoomOut => {
                self.zoom_out();
            }
            ShortcutAction::ResetView => self.reset_view(),
            ShortcutAction::FitView => {
                self.fit_view();
            }
            ShortcutAction::ToggleLock => self.toggle_lock(),
            ShortcutAction::DeleteSelected => {
                self.delete_selected();
            }
            ShortcutAction::Cancel => {
                for action in self.gesture.cancel() {
                    self.apply(action);
                }
                self.selected = None;
            }
        }
        true
    }
}
