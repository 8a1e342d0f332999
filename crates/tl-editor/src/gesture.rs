//! Gesture state machine for canvas interactions.
//!
//! Translates pointer events into `CanvasAction`s that the session applies
//! to the graph and viewport. The machine only reads the viewport (for the
//! screen → canvas conversion and the lock flag); it never mutates state
//! outside itself.
//!
//! | State             | Entered by                              | Left by            |
//! |-------------------|-----------------------------------------|--------------------|
//! | `Idle`            | any pointer-up, cancel                  | pointer-down       |
//! | `DraggingNode`    | press on a node body                    | pointer-up         |
//! | `PanningViewport` | press on empty canvas, middle, ⌘+press  | pointer-up         |
//! | `ConnectingFrom`  | press on an output dot                  | pointer-up, cancel |

use crate::input::{Button, InputEvent};
use smallvec::{SmallVec, smallvec};
use tl_core::id::{ConnectionId, NodeId};
use tl_core::model::{ConnectionPoint, Point, PointKind};
use tl_core::viewport::{Viewport, ZoomDirection};
use tl_render::hit::Hit;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    /// Grab offset is the canvas-space distance from the node origin to the
    /// pointer at press time.
    DraggingNode { id: NodeId, grab_dx: f32, grab_dy: f32 },
    PanningViewport,
    /// `pointer` is the live canvas position of the in-progress line's end.
    ConnectingFrom {
        source: ConnectionPoint,
        pointer: Point,
    },
}

/// A state change requested by a gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvasAction {
    SelectNode(Option<NodeId>),
    BringToFront(NodeId),
    /// Canvas-space top-left position.
    MoveNode { id: NodeId, x: f32, y: f32 },
    /// Screen-space pointer position.
    StartPan { x: f32, y: f32 },
    UpdatePan { x: f32, y: f32 },
    EndPan,
    /// Screen-space zoom center.
    Zoom { direction: ZoomDirection, center: Point },
    AddConnection { source: NodeId, target: NodeId },
    DeleteConnection(ConnectionId),
}

pub type Actions = SmallVec<[CanvasAction; 2]>;

#[derive(Debug, Clone, Default)]
pub struct GestureMachine {
    state: GestureState,
}

impl GestureMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn is_connecting(&self) -> bool {
        matches!(self.state, GestureState::ConnectingFrom { .. })
    }

    /// Source dot and live pointer of the in-progress connection.
    pub fn temp_connection(&self) -> Option<(ConnectionPoint, Point)> {
        match self.state {
            GestureState::ConnectingFrom { source, pointer } => Some((source, pointer)),
            _ => None,
        }
    }

    /// Feed one event. `hit` is what lies under the pointer in canvas space;
    /// it is ignored for moves and wheel events.
    pub fn handle(&mut self, event: &InputEvent, hit: Hit, viewport: &Viewport) -> Actions {
        match *event {
            InputEvent::PointerDown {
                x,
                y,
                button,
                modifiers,
            } => {
                let canvas = viewport.screen_to_canvas(x, y);
                if self.is_connecting() {
                    if hit == Hit::Canvas {
                        log::debug!("connection cancelled by background press");
                        self.state = GestureState::Idle;
                    }
                    return SmallVec::new();
                }

                let wants_pan = button == Button::Middle
                    || (button == Button::Primary && modifiers.command() && hit == Hit::Canvas);
                if wants_pan {
                    return self.begin_pan(x, y, viewport);
                }
                if button != Button::Primary {
                    return SmallVec::new();
                }

                match hit {
                    Hit::Point(point) if point.kind == PointKind::Output => {
                        self.state = GestureState::ConnectingFrom {
                            source: point,
                            pointer: canvas,
                        };
                        SmallVec::new()
                    }
                    Hit::Point(_) => SmallVec::new(),
                    Hit::DeleteTarget(id) => {
                        self.state = GestureState::Idle;
                        smallvec![CanvasAction::DeleteConnection(id)]
                    }
                    Hit::Node { id, origin } => {
                        self.state = GestureState::DraggingNode {
                            id,
                            grab_dx: canvas.x - origin.x,
                            grab_dy: canvas.y - origin.y,
                        };
                        smallvec![
                            CanvasAction::SelectNode(Some(id)),
                            CanvasAction::BringToFront(id)
                        ]
                    }
                    Hit::Canvas => {
                        let mut actions: Actions = smallvec![CanvasAction::SelectNode(None)];
                        actions.extend(self.begin_pan(x, y, viewport));
                        actions
                    }
                }
            }

            InputEvent::PointerMove { x, y, .. } => {
                let canvas = viewport.screen_to_canvas(x, y);
                match &mut self.state {
                    GestureState::DraggingNode { id, grab_dx, grab_dy } => {
                        smallvec![CanvasAction::MoveNode {
                            id: *id,
                            x: canvas.x - *grab_dx,
                            y: canvas.y - *grab_dy,
                        }]
                    }
                    GestureState::ConnectingFrom { pointer, .. } => {
                        *pointer = canvas;
                        SmallVec::new()
                    }
                    GestureState::PanningViewport => smallvec![CanvasAction::UpdatePan { x, y }],
                    GestureState::Idle => SmallVec::new(),
                }
            }

            InputEvent::PointerUp { x, y, .. } => {
                let canvas = viewport.screen_to_canvas(x, y);
                match std::mem::take(&mut self.state) {
                    GestureState::DraggingNode { id, grab_dx, grab_dy } => {
                        smallvec![CanvasAction::MoveNode {
                            id,
                            x: canvas.x - grab_dx,
                            y: canvas.y - grab_dy,
                        }]
                    }
                    GestureState::PanningViewport => smallvec![CanvasAction::EndPan],
                    GestureState::ConnectingFrom { source, .. } => match hit {
                        Hit::Point(target)
                            if target.kind == PointKind::Input
                                && target.node_id != source.node_id =>
                        {
                            smallvec![CanvasAction::AddConnection {
                                source: source.node_id,
                                target: target.node_id,
                            }]
                        }
                        _ => {
                            log::debug!("connection from {} cancelled", source.node_id);
                            SmallVec::new()
                        }
                    },
                    GestureState::Idle => SmallVec::new(),
                }
            }

            InputEvent::Wheel { x, y, delta_y } => {
                if viewport.is_locked() || delta_y == 0.0 || !delta_y.is_finite() {
                    return SmallVec::new();
                }
                let direction = if delta_y < 0.0 {
                    ZoomDirection::In
                } else {
                    ZoomDirection::Out
                };
                smallvec![CanvasAction::Zoom {
                    direction,
                    center: Point::new(x, y),
                }]
            }
        }
    }

    /// Abort the current gesture (Escape).
    pub fn cancel(&mut self) -> Actions {
        match std::mem::take(&mut self.state) {
            GestureState::PanningViewport => smallvec![CanvasAction::EndPan],
            _ => SmallVec::new(),
        }
    }

    fn begin_pan(&mut self, x: f32, y: f32, viewport: &Viewport) -> Actions {
        if viewport.is_locked() {
            self.state = GestureState::Idle;
            return SmallVec::new();
        }
        self.state = GestureState::PanningViewport;
        smallvec![CanvasAction::StartPan { x, y }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;
    use pretty_assertions::assert_eq;
    use tl_core::config::CanvasConfig;
    use tl_core::viewport::Transform;

    fn output_of(name: &str) -> ConnectionPoint {
        ConnectionPoint {
            node_id: NodeId::intern(name),
            kind: PointKind::Output,
            x: 70.0,
            y: 86.0,
        }
    }

    fn input_of(name: &str) -> ConnectionPoint {
        ConnectionPoint {
            node_id: NodeId::intern(name),
            kind: PointKind::Input,
            x: 370.0,
            y: 300.0,
        }
    }

    #[test]
    fn drag_uses_canvas_space_grab_offset() {
        let mut vp = Viewport::new(CanvasConfig::default());
        vp.set_transform(Transform {
            offset_x: 100.0,
            offset_y: 50.0,
            scale: 2.0,
        });
        let id = NodeId::intern("gesture-drag");
        let mut m = GestureMachine::new();

        // Screen (140, 90) is canvas (20, 20); the node origin is (10, 10).
        let actions = m.handle(
            &InputEvent::pointer_down(140.0, 90.0),
            Hit::Node {
                id,
                origin: Point::new(10.0, 10.0),
            },
            &vp,
        );
        assert_eq!(
            actions.as_slice(),
            &[CanvasAction::SelectNode(Some(id)), CanvasAction::BringToFront(id)]
        );

        // Screen +20 px at scale 2 is +10 canvas units.
        let actions = m.handle(&InputEvent::pointer_move(160.0, 90.0), Hit::Canvas, &vp);
        assert_eq!(actions.as_slice(), &[CanvasAction::MoveNode { id, x: 20.0, y: 10.0 }]);

        let actions = m.handle(&InputEvent::pointer_up(180.0, 110.0), Hit::Canvas, &vp);
        assert_eq!(actions.as_slice(), &[CanvasAction::MoveNode { id, x: 30.0, y: 20.0 }]);
        assert_eq!(m.state(), GestureState::Idle);
    }

    #[test]
    fn connect_output_to_input() {
        let vp = Viewport::new(CanvasConfig::default());
        let mut m = GestureMachine::new();
        let source = output_of("gesture-a");

        m.handle(&InputEvent::pointer_down(70.0, 86.0), Hit::Point(source), &vp);
        assert!(m.is_connecting());

        m.handle(&InputEvent::pointer_move(200.0, 150.0), Hit::Canvas, &vp);
        assert_eq!(m.temp_connection(), Some((source, Point::new(200.0, 150.0))));

        let target = input_of("gesture-b");
        let actions = m.handle(&InputEvent::pointer_up(370.0, 300.0), Hit::Point(target), &vp);
        assert_eq!(
            actions.as_slice(),
            &[CanvasAction::AddConnection {
                source: source.node_id,
                target: target.node_id,
            }]
        );
        assert_eq!(m.state(), GestureState::Idle);
    }

    #[test]
    fn release_on_own_input_cancels() {
        let vp = Viewport::new(CanvasConfig::default());
        let mut m = GestureMachine::new();
        m.handle(
            &InputEvent::pointer_down(70.0, 86.0),
            Hit::Point(output_of("gesture-self")),
            &vp,
        );
        let actions = m.handle(
            &InputEvent::pointer_up(70.0, 0.0),
            Hit::Point(input_of("gesture-self")),
            &vp,
        );
        assert!(actions.is_empty());
        assert_eq!(m.state(), GestureState::Idle);
    }

    #[test]
    fn release_on_output_cancels() {
        let vp = Viewport::new(CanvasConfig::default());
        let mut m = GestureMachine::new();
        m.handle(&InputEvent::pointer_down(0.0, 0.0), Hit::Point(output_of("gesture-c")), &vp);
        let actions = m.handle(
            &InputEvent::pointer_up(0.0, 0.0),
            Hit::Point(output_of("gesture-d")),
            &vp,
        );
        assert!(actions.is_empty());
        assert!(!m.is_connecting());
    }

    #[test]
    fn background_press_while_connecting_cancels_without_panning() {
        let vp = Viewport::new(CanvasConfig::default());
        let mut m = GestureMachine::new();
        m.handle(&InputEvent::pointer_down(0.0, 0.0), Hit::Point(output_of("gesture-e")), &vp);
        let actions = m.handle(&InputEvent::pointer_down(500.0, 500.0), Hit::Canvas, &vp);
        assert!(actions.is_empty());
        assert_eq!(m.state(), GestureState::Idle);
    }

    #[test]
    fn background_press_pans_and_deselects() {
        let vp = Viewport::new(CanvasConfig::default());
        let mut m = GestureMachine::new();
        let actions = m.handle(&InputEvent::pointer_down(5.0, 6.0), Hit::Canvas, &vp);
        assert_eq!(
            actions.as_slice(),
            &[
                CanvasAction::SelectNode(None),
                CanvasAction::StartPan { x: 5.0, y: 6.0 }
            ]
        );
        assert_eq!(m.state(), GestureState::PanningViewport);

        let actions = m.handle(&InputEvent::pointer_move(15.0, 26.0), Hit::Canvas, &vp);
        assert_eq!(actions.as_slice(), &[CanvasAction::UpdatePan { x: 15.0, y: 26.0 }]);

        let actions = m.handle(&InputEvent::pointer_up(15.0, 26.0), Hit::Canvas, &vp);
        assert_eq!(actions.as_slice(), &[CanvasAction::EndPan]);
    }

    #[test]
    fn middle_button_pans_even_over_a_node() {
        let vp = Viewport::new(CanvasConfig::default());
        let mut m = GestureMachine::new();
        let press = InputEvent::PointerDown {
            x: 1.0,
            y: 2.0,
            button: Button::Middle,
            modifiers: Modifiers::NONE,
        };
        let hit = Hit::Node {
            id: NodeId::intern("gesture-under"),
            origin: Point::new(0.0, 0.0),
        };
        let actions = m.handle(&press, hit, &vp);
        assert_eq!(actions.as_slice(), &[CanvasAction::StartPan { x: 1.0, y: 2.0 }]);
    }

    #[test]
    fn locked_viewport_never_pans_or_zooms() {
        let mut vp = Viewport::new(CanvasConfig::default());
        vp.set_locked(true);
        let mut m = GestureMachine::new();

        let actions = m.handle(&InputEvent::pointer_down(5.0, 6.0), Hit::Canvas, &vp);
        assert_eq!(actions.as_slice(), &[CanvasAction::SelectNode(None)]);
        assert_eq!(m.state(), GestureState::Idle);

        let wheel = InputEvent::Wheel {
            x: 0.0,
            y: 0.0,
            delta_y: -100.0,
        };
        assert!(m.handle(&wheel, Hit::Canvas, &vp).is_empty());
    }

    #[test]
    fn wheel_zooms_at_pointer() {
        let vp = Viewport::new(CanvasConfig::default());
        let mut m = GestureMachine::new();
        let up = InputEvent::Wheel {
            x: 40.0,
            y: 30.0,
            delta_y: -120.0,
        };
        assert_eq!(
            m.handle(&up, Hit::Canvas, &vp).as_slice(),
            &[CanvasAction::Zoom {
                direction: ZoomDirection::In,
                center: Point::new(40.0, 30.0),
            }]
        );
        let down = InputEvent::Wheel {
            x: 40.0,
            y: 30.0,
            delta_y: 120.0,
        };
        assert_eq!(
            m.handle(&down, Hit::Canvas, &vp).as_slice(),
            &[CanvasAction::Zoom {
                direction: ZoomDirection::Out,
                center: Point::new(40.0, 30.0),
            }]
        );
    }

    #[test]
    fn delete_target_press_deletes() {
        let vp = Viewport::new(CanvasConfig::default());
        let mut m = GestureMachine::new();
        let id = ConnectionId::intern("gesture-conn");
        let actions = m.handle(&InputEvent::pointer_down(0.0, 0.0), Hit::DeleteTarget(id), &vp);
        assert_eq!(actions.as_slice(), &[CanvasAction::DeleteConnection(id)]);
        assert_eq!(m.state(), GestureState::Idle);
    }

    #[test]
    fn cancel_ends_pan() {
        let vp = Viewport::new(CanvasConfig::default());
        let mut m = GestureMachine::new();
        m.handle(&InputEvent::pointer_down(0.0, 0.0), Hit::Canvas, &vp);
        assert_eq!(m.cancel().as_slice(), &[CanvasAction::EndPan]);
        assert!(m.cancel().is_empty());
    }
}
