//! Layer graph → Vello drawing commands.
//!
//! Paints node cards, connection curves, and the in-progress connection line
//! under the viewport transform. Call once per frame with a freshly-cleared
//! `Scene`; the caller presents it.

use crate::curve::{ConnectionCurve, DELETE_HOVER_GROWTH, DELETE_RADIUS};
use kurbo::{Affine, BezPath, Circle, Point as KPoint, Rect, RoundedRect, Stroke};
use peniko::{Color, Fill};
use tl_core::graph::Graph;
use tl_core::id::{ConnectionId, NodeId};
use tl_core::model::{Connection, LayerNode, Point, PointKind};
use tl_core::viewport::Transform;
use vello::Scene;

const NODE_RADIUS: f64 = 8.0;
const DOT_RADIUS: f64 = 6.0;

/// Colors used by the painter.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub node_fill: Color,
    pub node_border: Color,
    pub node_selected: Color,
    pub input_dot: Color,
    pub output_dot: Color,
    pub line: Color,
    pub line_hover: Color,
    pub line_deleting: Color,
    pub flow: Color,
    pub temp_line: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            node_fill: Color::from_rgb8(0xFF, 0xFF, 0xFF),
            node_border: Color::from_rgb8(0xE5, 0xE7, 0xEB),
            node_selected: Color::from_rgb8(0x3B, 0x82, 0xF6),
            input_dot: Color::from_rgb8(0x3B, 0x82, 0xF6),
            output_dot: Color::from_rgb8(0x22, 0xC5, 0x5E),
            line: Color::from_rgb8(0x6B, 0x72, 0x80),
            line_hover: Color::from_rgb8(0xEF, 0x44, 0x44),
            line_deleting: Color::from_rgb8(0xDF, 0xD1, 0xD1),
            flow: Color::from_rgba8(0x3B, 0x82, 0xF6, 0x99),
            temp_line: Color::from_rgb8(0x3B, 0x82, 0xF6),
        }
    }
}

/// Per-frame interaction state that affects drawing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overlay {
    pub selected: Option<NodeId>,
    pub hovered_connection: Option<ConnectionId>,
    /// Source and live pointer of an in-progress connection (canvas space).
    pub temp_connection: Option<(Point, Point)>,
}

/// Affine mapping canvas space to screen space.
pub fn view_affine(t: Transform) -> Affine {
    Affine::translate((t.offset_x as f64, t.offset_y as f64)) * Affine::scale(t.scale as f64)
}

/// Paint the whole canvas into `scene`.
pub fn paint_canvas(
    scene: &mut Scene,
    graph: &Graph,
    transform: Transform,
    overlay: &Overlay,
    palette: &Palette,
) {
    let view = view_affine(transform);

    for conn in graph.connections() {
        let hovered = overlay.hovered_connection == Some(conn.id);
        paint_connection(scene, view, conn, hovered, palette);
    }

    for node in graph.nodes() {
        paint_node(scene, view, node, overlay.selected == Some(node.id), palette);
    }

    if let Some((from, to)) = overlay.temp_connection {
        paint_temp_connection(scene, view, from, to, palette);
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────────

fn paint_node(
    scene: &mut Scene,
    view: Affine,
    node: &LayerNode,
    selected: bool,
    palette: &Palette,
) {
    let rect = Rect::new(
        node.x as f64,
        node.y as f64,
        (node.x + node.width) as f64,
        (node.y + node.height) as f64,
    );
    let card: RoundedRect = rect.to_rounded_rect(NODE_RADIUS);
    scene.fill(Fill::NonZero, view, palette.node_fill, None, &card);

    let (border, width) = if selected {
        (palette.node_selected, 2.0)
    } else {
        (palette.node_border, 1.0)
    };
    scene.stroke(&Stroke::new(width), view, border, None, &card);

    for kind in [PointKind::Input, PointKind::Output] {
        let p = node.anchor(kind);
        let dot = Circle::new((p.x as f64, p.y as f64), DOT_RADIUS);
        let color = match kind {
            PointKind::Input => palette.input_dot,
            PointKind::Output => palette.output_dot,
        };
        scene.fill(Fill::NonZero, view, color, None, &dot);
    }

    // Glyph shaping needs a font context owned by the host.
    log::trace!("label {:?} for {} at ({}, {})", node.label, node.id, node.x, node.y);
}

// ─── Connections ─────────────────────────────────────────────────────────────

fn paint_connection(
    scene: &mut Scene,
    view: Affine,
    conn: &Connection,
    hovered: bool,
    palette: &Palette,
) {
    let curve = ConnectionCurve::for_connection(conn);
    let color = if conn.is_deleting {
        palette.line_deleting
    } else if hovered {
        palette.line_hover
    } else {
        palette.line
    };

    let mut stroke = Stroke::new(if hovered { 3.0 } else { 2.0 });
    if conn.is_animating {
        stroke = stroke.with_dashes(10.0, [5.0, 5.0]);
    }
    let path = curve.to_path();
    scene.stroke(&stroke, view, color, None, &path);

    if !conn.is_deleting && curve.progress >= 1.0 {
        scene.stroke(&Stroke::new(2.0), view, palette.flow, None, &path);
    }

    if curve.shows_arrowhead() {
        scene.fill(Fill::NonZero, view, color, None, &curve.arrowhead());
    }

    let radius = if hovered {
        DELETE_RADIUS + DELETE_HOVER_GROWTH
    } else {
        DELETE_RADIUS
    };
    if (hovered || conn.is_deleting) && let Some(target) = curve.delete_target(radius) {
        let fill = if conn.is_deleting {
            palette.line_deleting
        } else {
            palette.node_fill
        };
        scene.fill(Fill::NonZero, view, fill, None, &target);
        scene.stroke(&Stroke::new(2.0), view, color, None, &target);
        scene.stroke(&Stroke::new(2.0), view, color, None, &cross(target.center, 3.5));
    }
}

fn paint_temp_connection(
    scene: &mut Scene,
    view: Affine,
    from: Point,
    to: Point,
    palette: &Palette,
) {
    let curve = ConnectionCurve::between(from, to);
    let stroke = Stroke::new(2.0).with_dashes(0.0, [8.0, 4.0]);
    scene.stroke(&stroke, view, palette.temp_line, None, &curve.to_path());
}

/// An "×" glyph centered on `c`.
fn cross(c: KPoint, half: f64) -> BezPath {
    let mut path = BezPath::new();
    path.move_to((c.x - half, c.y - half));
    path.line_to((c.x + half, c.y + half));
    path.move_to((c.x + half, c.y - half));
    path.line_to((c.x - half, c.y + half));
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_affine_matches_viewport_math() {
        let t = Transform {
            offset_x: 20.0,
            offset_y: -10.0,
            scale: 2.0,
        };
        let p = view_affine(t) * KPoint::new(5.0, 5.0);
        assert_eq!(p, KPoint::new(30.0, 0.0));
    }
}
