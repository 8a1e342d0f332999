//! Hit testing: canvas point → what is under it.
//!
//! Priority, highest first: connection dots, node bodies (topmost first),
//! connection delete targets, then the empty canvas. Connections paint under
//! the nodes, so a node covering a connection's midpoint takes the press.
//! Dots win over their own node's body.

use crate::curve::{ConnectionCurve, DELETE_HOVER_GROWTH};
use kurbo::{Point as KPoint, Shape};
use tl_core::config::EditorConfig;
use tl_core::graph::Graph;
use tl_core::id::{ConnectionId, NodeId};
use tl_core::model::{ConnectionPoint, Point, PointKind};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hit {
    /// An input or output dot.
    Point(ConnectionPoint),
    /// The delete target at a connection's midpoint.
    DeleteTarget(ConnectionId),
    /// A node body. `origin` is the node's top-left at hit time.
    Node { id: NodeId, origin: Point },
    /// Empty canvas background.
    Canvas,
}

impl Hit {
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            Hit::Point(p) => Some(p.node_id),
            Hit::Node { id, .. } => Some(*id),
            _ => None,
        }
    }
}

/// Find what sits at canvas position (px, py). The `hovered` connection's
/// delete target is tested at its enlarged, hovered size.
pub fn hit_test(
    graph: &Graph,
    config: &EditorConfig,
    hovered: Option<ConnectionId>,
    px: f32,
    py: f32,
) -> Hit {
    if let Some(point) = hit_test_point(graph, config.point_radius, px, py) {
        return Hit::Point(point);
    }
    if let Some(node) = graph.nodes().rev().find(|n| n.contains(px, py)) {
        return Hit::Node {
            id: node.id,
            origin: node.position(),
        };
    }
    hit_test_delete_target(graph, config.delete_radius, hovered, px, py)
        .map_or(Hit::Canvas, Hit::DeleteTarget)
}

/// Topmost connection dot within `radius` of (px, py).
pub fn hit_test_point(graph: &Graph, radius: f32, px: f32, py: f32) -> Option<ConnectionPoint> {
    let r2 = radius * radius;
    graph.nodes().rev().find_map(|node| {
        [PointKind::Output, PointKind::Input]
            .into_iter()
            .map(|kind| ConnectionPoint::of(node, kind))
            .find(|p| {
                let (dx, dy) = (p.x - px, p.y - py);
                dx * dx + dy * dy <= r2
            })
    })
}

/// Topmost live connection whose delete target contains (px, py).
pub fn hit_test_delete_target(
    graph: &Graph,
    radius: f32,
    hovered: Option<ConnectionId>,
    px: f32,
    py: f32,
) -> Option<ConnectionId> {
    let pt = KPoint::new(px as f64, py as f64);
    let live: Vec<_> = graph.live_connections().collect();
    live.into_iter().rev().find_map(|conn| {
        let radius = if hovered == Some(conn.id) {
            radius + DELETE_HOVER_GROWTH
        } else {
            radius
        };
        ConnectionCurve::for_connection(conn)
            .delete_target(radius)
            .filter(|circle| circle.contains(pt))
            .map(|_| conn.id)
    })
}
