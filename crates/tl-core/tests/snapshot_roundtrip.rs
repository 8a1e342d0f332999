//! Integration tests: snapshot load/export (tl-core).
//!
//! Uses the same JSON shape the host persists, including the demo network
//! the editor opens with.

use pretty_assertions::assert_eq;
use tl_core::*;

const DEMO: &str = include_str!("fixtures/demo_network.json");

fn demo_graph() -> Graph {
    let mut g = Graph::default();
    g.load_json(DEMO).unwrap();
    g
}

#[test]
fn load_demo_network() {
    let g = demo_graph();
    assert_eq!(g.stats(), GraphStats { layers: 4, connections: 3 });

    let linear = g.node(NodeId::intern("linear1-demo")).unwrap();
    assert_eq!(linear.params["in_features"], ParamValue::Number(784.0));
    assert_eq!(linear.params["bias"], ParamValue::Bool(true));
    assert_eq!(linear.output_shape, "[batch, 256]");
}

#[test]
fn loaded_connections_are_settled_and_reanchored() {
    let g = demo_graph();
    let conn = g.connection(ConnectionId::intern("conn-demo-1")).unwrap();
    assert_eq!(conn.animation_progress, 1.0);
    assert!(!conn.is_animating);
    assert!(!conn.is_deleting);

    // The fixture stores a stale cache; anchors win.
    let input = g.node(NodeId::intern("input-demo")).unwrap();
    let linear = g.node(NodeId::intern("linear1-demo")).unwrap();
    assert_eq!(conn.start(), input.output_anchor());
    assert_eq!(conn.end(), linear.input_anchor());
}

#[test]
fn export_then_load_is_stable() {
    let g = demo_graph();
    let exported = g.export();
    let json = exported.to_json().unwrap();

    let mut again = Graph::default();
    again.load_json(&json).unwrap();
    assert_eq!(again.export(), exported);
}

#[test]
fn export_skips_fading_connections() {
    let mut g = demo_graph();
    g.delete_connection(ConnectionId::intern("conn-demo-2"));
    let snapshot = g.export();
    assert_eq!(snapshot.connections.len(), 2);
    assert!(snapshot
        .connections
        .iter()
        .all(|c| c.id != ConnectionId::intern("conn-demo-2")));
}

#[test]
fn invalid_snapshots_leave_graph_untouched() {
    let mut g = demo_graph();

    let dangling = r#"{"nodes": [], "connections": [
        {"id": "c", "from": "nope", "to": "nada", "fromX": 0, "fromY": 0, "toX": 0, "toY": 0}
    ]}"#;
    assert!(matches!(
        g.load_json(dangling),
        Err(GraphError::DanglingConnection { .. })
    ));

    let self_loop = r#"{"nodes": [
        {"id": "x", "type": "ReLU", "label": "ReLU", "x": 0, "y": 0, "width": 140, "height": 86}
    ], "connections": [
        {"id": "c", "from": "x", "to": "x", "fromX": 0, "fromY": 0, "toX": 0, "toY": 0}
    ]}"#;
    assert!(matches!(g.load_json(self_loop), Err(GraphError::SelfLoop(_))));

    let zero_size = r#"{"nodes": [
        {"id": "flat", "type": "ReLU", "label": "ReLU", "x": 0, "y": 0, "width": 0, "height": 86}
    ]}"#;
    assert!(matches!(
        g.load_json(zero_size),
        Err(GraphError::InvalidGeometry(_))
    ));

    assert!(matches!(g.load_json("{"), Err(GraphError::Json(_))));

    assert_eq!(g.stats(), GraphStats { layers: 4, connections: 3 });
}
