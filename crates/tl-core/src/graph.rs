//! Layer graph: nodes, connections, and their structural operations.
//!
//! Storage is a `StableDiGraph` so indices survive removals, plus id
//! indices for O(1) lookup and insertion-order lists that double as the
//! paint order (last = topmost).
//!
//! Connection removal is two-phase. `delete_connection` only flags the
//! connection and starts its exit tween; `tick` purges it when the tween
//! reaches zero. A deleted node likewise stays in the graph until every
//! incident connection has been purged.

use crate::anim::{Animator, TweenKind};
use crate::config::EditorConfig;
use crate::error::{GraphError, ParamError};
use crate::id::{ConnectionId, NodeId};
use crate::model::*;
use petgraph::Direction as EdgeDirection;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use smallvec::SmallVec;
use std::collections::HashMap;

/// What a call to `Graph::tick` changed.
#[derive(Debug, Default)]
pub struct TickOutcome {
    /// More tweens are pending; the host should schedule another frame.
    pub needs_frame: bool,
    /// Connections whose exit tween finished and that are now gone.
    pub purged: SmallVec<[ConnectionId; 4]>,
    /// Deleted nodes that were finally removed this tick.
    pub removed_nodes: SmallVec<[NodeId; 2]>,
}

#[derive(Debug, Clone)]
pub struct Graph {
    graph: StableDiGraph<LayerNode, Connection>,
    node_index: HashMap<NodeId, NodeIndex>,
    edge_index: HashMap<ConnectionId, EdgeIndex>,
    node_order: Vec<NodeId>,
    edge_order: Vec<ConnectionId>,
    /// Deleted nodes waiting for their connections to fade out.
    pending_removal: SmallVec<[NodeId; 4]>,
    animator: Animator,
    config: EditorConfig,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Graph {
    #[must_use]
    pub fn new(config: EditorConfig) -> Self {
        Self {
            graph: StableDiGraph::new(),
            node_index: HashMap::new(),
            edge_index: HashMap::new(),
            node_order: Vec::new(),
            edge_order: Vec::new(),
            pending_removal: SmallVec::new(),
            animator: Animator::new(config.creation_ms, config.deletion_ms),
            config,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    // ─── Nodes ───────────────────────────────────────────────────────────

    /// Place a new node built from `template` with its top-left at `position`.
    pub fn add_node(&mut self, template: &LayerTemplate, position: Point) -> NodeId {
        let mut id = NodeId::for_layer(&template.layer_type);
        while self.node_index.contains_key(&id) {
            id = NodeId::for_layer(&template.layer_type);
        }
        let node = LayerNode::from_template(
            id,
            template,
            position,
            self.config.node_width,
            self.config.node_height,
        );
        log::debug!("add node {id} at ({}, {})", position.x, position.y);
        self.push_node(node)
    }

    /// Insert a fully specified node (used when loading).
    pub fn insert_node(&mut self, node: LayerNode) -> Result<NodeId, GraphError> {
        if self.node_index.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        if !node.has_valid_geometry() {
            return Err(GraphError::InvalidGeometry(node.id));
        }
        Ok(self.push_node(node))
    }

    fn push_node(&mut self, node: LayerNode) -> NodeId {
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.node_index.insert(id, idx);
        self.node_order.push(id);
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&LayerNode> {
        self.node_index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.node_index.contains_key(&id)
    }

    /// Nodes in paint order (last = topmost).
    pub fn nodes(&self) -> impl DoubleEndedIterator<Item = &LayerNode> + '_ {
        self.node_order.iter().filter_map(|id| self.node(*id))
    }

    pub fn node_count(&self) -> usize {
        self.node_index.len()
    }

    /// Whether `id` was deleted and is only waiting for its connections to fade.
    pub fn is_pending_removal(&self, id: NodeId) -> bool {
        self.pending_removal.contains(&id)
    }

    /// Raise a node to the top of the paint order.
    pub fn bring_to_front(&mut self, id: NodeId) {
        if let Some(pos) = self.node_order.iter().position(|n| *n == id) {
            let id = self.node_order.remove(pos);
            self.node_order.push(id);
        }
    }

    /// Move a node and re-anchor every incident connection.
    /// Unknown ids and non-finite positions are ignored.
    pub fn move_node(&mut self, id: NodeId, x: f32, y: f32) -> bool {
        if !(x.is_finite() && y.is_finite()) {
            return false;
        }
        let Some(&idx) = self.node_index.get(&id) else {
            return false;
        };

        let node = &mut self.graph[idx];
        node.x = x;
        node.y = y;
        let output = node.output_anchor();
        let input = node.input_anchor();

        let outgoing: SmallVec<[EdgeIndex; 8]> = self
            .graph
            .edges_directed(idx, EdgeDirection::Outgoing)
            .map(|e| e.id())
            .collect();
        for e in outgoing {
            let conn = &mut self.graph[e];
            conn.from_x = output.x;
            conn.from_y = output.y;
        }

        let incoming: SmallVec<[EdgeIndex; 8]> = self
            .graph
            .edges_directed(idx, EdgeDirection::Incoming)
            .map(|e| e.id())
            .collect();
        for e in incoming {
            let conn = &mut self.graph[e];
            conn.to_x = input.x;
            conn.to_y = input.y;
        }
        true
    }

    /// Delete a node: its connections fade out first, then the node goes.
    /// A node without connections is removed immediately.
    pub fn delete_node(&mut self, id: NodeId) -> bool {
        let Some(&idx) = self.node_index.get(&id) else {
            return false;
        };
        if self.is_pending_removal(id) {
            return false;
        }

        let incident: SmallVec<[ConnectionId; 8]> = self.incident_edges(idx).collect();
        for conn_id in &incident {
            self.delete_connection(*conn_id);
        }

        if incident.is_empty() && !self.has_any_edges(idx) {
            self.remove_node_now(id);
        } else {
            log::debug!("node {id} waits for {} connection(s) to fade", incident.len());
            self.pending_removal.push(id);
        }
        true
    }

    /// Live connection ids in both directions.
    fn incident_edges(&self, idx: NodeIndex) -> impl Iterator<Item = ConnectionId> + '_ {
        self.graph
            .edges_directed(idx, EdgeDirection::Outgoing)
            .chain(self.graph.edges_directed(idx, EdgeDirection::Incoming))
            .filter(|e| e.weight().is_live())
            .map(|e| e.weight().id)
    }

    fn has_any_edges(&self, idx: NodeIndex) -> bool {
        self.graph
            .edges_directed(idx, EdgeDirection::Outgoing)
            .chain(self.graph.edges_directed(idx, EdgeDirection::Incoming))
            .next()
            .is_some()
    }

    fn remove_node_now(&mut self, id: NodeId) {
        let Some(idx) = self.node_index.remove(&id) else {
            return;
        };
        // Anything still attached goes with the node; keep the indices in step.
        let attached: SmallVec<[ConnectionId; 4]> = self
            .graph
            .edges_directed(idx, EdgeDirection::Outgoing)
            .chain(self.graph.edges_directed(idx, EdgeDirection::Incoming))
            .map(|e| e.weight().id)
            .collect();
        for conn_id in attached {
            self.forget_connection(conn_id);
        }
        self.graph.remove_node(idx);
        self.node_order.retain(|n| *n != id);
        self.pending_removal.retain(|n| *n != id);
        log::debug!("removed node {id}");
    }

    /// Delete every connection (animated) and then every node.
    pub fn clear(&mut self) {
        let ids: Vec<NodeId> = self.node_order.clone();
        for id in ids {
            self.delete_node(id);
        }
    }

    // ─── Parameters ──────────────────────────────────────────────────────

    /// Edit one parameter. The new value must have the kind the template declared.
    pub fn set_param(
        &mut self,
        id: NodeId,
        name: &str,
        value: ParamValue,
    ) -> Result<(), ParamError> {
        let idx = *self.node_index.get(&id).ok_or(ParamError::UnknownNode(id))?;
        let slot = self.graph[idx]
            .params
            .get_mut(name)
            .ok_or_else(|| ParamError::UnknownParam {
                node: id,
                name: name.to_string(),
            })?;
        if slot.kind() != value.kind() {
            return Err(ParamError::KindMismatch {
                name: name.to_string(),
                expected: slot.kind(),
                found: value.kind(),
            });
        }
        *slot = value;
        Ok(())
    }

    // ─── Connections ─────────────────────────────────────────────────────

    /// Connect `source`'s output to `target`'s input.
    ///
    /// Returns `None` for self-loops, duplicates of a live connection, unknown
    /// nodes, and nodes that are being deleted.
    pub fn add_connection(
        &mut self,
        source: NodeId,
        target: NodeId,
        start: Point,
        end: Point,
    ) -> Option<ConnectionId> {
        if source == target {
            log::debug!("rejected self-loop on {source}");
            return None;
        }
        let (&a, &b) = (self.node_index.get(&source)?, self.node_index.get(&target)?);
        if self.is_pending_removal(source) || self.is_pending_removal(target) {
            return None;
        }
        let duplicate = self
            .graph
            .edges_directed(a, EdgeDirection::Outgoing)
            .any(|e| e.target() == b && e.weight().is_live());
        if duplicate {
            log::debug!("rejected duplicate connection {source} -> {target}");
            return None;
        }

        let mut id = ConnectionId::fresh();
        while self.edge_index.contains_key(&id) {
            id = ConnectionId::fresh();
        }
        let conn = Connection::new(id, source, target, start, end);
        let e = self.graph.add_edge(a, b, conn);
        self.edge_index.insert(id, e);
        self.edge_order.push(id);
        self.animator.start(id, TweenKind::Creation);
        log::debug!("connected {source} -> {target} as {id}");
        Some(id)
    }

    /// Start the exit tween. The connection is purged when it completes.
    pub fn delete_connection(&mut self, id: ConnectionId) -> bool {
        let Some(&e) = self.edge_index.get(&id) else {
            return false;
        };
        let conn = &mut self.graph[e];
        if conn.is_deleting {
            return false;
        }
        conn.is_deleting = true;
        conn.is_animating = false;
        self.animator.start(id, TweenKind::Deletion);
        true
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.edge_index.get(&id).map(|e| &self.graph[*e])
    }

    /// Every connection still rendered, including ones fading out.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> + '_ {
        self.edge_order.iter().filter_map(|id| self.connection(*id))
    }

    /// Connections that count structurally.
    pub fn live_connections(&self) -> impl Iterator<Item = &Connection> + '_ {
        self.connections().filter(|c| c.is_live())
    }

    /// Live connections touching `node` in the given direction.
    pub fn connections_touching(&self, node: NodeId, direction: Direction) -> Vec<&Connection> {
        let Some(&idx) = self.node_index.get(&node) else {
            return Vec::new();
        };
        let dirs: &[EdgeDirection] = match direction {
            Direction::Incoming => &[EdgeDirection::Incoming],
            Direction::Outgoing => &[EdgeDirection::Outgoing],
            Direction::Both => &[EdgeDirection::Outgoing, EdgeDirection::Incoming],
        };
        dirs.iter()
            .flat_map(|&d| self.graph.edges_directed(idx, d))
            .map(|e| e.weight())
            .filter(|c| c.is_live())
            .collect()
    }

    pub fn degree(&self, node: NodeId) -> NodeDegree {
        NodeDegree {
            inputs: self.connections_touching(node, Direction::Incoming).len(),
            outputs: self.connections_touching(node, Direction::Outgoing).len(),
        }
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            layers: self.node_count(),
            connections: self.live_connections().count(),
        }
    }

    fn forget_connection(&mut self, id: ConnectionId) {
        self.edge_index.remove(&id);
        self.edge_order.retain(|c| *c != id);
        self.animator.cancel(id);
    }

    fn purge_connection(&mut self, id: ConnectionId) {
        if let Some(e) = self.edge_index.get(&id).copied() {
            self.graph.remove_edge(e);
        }
        self.forget_connection(id);
        log::trace!("purged connection {id}");
    }

    // ─── Animation ───────────────────────────────────────────────────────

    pub fn is_animating(&self) -> bool {
        !self.animator.is_idle()
    }

    /// Advance every tween to `now_ms` and apply the results.
    pub fn tick(&mut self, now_ms: f64) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        for sample in self.animator.advance(now_ms) {
            let Some(&e) = self.edge_index.get(&sample.id) else {
                // The connection is already gone; stop animating it.
                self.animator.cancel(sample.id);
                continue;
            };
            let conn = &mut self.graph[e];
            conn.animation_progress = sample.progress;
            match sample.kind {
                TweenKind::Creation => {
                    conn.is_animating = !sample.finished;
                }
                TweenKind::Deletion => {
                    if sample.finished {
                        self.purge_connection(sample.id);
                        outcome.purged.push(sample.id);
                    }
                }
            }
        }

        let ready: SmallVec<[NodeId; 4]> = self
            .pending_removal
            .iter()
            .copied()
            .filter(|id| {
                self.node_index
                    .get(id)
                    .is_none_or(|&idx| !self.has_any_edges(idx))
            })
            .collect();
        for id in ready {
            self.remove_node_now(id);
            outcome.removed_nodes.push(id);
        }

        outcome.needs_frame = !self.animator.is_idle();
        outcome
    }

    // ─── Snapshot ────────────────────────────────────────────────────────

    /// Replace the whole graph. Nothing changes if the snapshot is invalid.
    ///
    /// Connection endpoints are recomputed from the node anchors; the stored
    /// coordinates are only a cache.
    pub fn load(&mut self, snapshot: GraphSnapshot) -> Result<(), GraphError> {
        let mut fresh = Graph::new(self.config);
        for node in snapshot.nodes {
            fresh.insert_node(node)?;
        }

        for mut conn in snapshot.connections {
            if fresh.edge_index.contains_key(&conn.id) {
                return Err(GraphError::DuplicateConnectionId(conn.id));
            }
            if conn.from == conn.to {
                return Err(GraphError::SelfLoop(conn.id));
            }
            let a = *fresh
                .node_index
                .get(&conn.from)
                .ok_or(GraphError::DanglingConnection {
                    id: conn.id,
                    node: conn.from,
                })?;
            let b = *fresh
                .node_index
                .get(&conn.to)
                .ok_or(GraphError::DanglingConnection {
                    id: conn.id,
                    node: conn.to,
                })?;
            if fresh.graph.find_edge(a, b).is_some() {
                return Err(GraphError::DuplicateConnection {
                    from: conn.from,
                    to: conn.to,
                });
            }

            let start = fresh.graph[a].output_anchor();
            let end = fresh.graph[b].input_anchor();
            conn.from_x = start.x;
            conn.from_y = start.y;
            conn.to_x = end.x;
            conn.to_y = end.y;
            conn.is_animating = false;
            conn.is_deleting = false;
            conn.animation_progress = 1.0;

            let id = conn.id;
            let e = fresh.graph.add_edge(a, b, conn);
            fresh.edge_index.insert(id, e);
            fresh.edge_order.push(id);
        }

        log::debug!(
            "loaded graph: {} nodes, {} connections",
            fresh.node_count(),
            fresh.edge_order.len()
        );
        *self = fresh;
        Ok(())
    }

    /// Parse and load a JSON snapshot.
    pub fn load_json(&mut self, json: &str) -> Result<(), GraphError> {
        self.load(GraphSnapshot::from_json(json)?)
    }

    /// Structural snapshot: fading connections are already gone logically,
    /// so they are left out.
    pub fn export(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes().cloned().collect(),
            connections: self.live_connections().cloned().collect(),
        }
    }
}
