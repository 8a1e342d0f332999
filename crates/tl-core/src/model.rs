//! Data model for the layer canvas.
//!
//! A document is a set of layer nodes placed in canvas space plus directed
//! connections from one node's output anchor to another node's input anchor.
//! Field names serialize in camelCase so snapshots match the host's JSON.

use crate::id::{ConnectionId, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ─── Geometry ────────────────────────────────────────────────────────────

/// A point in canvas (or screen) space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

// ─── Parameters ──────────────────────────────────────────────────────────

/// Kind of a layer parameter. Decides which editor widget the host shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Bool,
    Number,
    Text,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ParamKind::Bool => "bool",
            ParamKind::Number => "number",
            ParamKind::Text => "text",
        })
    }
}

/// A single layer parameter value.
///
/// Serialized untagged, so `{"p": 0.5, "bias": true, "shape": "[batch, 784]"}`
/// round-trips through the host's JSON unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Bool(_) => ParamKind::Bool,
            ParamValue::Number(_) => ParamKind::Number,
            ParamValue::Text(_) => ParamKind::Text,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Number(n) => write!(f, "{n}"),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}

pub type Params = BTreeMap<String, ParamValue>;

// ─── Templates ───────────────────────────────────────────────────────────

/// A palette entry dropped onto the canvas. The parameter kinds declared
/// here stay fixed for every node created from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerTemplate {
    #[serde(rename = "type")]
    pub layer_type: String,
    pub label: String,
    #[serde(default)]
    pub icon_name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub params: Params,
    #[serde(default)]
    pub input_shape: String,
    #[serde(default)]
    pub output_shape: String,
}

impl LayerTemplate {
    /// Decode a drag-and-drop payload.
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// One network layer placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerNode {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub layer_type: String,
    pub label: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub icon_name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub params: Params,
    #[serde(default)]
    pub input_shape: String,
    #[serde(default)]
    pub output_shape: String,
}

impl LayerNode {
    /// Instantiate a template at `position` with the given size.
    pub fn from_template(
        id: NodeId,
        template: &LayerTemplate,
        position: Point,
        width: f32,
        height: f32,
    ) -> Self {
        Self {
            id,
            layer_type: template.layer_type.clone(),
            label: template.label.clone(),
            x: position.x,
            y: position.y,
            width,
            height,
            icon_name: template.icon_name.clone(),
            color: template.color.clone(),
            params: template.params.clone(),
            input_shape: template.input_shape.clone(),
            output_shape: template.output_shape.clone(),
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Input anchor: top-center of the node.
    pub fn input_anchor(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y)
    }

    /// Output anchor: bottom-center of the node.
    pub fn output_anchor(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height)
    }

    pub fn anchor(&self, kind: PointKind) -> Point {
        match kind {
            PointKind::Input => self.input_anchor(),
            PointKind::Output => self.output_anchor(),
        }
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }

    /// Finite position and strictly positive size.
    pub fn has_valid_geometry(&self) -> bool {
        self.position().is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }
}

// ─── Connections ─────────────────────────────────────────────────────────

/// Which anchor of a node a connection point refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointKind {
    Input,
    Output,
}

/// Transient anchor descriptor used while a connect gesture is in flight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionPoint {
    pub node_id: NodeId,
    pub kind: PointKind,
    pub x: f32,
    pub y: f32,
}

impl ConnectionPoint {
    pub fn of(node: &LayerNode, kind: PointKind) -> Self {
        let p = node.anchor(kind);
        Self {
            node_id: node.id,
            kind,
            x: p.x,
            y: p.y,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

fn settled() -> f32 {
    1.0
}

/// A directed edge from `from`'s output anchor to `to`'s input anchor.
///
/// The endpoint coordinates are a cache of the two anchors; the graph
/// recomputes them whenever either node moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: ConnectionId,
    pub from: NodeId,
    pub to: NodeId,
    pub from_x: f32,
    pub from_y: f32,
    pub to_x: f32,
    pub to_y: f32,
    #[serde(default, skip_serializing)]
    pub is_animating: bool,
    #[serde(default, skip_serializing)]
    pub is_deleting: bool,
    #[serde(default = "settled", skip_serializing)]
    pub animation_progress: f32,
}

impl Connection {
    /// A connection that has just been created and has not animated yet.
    pub fn new(id: ConnectionId, from: NodeId, to: NodeId, start: Point, end: Point) -> Self {
        Self {
            id,
            from,
            to,
            from_x: start.x,
            from_y: start.y,
            to_x: end.x,
            to_y: end.y,
            is_animating: true,
            is_deleting: false,
            animation_progress: 0.0,
        }
    }

    pub fn start(&self) -> Point {
        Point::new(self.from_x, self.from_y)
    }

    pub fn end(&self) -> Point {
        Point::new(self.to_x, self.to_y)
    }

    /// Whether the connection still counts structurally.
    pub fn is_live(&self) -> bool {
        !self.is_deleting
    }
}

/// Which incident connections a query selects, relative to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Incoming,
    Outgoing,
    Both,
}

// ─── Snapshot ────────────────────────────────────────────────────────────

/// The unit of save/load handed to the persistence layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<LayerNode>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl GraphSnapshot {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Counts shown in the properties and statistics panels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub layers: usize,
    pub connections: usize,
}

/// Live input/output counts for one node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NodeDegree {
    pub inputs: usize,
    pub outputs: usize,
}
