use crate::id::{ConnectionId, NodeId};
use crate::model::ParamKind;
use thiserror::Error;

/// Why a snapshot could not be loaded.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("duplicate node id `{0}`")]
    DuplicateNode(NodeId),

    #[error("node `{0}` has a non-finite position or non-positive size")]
    InvalidGeometry(NodeId),

    #[error("duplicate connection id `{0}`")]
    DuplicateConnectionId(ConnectionId),

    #[error("connection `{id}` references unknown node `{node}`")]
    DanglingConnection { id: ConnectionId, node: NodeId },

    #[error("connection `{0}` connects a node to itself")]
    SelfLoop(ConnectionId),

    #[error("more than one connection from `{from}` to `{to}`")]
    DuplicateConnection { from: NodeId, to: NodeId },

    #[error("invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a configuration was rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("`{field}` must be finite and greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("`minScale` ({min}) exceeds `maxScale` ({max})")]
    ScaleRange { min: f32, max: f32 },

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a parameter edit was rejected.
#[derive(Debug, Error, PartialEq)]
pub enum ParamError {
    #[error("unknown node `{0}`")]
    UnknownNode(NodeId),

    #[error("node `{node}` has no parameter `{name}`")]
    UnknownParam { node: NodeId, name: String },

    #[error("parameter `{name}` expects a {expected} value, got {found}")]
    KindMismatch {
        name: String,
        expected: ParamKind,
        found: ParamKind,
    },
}
