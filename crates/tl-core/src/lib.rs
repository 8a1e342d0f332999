pub mod anim;
pub mod config;
pub mod error;
pub mod graph;
pub mod id;
pub mod model;
pub mod viewport;

pub use anim::{FrameScheduler, NoopScheduler};
pub use config::{CanvasConfig, EditorConfig};
pub use error::{ConfigError, GraphError, ParamError};
pub use graph::{Graph, TickOutcome};
pub use id::{ConnectionId, NodeId};
pub use model::*;
pub use viewport::{Transform, ViewBounds, Viewport, ZoomDirection};
