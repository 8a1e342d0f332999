use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global string interner shared by node and connection ids.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Per-process counter used to mint fresh ids.
static COUNTER: AtomicU64 = AtomicU64::new(1);

fn next_serial() -> u64 {
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Identifier of a layer node on the canvas.
/// Internally a `Spur` index: 4 bytes, Copy, Eq, Hash in O(1).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Spur);

impl NodeId {
    /// Intern a string as a NodeId, or return the existing one.
    pub fn intern(s: &str) -> Self {
        NodeId(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Mint a fresh id prefixed by the layer type (e.g. `Linear-12`).
    ///
    /// Uniqueness against ids loaded from a snapshot is the graph's job;
    /// see `Graph::add_node`.
    pub fn for_layer(layer_type: &str) -> Self {
        Self::intern(&format!("{layer_type}-{}", next_serial()))
    }
}

/// Identifier of a connection between two nodes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Spur);

impl ConnectionId {
    pub fn intern(s: &str) -> Self {
        ConnectionId(INTERNER.get_or_intern(s))
    }

    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Mint a fresh `conn-<n>` id.
    pub fn fresh() -> Self {
        Self::intern(&format!("conn-{}", next_serial()))
    }
}

macro_rules! impl_id_traits {
    ($ty:ident) => {
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($ty), self.as_str())
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok($ty::intern(&s))
            }
        }
    };
}

impl_id_traits!(NodeId);
impl_id_traits!(ConnectionId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = NodeId::intern("input-demo");
        let b = NodeId::intern("input-demo");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "input-demo");
    }

    #[test]
    fn layer_ids_are_prefixed_and_unique() {
        let a = NodeId::for_layer("Linear");
        let b = NodeId::for_layer("Linear");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("Linear-"));
    }

    #[test]
    fn connection_ids_serialize_as_plain_strings() {
        let id = ConnectionId::intern("conn-7");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"conn-7\"");
        let back: ConnectionId = serde_json::from_str("\"conn-7\"").unwrap();
        assert_eq!(back, id);
    }
}
