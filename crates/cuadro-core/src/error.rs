//! Error taxonomy for the routing core.
//!
//! Everything here is recoverable by the caller except [`RoutingError::RootCreation`],
//! which is raised during engine construction and leaves the engine unusable.
//! No operation on a patched graph errors during `render()`.

use crate::node::NodeId;

/// Errors that can occur during routing-core operations.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    /// A root graph could not be created during engine startup. Fatal for the
    /// engine instance.
    #[error("failed to create root graph '{0}'")]
    RootCreation(String),

    /// A root node with this key already exists.
    #[error("root node '{0}' already exists")]
    RootExists(String),

    /// The plugin type name is not registered with the factory.
    #[error("unknown node type '{0}'")]
    UnknownType(String),

    /// No live instance with this name.
    #[error("unknown node instance '{0}'")]
    UnknownInstance(String),

    /// The node id does not resolve to a live node.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// A slot index is outside the node's slot collection.
    #[error("slot index {index} out of range (node has {count})")]
    SlotOutOfRange {
        /// Requested slot index.
        index: usize,
        /// Number of slots the node actually has.
        count: usize,
    },

    /// Creating another input slot would exceed the fixed capacity.
    #[error("slot capacity exceeded ({0} inputs maximum)")]
    SlotCapacity(usize),

    /// One of the two endpoints already has a connection.
    #[error("slot is already connected")]
    AlreadyConnected,

    /// Disconnect was called on a slot pair that is not connected.
    #[error("slot is not connected")]
    NotConnected,

    /// Connecting a node's output back to its own input.
    #[error("cannot connect a node to itself")]
    SelfConnection,

    /// A track index is outside `[0, capacity)`.
    #[error("track index {track} out of range (capacity {capacity})")]
    TrackOutOfRange {
        /// Requested track index.
        track: usize,
        /// Fixed track capacity of the engine.
        capacity: usize,
    },

    /// A frame's pixel plane does not match its declared geometry.
    #[error("pixel plane of {got} bytes does not match {width}x{height} RGBA")]
    FrameGeometry {
        /// Declared frame width.
        width: u32,
        /// Declared frame height.
        height: u32,
        /// Actual plane length in bytes.
        got: usize,
    },
}
