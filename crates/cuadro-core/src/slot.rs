//! Slot pair: unidirectional, single-connection frame endpoints.
//!
//! A [`SourceSlot`] owns a writable value cell; a [`SinkSlot`] reads the cell
//! of the source it is connected to. Connecting shares the source's cell with
//! the sink (an `Arc` around the cell's lock), so a write on the source side
//! is visible on the sink side at the next read — last write wins, nothing is
//! queued.
//!
//! Back-references between the two sides are [`SlotEndpoint`] handles (node id
//! plus slot index), never pointers: deleting or reconnecting a node can leave
//! a stale handle at worst, and stale handles resolve to "not found" at the
//! arena, not to dangling memory.
//!
//! The per-slot shared/exclusive lock guards the *value*: writes take the
//! cell's write lock, reads its read lock, independent of the engine's
//! structural lock. Topology changes (connect/disconnect) need `&mut` on both
//! slots and are serialized by whoever owns the slots.

use std::sync::{Arc, PoisonError, RwLock};

use crate::error::RoutingError;
use crate::node::NodeId;

/// Arena handle addressing one slot on one node.
///
/// `node` may be [`NodeId::sentinel()`] for slots owned by the engine itself
/// (track feeds and output sinks) rather than by an arena node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotEndpoint {
    /// Owning node.
    pub node: NodeId,
    /// Slot index within the owning node's input or output collection.
    pub slot: usize,
}

impl SlotEndpoint {
    /// Endpoint for an engine-owned slot outside the node arena.
    pub fn external(slot: usize) -> Self {
        Self {
            node: NodeId::sentinel(),
            slot,
        }
    }
}

/// Output endpoint owning a writable value cell.
///
/// Writes always succeed, connected or not; an unconnected source absorbs
/// writes into its own cell.
pub struct SourceSlot<T> {
    id: u32,
    name: String,
    owner: SlotEndpoint,
    connected: Option<SlotEndpoint>,
    cell: Arc<RwLock<T>>,
}

impl<T: Clone + Default> SourceSlot<T> {
    /// Creates a disconnected source slot holding the default value.
    pub fn new(id: u32, name: impl Into<String>, owner: SlotEndpoint) -> Self {
        Self {
            id,
            name: name.into(),
            owner,
            connected: None,
            cell: Arc::new(RwLock::new(T::default())),
        }
    }

    /// Stores a value into the owned cell. Always succeeds.
    pub fn write(&self, value: T) {
        *self
            .cell
            .write()
            .unwrap_or_else(PoisonError::into_inner) = value;
    }

    /// Reads back the cell's current value.
    pub fn value(&self) -> T {
        self.cell
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Numeric slot id.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Slot name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Endpoint of the slot itself (owning node + index).
    pub fn owner(&self) -> SlotEndpoint {
        self.owner
    }

    /// Endpoint of the connected sink, if any.
    pub fn connected_to(&self) -> Option<SlotEndpoint> {
        self.connected
    }

    /// Returns true while a sink is connected.
    pub fn is_connected(&self) -> bool {
        self.connected.is_some()
    }

    /// Clears only this side's connection record.
    ///
    /// Used during node deletion, where the remote side is fixed up through
    /// the arena (or is being dropped with its node).
    pub fn sever(&mut self) {
        self.connected = None;
    }
}

/// Input endpoint reading a connected source's cell.
///
/// While unconnected, reads return the slot's fallback value, which starts as
/// `T::default()` and can be replaced via [`SinkSlot::set_fallback`] to feed a
/// literal value into a node input that has no upstream.
pub struct SinkSlot<T> {
    id: u32,
    name: String,
    owner: SlotEndpoint,
    connected: Option<SlotEndpoint>,
    pipe: Option<Arc<RwLock<T>>>,
    fallback: T,
}

impl<T: Clone + Default> SinkSlot<T> {
    /// Creates a disconnected sink slot.
    pub fn new(id: u32, name: impl Into<String>, owner: SlotEndpoint) -> Self {
        Self {
            id,
            name: name.into(),
            owner,
            connected: None,
            pipe: None,
            fallback: T::default(),
        }
    }

    /// Reads the connected source's current value, or the fallback value when
    /// unconnected. Never blocks on anything but the cell's read lock.
    pub fn read(&self) -> T {
        match &self.pipe {
            Some(cell) => cell
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            None => self.fallback.clone(),
        }
    }

    /// Replaces the fallback value returned while unconnected.
    pub fn set_fallback(&mut self, value: T) {
        self.fallback = value;
    }

    /// Numeric slot id.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Slot name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Endpoint of the slot itself (owning node + index).
    pub fn owner(&self) -> SlotEndpoint {
        self.owner
    }

    /// Endpoint of the connected source, if any.
    pub fn connected_to(&self) -> Option<SlotEndpoint> {
        self.connected
    }

    /// Returns true while a source is connected.
    pub fn is_connected(&self) -> bool {
        self.connected.is_some()
    }

    /// Clears only this side's connection and pipe.
    ///
    /// See [`SourceSlot::sever`].
    pub fn sever(&mut self) {
        self.connected = None;
        self.pipe = None;
        self.fallback = T::default();
    }
}

/// Connects a source to a sink.
///
/// Succeeds only if both sides are currently free; there is no implicit
/// disconnect-then-reconnect. On failure neither side is modified.
pub fn connect<T: Clone + Default>(
    source: &mut SourceSlot<T>,
    sink: &mut SinkSlot<T>,
) -> Result<(), RoutingError> {
    if source.connected.is_some() || sink.connected.is_some() {
        return Err(RoutingError::AlreadyConnected);
    }
    source.connected = Some(sink.owner);
    sink.connected = Some(source.owner);
    sink.pipe = Some(Arc::clone(&source.cell));
    tracing::debug!(
        "slot_connect: {:?}[{}] → {:?}[{}]",
        source.owner.node,
        source.owner.slot,
        sink.owner.node,
        sink.owner.slot
    );
    Ok(())
}

/// Disconnects a source/sink pair.
///
/// Safe to call repeatedly: the second call reports
/// [`RoutingError::NotConnected`] and changes nothing. After a disconnect the
/// source keeps absorbing writes into its own cell and the orphaned sink reads
/// the default value again.
pub fn disconnect<T: Clone + Default>(
    source: &mut SourceSlot<T>,
    sink: &mut SinkSlot<T>,
) -> Result<(), RoutingError> {
    if source.connected.is_none() && sink.connected.is_none() {
        return Err(RoutingError::NotConnected);
    }
    source.connected = None;
    sink.sever();
    tracing::debug!(
        "slot_disconnect: {:?}[{}] ⇸ {:?}[{}]",
        source.owner.node,
        source.owner.slot,
        sink.owner.node,
        sink.owner.slot
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::VideoFrame;

    fn pair() -> (SourceSlot<VideoFrame>, SinkSlot<VideoFrame>) {
        let source = SourceSlot::new(0, "out0", SlotEndpoint::external(0));
        let sink = SinkSlot::new(0, "in0", SlotEndpoint::external(0));
        (source, sink)
    }

    #[test]
    fn unconnected_sink_reads_default() {
        let (_, sink) = pair();
        assert!(sink.read().is_empty());
    }

    #[test]
    fn write_flows_to_connected_sink() {
        let (mut source, mut sink) = pair();
        connect(&mut source, &mut sink).unwrap();

        let frame = VideoFrame::solid(2, 2, [1, 2, 3, 255]);
        source.write(frame.clone());
        assert!(sink.read().same_plane(&frame));
    }

    #[test]
    fn last_write_wins() {
        let (mut source, mut sink) = pair();
        connect(&mut source, &mut sink).unwrap();

        let first = VideoFrame::solid(2, 2, [1, 1, 1, 255]);
        let second = VideoFrame::solid(2, 2, [2, 2, 2, 255]);
        source.write(first);
        source.write(second.clone());
        assert!(sink.read().same_plane(&second));
    }

    #[test]
    fn connect_refuses_busy_endpoints() {
        let (mut source, mut sink) = pair();
        connect(&mut source, &mut sink).unwrap();

        // A second sink cannot steal a connected source.
        let mut other_sink = SinkSlot::new(1, "in1", SlotEndpoint::external(1));
        assert!(matches!(
            connect(&mut source, &mut other_sink),
            Err(RoutingError::AlreadyConnected)
        ));
        // The original link is intact.
        assert_eq!(source.connected_to(), Some(sink.owner()));
        assert!(sink.is_connected());
        assert!(!other_sink.is_connected());

        // A second source cannot steal a connected sink either.
        let mut other_source = SourceSlot::new(1, "out1", SlotEndpoint::external(1));
        assert!(matches!(
            connect(&mut other_source, &mut sink),
            Err(RoutingError::AlreadyConnected)
        ));
        assert!(!other_source.is_connected());
    }

    #[test]
    fn disconnect_is_idempotent_safe() {
        let (mut source, mut sink) = pair();
        connect(&mut source, &mut sink).unwrap();

        disconnect(&mut source, &mut sink).unwrap();
        assert!(!source.is_connected());
        assert!(!sink.is_connected());

        assert!(matches!(
            disconnect(&mut source, &mut sink),
            Err(RoutingError::NotConnected)
        ));
    }

    #[test]
    fn orphaned_sink_reads_default_again() {
        let (mut source, mut sink) = pair();
        connect(&mut source, &mut sink).unwrap();
        source.write(VideoFrame::solid(2, 2, [9, 9, 9, 255]));

        disconnect(&mut source, &mut sink).unwrap();
        assert!(sink.read().is_empty());

        // Writes to the now-disconnected source are absorbed, not errors.
        let frame = VideoFrame::solid(4, 4, [7, 7, 7, 255]);
        source.write(frame.clone());
        assert!(source.value().same_plane(&frame));
        assert!(sink.read().is_empty());
    }

    #[test]
    fn fallback_feeds_unconnected_sink() {
        let (mut source, mut sink) = pair();
        let frame = VideoFrame::solid(2, 2, [3, 3, 3, 255]);
        sink.set_fallback(frame.clone());
        assert!(sink.read().same_plane(&frame));

        // A live connection shadows the fallback.
        connect(&mut source, &mut sink).unwrap();
        assert!(sink.read().is_empty());

        // Disconnecting resets the fallback to the default value.
        disconnect(&mut source, &mut sink).unwrap();
        assert!(sink.read().is_empty());
    }

    #[test]
    fn reconnect_after_disconnect() {
        let (mut source, mut sink) = pair();
        connect(&mut source, &mut sink).unwrap();
        disconnect(&mut source, &mut sink).unwrap();
        connect(&mut source, &mut sink).unwrap();

        let frame = VideoFrame::solid(2, 2, [5, 5, 5, 255]);
        source.write(frame.clone());
        assert!(sink.read().same_plane(&frame));
    }
}
