//! Effect nodes: addressable processing units with slots and children.
//!
//! An [`EffectNode`] bundles an ordered set of input [`SinkSlot`]s, an ordered
//! set of output [`SourceSlot`]s, a child list, and a boxed [`FrameEffect`]
//! behavior. `render()` reads every input, runs the behavior once, and writes
//! every output — it is total and never fails on a patched node.
//!
//! Nodes are identified by [`NodeId`] handles into the factory's arena. Child
//! lists hold ids, not nodes; operations that need to resolve ids (child
//! creation, cross-node wiring through the arena, deletion) live on
//! [`NodeFactory`](crate::factory::NodeFactory).

use crate::error::RoutingError;
use crate::frame::VideoFrame;
use crate::slot::{SinkSlot, SlotEndpoint, SourceSlot, connect};

/// Fixed track capacity of the routing core.
///
/// Bounds the number of video inputs a node will create and the size of the
/// engine's input array.
pub const MAX_TRACKS: usize = 64;

/// Unique identifier for a node in the factory arena.
///
/// Ids are assigned sequentially and never reused within a factory instance.
/// They remain stable across graph mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }

    /// Sentinel marking endpoints owned by the engine rather than a node.
    #[inline]
    pub fn sentinel() -> Self {
        Self(u32::MAX)
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Frame-processing behavior of a node.
///
/// `inputs` holds one frame per input slot (unconnected slots yield the null
/// frame); `outputs` holds one pre-defaulted frame per output slot for the
/// implementation to overwrite. Implementations must not assume any particular
/// frame geometry.
///
/// Behaviors live inside nodes shared across threads through the engine's
/// lock, hence the `Send + Sync` bound at the boxing sites.
pub trait FrameEffect {
    /// Processes the current input frames into the output frames.
    fn process(&mut self, inputs: &[VideoFrame], outputs: &mut [VideoFrame]);

    /// Clears internal state, if any. Most frame effects are stateless.
    fn reset(&mut self) {}
}

/// Behavior for structural nodes: copies input `i` to output `i`.
///
/// Root graph nodes carry this so their own slots forward frames unchanged.
pub struct Passthrough;

impl FrameEffect for Passthrough {
    fn process(&mut self, inputs: &[VideoFrame], outputs: &mut [VideoFrame]) {
        for (out, input) in outputs.iter_mut().zip(inputs.iter()) {
            *out = input.clone();
        }
    }
}

/// A named, addressable processing unit in the routing graph.
pub struct EffectNode {
    id: NodeId,
    instance_name: String,
    type_name: String,
    inputs: Vec<SinkSlot<VideoFrame>>,
    outputs: Vec<SourceSlot<VideoFrame>>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    behavior: Box<dyn FrameEffect + Send + Sync>,
    /// Scratch frames reused across renders to avoid per-tick reallocation.
    scratch_in: Vec<VideoFrame>,
    scratch_out: Vec<VideoFrame>,
}

impl EffectNode {
    /// Creates a node with no slots and no children.
    pub fn new(
        id: NodeId,
        instance_name: impl Into<String>,
        type_name: impl Into<String>,
        behavior: Box<dyn FrameEffect + Send + Sync>,
    ) -> Self {
        Self {
            id,
            instance_name: instance_name.into(),
            type_name: type_name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            children: Vec::new(),
            parent: None,
            behavior,
            scratch_in: Vec::new(),
            scratch_out: Vec::new(),
        }
    }

    // --- Slot creation ---

    /// Appends a video input slot and returns its index.
    ///
    /// Slot indices are stable for the node's lifetime. Fails once
    /// [`MAX_TRACKS`] inputs exist.
    pub fn add_video_input(&mut self) -> Result<usize, RoutingError> {
        if self.inputs.len() >= MAX_TRACKS {
            return Err(RoutingError::SlotCapacity(MAX_TRACKS));
        }
        let index = self.inputs.len();
        let owner = SlotEndpoint {
            node: self.id,
            slot: index,
        };
        self.inputs
            .push(SinkSlot::new(index as u32, format!("video_in{index}"), owner));
        tracing::debug!("node_slot: {} input {index}", self.instance_name);
        Ok(index)
    }

    /// Appends a video output slot and returns its index.
    pub fn add_video_output(&mut self) -> Result<usize, RoutingError> {
        if self.outputs.len() >= MAX_TRACKS {
            return Err(RoutingError::SlotCapacity(MAX_TRACKS));
        }
        let index = self.outputs.len();
        let owner = SlotEndpoint {
            node: self.id,
            slot: index,
        };
        self.outputs.push(SourceSlot::new(
            index as u32,
            format!("video_out{index}"),
            owner,
        ));
        tracing::debug!("node_slot: {} output {index}", self.instance_name);
        Ok(index)
    }

    // --- Wiring ---

    /// Feeds a literal frame into an input slot.
    ///
    /// The frame becomes the slot's value while it has no upstream connection.
    /// Used to push externally-produced frames into the first node of a chain.
    pub fn feed(&mut self, frame: VideoFrame, input: usize) -> Result<(), RoutingError> {
        let count = self.inputs.len();
        let sink = self
            .inputs
            .get_mut(input)
            .ok_or(RoutingError::SlotOutOfRange { index: input, count })?;
        sink.set_fallback(frame);
        Ok(())
    }

    /// Connects an external source slot into this node's input `input`.
    pub fn connect_input_from(
        &mut self,
        source: &mut SourceSlot<VideoFrame>,
        input: usize,
    ) -> Result<(), RoutingError> {
        let count = self.inputs.len();
        let sink = self
            .inputs
            .get_mut(input)
            .ok_or(RoutingError::SlotOutOfRange { index: input, count })?;
        connect(source, sink)
    }

    /// Wires this node's output `output` into `other`'s input `other_input`.
    ///
    /// Fails per the slot-pair contract if either endpoint is already bound.
    pub fn connect_output_to(
        &mut self,
        output: usize,
        other: &mut EffectNode,
        other_input: usize,
    ) -> Result<(), RoutingError> {
        let out_count = self.outputs.len();
        let source = self
            .outputs
            .get_mut(output)
            .ok_or(RoutingError::SlotOutOfRange {
                index: output,
                count: out_count,
            })?;
        let in_count = other.inputs.len();
        let sink = other
            .inputs
            .get_mut(other_input)
            .ok_or(RoutingError::SlotOutOfRange {
                index: other_input,
                count: in_count,
            })?;
        connect(source, sink)
    }

    /// Wires this node's output `output` into an external sink slot.
    pub fn connect_output_to_sink(
        &mut self,
        output: usize,
        sink: &mut SinkSlot<VideoFrame>,
    ) -> Result<(), RoutingError> {
        let count = self.outputs.len();
        let source = self
            .outputs
            .get_mut(output)
            .ok_or(RoutingError::SlotOutOfRange {
                index: output,
                count,
            })?;
        connect(source, sink)
    }

    // --- Processing ---

    /// Runs one processing pass: read all inputs, process, write all outputs.
    ///
    /// Total — a node with unconnected inputs simply sees null frames. Render
    /// order across nodes is the orchestrator's responsibility: a node must
    /// not render before everything feeding its inputs has rendered in the
    /// same tick.
    pub fn render(&mut self) {
        self.scratch_in.clear();
        self.scratch_in.extend(self.inputs.iter().map(SinkSlot::read));

        self.scratch_out.clear();
        self.scratch_out
            .resize_with(self.outputs.len(), VideoFrame::default);

        self.behavior.process(&self.scratch_in, &mut self.scratch_out);

        for (slot, frame) in self.outputs.iter().zip(self.scratch_out.drain(..)) {
            slot.write(frame);
        }
    }

    /// Resets the behavior's internal state.
    pub fn reset(&mut self) {
        self.behavior.reset();
    }

    // --- Introspection ---

    /// Node id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Globally unique instance name (`"{type}_{seq}"` for factory-created
    /// nodes).
    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    /// Plugin type name this node was instantiated from.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Number of input slots.
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Number of output slots.
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Input slot by index.
    pub fn input(&self, index: usize) -> Option<&SinkSlot<VideoFrame>> {
        self.inputs.get(index)
    }

    /// Mutable input slot by index.
    pub fn input_mut(&mut self, index: usize) -> Option<&mut SinkSlot<VideoFrame>> {
        self.inputs.get_mut(index)
    }

    /// Output slot by index.
    pub fn output(&self, index: usize) -> Option<&SourceSlot<VideoFrame>> {
        self.outputs.get(index)
    }

    /// Mutable output slot by index.
    pub fn output_mut(&mut self, index: usize) -> Option<&mut SourceSlot<VideoFrame>> {
        self.outputs.get_mut(index)
    }

    /// Child id by position in the child list.
    pub fn child(&self, index: usize) -> Option<NodeId> {
        self.children.get(index).copied()
    }

    /// Ordered child ids.
    pub fn child_ids(&self) -> &[NodeId] {
        &self.children
    }

    /// Parent node id, if attached to a tree.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    // --- Tree bookkeeping (factory-internal) ---

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    pub(crate) fn push_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    pub(crate) fn remove_child(&mut self, child: NodeId) {
        self.children.retain(|&c| c != child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test behavior: inverts every byte of input 0 into output 0.
    struct InvertBytes;

    impl FrameEffect for InvertBytes {
        fn process(&mut self, inputs: &[VideoFrame], outputs: &mut [VideoFrame]) {
            if let (Some(input), Some(out)) = (inputs.first(), outputs.first_mut()) {
                let plane: Vec<u8> = input.plane().iter().map(|b| !b).collect();
                *out = VideoFrame::new(input.width(), input.height(), plane, input.pts())
                    .unwrap_or_default();
            }
        }
    }

    fn node(name: &str) -> EffectNode {
        EffectNode::new(NodeId(0), name, "test", Box::new(Passthrough))
    }

    #[test]
    fn slot_indices_are_stable_and_sequential() {
        let mut n = node("n_1");
        assert_eq!(n.add_video_input().unwrap(), 0);
        assert_eq!(n.add_video_input().unwrap(), 1);
        assert_eq!(n.add_video_output().unwrap(), 0);
        assert_eq!(n.input_count(), 2);
        assert_eq!(n.output_count(), 1);
        assert_eq!(n.input(1).unwrap().name(), "video_in1");
    }

    #[test]
    fn input_capacity_is_enforced() {
        let mut n = node("n_1");
        for _ in 0..MAX_TRACKS {
            n.add_video_input().unwrap();
        }
        assert!(matches!(
            n.add_video_input(),
            Err(RoutingError::SlotCapacity(MAX_TRACKS))
        ));
        assert_eq!(n.input_count(), MAX_TRACKS);
    }

    #[test]
    fn feed_rejects_bad_index() {
        let mut n = node("n_1");
        n.add_video_input().unwrap();
        assert!(matches!(
            n.feed(VideoFrame::default(), 3),
            Err(RoutingError::SlotOutOfRange { index: 3, count: 1 })
        ));
    }

    #[test]
    fn passthrough_render_copies_fed_frame() {
        let mut n = node("root");
        n.add_video_input().unwrap();
        n.add_video_output().unwrap();

        let frame = VideoFrame::solid(2, 2, [8, 8, 8, 255]);
        n.feed(frame.clone(), 0).unwrap();
        n.render();

        assert!(n.output(0).unwrap().value().same_plane(&frame));
    }

    #[test]
    fn render_applies_behavior() {
        let mut n = EffectNode::new(NodeId(1), "inv_1", "invert", Box::new(InvertBytes));
        n.add_video_input().unwrap();
        n.add_video_output().unwrap();

        n.feed(VideoFrame::solid(1, 1, [0, 255, 15, 240]), 0).unwrap();
        n.render();

        let out = n.output(0).unwrap().value();
        assert_eq!(out.plane(), &[255, 0, 240, 15]);
    }

    #[test]
    fn render_with_no_inputs_writes_defaults() {
        let mut n = node("root");
        n.add_video_output().unwrap();
        n.render();
        assert!(n.output(0).unwrap().value().is_empty());
    }

    #[test]
    fn two_node_chain_via_connect_output_to() {
        let mut a = EffectNode::new(NodeId(1), "a_1", "test", Box::new(Passthrough));
        let mut b = EffectNode::new(NodeId(2), "b_1", "test", Box::new(InvertBytes));
        a.add_video_input().unwrap();
        a.add_video_output().unwrap();
        b.add_video_input().unwrap();
        b.add_video_output().unwrap();

        a.connect_output_to(0, &mut b, 0).unwrap();

        a.feed(VideoFrame::solid(1, 1, [0, 0, 0, 0]), 0).unwrap();
        a.render();
        b.render();

        assert_eq!(b.output(0).unwrap().value().plane(), &[255, 255, 255, 255]);
    }

    #[test]
    fn connect_output_to_rejects_bound_endpoint() {
        let mut a = node("a_1");
        let mut b = node("b_1");
        let mut c = node("c_1");
        a.add_video_output().unwrap();
        b.add_video_input().unwrap();
        c.add_video_input().unwrap();

        a.connect_output_to(0, &mut b, 0).unwrap();
        assert!(matches!(
            a.connect_output_to(0, &mut c, 0),
            Err(RoutingError::AlreadyConnected)
        ));
    }
}
