//! Node factory: plugin type catalog, live-instance arena, and root graphs.
//!
//! [`NodeFactory`] is the registry of the routing core. It maps plugin type
//! names to [`NodeTemplate`]s, owns every live [`EffectNode`] in an arena keyed
//! by [`NodeId`], tracks instance names (`"{type}_{seq}"`), and manages the
//! singleton root graphs by string key. It is a plain owned object — the
//! engine receives one at construction; there is no process-wide state.
//!
//! All cross-node wiring goes through the factory so that both endpoints are
//! resolved through the arena: a stale handle yields a lookup failure, never a
//! dangling reference.

use std::collections::HashMap;

use crate::error::RoutingError;
use crate::node::{EffectNode, FrameEffect, MAX_TRACKS, NodeId, Passthrough};
use crate::slot::SlotEndpoint;

/// Blueprint for instantiating a plugin type.
pub struct NodeTemplate {
    /// Number of video input slots to create on each instance.
    pub inputs: usize,
    /// Number of video output slots to create on each instance.
    pub outputs: usize,
    /// Builds the processing behavior for a fresh instance.
    pub build: fn() -> Box<dyn FrameEffect + Send + Sync>,
}

/// Catalog of node types plus the arena of live node instances.
#[derive(Default)]
pub struct NodeFactory {
    types: HashMap<String, NodeTemplate>,
    nodes: HashMap<NodeId, EffectNode>,
    names: HashMap<String, NodeId>,
    seq: HashMap<String, u32>,
    roots: HashMap<String, NodeId>,
    next_id: u32,
}

impl NodeFactory {
    /// Creates an empty factory with no registered types.
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    // --- Type catalog ---

    /// Registers a plugin type under `type_name`.
    ///
    /// Re-registering an existing name overwrites the previous template
    /// (last registration wins); plugin discovery relies on this at startup.
    pub fn register_node_type(&mut self, type_name: impl Into<String>, template: NodeTemplate) {
        let type_name = type_name.into();
        tracing::debug!("factory_register: type '{type_name}'");
        self.types.insert(type_name, template);
    }

    /// Registered type names, sorted for stable iteration.
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.keys().cloned().collect();
        names.sort();
        names
    }

    // --- Instance management ---

    /// Instantiates a registered type and returns the new instance name.
    ///
    /// The Nth instantiation of a type yields `"{type_name}_{N}"`, starting at
    /// 1. An unknown type fails without touching the arena or the sequence
    /// counters.
    pub fn create_instance(&mut self, type_name: &str) -> Result<String, RoutingError> {
        let template = self
            .types
            .get(type_name)
            .ok_or_else(|| RoutingError::UnknownType(type_name.to_string()))?;
        if template.inputs > MAX_TRACKS || template.outputs > MAX_TRACKS {
            return Err(RoutingError::SlotCapacity(MAX_TRACKS));
        }
        let (inputs, outputs, build) = (template.inputs, template.outputs, template.build);

        let seq = self.seq.entry(type_name.to_string()).or_insert(0);
        *seq += 1;
        let instance_name = format!("{type_name}_{seq}");

        let id = self.alloc_id();
        let mut node = EffectNode::new(id, instance_name.clone(), type_name, build());
        for _ in 0..inputs {
            node.add_video_input()?;
        }
        for _ in 0..outputs {
            node.add_video_output()?;
        }

        tracing::debug!("factory_create: instance '{instance_name}' as {id}");
        self.names.insert(instance_name.clone(), id);
        self.nodes.insert(id, node);
        Ok(instance_name)
    }

    /// Removes and destroys an instance (and its whole child subtree).
    ///
    /// The instance is detached from its parent's child list, and every
    /// connection whose remote end survives is cleanly severed on the remote
    /// side. Unknown names fail without side effects; callers may ignore that.
    pub fn delete_instance(&mut self, instance_name: &str) -> Result<(), RoutingError> {
        let id = self
            .names
            .get(instance_name)
            .copied()
            .ok_or_else(|| RoutingError::UnknownInstance(instance_name.to_string()))?;
        self.delete_subtree(id);
        Ok(())
    }

    /// Resolves an instance name to its node id.
    pub fn instance(&self, instance_name: &str) -> Option<NodeId> {
        self.names.get(instance_name).copied()
    }

    /// Live instance names, sorted for stable iteration.
    ///
    /// Root nodes are not listed; they are addressed by root key.
    pub fn instance_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.names.keys().cloned().collect();
        names.sort();
        names
    }

    /// Node by id.
    pub fn node(&self, id: NodeId) -> Option<&EffectNode> {
        self.nodes.get(&id)
    }

    /// Mutable node by id.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut EffectNode> {
        self.nodes.get_mut(&id)
    }

    /// Node by instance name.
    pub fn node_by_name(&self, instance_name: &str) -> Option<&EffectNode> {
        self.nodes.get(self.names.get(instance_name)?)
    }

    /// Mutable node by instance name.
    pub fn node_by_name_mut(&mut self, instance_name: &str) -> Option<&mut EffectNode> {
        let id = *self.names.get(instance_name)?;
        self.nodes.get_mut(&id)
    }

    // --- Root graphs ---

    /// Creates a singleton root node under `key`.
    ///
    /// Root nodes carry a passthrough behavior and start with no slots; the
    /// engine populates them. Fails if the key is already taken.
    pub fn create_root(&mut self, key: &str) -> Result<NodeId, RoutingError> {
        if self.roots.contains_key(key) {
            return Err(RoutingError::RootExists(key.to_string()));
        }
        let id = self.alloc_id();
        let node = EffectNode::new(id, key, "root", Box::new(Passthrough));
        self.nodes.insert(id, node);
        self.roots.insert(key.to_string(), id);
        tracing::debug!("factory_root: created '{key}' as {id}");
        Ok(id)
    }

    /// Root node id by key.
    pub fn root(&self, key: &str) -> Option<NodeId> {
        self.roots.get(key).copied()
    }

    /// Deletes a root node and its entire subtree.
    pub fn delete_root(&mut self, key: &str) -> Result<(), RoutingError> {
        let id = self
            .roots
            .remove(key)
            .ok_or_else(|| RoutingError::UnknownInstance(key.to_string()))?;
        self.delete_subtree(id);
        tracing::debug!("factory_root: deleted '{key}'");
        Ok(())
    }

    // --- Child tree ---

    /// Instantiates `type_name` as a child of `parent`; returns the child's
    /// instance name.
    pub fn create_child(
        &mut self,
        parent: NodeId,
        type_name: &str,
    ) -> Result<String, RoutingError> {
        if !self.nodes.contains_key(&parent) {
            return Err(RoutingError::NodeNotFound(parent));
        }
        let instance_name = self.create_instance(type_name)?;
        let child_id = self.names[&instance_name];
        // Both lookups are infallible here; the nodes were just checked/created.
        if let Some(child) = self.nodes.get_mut(&child_id) {
            child.set_parent(Some(parent));
        }
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.push_child(child_id);
        }
        Ok(instance_name)
    }

    /// Finds a direct child of `parent` by instance name.
    pub fn child_by_name(&self, parent: NodeId, instance_name: &str) -> Option<NodeId> {
        let id = self.names.get(instance_name).copied()?;
        let node = self.nodes.get(&id)?;
        (node.parent() == Some(parent)).then_some(id)
    }

    /// Type names of `parent`'s direct children, in child order.
    pub fn child_type_names(&self, parent: NodeId) -> Vec<String> {
        let Some(node) = self.nodes.get(&parent) else {
            return Vec::new();
        };
        node.child_ids()
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .map(|child| child.type_name().to_string())
            .collect()
    }

    // --- Arena wiring ---

    /// Connects output slot `from` to input slot `to` across the arena.
    pub fn connect(&mut self, from: SlotEndpoint, to: SlotEndpoint) -> Result<(), RoutingError> {
        if from.node == to.node {
            return Err(RoutingError::SelfConnection);
        }
        let [src_node, dst_node] = self.nodes.get_disjoint_mut([&from.node, &to.node]);
        let src_node = src_node.ok_or(RoutingError::NodeNotFound(from.node))?;
        let dst_node = dst_node.ok_or(RoutingError::NodeNotFound(to.node))?;

        let out_count = src_node.output_count();
        let source = src_node
            .output_mut(from.slot)
            .ok_or(RoutingError::SlotOutOfRange {
                index: from.slot,
                count: out_count,
            })?;
        let in_count = dst_node.input_count();
        let sink = dst_node
            .input_mut(to.slot)
            .ok_or(RoutingError::SlotOutOfRange {
                index: to.slot,
                count: in_count,
            })?;
        crate::slot::connect(source, sink)
    }

    /// Disconnects the pair previously wired by [`connect`](Self::connect).
    pub fn disconnect(&mut self, from: SlotEndpoint, to: SlotEndpoint) -> Result<(), RoutingError> {
        if from.node == to.node {
            return Err(RoutingError::SelfConnection);
        }
        let [src_node, dst_node] = self.nodes.get_disjoint_mut([&from.node, &to.node]);
        let src_node = src_node.ok_or(RoutingError::NodeNotFound(from.node))?;
        let dst_node = dst_node.ok_or(RoutingError::NodeNotFound(to.node))?;

        let out_count = src_node.output_count();
        let source = src_node
            .output_mut(from.slot)
            .ok_or(RoutingError::SlotOutOfRange {
                index: from.slot,
                count: out_count,
            })?;
        let in_count = dst_node.input_count();
        let sink = dst_node
            .input_mut(to.slot)
            .ok_or(RoutingError::SlotOutOfRange {
                index: to.slot,
                count: in_count,
            })?;
        crate::slot::disconnect(source, sink)
    }

    // --- Internal teardown ---

    /// Removes `id` and its subtree, severing every connection whose remote
    /// end survives.
    fn delete_subtree(&mut self, id: NodeId) {
        // Collect the subtree depth-first.
        let mut subtree = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(&current) {
                stack.extend(node.child_ids().iter().copied());
                subtree.push(current);
            }
        }

        // Detach the subtree root from its parent.
        if let Some(parent) = self.nodes.get(&id).and_then(EffectNode::parent)
            && let Some(parent_node) = self.nodes.get_mut(&parent)
        {
            parent_node.remove_child(id);
        }

        // Record remote endpoints to sever: (remote endpoint, remote side is a
        // source slot). Engine-owned (sentinel) endpoints are the engine's to
        // clean up.
        let mut remote_links = Vec::new();
        for node_id in &subtree {
            let Some(node) = self.nodes.get(node_id) else {
                continue;
            };
            for i in 0..node.input_count() {
                if let Some(ep) = node.input(i).and_then(|s| s.connected_to())
                    && ep.node != NodeId::sentinel()
                    && !subtree.contains(&ep.node)
                {
                    remote_links.push((ep, true));
                }
            }
            for i in 0..node.output_count() {
                if let Some(ep) = node.output(i).and_then(|s| s.connected_to())
                    && ep.node != NodeId::sentinel()
                    && !subtree.contains(&ep.node)
                {
                    remote_links.push((ep, false));
                }
            }
        }

        for node_id in &subtree {
            if let Some(node) = self.nodes.remove(node_id) {
                tracing::debug!("factory_delete: instance '{}'", node.instance_name());
                self.names.remove(node.instance_name());
            }
        }

        for (ep, is_source) in remote_links {
            let Some(remote) = self.nodes.get_mut(&ep.node) else {
                continue;
            };
            if is_source {
                if let Some(slot) = remote.output_mut(ep.slot) {
                    slot.sever();
                }
            } else if let Some(slot) = remote.input_mut(ep.slot) {
                slot.sever();
            }
        }
    }
}
