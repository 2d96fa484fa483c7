// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-memory scene graph.
//!
//! `MemoryScene` implements [`SceneGraph`] entirely in process memory. The
//! rigging layers are written against the trait, so everything above this
//! module can be exercised without a live host.

use crate::node::{AttrDef, NodeData, NodeId, NodeTypeRegistry};
use crate::plug::{AttrValue, Plug};
use crate::scene::{SceneError, SceneGraph};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A directed plug-to-plug connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Connection {
    /// Source plug
    src: Plug,
    /// Destination plug
    dst: Plug,
}

/// In-memory implementation of [`SceneGraph`]
#[derive(Debug, Clone)]
pub struct MemoryScene {
    /// Node type registry
    registry: NodeTypeRegistry,
    /// All nodes, in creation order
    nodes: IndexMap<NodeId, NodeData>,
    /// Name index into `nodes`
    names: IndexMap<String, NodeId>,
    /// All connections, in creation order
    connections: Vec<Connection>,
}

impl MemoryScene {
    /// Create a scene with the built-in node types registered
    pub fn new() -> Self {
        Self::with_registry(NodeTypeRegistry::builtin())
    }

    /// Create a scene with a caller-supplied registry
    pub fn with_registry(registry: NodeTypeRegistry) -> Self {
        Self {
            registry,
            nodes: IndexMap::new(),
            names: IndexMap::new(),
            connections: Vec::new(),
        }
    }

    fn node(&self, node: NodeId) -> Result<&NodeData, SceneError> {
        self.nodes.get(&node).ok_or(SceneError::NodeNotFound(node))
    }

    fn node_mut(&mut self, node: NodeId) -> Result<&mut NodeData, SceneError> {
        self.nodes
            .get_mut(&node)
            .ok_or(SceneError::NodeNotFound(node))
    }

    fn check_attr(&self, plug: &Plug) -> Result<(), SceneError> {
        let data = self.node(plug.node)?;
        if data.has_attr(&plug.attr) {
            Ok(())
        } else {
            Err(SceneError::AttributeNotFound {
                node: plug.node,
                attr: plug.attr_path(),
            })
        }
    }

    fn collect_descendants(&self, node: NodeId, out: &mut Vec<NodeId>) {
        if let Some(data) = self.nodes.get(&node) {
            for child in &data.children {
                out.push(*child);
                self.collect_descendants(*child, out);
            }
        }
    }

    fn detach_from_parent(&mut self, node: NodeId) {
        let Some(parent) = self.nodes.get(&node).and_then(|n| n.parent) else {
            return;
        };
        if let Some(parent_data) = self.nodes.get_mut(&parent) {
            parent_data.children.retain(|c| *c != node);
        }
    }
}

impl Default for MemoryScene {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph for MemoryScene {
    fn registry(&self) -> &NodeTypeRegistry {
        &self.registry
    }

    fn create_node(&mut self, node_type: &str, name: &str) -> Result<NodeId, SceneError> {
        if self.names.contains_key(name) {
            return Err(SceneError::NameExists(name.to_string()));
        }
        let type_def = self
            .registry
            .get(node_type)
            .ok_or_else(|| SceneError::UnknownNodeType(node_type.to_string()))?
            .clone();
        let id = NodeId::new();
        self.nodes.insert(id, NodeData::new(name, &type_def));
        self.names.insert(name.to_string(), id);
        tracing::debug!("Created {} node: {}", node_type, name);
        Ok(id)
    }

    fn find_node(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    fn node_name(&self, node: NodeId) -> Result<String, SceneError> {
        Ok(self.node(node)?.name.clone())
    }

    fn node_type(&self, node: NodeId) -> Result<String, SceneError> {
        Ok(self.node(node)?.node_type.clone())
    }

    fn node_path(&self, node: NodeId) -> Result<String, SceneError> {
        let mut names = vec![self.node(node)?.name.clone()];
        let mut current = self.node(node)?.parent;
        while let Some(ancestor) = current {
            let data = self.node(ancestor)?;
            names.push(data.name.clone());
            current = data.parent;
        }
        names.reverse();
        Ok(format!("|{}", names.join("|")))
    }

    fn delete_node(&mut self, node: NodeId) -> Result<(), SceneError> {
        let data = self.node(node)?.clone();
        self.disconnect_all(node)?;
        // Orphaned children move up to the deleted node's parent
        for child in &data.children {
            if let Some(child_data) = self.nodes.get_mut(child) {
                child_data.parent = data.parent;
            }
            if let Some(parent) = data.parent {
                if let Some(parent_data) = self.nodes.get_mut(&parent) {
                    parent_data.children.push(*child);
                }
            }
        }
        self.detach_from_parent(node);
        self.names.shift_remove(&data.name);
        self.nodes.shift_remove(&node);
        tracing::debug!("Deleted node: {}", data.name);
        Ok(())
    }

    fn add_attribute(&mut self, node: NodeId, attr: AttrDef) -> Result<(), SceneError> {
        let data = self.node_mut(node)?;
        if !data.has_attr(&attr.name) {
            data.attrs.insert(attr.name.clone(), attr);
        }
        Ok(())
    }

    fn has_attribute(&self, node: NodeId, attr: &str) -> bool {
        self.nodes
            .get(&node)
            .is_some_and(|data| data.has_attr(attr))
    }

    fn connect(&mut self, src: Plug, dst: Plug) -> Result<(), SceneError> {
        self.check_attr(&src)?;
        self.check_attr(&dst)?;
        let pair = Connection {
            src: src.clone(),
            dst: dst.clone(),
        };
        if self.connections.contains(&pair) {
            return Ok(());
        }
        // Single incoming connection per destination: force-connect replaces
        self.connections.retain(|c| c.dst != dst);
        tracing::debug!("Connected {} -> {}", src, dst);
        self.connections.push(pair);
        Ok(())
    }

    fn disconnect_all(&mut self, node: NodeId) -> Result<(), SceneError> {
        self.node(node)?;
        self.connections
            .retain(|c| c.src.node != node && c.dst.node != node);
        Ok(())
    }

    fn source_of(&self, dst: &Plug) -> Option<Plug> {
        self.connections
            .iter()
            .find(|c| c.dst == *dst)
            .map(|c| c.src.clone())
    }

    fn connections_from(&self, node: NodeId) -> Vec<(Plug, Plug)> {
        self.connections
            .iter()
            .filter(|c| c.src.node == node)
            .map(|c| (c.src.clone(), c.dst.clone()))
            .collect()
    }

    fn set_value(&mut self, plug: &Plug, value: AttrValue) -> Result<(), SceneError> {
        self.check_attr(plug)?;
        let path = plug.attr_path();
        self.node_mut(plug.node)?.values.insert(path, value);
        Ok(())
    }

    fn value(&self, plug: &Plug) -> Option<AttrValue> {
        self.nodes
            .get(&plug.node)
            .and_then(|data| data.values.get(&plug.attr_path()))
            .cloned()
    }

    fn parent(&self, node: NodeId) -> Result<Option<NodeId>, SceneError> {
        Ok(self.node(node)?.parent)
    }

    fn set_parent(&mut self, node: NodeId, parent: Option<NodeId>) -> Result<(), SceneError> {
        self.node(node)?;
        if let Some(new_parent) = parent {
            self.node(new_parent)?;
            if new_parent == node || self.descendants(node)?.contains(&new_parent) {
                return Err(SceneError::WouldCycle(node));
            }
        }
        self.detach_from_parent(node);
        if let Some(new_parent) = parent {
            if let Some(parent_data) = self.nodes.get_mut(&new_parent) {
                parent_data.children.push(node);
            }
        }
        self.node_mut(node)?.parent = parent;
        Ok(())
    }

    fn children(&self, node: NodeId) -> Result<Vec<NodeId>, SceneError> {
        Ok(self.node(node)?.children.clone())
    }

    fn descendants(&self, node: NodeId) -> Result<Vec<NodeId>, SceneError> {
        self.node(node)?;
        let mut out = Vec::new();
        self.collect_descendants(node, &mut out);
        Ok(out)
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::types;
    use pretty_assertions::assert_eq;

    fn scene_with_chain() -> (MemoryScene, NodeId, NodeId, NodeId) {
        let mut scene = MemoryScene::new();
        let a = scene.create_node(types::TRANSFORM, "a").unwrap();
        let b = scene.create_node(types::JOINT, "b").unwrap();
        let c = scene.create_node(types::JOINT, "c").unwrap();
        scene.set_parent(b, Some(a)).unwrap();
        scene.set_parent(c, Some(b)).unwrap();
        (scene, a, b, c)
    }

    #[test]
    fn create_rejects_duplicate_names() {
        let mut scene = MemoryScene::new();
        scene.create_node(types::TRANSFORM, "root").unwrap();
        assert!(matches!(
            scene.create_node(types::JOINT, "root"),
            Err(SceneError::NameExists(_))
        ));
        assert_eq!(scene.node_count(), 1);
    }

    #[test]
    fn create_rejects_unknown_type() {
        let mut scene = MemoryScene::new();
        assert!(matches!(
            scene.create_node("ik_solver", "x"),
            Err(SceneError::UnknownNodeType(_))
        ));
    }

    #[test]
    fn paths_follow_hierarchy() {
        let (scene, a, _, c) = scene_with_chain();
        assert_eq!(scene.node_path(a).unwrap(), "|a");
        assert_eq!(scene.node_path(c).unwrap(), "|a|b|c");
    }

    #[test]
    fn descendants_are_depth_first() {
        let (mut scene, a, b, c) = scene_with_chain();
        let d = scene.create_node(types::TRANSFORM, "d").unwrap();
        scene.set_parent(d, Some(a)).unwrap();
        assert_eq!(scene.descendants(a).unwrap(), vec![b, c, d]);
    }

    #[test]
    fn reparent_cycle_rejected() {
        let (mut scene, a, _, c) = scene_with_chain();
        assert!(matches!(
            scene.set_parent(a, Some(c)),
            Err(SceneError::WouldCycle(_))
        ));
        assert!(matches!(
            scene.set_parent(a, Some(a)),
            Err(SceneError::WouldCycle(_))
        ));
    }

    #[test]
    fn connect_same_pair_is_noop() {
        let mut scene = MemoryScene::new();
        let m = scene.create_node(types::MULTIPLY2, "m1").unwrap();
        let n = scene.create_node(types::MULTIPLY2, "m2").unwrap();
        let src = Plug::new(m, "output");
        let dst = Plug::new(n, "input1");
        scene.connect(src.clone(), dst.clone()).unwrap();
        scene.connect(src.clone(), dst.clone()).unwrap();
        assert_eq!(scene.connection_count(), 1);
        assert_eq!(scene.source_of(&dst), Some(src));
    }

    #[test]
    fn connect_replaces_previous_source() {
        let mut scene = MemoryScene::new();
        let m = scene.create_node(types::MULTIPLY2, "m1").unwrap();
        let n = scene.create_node(types::MULTIPLY2, "m2").unwrap();
        let o = scene.create_node(types::MULTIPLY2, "m3").unwrap();
        let dst = Plug::new(o, "input1");
        scene.connect(Plug::new(m, "output"), dst.clone()).unwrap();
        scene.connect(Plug::new(n, "output"), dst.clone()).unwrap();
        assert_eq!(scene.connection_count(), 1);
        assert_eq!(scene.source_of(&dst), Some(Plug::new(n, "output")));
    }

    #[test]
    fn connect_requires_attributes() {
        let mut scene = MemoryScene::new();
        let a = scene.create_node(types::TRANSFORM, "a").unwrap();
        let m = scene.create_node(types::MULTIPLY2, "m").unwrap();
        let err = scene.connect(Plug::new(m, "output"), Plug::new(a, "input1"));
        assert!(matches!(err, Err(SceneError::AttributeNotFound { .. })));
    }

    #[test]
    fn delete_drops_connections_and_lifts_children() {
        let (mut scene, a, b, c) = scene_with_chain();
        scene.add_attribute(b, AttrDef::scalar("out")).unwrap();
        scene.add_attribute(c, AttrDef::scalar("in")).unwrap();
        scene
            .connect(Plug::new(b, "out"), Plug::new(c, "in"))
            .unwrap();

        scene.delete_node(b).unwrap();
        assert_eq!(scene.connection_count(), 0);
        assert_eq!(scene.parent(c).unwrap(), Some(a));
        assert_eq!(scene.find_node("b"), None);
        assert_eq!(scene.children(a).unwrap(), vec![c]);
    }

    #[test]
    fn values_round_trip_per_plug_path() {
        let mut scene = MemoryScene::new();
        let agg = scene.create_node(types::AGGREGATE, "agg").unwrap();
        let slot0 = Plug::new(agg, "input1d").element(0);
        let slot1 = Plug::new(agg, "input1d").element(1);
        scene.set_value(&slot0, AttrValue::Float(2.0)).unwrap();
        scene.set_value(&slot1, AttrValue::Float(3.0)).unwrap();
        assert_eq!(scene.value(&slot0), Some(AttrValue::Float(2.0)));
        assert_eq!(scene.value(&slot1), Some(AttrValue::Float(3.0)));
    }
}
