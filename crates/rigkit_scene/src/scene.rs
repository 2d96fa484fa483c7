// SPDX-License-Identifier: MIT OR Apache-2.0
//! The host-capability trait every rig unit is written against.

use crate::node::{AttrDef, NodeId, NodeTypeRegistry};
use crate::plug::{AttrValue, Plug};

/// Narrow capability interface over a host scene graph.
///
/// The trait covers exactly what the rigging layers need: named/typed node
/// creation and lookup, attribute creation, directed plug connections, plug
/// value access, and hierarchy traversal. Anything the host does beyond this
/// (evaluation, dirty propagation, undo) stays on the host side of the seam.
pub trait SceneGraph {
    /// The node type registry backing this scene
    fn registry(&self) -> &NodeTypeRegistry;

    /// Create a node of the given type. Fails if the name is taken or the
    /// type tag is unknown.
    fn create_node(&mut self, node_type: &str, name: &str) -> Result<NodeId, SceneError>;

    /// Look up a node by name
    fn find_node(&self, name: &str) -> Option<NodeId>;

    /// Check whether a name is taken in the scene namespace
    fn node_exists(&self, name: &str) -> bool {
        self.find_node(name).is_some()
    }

    /// Get a node's name
    fn node_name(&self, node: NodeId) -> Result<String, SceneError>;

    /// Get a node's type tag
    fn node_type(&self, node: NodeId) -> Result<String, SceneError>;

    /// Get a node's full hierarchy path (`|root|child|leaf`)
    fn node_path(&self, node: NodeId) -> Result<String, SceneError>;

    /// Delete a node. All connections touching it are removed and its
    /// children are re-parented to its parent.
    fn delete_node(&mut self, node: NodeId) -> Result<(), SceneError>;

    /// Ensure an attribute exists on a node. Adding an attribute that is
    /// already present is a no-op.
    fn add_attribute(&mut self, node: NodeId, attr: AttrDef) -> Result<(), SceneError>;

    /// Check whether a node carries an attribute
    fn has_attribute(&self, node: NodeId, attr: &str) -> bool;

    /// Connect a source plug to a destination plug.
    ///
    /// Connecting an already-connected identical pair is a no-op. A
    /// destination that already has a different source is force-connected:
    /// the previous incoming connection is replaced.
    fn connect(&mut self, src: Plug, dst: Plug) -> Result<(), SceneError>;

    /// Remove every connection touching a node, in both directions
    fn disconnect_all(&mut self, node: NodeId) -> Result<(), SceneError>;

    /// Get the source plug currently feeding a destination plug
    fn source_of(&self, dst: &Plug) -> Option<Plug>;

    /// Get all connections whose source is on the given node
    fn connections_from(&self, node: NodeId) -> Vec<(Plug, Plug)>;

    /// Write a static value to a plug
    fn set_value(&mut self, plug: &Plug, value: AttrValue) -> Result<(), SceneError>;

    /// Read a plug's static value
    fn value(&self, plug: &Plug) -> Option<AttrValue>;

    /// Get a node's parent
    fn parent(&self, node: NodeId) -> Result<Option<NodeId>, SceneError>;

    /// Re-parent a node (`None` moves it to the scene root)
    fn set_parent(&mut self, node: NodeId, parent: Option<NodeId>) -> Result<(), SceneError>;

    /// Get a node's children in insertion order
    fn children(&self, node: NodeId) -> Result<Vec<NodeId>, SceneError>;

    /// Get all descendants of a node in depth-first pre-order, excluding the
    /// node itself
    fn descendants(&self, node: NodeId) -> Result<Vec<NodeId>, SceneError>;

    /// Total number of nodes in the scene
    fn node_count(&self) -> usize;

    /// Total number of connections in the scene
    fn connection_count(&self) -> usize;
}

/// Error raised by scene operations
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// Node handle does not refer to a live node
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Scene namespace already contains the name
    #[error("Name already exists in scene: {0}")]
    NameExists(String),

    /// Node type tag is not registered
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    /// Attribute does not exist on the node
    #[error("Attribute not found: {attr} on {node:?}")]
    AttributeNotFound {
        /// Node the lookup ran against
        node: NodeId,
        /// Attribute path that failed
        attr: String,
    },

    /// Re-parenting would make a node its own ancestor
    #[error("Re-parenting would create a hierarchy cycle at {0:?}")]
    WouldCycle(NodeId),
}
