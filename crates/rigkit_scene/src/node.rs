// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the scene layer.

use crate::plug::AttrValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a scene node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Well-known node type tags.
pub mod types {
    /// Generic hierarchy node
    pub const TRANSFORM: &str = "transform";
    /// Skeleton joint
    pub const JOINT: &str = "joint";
    /// Fan-out node owned by a DAG unit
    pub const MANAGER: &str = "manager";
    /// N-ary sum/difference/average utility node
    pub const AGGREGATE: &str = "aggregate";
    /// Binary multiply/divide/power utility node
    pub const MULTIPLY_DIVIDE: &str = "multiply_divide";
    /// Dedicated two-input scalar multiply node
    pub const MULTIPLY2: &str = "multiply2";
}

/// Definition of a single attribute on a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttrDef {
    /// Attribute name
    pub name: String,
    /// Whether the attribute is an indexed array
    pub array: bool,
}

impl AttrDef {
    /// Create a scalar (non-array) attribute definition
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            array: false,
        }
    }

    /// Create an indexed array attribute definition
    pub fn array(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            array: true,
        }
    }
}

/// Node type definition: type tag plus the attributes every instance carries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeTypeDef {
    /// Unique type tag
    pub id: String,
    /// Attributes instantiated on every node of this type
    pub attrs: Vec<AttrDef>,
}

impl NodeTypeDef {
    /// Create a new type definition
    pub fn new(id: impl Into<String>, attrs: Vec<AttrDef>) -> Self {
        Self {
            id: id.into(),
            attrs,
        }
    }
}

/// A node instance in the scene
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
    /// Node name (unique in the scene namespace)
    pub name: String,
    /// Node type tag
    pub node_type: String,
    /// Parent node (if any)
    pub parent: Option<NodeId>,
    /// Child nodes, in insertion order
    pub children: Vec<NodeId>,
    /// Attributes on this node, keyed by name
    pub attrs: IndexMap<String, AttrDef>,
    /// Static plug values, keyed by rendered plug path
    pub values: IndexMap<String, AttrValue>,
}

impl NodeData {
    /// Create a new node from a type definition
    pub fn new(name: impl Into<String>, type_def: &NodeTypeDef) -> Self {
        let attrs = type_def
            .attrs
            .iter()
            .map(|a| (a.name.clone(), a.clone()))
            .collect();
        Self {
            name: name.into(),
            node_type: type_def.id.clone(),
            parent: None,
            children: Vec::new(),
            attrs,
            values: IndexMap::new(),
        }
    }

    /// Check whether the node carries an attribute with the given name
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }
}

/// Registry of available node types
#[derive(Debug, Clone, Default)]
pub struct NodeTypeRegistry {
    /// Registered type definitions by tag
    types: IndexMap<String, NodeTypeDef>,
}

impl NodeTypeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            types: IndexMap::new(),
        }
    }

    /// Create a registry pre-loaded with the built-in node types
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(NodeTypeDef::new(types::TRANSFORM, Vec::new()));
        registry.register(NodeTypeDef::new(types::JOINT, Vec::new()));
        registry.register(NodeTypeDef::new(types::MANAGER, Vec::new()));
        registry.register(NodeTypeDef::new(
            types::AGGREGATE,
            vec![
                AttrDef::scalar("operation"),
                AttrDef::array("input1d"),
                AttrDef::array("input2d"),
                AttrDef::array("input3d"),
                AttrDef::scalar("output1d"),
                AttrDef::scalar("output2d"),
                AttrDef::scalar("output3d"),
            ],
        ));
        registry.register(NodeTypeDef::new(
            types::MULTIPLY_DIVIDE,
            vec![
                AttrDef::scalar("operation"),
                AttrDef::scalar("input1"),
                AttrDef::scalar("input2"),
                AttrDef::scalar("output"),
            ],
        ));
        registry.register(NodeTypeDef::new(
            types::MULTIPLY2,
            vec![
                AttrDef::scalar("input1"),
                AttrDef::scalar("input2"),
                AttrDef::scalar("output"),
            ],
        ));
        registry
    }

    /// Register a node type, replacing any previous definition with the same tag
    pub fn register(&mut self, type_def: NodeTypeDef) {
        self.types.insert(type_def.id.clone(), type_def);
    }

    /// Get a type definition by tag
    pub fn get(&self, id: &str) -> Option<&NodeTypeDef> {
        self.types.get(id)
    }

    /// Check whether a type tag is registered
    pub fn contains(&self, id: &str) -> bool {
        self.types.contains_key(id)
    }

    /// Iterate over all registered type definitions
    pub fn types(&self) -> impl Iterator<Item = &NodeTypeDef> {
        self.types.values()
    }
}
