// SPDX-License-Identifier: MIT OR Apache-2.0
//! Plugs: addressable attribute endpoints on scene nodes.
//!
//! A plug names one connectable/settable slot: an attribute, optionally an
//! element of an array attribute, optionally one component of a compound
//! vector attribute. `aggregate.input3d[2].x` is a plug; so is
//! `joint.stretch`.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Vector component selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axis {
    /// X component
    X,
    /// Y component
    Y,
    /// Z component
    Z,
}

impl Axis {
    /// Lowercase suffix used when rendering plug paths
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
        }
    }
}

/// An addressable attribute endpoint on a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Plug {
    /// Owning node
    pub node: NodeId,
    /// Base attribute name
    pub attr: String,
    /// Array element index (for array attributes)
    pub index: Option<usize>,
    /// Vector component (for compound attributes)
    pub component: Option<Axis>,
}

impl Plug {
    /// Create a plug addressing a whole attribute
    pub fn new(node: NodeId, attr: impl Into<String>) -> Self {
        Self {
            node,
            attr: attr.into(),
            index: None,
            component: None,
        }
    }

    /// Address one element of an array attribute
    pub fn element(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Address one component of a compound attribute
    pub fn axis(mut self, axis: Axis) -> Self {
        self.component = Some(axis);
        self
    }

    /// Render the attribute path portion of the plug (`attr[2].x`)
    pub fn attr_path(&self) -> String {
        let mut path = self.attr.clone();
        if let Some(index) = self.index {
            path.push_str(&format!("[{index}]"));
        }
        if let Some(axis) = self.component {
            path.push('.');
            path.push_str(axis.suffix());
        }
        path
    }
}

impl fmt::Display for Plug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.attr_path())
    }
}

/// Value that can be stored on a plug
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    /// Floating point value
    Float(f64),
    /// Integer value
    Int(i64),
    /// Boolean value
    Bool(bool),
    /// String value
    Str(String),
}

impl AttrValue {
    /// Get the value as a float, converting integers
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            Self::Bool(_) | Self::Str(_) => None,
        }
    }

    /// Get the value as an integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }
}
