// SPDX-License-Identifier: MIT OR Apache-2.0
//! Arithmetic node networks.
//!
//! [`LinearNodes`] takes an ordered list of numeric endpoints and wires host
//! utility nodes into arithmetic networks: sum/difference/average through a
//! single N-ary aggregation node, multiply/divide/power through a chain of
//! binary nodes. The returned endpoint is the network's final output and can
//! feed further networks.

use crate::naming::{
    aggregate_node_name, chain_node_name, MULDIV_PREFIX, MULTIPLY_PREFIX,
};
use rigkit_scene::node::types;
use rigkit_scene::{AttrValue, Axis, NodeId, Plug, SceneError, SceneGraph};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A value source for arithmetic wiring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Endpoint {
    /// A constant written as a static value
    Constant(f64),
    /// A scene attribute connected live
    Attr(Plug),
}

impl Eq for Endpoint {}

impl Ord for Endpoint {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Constant(a), Self::Constant(b)) => a.total_cmp(b),
            (Self::Constant(_), Self::Attr(_)) => Ordering::Less,
            (Self::Attr(_), Self::Constant(_)) => Ordering::Greater,
            (Self::Attr(a), Self::Attr(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Endpoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<f64> for Endpoint {
    fn from(value: f64) -> Self {
        Self::Constant(value)
    }
}

impl From<Plug> for Endpoint {
    fn from(plug: Plug) -> Self {
        Self::Attr(plug)
    }
}

/// Aggregation node operation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    /// Sum of all inputs
    Sum,
    /// First input minus all subsequent inputs
    Difference,
    /// Average of all inputs
    Average,
}

impl AggregateOp {
    /// The mode value written to the aggregation node's operation attribute
    pub fn mode(&self) -> i64 {
        match self {
            Self::Sum => 1,
            Self::Difference => 2,
            Self::Average => 3,
        }
    }
}

/// Divide mode on a multiply-capable binary node
const MULDIV_DIVIDE: i64 = 2;
/// Power mode on a multiply-capable binary node
const MULDIV_POWER: i64 = 3;

/// Input slot selector for aggregation networks
#[derive(Debug, Clone, Copy)]
enum Slot {
    D1,
    D2(Axis),
    D3(Axis),
}

impl Slot {
    fn input_plug(&self, node: NodeId, index: usize) -> Plug {
        match self {
            Self::D1 => Plug::new(node, "input1d").element(index),
            Self::D2(axis) => Plug::new(node, "input2d").element(index).axis(*axis),
            Self::D3(axis) => Plug::new(node, "input3d").element(index).axis(*axis),
        }
    }

    fn output_plug(&self, node: NodeId) -> Plug {
        match self {
            Self::D1 => Plug::new(node, "output1d"),
            Self::D2(axis) => Plug::new(node, "output2d").axis(*axis),
            Self::D3(axis) => Plug::new(node, "output3d").axis(*axis),
        }
    }
}

/// Builder for arithmetic node networks over an ordered endpoint list
#[derive(Debug, Clone)]
pub struct LinearNodes {
    /// Network name; all derived node names embed it
    name: String,
    /// Ordered endpoint list
    args: Vec<Endpoint>,
}

impl LinearNodes {
    /// Create a builder with a name and an ordered endpoint list
    pub fn new(name: impl Into<String>, args: Vec<Endpoint>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// The network name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the network
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The current endpoint list
    pub fn args(&self) -> &[Endpoint] {
        &self.args
    }

    /// Replace the endpoint list, preserving the given order
    pub fn set_args(&mut self, args: Vec<Endpoint>) {
        self.args = args;
    }

    /// Add endpoints to the list.
    ///
    /// The combined list is deduplicated and sorted, so caller-intended
    /// ordering does not survive this call. For the non-commutative
    /// operations (difference, divide, power) use
    /// [`set_args`](Self::set_args) to control operand order.
    pub fn add_args(&mut self, args: impl IntoIterator<Item = Endpoint>) {
        self.args.extend(args);
        self.args.sort();
        self.args.dedup();
    }

    /// Remove endpoints from the list, keeping the order of the rest
    pub fn remove_args(&mut self, args: &[Endpoint]) {
        self.args.retain(|arg| !args.contains(arg));
    }

    // --- N-ary aggregation networks -----------------------------------

    /// Sum all endpoints through a 1D aggregation node
    pub fn plus1d(&self, scene: &mut dyn SceneGraph) -> Result<Plug, ArithError> {
        self.aggregate(scene, AggregateOp::Sum, Slot::D1)
    }

    /// Sum all endpoints through one 2D component lane
    pub fn plus2d(&self, scene: &mut dyn SceneGraph, axis: Axis) -> Result<Plug, ArithError> {
        self.aggregate(scene, AggregateOp::Sum, slot2d(axis)?)
    }

    /// Sum all endpoints through one 3D component lane
    pub fn plus3d(&self, scene: &mut dyn SceneGraph, axis: Axis) -> Result<Plug, ArithError> {
        self.aggregate(scene, AggregateOp::Sum, Slot::D3(axis))
    }

    /// Subtract all subsequent endpoints from the first, 1D
    pub fn minus1d(&self, scene: &mut dyn SceneGraph) -> Result<Plug, ArithError> {
        self.aggregate(scene, AggregateOp::Difference, Slot::D1)
    }

    /// Subtract all subsequent endpoints from the first, 2D lane
    pub fn minus2d(&self, scene: &mut dyn SceneGraph, axis: Axis) -> Result<Plug, ArithError> {
        self.aggregate(scene, AggregateOp::Difference, slot2d(axis)?)
    }

    /// Subtract all subsequent endpoints from the first, 3D lane
    pub fn minus3d(&self, scene: &mut dyn SceneGraph, axis: Axis) -> Result<Plug, ArithError> {
        self.aggregate(scene, AggregateOp::Difference, Slot::D3(axis))
    }

    /// Average all endpoints, 1D
    pub fn average1d(&self, scene: &mut dyn SceneGraph) -> Result<Plug, ArithError> {
        self.aggregate(scene, AggregateOp::Average, Slot::D1)
    }

    /// Average all endpoints, 2D lane
    pub fn average2d(&self, scene: &mut dyn SceneGraph, axis: Axis) -> Result<Plug, ArithError> {
        self.aggregate(scene, AggregateOp::Average, slot2d(axis)?)
    }

    /// Average all endpoints, 3D lane
    pub fn average3d(&self, scene: &mut dyn SceneGraph, axis: Axis) -> Result<Plug, ArithError> {
        self.aggregate(scene, AggregateOp::Average, Slot::D3(axis))
    }

    // --- Binary chain networks ----------------------------------------

    /// Multiply all endpoints left to right through two-input multiply nodes
    pub fn mult(&self, scene: &mut dyn SceneGraph) -> Result<Endpoint, ArithError> {
        self.chain(scene, types::MULTIPLY2, MULTIPLY_PREFIX, None)
    }

    /// Divide the first endpoint by each subsequent endpoint left to right
    pub fn div(&self, scene: &mut dyn SceneGraph) -> Result<Endpoint, ArithError> {
        self.chain(scene, types::MULTIPLY_DIVIDE, MULDIV_PREFIX, Some(MULDIV_DIVIDE))
    }

    /// Raise the running result to each subsequent endpoint left to right
    pub fn power(&self, scene: &mut dyn SceneGraph) -> Result<Endpoint, ArithError> {
        self.chain(scene, types::MULTIPLY_DIVIDE, MULDIV_PREFIX, Some(MULDIV_POWER))
    }

    /// Build or reuse the aggregation node and wire every endpoint into a
    /// successive input slot. Constants are written as static values, not
    /// connected. Returns the output plug for the requested lane.
    fn aggregate(
        &self,
        scene: &mut dyn SceneGraph,
        op: AggregateOp,
        slot: Slot,
    ) -> Result<Plug, ArithError> {
        if self.args.is_empty() {
            return Err(ArithError::NoEndpoints);
        }
        let node_name = aggregate_node_name(&self.name);
        let node = match scene.find_node(&node_name) {
            Some(existing) => {
                if scene.node_type(existing)? != types::AGGREGATE {
                    return Err(ArithError::NameTaken(node_name));
                }
                existing
            }
            None => scene.create_node(types::AGGREGATE, &node_name)?,
        };
        for (index, arg) in self.args.iter().enumerate() {
            connect_or_set(scene, arg, slot.input_plug(node, index))?;
        }
        scene.set_value(&Plug::new(node, "operation"), AttrValue::Int(op.mode()))?;
        Ok(slot.output_plug(node))
    }

    /// Fold the endpoint list into a chain of binary nodes, feeding each
    /// node's output into the next node's first input. A single endpoint is
    /// returned unchanged with no node creation.
    fn chain(
        &self,
        scene: &mut dyn SceneGraph,
        node_type: &str,
        prefix: &str,
        operation: Option<i64>,
    ) -> Result<Endpoint, ArithError> {
        let Some(first) = self.args.first() else {
            return Err(ArithError::NoEndpoints);
        };
        let mut out = first.clone();
        for (index, arg) in self.args.iter().enumerate().skip(1) {
            let node_name = chain_node_name(prefix, &self.name, index);
            let node = scene.create_node(node_type, &node_name)?;
            if let Some(mode) = operation {
                scene.set_value(&Plug::new(node, "operation"), AttrValue::Int(mode))?;
            }
            connect_or_set(scene, &out, Plug::new(node, "input1"))?;
            connect_or_set(scene, arg, Plug::new(node, "input2"))?;
            out = Endpoint::Attr(Plug::new(node, "output"));
        }
        Ok(out)
    }
}

/// Map a 2D lane request onto a slot, rejecting the Z component
fn slot2d(axis: Axis) -> Result<Slot, ArithError> {
    match axis {
        Axis::X | Axis::Y => Ok(Slot::D2(axis)),
        Axis::Z => Err(ArithError::UnsupportedAxis { axis, dims: 2 }),
    }
}

/// Connect an attribute endpoint or write a constant one
fn connect_or_set(
    scene: &mut dyn SceneGraph,
    endpoint: &Endpoint,
    dst: Plug,
) -> Result<(), SceneError> {
    match endpoint {
        Endpoint::Constant(value) => scene.set_value(&dst, AttrValue::Float(*value)),
        Endpoint::Attr(plug) => scene.connect(plug.clone(), dst),
    }
}

/// Error raised by arithmetic network construction
#[derive(Debug, thiserror::Error)]
pub enum ArithError {
    /// The endpoint list is empty
    #[error("Arithmetic network needs at least one endpoint")]
    NoEndpoints,

    /// Component lane not available for the requested dimensionality
    #[error("Axis {axis:?} is not valid for a {dims}D aggregation")]
    UnsupportedAxis {
        /// The rejected component
        axis: Axis,
        /// Dimensionality of the requested operation
        dims: u8,
    },

    /// Derived node name is held by a node of a different type
    #[error("Node name taken by a different node type: {0}")]
    NameTaken(String),

    /// Underlying scene operation failed
    #[error(transparent)]
    Scene(#[from] SceneError),
}
