// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene-graph capability layer for RigKit.
//!
//! Rig units never talk to a host application directly. Everything they need
//! from the host is expressed as the narrow [`SceneGraph`] trait:
//! - Named, typed node creation and lookup
//! - Attribute creation and plug-level value access
//! - Directed plug-to-plug connections
//! - Hierarchy traversal and re-parenting
//!
//! [`MemoryScene`] is a complete in-memory implementation of that trait. It
//! serves as the test double for the bookkeeping layers above and as the
//! reference semantics for any real host binding.

pub mod memory;
pub mod node;
pub mod plug;
pub mod scene;

pub use memory::MemoryScene;
pub use node::{AttrDef, NodeData, NodeId, NodeTypeDef, NodeTypeRegistry};
pub use plug::{AttrValue, Axis, Plug};
pub use scene::{SceneError, SceneGraph};
