// SPDX-License-Identifier: MIT OR Apache-2.0
//! Rig units for RigKit.
//!
//! This crate provides the rigging bookkeeping layers built on top of
//! [`rigkit_scene`]:
//! - Schema-checked unit records with JSON persistence
//! - DAG units: hierarchy membership tracking plus manager fan-out wiring
//! - Arithmetic node networks (sum/difference/average, multiply/divide/power)
//! - Explicit name derivation for every scene object the units own
//!
//! ## Architecture
//!
//! Every operation here is a sequence of calls through the
//! [`SceneGraph`](rigkit_scene::SceneGraph) trait; the host's own dependency
//! graph performs all evaluation once the wiring is in place. Operations are
//! synchronous and idempotent where the contract requires it (re-running a
//! unit update never duplicates nodes or connections).

pub mod arith;
pub mod dag;
pub mod naming;
pub mod record;

pub use arith::{ArithError, Endpoint, LinearNodes};
pub use dag::{DagError, DagUnit};
pub use record::{Record, RecordError};
