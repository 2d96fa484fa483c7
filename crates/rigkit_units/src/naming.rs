// SPDX-License-Identifier: MIT OR Apache-2.0
//! Name derivation for unit-owned scene objects.
//!
//! Units identify the objects they own purely by name convention, so every
//! derived name goes through this module instead of ad-hoc concatenation.
//! Existence checks against these names are how ownership collisions are
//! detected before anything is created.

/// Record field holding the schema tag
pub const IRCLASS_KEY: &str = "IRCLASS";
/// Record field holding the unit name
pub const NAME_KEY: &str = "NAME";
/// Record field holding the manager node name
pub const MANAGER_KEY: &str = "MANAGER";
/// Record field holding the root's parent name
pub const PARENT_KEY: &str = "PARENT";
/// Record field holding the membership cache
pub const MEMBERS_KEY: &str = "MEMBERS";
/// Membership entry holding the root's own path
pub const ROOT_KEY: &str = "ROOT";

/// Name prefix for manager nodes
pub const MANAGER_PREFIX: &str = "IRMNG_";
/// Name prefix for aggregation nodes
pub const AGGREGATE_PREFIX: &str = "PMA_";
/// Name prefix for multiply/divide/power chain nodes
pub const MULDIV_PREFIX: &str = "MD_";
/// Name prefix for two-input multiply chain nodes
pub const MULTIPLY_PREFIX: &str = "MULT_";

/// Manager output attribute broadcast to every member
pub const MANAGER_OUT_ATTR: &str = "unit_out";
/// Root-marker input attribute on a unit's root node
pub const ROOT_MARK_ATTR: &str = "unit_root";

/// Derive the manager node name for a unit
pub fn manager_node_name(unit: &str) -> String {
    format!("{MANAGER_PREFIX}{unit}")
}

/// Recover the unit name from a manager node name, if it conforms
pub fn unit_name_from_manager(node_name: &str) -> Option<&str> {
    node_name.strip_prefix(MANAGER_PREFIX)
}

/// Derive the aggregation node name for a network
pub fn aggregate_node_name(network: &str) -> String {
    format!("{AGGREGATE_PREFIX}{network}")
}

/// Derive a chain node name with a zero-padded sequence suffix
pub fn chain_node_name(prefix: &str, network: &str, index: usize) -> String {
    format!("{prefix}{network}{index:02}")
}

/// Derive the member input attribute name for a node type tag
pub fn member_attr_name(node_type: &str) -> String {
    format!("unit_{node_type}")
}
