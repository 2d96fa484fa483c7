// SPDX-License-Identifier: MIT OR Apache-2.0
//! DAG units: hierarchy membership tracking and manager fan-out wiring.
//!
//! A DAG unit owns one root node in the scene and one manager node derived
//! from the unit's name. The manager broadcasts a single output attribute to
//! a root-marker attribute on the root and a type-specific attribute on every
//! descendant. Membership is a cache: it is recomputed in full from the live
//! hierarchy on every update, never patched incrementally.

use crate::naming::{
    manager_node_name, member_attr_name, unit_name_from_manager, MANAGER_KEY, MANAGER_OUT_ATTR,
    MEMBERS_KEY, NAME_KEY, PARENT_KEY, ROOT_KEY, ROOT_MARK_ATTR,
};
use crate::record::{Record, RecordError};
use rigkit_scene::node::types;
use rigkit_scene::{AttrDef, NodeId, Plug, SceneError, SceneGraph};
use serde_json::Value;

/// Schema class tag for DAG unit records
pub const DAG_CLASS: &str = "DAG";

/// A bound DAG unit
#[derive(Debug)]
pub struct DagUnit {
    /// Root node of the tracked hierarchy
    root: NodeId,
    /// Unit name (manager name derives from it)
    name: String,
    /// The manager node this unit owns
    manager: NodeId,
    /// Mirrored unit state
    record: Record,
}

impl DagUnit {
    /// Bind a unit to a root node.
    ///
    /// If the root already has a manager connection, omitting `name` adopts
    /// the existing manager; supplying a fresh name replaces it (the old
    /// manager is fully disconnected and deleted). Supplying a name whose
    /// derived manager name is already taken fails with
    /// [`DagError::NameConflict`] before anything is mutated. A root with no
    /// manager requires a name.
    pub fn bind(
        scene: &mut dyn SceneGraph,
        root: NodeId,
        name: Option<&str>,
    ) -> Result<Self, DagError> {
        let existing = scene
            .source_of(&Plug::new(root, ROOT_MARK_ATTR))
            .map(|plug| plug.node);

        let unit_name = match (existing, name) {
            (Some(manager), None) => {
                let manager_name = scene.node_name(manager)?;
                unit_name_from_manager(&manager_name)
                    .ok_or(DagError::ForeignManager(manager_name.clone()))?
                    .to_string()
            }
            (Some(manager), Some(requested)) => {
                let manager_name = manager_node_name(requested);
                if scene.node_exists(&manager_name) {
                    return Err(DagError::NameConflict(manager_name));
                }
                let old_name = scene.node_name(manager)?;
                scene.delete_node(manager)?;
                tracing::info!("Replaced manager node: {old_name} -> {manager_name}");
                requested.to_string()
            }
            (None, None) => return Err(DagError::MissingName),
            (None, Some(requested)) => {
                let manager_name = manager_node_name(requested);
                if scene.node_exists(&manager_name) {
                    return Err(DagError::NameConflict(manager_name));
                }
                requested.to_string()
            }
        };

        let mut record = Record::new(DAG_CLASS);
        record.declare(PARENT_KEY, Value::Null);
        record.declare(MEMBERS_KEY, Value::Null);
        record.set(NAME_KEY, Value::String(unit_name.clone()))?;
        record.set(
            MANAGER_KEY,
            Value::String(manager_node_name(&unit_name)),
        )?;

        let mut unit = Self {
            root,
            name: unit_name,
            manager: root, // placeholder until the wiring pass resolves it
            record,
        };
        unit.update_node(scene)?;
        Ok(unit)
    }

    /// Recompute parent, membership, and manager wiring from the live
    /// hierarchy.
    ///
    /// Idempotent: repeated calls with no hierarchy change create no new
    /// nodes, attributes, or connections.
    pub fn update_node(&mut self, scene: &mut dyn SceneGraph) -> Result<(), DagError> {
        self.refresh_parent(scene)?;
        self.refresh_members(scene)?;
        self.rebuild_wiring(scene)?;
        Ok(())
    }

    /// Record a new parent and re-parent the root in the scene.
    ///
    /// Membership is not recomputed; call
    /// [`update_node`](Self::update_node) afterwards if descendants may have
    /// changed.
    pub fn set_parent(
        &mut self,
        scene: &mut dyn SceneGraph,
        new_parent: Option<&str>,
    ) -> Result<(), DagError> {
        match new_parent {
            Some(parent_name) => {
                let parent = scene
                    .find_node(parent_name)
                    .ok_or_else(|| DagError::ParentNotFound(parent_name.to_string()))?;
                scene.set_parent(self.root, Some(parent))?;
                self.record
                    .set(PARENT_KEY, Value::String(parent_name.to_string()))?;
            }
            None => {
                scene.set_parent(self.root, None)?;
                self.record.set(PARENT_KEY, Value::Null)?;
            }
        }
        Ok(())
    }

    /// The unit name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The unit's root node
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The manager node this unit owns
    pub fn manager(&self) -> NodeId {
        self.manager
    }

    /// The unit's record
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Mutable access to the unit's record (for load/merge)
    pub fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }

    fn refresh_parent(&mut self, scene: &mut dyn SceneGraph) -> Result<(), DagError> {
        let value = match scene.parent(self.root)? {
            Some(parent) => Value::String(scene.node_name(parent)?),
            None => Value::Null,
        };
        self.record.set(PARENT_KEY, value)?;
        Ok(())
    }

    fn refresh_members(&mut self, scene: &mut dyn SceneGraph) -> Result<(), DagError> {
        let mut members = serde_json::Map::new();
        members.insert(
            ROOT_KEY.to_string(),
            Value::String(scene.node_path(self.root)?),
        );
        for member in scene.descendants(self.root)? {
            let type_tag = scene.node_type(member)?;
            let path = Value::String(scene.node_path(member)?);
            let entry = members
                .entry(type_tag)
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Some(paths) = entry.as_array_mut() {
                paths.push(path);
            }
        }
        self.record.set(MEMBERS_KEY, Value::Object(members))?;
        Ok(())
    }

    fn rebuild_wiring(&mut self, scene: &mut dyn SceneGraph) -> Result<(), DagError> {
        let manager_name = manager_node_name(&self.name);
        let manager = match scene.find_node(&manager_name) {
            Some(node) => node,
            None => {
                let node = scene.create_node(types::MANAGER, &manager_name)?;
                tracing::info!("Created manager node: {manager_name}");
                node
            }
        };
        scene.add_attribute(manager, AttrDef::scalar(MANAGER_OUT_ATTR))?;
        let out = Plug::new(manager, MANAGER_OUT_ATTR);

        scene.add_attribute(self.root, AttrDef::scalar(ROOT_MARK_ATTR))?;
        scene.connect(out.clone(), Plug::new(self.root, ROOT_MARK_ATTR))?;

        for member in scene.descendants(self.root)? {
            let type_tag = scene.node_type(member)?;
            let attr = member_attr_name(&type_tag);
            scene.add_attribute(member, AttrDef::scalar(&attr))?;
            scene.connect(out.clone(), Plug::new(member, attr))?;
        }

        self.manager = manager;
        Ok(())
    }
}

/// Error raised by DAG unit operations
#[derive(Debug, thiserror::Error)]
pub enum DagError {
    /// Root has no prior manager and no name was supplied
    #[error("A unit name is required: the root has no existing manager")]
    MissingName,

    /// Derived manager name collides with an existing scene object
    #[error("Manager name already exists in scene: {0}")]
    NameConflict(String),

    /// Root is wired to a manager whose name does not follow the derivation
    /// convention, so no unit name can be recovered from it
    #[error("Existing manager has a non-conforming name: {0}")]
    ForeignManager(String),

    /// Named parent does not exist in the scene
    #[error("Parent node not found: {0}")]
    ParentNotFound(String),

    /// Underlying scene operation failed
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// Record mirroring failed
    #[error(transparent)]
    Record(#[from] RecordError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::MANAGER_PREFIX;
    use pretty_assertions::assert_eq;
    use rigkit_scene::MemoryScene;
    use serde_json::json;

    /// Root transform with a joint chain and a loose transform under it
    fn rig_scene() -> (MemoryScene, NodeId) {
        let mut scene = MemoryScene::new();
        let root = scene.create_node(types::TRANSFORM, "arm_root").unwrap();
        let upper = scene.create_node(types::JOINT, "upper").unwrap();
        let lower = scene.create_node(types::JOINT, "lower").unwrap();
        let offset = scene.create_node(types::TRANSFORM, "offset").unwrap();
        scene.set_parent(upper, Some(root)).unwrap();
        scene.set_parent(lower, Some(upper)).unwrap();
        scene.set_parent(offset, Some(root)).unwrap();
        (scene, root)
    }

    #[test]
    fn bind_without_name_or_manager_fails() {
        let (mut scene, root) = rig_scene();
        let before = scene.node_count();
        assert!(matches!(
            DagUnit::bind(&mut scene, root, None),
            Err(DagError::MissingName)
        ));
        assert_eq!(scene.node_count(), before);
    }

    #[test]
    fn bind_with_taken_name_fails_before_mutation() {
        let (mut scene, root) = rig_scene();
        scene.create_node(types::TRANSFORM, "IRMNG_arm").unwrap();
        let before = (scene.node_count(), scene.connection_count());
        assert!(matches!(
            DagUnit::bind(&mut scene, root, Some("arm")),
            Err(DagError::NameConflict(_))
        ));
        assert_eq!((scene.node_count(), scene.connection_count()), before);
    }

    #[test]
    fn bind_builds_manager_and_membership() {
        let (mut scene, root) = rig_scene();
        let unit = DagUnit::bind(&mut scene, root, Some("arm")).unwrap();

        assert_eq!(unit.name(), "arm");
        let manager = scene.find_node("IRMNG_arm").unwrap();
        assert_eq!(unit.manager(), manager);

        // Root marker plus one connection per descendant
        let out = Plug::new(manager, MANAGER_OUT_ATTR);
        assert_eq!(
            scene.source_of(&Plug::new(root, ROOT_MARK_ATTR)),
            Some(out.clone())
        );
        assert_eq!(scene.connections_from(manager).len(), 4);

        let members = unit.record().get(MEMBERS_KEY).unwrap();
        assert_eq!(members["ROOT"], json!("|arm_root"));
        assert_eq!(
            members["joint"],
            json!(["|arm_root|upper", "|arm_root|upper|lower"])
        );
        assert_eq!(members["transform"], json!(["|arm_root|offset"]));
        assert_eq!(unit.record().get(PARENT_KEY), Some(&Value::Null));
    }

    #[test]
    fn update_is_idempotent() {
        let (mut scene, root) = rig_scene();
        let mut unit = DagUnit::bind(&mut scene, root, Some("arm")).unwrap();
        let members = unit.record().get(MEMBERS_KEY).cloned();
        let counts = (scene.node_count(), scene.connection_count());

        unit.update_node(&mut scene).unwrap();
        assert_eq!((scene.node_count(), scene.connection_count()), counts);
        assert_eq!(unit.record().get(MEMBERS_KEY).cloned(), members);
    }

    #[test]
    fn update_tracks_new_members() {
        let (mut scene, root) = rig_scene();
        let mut unit = DagUnit::bind(&mut scene, root, Some("arm")).unwrap();
        let connections = scene.connection_count();

        let wrist = scene.create_node(types::JOINT, "wrist").unwrap();
        let lower = scene.find_node("lower").unwrap();
        scene.set_parent(wrist, Some(lower)).unwrap();
        unit.update_node(&mut scene).unwrap();

        assert_eq!(scene.connection_count(), connections + 1);
        let members = unit.record().get(MEMBERS_KEY).unwrap();
        assert_eq!(
            members["joint"],
            json!([
                "|arm_root|upper",
                "|arm_root|upper|lower",
                "|arm_root|upper|lower|wrist"
            ])
        );
    }

    #[test]
    fn rebind_without_name_adopts_existing_manager() {
        let (mut scene, root) = rig_scene();
        DagUnit::bind(&mut scene, root, Some("arm")).unwrap();
        let counts = (scene.node_count(), scene.connection_count());

        let unit = DagUnit::bind(&mut scene, root, None).unwrap();
        assert_eq!(unit.name(), "arm");
        assert_eq!((scene.node_count(), scene.connection_count()), counts);
    }

    #[test]
    fn rebind_with_fresh_name_replaces_manager() {
        let (mut scene, root) = rig_scene();
        DagUnit::bind(&mut scene, root, Some("arm")).unwrap();
        let counts = (scene.node_count(), scene.connection_count());

        let unit = DagUnit::bind(&mut scene, root, Some("arm_L")).unwrap();
        assert_eq!(unit.name(), "arm_L");
        assert_eq!(scene.find_node("IRMNG_arm"), None);
        let manager = scene.find_node("IRMNG_arm_L").unwrap();
        assert_eq!(
            scene.source_of(&Plug::new(root, ROOT_MARK_ATTR)),
            Some(Plug::new(manager, MANAGER_OUT_ATTR))
        );
        // Old manager and its connections are gone, replaced one for one
        assert_eq!((scene.node_count(), scene.connection_count()), counts);
    }

    #[test]
    fn rebind_with_same_name_is_a_conflict() {
        let (mut scene, root) = rig_scene();
        DagUnit::bind(&mut scene, root, Some("arm")).unwrap();
        assert!(matches!(
            DagUnit::bind(&mut scene, root, Some("arm")),
            Err(DagError::NameConflict(name)) if name == format!("{MANAGER_PREFIX}arm")
        ));
        // The original manager survives untouched
        assert!(scene.node_exists("IRMNG_arm"));
    }

    #[test]
    fn set_parent_records_without_membership_recompute() {
        let (mut scene, root) = rig_scene();
        let mut unit = DagUnit::bind(&mut scene, root, Some("arm")).unwrap();
        let members = unit.record().get(MEMBERS_KEY).cloned();

        let hips = scene.create_node(types::TRANSFORM, "hips").unwrap();
        unit.set_parent(&mut scene, Some("hips")).unwrap();

        assert_eq!(scene.parent(root).unwrap(), Some(hips));
        assert_eq!(unit.record().get(PARENT_KEY), Some(&json!("hips")));
        // Paths in MEMBERS are stale until the caller updates
        assert_eq!(unit.record().get(MEMBERS_KEY).cloned(), members);

        unit.update_node(&mut scene).unwrap();
        let members = unit.record().get(MEMBERS_KEY).unwrap();
        assert_eq!(members["ROOT"], json!("|hips|arm_root"));
    }

    #[test]
    fn set_parent_to_unknown_node_fails() {
        let (mut scene, root) = rig_scene();
        let mut unit = DagUnit::bind(&mut scene, root, Some("arm")).unwrap();
        assert!(matches!(
            unit.set_parent(&mut scene, Some("missing")),
            Err(DagError::ParentNotFound(_))
        ));
    }
}
