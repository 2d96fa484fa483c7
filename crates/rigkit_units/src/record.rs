// SPDX-License-Identifier: MIT OR Apache-2.0
//! Schema-checked unit records with JSON persistence.
//!
//! A record is a flat, ordered field map tagged with a schema class. The
//! schema check is structural, not typed: an update must carry the same
//! class tag and must not introduce keys outside the record's current field
//! set. This exists to stop one unit kind's saved data from being applied to
//! a different kind's instance after a rename or field restructuring.

use crate::naming::{IRCLASS_KEY, MANAGER_KEY, NAME_KEY};
use indexmap::IndexMap;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Schema class tag for plain base records
pub const BASE_CLASS: &str = "Base";

/// A schema-checked key/value record
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Field map, in declaration order
    fields: IndexMap<String, Value>,
}

impl Record {
    /// Create a record with the given class tag and the default field set
    /// (`IRCLASS`, `NAME`, `MANAGER`)
    pub fn new(class_tag: impl Into<String>) -> Self {
        let mut fields = IndexMap::new();
        fields.insert(IRCLASS_KEY.to_string(), Value::String(class_tag.into()));
        fields.insert(NAME_KEY.to_string(), Value::Null);
        fields.insert(MANAGER_KEY.to_string(), Value::Null);
        Self { fields }
    }

    /// The record's schema class tag
    pub fn class_tag(&self) -> &str {
        self.fields
            .get(IRCLASS_KEY)
            .and_then(Value::as_str)
            .unwrap_or(BASE_CLASS)
    }

    /// Widen the schema with a new field. Used by unit kinds that extend the
    /// base record; a field that already exists keeps its current value.
    pub fn declare(&mut self, key: impl Into<String>, default: Value) {
        self.fields.entry(key.into()).or_insert(default);
    }

    /// Check whether an update is compatible with this record's schema
    pub fn check_data(&self, update: &IndexMap<String, Value>) -> Result<(), RecordError> {
        let tag = update
            .get(IRCLASS_KEY)
            .and_then(Value::as_str)
            .ok_or(RecordError::MissingClassTag)?;
        if tag != self.class_tag() {
            return Err(RecordError::ClassMismatch {
                expected: self.class_tag().to_string(),
                found: tag.to_string(),
            });
        }
        for key in update.keys() {
            if !self.fields.contains_key(key) {
                return Err(RecordError::UnknownField(key.clone()));
            }
        }
        Ok(())
    }

    /// Merge an update into the record.
    ///
    /// All-or-nothing: the update is validated first, and a rejected update
    /// leaves the record untouched. Keys absent from the update keep their
    /// prior value.
    pub fn set_data(&mut self, update: IndexMap<String, Value>) -> Result<(), RecordError> {
        self.check_data(&update)?;
        for (key, value) in update {
            self.fields.insert(key, value);
        }
        Ok(())
    }

    /// Set a single field. Rejects keys outside the current field set with
    /// the same schema error as [`set_data`](Self::set_data).
    pub fn set(&mut self, key: &str, value: Value) -> Result<(), RecordError> {
        if !self.fields.contains_key(key) {
            return Err(RecordError::UnknownField(key.to_string()));
        }
        self.fields.insert(key.to_string(), value);
        Ok(())
    }

    /// Get a single field value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The full current record
    pub fn data(&self) -> &IndexMap<String, Value> {
        &self.fields
    }

    /// Serialize the record as pretty-printed JSON to the given path.
    ///
    /// The record is serialized in full before the file is touched, so a
    /// serialization failure leaves any existing file intact. Failures are
    /// logged and returned; callers decide whether they are fatal.
    pub fn save_data(&self, path: &Path) -> Result<(), RecordError> {
        let result = serde_json::to_string_pretty(&self.fields)
            .map_err(|source| RecordError::Json {
                path: path.to_path_buf(),
                source,
            })
            .and_then(|content| {
                std::fs::write(path, content).map_err(|source| RecordError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            });
        match result {
            Ok(()) => {
                tracing::info!("Record exported: {}", path.display());
                Ok(())
            }
            Err(err) => {
                tracing::warn!("Record save failed: {err}");
                Err(err)
            }
        }
    }

    /// Load a JSON record file and merge it via [`set_data`](Self::set_data).
    ///
    /// Any read, parse, or schema failure is logged and returned, and the
    /// record is left unmodified.
    pub fn load_data(&mut self, path: &Path) -> Result<(), RecordError> {
        let result = std::fs::read_to_string(path)
            .map_err(|source| RecordError::Io {
                path: path.to_path_buf(),
                source,
            })
            .and_then(|content| {
                serde_json::from_str::<IndexMap<String, Value>>(&content).map_err(|source| {
                    RecordError::Json {
                        path: path.to_path_buf(),
                        source,
                    }
                })
            })
            .and_then(|update| self.set_data(update));
        if let Err(err) = &result {
            tracing::warn!("Record load failed for {}: {err}", path.display());
        }
        result
    }
}

/// Error raised by record operations
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// Update carries no `IRCLASS` tag
    #[error("Record update is missing the IRCLASS tag")]
    MissingClassTag,

    /// Update was saved by a different unit kind
    #[error("Record class mismatch: expected {expected}, found {found}")]
    ClassMismatch {
        /// This record's class tag
        expected: String,
        /// The tag carried by the update
        found: String,
    },

    /// Update carries a key outside the record's field set
    #[error("Unknown record field: {0}")]
    UnknownField(String),

    /// Filesystem failure during save or load
    #[error("Record I/O failed for {path}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization or parse failure
    #[error("Record JSON failed for {path}")]
    Json {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn update(pairs: &[(&str, Value)]) -> IndexMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("rigkit_record_{tag}_{}.json", std::process::id()))
    }

    #[test]
    fn matching_update_merges() {
        let mut record = Record::new(BASE_CLASS);
        record
            .set_data(update(&[
                (IRCLASS_KEY, json!("Base")),
                (NAME_KEY, json!("arm_L")),
            ]))
            .unwrap();
        assert_eq!(record.get(NAME_KEY), Some(&json!("arm_L")));
        // Keys absent from the update keep their prior value
        assert_eq!(record.get(MANAGER_KEY), Some(&Value::Null));
    }

    #[test]
    fn missing_tag_rejected() {
        let mut record = Record::new(BASE_CLASS);
        let err = record.set_data(update(&[(NAME_KEY, json!("arm_L"))]));
        assert!(matches!(err, Err(RecordError::MissingClassTag)));
    }

    #[test]
    fn foreign_tag_rejected_and_record_unchanged() {
        let mut record = Record::new(BASE_CLASS);
        let before = record.data().clone();
        let err = record.set_data(update(&[
            (IRCLASS_KEY, json!("DAG")),
            (NAME_KEY, json!("arm_L")),
        ]));
        assert!(matches!(err, Err(RecordError::ClassMismatch { .. })));
        assert_eq!(record.data(), &before);
    }

    #[test]
    fn extra_key_rejected_and_record_unchanged() {
        let mut record = Record::new(BASE_CLASS);
        let before = record.data().clone();
        let err = record.set_data(update(&[
            (IRCLASS_KEY, json!("Base")),
            ("COLOR", json!("red")),
        ]));
        assert!(matches!(err, Err(RecordError::UnknownField(_))));
        assert_eq!(record.data(), &before);
    }

    #[test]
    fn single_field_set_rejects_unknown_keys() {
        let mut record = Record::new(BASE_CLASS);
        assert!(record.set(NAME_KEY, json!("arm_L")).is_ok());
        assert!(matches!(
            record.set("COLOR", json!("red")),
            Err(RecordError::UnknownField(_))
        ));
    }

    #[test]
    fn declare_widens_schema_without_clobbering() {
        let mut record = Record::new(BASE_CLASS);
        record.declare("PARENT", Value::Null);
        record.set("PARENT", json!("hips")).unwrap();
        record.declare("PARENT", Value::Null);
        assert_eq!(record.get("PARENT"), Some(&json!("hips")));
    }

    #[test]
    fn save_load_round_trip() {
        let path = temp_path("round_trip");
        let mut record = Record::new(BASE_CLASS);
        record.set(NAME_KEY, json!("spine")).unwrap();
        record.set(MANAGER_KEY, json!("IRMNG_spine")).unwrap();
        record.save_data(&path).unwrap();

        let mut loaded = Record::new(BASE_CLASS);
        loaded.load_data(&path).unwrap();
        assert_eq!(loaded.data(), record.data());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn load_failure_leaves_record_unchanged() {
        let mut record = Record::new(BASE_CLASS);
        let before = record.data().clone();
        let missing = temp_path("does_not_exist");
        assert!(matches!(
            record.load_data(&missing),
            Err(RecordError::Io { .. })
        ));
        assert_eq!(record.data(), &before);
    }

    #[test]
    fn load_rejects_foreign_class_file() {
        let path = temp_path("foreign");
        let foreign = Record::new("DAG");
        foreign.save_data(&path).unwrap();

        let mut record = Record::new(BASE_CLASS);
        assert!(matches!(
            record.load_data(&path),
            Err(RecordError::ClassMismatch { .. })
        ));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn save_to_unwritable_path_fails_nonfatally() {
        let record = Record::new(BASE_CLASS);
        // A directory path is not writable as a file
        let err = record.save_data(&std::env::temp_dir());
        assert!(matches!(err, Err(RecordError::Io { .. })));
        // Record is still usable afterwards
        assert_eq!(record.class_tag(), BASE_CLASS);
    }
}
