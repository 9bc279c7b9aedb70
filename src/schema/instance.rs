//! Schema instances
//!
//! A `SchemaInstance` is one document of a schema: a data mapping from
//! field name to stored slot, and a change-set of fields modified since
//! creation or the last save. Fields are read and written through the
//! class's `FieldDescriptor`s; the instance never interprets types itself.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::class::SchemaClass;
use super::tracked::{ChangeSet, OwnerLink, TrackedList, TrackedMap};
use crate::field::{Field, FieldDescriptor, FieldError, FieldResult};

/// A stored field value.
///
/// Values loaded from a document or written through a field are kept as
/// `Value` until first read, when list, mixed and embedded fields are
/// materialized into their tracked form.
#[derive(Debug)]
pub enum Slot {
    Value(Value),
    List(TrackedList),
    Mixed(TrackedMap),
    Embedded(Box<SchemaInstance>),
}

impl Slot {
    /// Snapshot as plain JSON
    pub fn to_value(&self) -> Value {
        match self {
            Slot::Value(value) => value.clone(),
            Slot::List(list) => Value::Array(list.to_vec()),
            Slot::Mixed(map) => Value::Object((**map).clone()),
            Slot::Embedded(instance) => Value::Object(instance.to_document()),
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Slot::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut TrackedList> {
        match self {
            Slot::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut TrackedMap> {
        match self {
            Slot::Mixed(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_embedded_mut(&mut self) -> Option<&mut SchemaInstance> {
        match self {
            Slot::Embedded(instance) => Some(instance),
            _ => None,
        }
    }
}

/// One document of a schema.
#[derive(Debug)]
pub struct SchemaInstance {
    class: Arc<SchemaClass>,
    data: BTreeMap<String, Slot>,
    changes: ChangeSet,
}

impl SchemaInstance {
    /// Create an empty top-level instance
    pub fn new(class: Arc<SchemaClass>) -> Self {
        Self {
            class,
            data: BTreeMap::new(),
            changes: ChangeSet::new(),
        }
    }

    /// Create an instance embedded in the field behind `owner`.
    ///
    /// Changes to the embedded instance mark that field on the owner.
    pub fn embedded(class: Arc<SchemaClass>, owner: OwnerLink) -> Self {
        Self {
            class,
            data: BTreeMap::new(),
            changes: ChangeSet::with_parent(owner),
        }
    }

    /// Create a top-level instance holding a document from the service
    pub fn from_document(class: Arc<SchemaClass>, doc: Map<String, Value>) -> Self {
        let mut instance = Self::new(class);
        instance.set_data(doc);
        instance
    }

    /// Replace the data mapping with a loaded document.
    ///
    /// Nothing is coerced and nothing is marked as changed.
    pub fn set_data(&mut self, doc: Map<String, Value>) {
        self.data = doc
            .into_iter()
            .map(|(key, value)| (key, Slot::Value(value)))
            .collect();
    }

    /// Returns the schema of this instance
    pub fn class(&self) -> &Arc<SchemaClass> {
        &self.class
    }

    /// Read a field, materializing its container on first access.
    ///
    /// Returns `None` for a scalar field that was never set or loaded.
    pub fn get(&mut self, name: &str) -> FieldResult<Option<&mut Slot>> {
        let class = Arc::clone(&self.class);
        let field = lookup(&class, name)?;
        Ok(field.get(self))
    }

    /// Write a field; returns whether the stored value changed.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> FieldResult<bool> {
        let class = Arc::clone(&self.class);
        lookup(&class, name)?.set(self, value.into())
    }

    /// Snapshot of a stored value without materializing anything
    pub fn value(&self, name: &str) -> Option<Value> {
        self.data.get(name).map(Slot::to_value)
    }

    /// Returns the changed field names in sorted order
    pub fn changed_fields(&self) -> Vec<String> {
        self.changes.fields()
    }

    /// Returns whether the field changed since the last save
    pub fn is_changed(&self, name: &str) -> bool {
        self.changes.contains(name)
    }

    /// Returns whether any field changed since the last save
    pub fn is_dirty(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Forget all changes, including those of materialized embedded instances
    pub fn clear_changes(&mut self) {
        self.changes.clear();
        for slot in self.data.values_mut() {
            if let Slot::Embedded(embedded) = slot {
                embedded.clear_changes();
            }
        }
    }

    /// Minimal update payload: every changed field with its current value
    pub fn change_payload(&self) -> Map<String, Value> {
        self.changes
            .fields()
            .into_iter()
            .map(|name| {
                let value = self.value(&name).unwrap_or(Value::Null);
                (name, value)
            })
            .collect()
    }

    /// Snapshot of all stored data as a JSON document
    pub fn to_document(&self) -> Map<String, Value> {
        self.data
            .iter()
            .map(|(key, slot)| (key.clone(), slot.to_value()))
            .collect()
    }

    pub(crate) fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    pub(crate) fn data(&self) -> &BTreeMap<String, Slot> {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut BTreeMap<String, Slot> {
        &mut self.data
    }
}

fn lookup<'a>(class: &'a SchemaClass, name: &str) -> FieldResult<&'a FieldDescriptor> {
    class
        .field(name)
        .ok_or_else(|| FieldError::no_such_field(class.name(), name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::resolve_schema;
    use serde_json::json;

    fn host_class() -> Arc<SchemaClass> {
        Arc::new(
            resolve_schema(&json!({
                "name": "host",
                "hostname": "string",
                "port": "number",
                "active": "boolean",
                "owner": "objectid",
                "tags": ["string"],
                "meta": {},
                "location": {"dc": "string", "rack": {"row": "number"}}
            }))
            .unwrap(),
        )
    }

    #[test]
    fn test_write_marks_changed() {
        let mut host = host_class().new_instance();
        assert!(!host.is_dirty());

        assert!(host.set("port", "8080").unwrap());
        assert_eq!(host.value("port"), Some(json!(8080)));
        assert_eq!(host.changed_fields(), vec!["port".to_string()]);
    }

    #[test]
    fn test_identical_write_is_not_a_change() {
        let mut host = host_class().new_instance();
        host.set("hostname", "web1").unwrap();
        host.clear_changes();

        assert!(!host.set("hostname", "web1").unwrap());
        assert!(!host.is_dirty());
    }

    #[test]
    fn test_coerced_equal_write_is_not_a_change() {
        let mut host = host_class().new_instance();
        host.set("port", 80).unwrap();
        host.clear_changes();

        assert!(!host.set("port", "80").unwrap());
        assert!(!host.is_changed("port"));
    }

    #[test]
    fn test_failed_coercion_leaves_instance_untouched() {
        let mut host = host_class().new_instance();
        host.set("port", 80).unwrap();
        host.clear_changes();

        let err = host.set("port", "eighty").unwrap_err();
        assert_eq!(err.code(), "SIS_FIELD_CONVERSION");
        assert_eq!(host.value("port"), Some(json!(80)));
        assert!(!host.is_dirty());
    }

    #[test]
    fn test_unknown_field() {
        let mut host = host_class().new_instance();
        assert!(matches!(
            host.set("nope", 1),
            Err(FieldError::NoSuchField { .. })
        ));
        assert!(host.get("nope").is_err());
    }

    #[test]
    fn test_read_never_marks() {
        let mut host = host_class().new_instance();
        host.get("hostname").unwrap();
        host.get("tags").unwrap();
        host.get("meta").unwrap();
        host.get("location").unwrap();
        assert!(!host.is_dirty());
    }

    #[test]
    fn test_unset_scalar_read_stores_nothing() {
        let mut host = host_class().new_instance();
        assert!(host.get("hostname").unwrap().is_none());
        assert!(host.to_document().is_empty());
        assert_eq!(host.value("hostname"), None);
    }

    #[test]
    fn test_null_write_after_read_marks_unset_field() {
        let mut fresh = host_class().new_instance();
        let mut read_first = host_class().new_instance();
        read_first.get("hostname").unwrap();

        assert!(fresh.set("hostname", Value::Null).unwrap());
        assert!(read_first.set("hostname", Value::Null).unwrap());
        assert_eq!(fresh.changed_fields(), read_first.changed_fields());
        assert_eq!(fresh.to_document(), read_first.to_document());
    }

    #[test]
    fn test_embedded_payload_has_no_read_only_fields() {
        let mut host = host_class().new_instance();
        let location = host.get("location").unwrap().unwrap().as_embedded_mut().unwrap();
        location.get("dc").unwrap();
        let rack = location.get("rack").unwrap().unwrap().as_embedded_mut().unwrap();
        rack.set("row", 2).unwrap();

        assert_eq!(
            host.change_payload().get("location"),
            Some(&json!({"rack": {"row": 2}}))
        );
    }

    #[test]
    fn test_list_is_materialized_lazily() {
        let class = host_class();
        let mut doc = Map::new();
        doc.insert("tags".into(), json!(["a", "b"]));
        let mut host = SchemaInstance::from_document(class, doc);

        let tags = host.get("tags").unwrap().unwrap().as_list_mut().unwrap();
        assert_eq!(tags.len(), 2);
        tags.push(json!("c")).unwrap();

        assert_eq!(host.changed_fields(), vec!["tags".to_string()]);
        assert_eq!(host.value("tags"), Some(json!(["a", "b", "c"])));
    }

    #[test]
    fn test_list_write_stores_coerced_elements() {
        let mut host = host_class().new_instance();
        assert!(host.set("tags", json!([1, true])).unwrap());
        assert_eq!(host.value("tags"), Some(json!(["1", "true"])));

        assert!(host.set("tags", json!("solo")).is_err());
    }

    #[test]
    fn test_mixed_is_materialized_as_map() {
        let mut host = host_class().new_instance();
        let meta = host.get("meta").unwrap().unwrap().as_map_mut().unwrap();
        assert!(meta.is_empty());
        meta.insert("k", json!(1));

        assert!(host.is_changed("meta"));
        assert_eq!(host.change_payload().get("meta"), Some(&json!({"k": 1})));
    }

    #[test]
    fn test_mixed_scalar_is_kept() {
        let mut host = host_class().new_instance();
        host.set("meta", 42).unwrap();
        assert_eq!(host.get("meta").unwrap().unwrap().as_value(), Some(&json!(42)));
    }

    #[test]
    fn test_embedded_change_marks_parent() {
        let mut host = host_class().new_instance();
        let location = host.get("location").unwrap().unwrap().as_embedded_mut().unwrap();
        assert_eq!(location.class().name(), "host__location");

        location.set("dc", "east").unwrap();
        assert!(location.is_changed("dc"));
        assert!(host.is_changed("location"));
        assert_eq!(
            host.change_payload().get("location"),
            Some(&json!({"dc": "east"}))
        );
    }

    #[test]
    fn test_depth_three_change_marks_every_ancestor() {
        let mut host = host_class().new_instance();
        let location = host.get("location").unwrap().unwrap().as_embedded_mut().unwrap();
        let rack = location.get("rack").unwrap().unwrap().as_embedded_mut().unwrap();
        assert_eq!(rack.class().name(), "host__location__rack");

        rack.set("row", "3").unwrap();
        assert!(rack.is_changed("row"));
        assert!(location.is_changed("rack"));
        assert!(host.is_changed("location"));

        host.clear_changes();
        assert!(!host.is_dirty());
        let location = host.get("location").unwrap().unwrap().as_embedded_mut().unwrap();
        assert!(!location.is_dirty());
    }

    #[test]
    fn test_loaded_document_is_clean() {
        let mut doc = Map::new();
        doc.insert("hostname".into(), json!("db1"));
        doc.insert("location".into(), json!({"dc": "west"}));
        let mut host = SchemaInstance::from_document(host_class(), doc);

        let location = host.get("location").unwrap().unwrap().as_embedded_mut().unwrap();
        assert_eq!(location.value("dc"), Some(json!("west")));
        assert!(!host.is_dirty());
        assert_eq!(
            Value::Object(host.to_document()),
            json!({"hostname": "db1", "location": {"dc": "west"}})
        );
    }

    #[test]
    fn test_embedded_write_coerces_nested_fields() {
        let mut host = host_class().new_instance();
        host.set("location", json!({"rack": {"row": "7"}})).unwrap();
        assert_eq!(
            host.value("location"),
            Some(json!({"rack": {"row": 7}}))
        );
        assert!(host.set("location", "nowhere").is_err());
    }

    #[test]
    fn test_object_id_from_sub_document() {
        let mut host = host_class().new_instance();
        host.set("owner", json!({"_id": "u1", "name": "ops"})).unwrap();
        assert_eq!(host.value("owner"), Some(json!("u1")));
        assert!(host.set("owner", json!({"name": "ops"})).is_err());
    }
}
