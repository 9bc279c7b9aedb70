//! Resolved schema classes
//!
//! A `SchemaClass` is the tree of field descriptors resolved from one raw
//! schema descriptor. It is immutable once built and shared by every
//! instance through an `Arc`.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::instance::SchemaInstance;
use crate::config::SisConfig;
use crate::error::{SisError, SisResult};
use crate::field::{resolve_fields, Field, FieldDescriptor, FieldResult};

/// Key naming a schema in its raw descriptor
pub const NAME_KEY: &str = "name";

/// Key under which the remote service nests field definitions
pub const DEFINITION_KEY: &str = "definition";

/// A named schema and its resolved fields.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaClass {
    name: String,
    fields: BTreeMap<String, FieldDescriptor>,
}

impl SchemaClass {
    /// Create a schema class from already resolved fields
    pub fn new(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name: name.into(),
            fields: fields
                .into_iter()
                .map(|field| (field.name().to_string(), field))
                .collect(),
        }
    }

    /// Resolve a raw schema descriptor using the default metadata keys.
    pub fn from_descriptor(raw: &Value) -> SisResult<Self> {
        Self::from_descriptor_with(raw, &SisConfig::default().metadata_keys)
    }

    /// Resolve a raw schema descriptor.
    ///
    /// Fields come from the `definition` mapping when present, otherwise
    /// from every top-level key not listed in `metadata_keys`. Resolution
    /// is all-or-nothing.
    pub fn from_descriptor_with(raw: &Value, metadata_keys: &[String]) -> SisResult<Self> {
        let name = schema_name(raw)?;

        let class = match raw.get(DEFINITION_KEY) {
            Some(Value::Object(definition)) => resolve_fields(name, definition.iter())?,
            _ => {
                let entries = raw
                    .as_object()
                    .into_iter()
                    .flatten()
                    .filter(|(key, _)| !metadata_keys.iter().any(|m| m == *key));
                resolve_fields(name, entries)?
            }
        };

        Ok(class)
    }

    /// Returns the schema name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    /// Returns all fields in name order
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values()
    }

    /// Returns all field names in order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Returns the number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns whether the schema declares no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Coerce every declared field present in `doc`; undeclared keys are kept.
    pub fn coerce_document(&self, doc: Map<String, Value>) -> FieldResult<Map<String, Value>> {
        doc.into_iter()
            .map(|(key, value)| match self.fields.get(&key) {
                Some(field) => field.coerce(value).map(|coerced| (key, coerced)),
                None => Ok((key, value)),
            })
            .collect()
    }

    /// Create an empty top-level instance of this schema
    pub fn new_instance(self: &Arc<Self>) -> SchemaInstance {
        SchemaInstance::new(Arc::clone(self))
    }
}

/// Returns the name of a raw schema descriptor.
pub fn schema_name(raw: &Value) -> SisResult<&str> {
    if !raw.is_object() {
        return Err(SisError::invalid_schema(format!(
            "schema descriptor must be an object, got {raw}"
        )));
    }
    match raw.get(NAME_KEY) {
        Some(Value::String(name)) if !name.is_empty() => Ok(name.as_str()),
        _ => Err(SisError::invalid_schema("schema descriptor has no name")),
    }
}

/// Resolve a raw schema descriptor into a schema class.
pub fn resolve_schema(raw: &Value) -> SisResult<SchemaClass> {
    SchemaClass::from_descriptor(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldError, FieldKind};
    use serde_json::json;

    #[test]
    fn test_resolve_scalar_and_embedded() {
        let class = resolve_schema(&json!({
            "name": "s",
            "a": "number",
            "b": {"c": "string"}
        }))
        .unwrap();

        assert_eq!(class.name(), "s");
        assert_eq!(class.len(), 2);
        assert_eq!(class.field("a").unwrap().kind(), &FieldKind::Number);

        let nested = class.field("b").unwrap().embedded_schema().unwrap();
        assert_eq!(nested.name(), "s__b");
        assert_eq!(nested.field("c").unwrap().kind(), &FieldKind::String);
    }

    #[test]
    fn test_resolve_unknown_type_fails_whole_schema() {
        let result = resolve_schema(&json!({"name": "s", "a": "number", "x": "unknowntype"}));
        match result {
            Err(SisError::Field(FieldError::UnknownType(t))) => assert_eq!(t, "unknowntype"),
            other => panic!("expected unknown type, got {other:?}"),
        }
    }

    #[test]
    fn test_definition_mapping_takes_precedence() {
        let class = resolve_schema(&json!({
            "name": "hosts",
            "owner": ["admins"],
            "definition": {"hostname": "string", "port": "number"}
        }))
        .unwrap();

        let names: Vec<_> = class.field_names().collect();
        assert_eq!(names, vec!["hostname", "port"]);
    }

    #[test]
    fn test_flat_descriptor_keeps_service_named_fields() {
        let class = resolve_schema(&json!({
            "name": "s",
            "owner": "string",
            "_id": "objectid",
            "a": "number"
        }))
        .unwrap();

        assert_eq!(
            class.field_names().collect::<Vec<_>>(),
            vec!["_id", "a", "owner"]
        );
        assert_eq!(class.field("owner").unwrap().kind(), &FieldKind::String);
        assert_eq!(class.field("_id").unwrap().kind(), &FieldKind::ObjectId);
    }

    #[test]
    fn test_metadata_keys_are_not_fields() {
        let class = SchemaClass::from_descriptor_with(
            &json!({"name": "s", "_id": "abc", "a": "string"}),
            &["name".to_string(), "_id".to_string()],
        )
        .unwrap();
        assert_eq!(class.field_names().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn test_missing_name() {
        assert!(matches!(
            resolve_schema(&json!({"a": "string"})),
            Err(SisError::InvalidSchema(_))
        ));
        assert!(matches!(
            resolve_schema(&json!({"name": "", "a": "string"})),
            Err(SisError::InvalidSchema(_))
        ));
        assert!(matches!(
            resolve_schema(&json!(["name"])),
            Err(SisError::InvalidSchema(_))
        ));
    }

    #[test]
    fn test_resolving_twice_is_equal() {
        let raw = json!({"name": "s", "a": "number", "b": {"c": ["string"]}});
        assert_eq!(resolve_schema(&raw).unwrap(), resolve_schema(&raw).unwrap());
    }

    #[test]
    fn test_coerce_document_keeps_undeclared_keys() {
        let class = resolve_schema(&json!({"name": "s", "n": "number"})).unwrap();
        let doc = json!({"n": "12", "extra": true});
        let coerced = class
            .coerce_document(doc.as_object().unwrap().clone())
            .unwrap();
        assert_eq!(Value::Object(coerced), json!({"n": 12, "extra": true}));
    }
}
