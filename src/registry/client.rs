//! Remote schema service boundary
//!
//! The registry only needs three calls from the service. Transport, auth
//! and retries belong to the implementor.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{SisError, SisResult};
use crate::schema::schema_name;

/// Schema operations of the remote service.
pub trait SchemaClient {
    /// All current raw schema descriptors, each carrying a unique `name`
    fn list(&mut self) -> SisResult<Vec<Value>>;

    /// Create a schema; returns the server's canonical descriptor
    fn create(&mut self, descriptor: &Value) -> SisResult<Value>;

    /// Replace the schema `name`; returns the server's canonical descriptor
    fn update(&mut self, name: &str, descriptor: &Value) -> SisResult<Value>;
}

/// In-process schema service keyed by schema name.
///
/// Stands in for the remote service when working offline and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryClient {
    schemas: BTreeMap<String, Value>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the service with descriptors, as if created elsewhere
    pub fn with_schemas(descriptors: impl IntoIterator<Item = Value>) -> SisResult<Self> {
        let mut client = Self::new();
        for descriptor in descriptors {
            client.put(descriptor)?;
        }
        Ok(client)
    }

    /// Store a descriptor, replacing any schema of the same name
    pub fn put(&mut self, descriptor: Value) -> SisResult<()> {
        let name = schema_name(&descriptor)?.to_string();
        self.schemas.insert(name, descriptor);
        Ok(())
    }

    /// Delete a schema server-side
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.schemas.remove(name)
    }

    /// Returns a stored descriptor
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schemas.get(name)
    }
}

impl SchemaClient for MemoryClient {
    fn list(&mut self) -> SisResult<Vec<Value>> {
        Ok(self.schemas.values().cloned().collect())
    }

    fn create(&mut self, descriptor: &Value) -> SisResult<Value> {
        let name = schema_name(descriptor)?;
        if self.schemas.contains_key(name) {
            return Err(SisError::client(format!("schema '{}' already exists", name)));
        }
        self.schemas.insert(name.to_string(), descriptor.clone());
        Ok(descriptor.clone())
    }

    fn update(&mut self, name: &str, descriptor: &Value) -> SisResult<Value> {
        if schema_name(descriptor)? != name {
            return Err(SisError::client(format!(
                "schema name cannot change from '{}'",
                name
            )));
        }
        match self.schemas.get_mut(name) {
            Some(stored) => {
                *stored = descriptor.clone();
                Ok(descriptor.clone())
            }
            None => Err(SisError::client(format!("schema '{}' not found", name))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_then_list() {
        let mut client = MemoryClient::new();
        client.create(&json!({"name": "a", "x": "string"})).unwrap();
        client.create(&json!({"name": "b", "y": "number"})).unwrap();

        let names: Vec<_> = client
            .list()
            .unwrap()
            .iter()
            .map(|s| s["name"].clone())
            .collect();
        assert_eq!(names, vec![json!("a"), json!("b")]);
    }

    #[test]
    fn test_create_duplicate_fails() {
        let mut client = MemoryClient::new();
        client.create(&json!({"name": "a"})).unwrap();
        assert!(matches!(
            client.create(&json!({"name": "a"})),
            Err(SisError::Client(_))
        ));
    }

    #[test]
    fn test_update_requires_existing_schema() {
        let mut client = MemoryClient::new();
        let result = client.update("a", &json!({"name": "a"}));
        assert!(matches!(result, Err(SisError::Client(_))));
    }

    #[test]
    fn test_update_cannot_rename() {
        let mut client = MemoryClient::with_schemas([json!({"name": "a"})]).unwrap();
        let result = client.update("a", &json!({"name": "b"}));
        assert!(matches!(result, Err(SisError::Client(_))));
    }

    #[test]
    fn test_unnamed_descriptor_rejected() {
        let mut client = MemoryClient::new();
        assert!(matches!(
            client.create(&json!({"x": "string"})),
            Err(SisError::InvalidSchema(_))
        ));
    }
}
