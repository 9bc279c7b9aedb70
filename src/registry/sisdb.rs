//! The schema registry
//!
//! `SisDb` owns the mapping from schema name to resolved class and keeps it
//! in step with the remote service. The mapping only changes after every
//! involved descriptor has resolved, so a failed refresh or update leaves
//! the registry as it was.
//!
//! Single-threaded: callers sharing a registry across threads must wrap it
//! in their own lock.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use super::client::SchemaClient;
use crate::config::SisConfig;
use crate::error::{SisError, SisResult};
use crate::schema::{schema_name, SchemaClass, SchemaInstance, NAME_KEY};

/// Registry of the schemas known to the remote service.
#[derive(Debug)]
pub struct SisDb<C> {
    client: C,
    config: SisConfig,
    schemas: BTreeMap<String, Arc<SchemaClass>>,
}

impl<C: SchemaClient> SisDb<C> {
    /// Create an empty registry without contacting the service
    pub fn new(client: C, config: SisConfig) -> Self {
        Self {
            client,
            config,
            schemas: BTreeMap::new(),
        }
    }

    /// Create a registry, listing schemas first unless configured not to
    pub fn connect(client: C, config: SisConfig) -> SisResult<Self> {
        config.validate()?;
        let mut db = Self::new(client, config);
        if db.config.refresh_on_connect {
            db.refresh()?;
        }
        Ok(db)
    }

    /// Re-list schemas from the service.
    ///
    /// Schemas no longer listed are dropped, new ones added, changed ones
    /// replaced. An unchanged descriptor keeps its existing class.
    pub fn refresh(&mut self) -> SisResult<()> {
        let descriptors = self.client.list()?;

        let resolved = descriptors
            .iter()
            .map(|raw| self.resolve(raw))
            .collect::<SisResult<Vec<_>>>()?;

        let listed: BTreeSet<String> = resolved
            .iter()
            .map(|class| class.name().to_string())
            .collect();
        let deleted: Vec<String> = self
            .schemas
            .keys()
            .filter(|name| !listed.contains(*name))
            .cloned()
            .collect();

        for name in deleted {
            self.schemas.remove(&name);
            info!(schema = %name, "schema_removed");
        }
        for class in resolved {
            self.register(class);
        }

        Ok(())
    }

    /// Create or update a schema through the service and register the
    /// descriptor it returns.
    ///
    /// The descriptor is resolved locally before anything is sent.
    pub fn update_schema(&mut self, raw: &Value) -> SisResult<Arc<SchemaClass>> {
        self.resolve(raw)?;
        let name = schema_name(raw)?;

        let canonical = if self.schemas.contains_key(name) {
            self.client.update(name, raw)?
        } else {
            self.client.create(raw)?
        };

        let class = self.resolve(&canonical)?;
        Ok(self.register(class))
    }

    /// Returns a registered schema
    pub fn schema(&self, name: &str) -> Option<Arc<SchemaClass>> {
        self.schemas.get(name).cloned()
    }

    /// Returns registered schema names in order
    pub fn schema_names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Returns whether a schema is registered
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Create an empty instance of a registered schema
    pub fn new_instance(&self, name: &str) -> SisResult<SchemaInstance> {
        self.schemas
            .get(name)
            .map(SchemaClass::new_instance)
            .ok_or_else(|| SisError::UnknownSchema(name.to_string()))
    }

    pub fn config(&self) -> &SisConfig {
        &self.config
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    fn resolve(&self, raw: &Value) -> SisResult<SchemaClass> {
        SchemaClass::from_descriptor_with(raw, &self.config.metadata_keys).inspect_err(|err| {
            let schema = raw
                .get(NAME_KEY)
                .and_then(serde_json::Value::as_str)
                .unwrap_or("<unnamed>");
            warn!(
                schema,
                error = %err,
                code = err.code(),
                "schema_resolution_failed"
            );
        })
    }

    fn register(&mut self, class: SchemaClass) -> Arc<SchemaClass> {
        if let Some(existing) = self.schemas.get(class.name()) {
            if **existing == class {
                return Arc::clone(existing);
            }
        }

        let name = class.name().to_string();
        let class = Arc::new(class);
        let replaced = self
            .schemas
            .insert(name.clone(), Arc::clone(&class))
            .is_some();
        info!(
            schema = %name,
            fields = class.len(),
            replaced,
            "schema_registered"
        );
        class
    }
}
