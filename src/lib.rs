//! sisdb - client-side object-document mapping for SIS schemas
//!
//! Schemas defined on the remote service are resolved into trees of typed
//! field descriptors. Documents of a schema are `SchemaInstance`s: values
//! written through a field are coerced to the field's canonical form, and
//! every change is recorded so that only modified fields are sent back.
//!
//! ```rust,ignore
//! use sisdb::{MemoryClient, SisConfig, SisDb};
//! use serde_json::json;
//!
//! let client = MemoryClient::with_schemas([json!({"name": "host", "port": "number"})])?;
//! let db = SisDb::connect(client, SisConfig::default())?;
//!
//! let mut host = db.new_instance("host")?;
//! host.set("port", "8080")?;
//! assert_eq!(host.change_payload()["port"], json!(8080));
//! ```

pub mod config;
pub mod error;
pub mod field;
pub mod registry;
pub mod schema;

pub use config::SisConfig;
pub use error::{SisError, SisResult};
pub use field::{Field, FieldDescriptor, FieldError, FieldKind, FieldResult};
pub use registry::{MemoryClient, SchemaClient, SisDb};
pub use schema::{resolve_schema, SchemaClass, SchemaInstance, Slot};
