//! Field subsystem
//!
//! Coercion of raw values into canonical per-type forms, and resolution of
//! raw schema descriptors into typed field descriptors.

pub mod coerce;
mod descriptor;
mod errors;
mod resolver;
mod types;

pub use descriptor::{Descriptor, ScalarType};
pub use errors::{FieldError, FieldResult};
pub use resolver::{
    embedded_schema_name, resolve_field, resolve_fields, EMBEDDED_NAME_SEPARATOR, TYPE_KEY,
};
pub use types::{Field, FieldDescriptor, FieldKind};
