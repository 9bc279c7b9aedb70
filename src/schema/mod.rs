//! Schema classes and instances
//!
//! A raw schema descriptor resolves into a `SchemaClass`, a tree of field
//! descriptors. Documents of that schema are `SchemaInstance`s, which keep
//! their own data mapping and change-set.

mod class;
mod instance;
mod tracked;

pub use class::{resolve_schema, schema_name, SchemaClass, DEFINITION_KEY, NAME_KEY};
pub use instance::{SchemaInstance, Slot};
pub use tracked::{ChangeSet, ChangeTracked, OwnerLink, TrackedList, TrackedMap};
