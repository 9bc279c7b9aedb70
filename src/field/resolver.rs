//! Schema descriptor resolution
//!
//! Turns a raw type specification into a `FieldDescriptor`. First match wins:
//!
//! 1. A type name is looked up in the fixed table.
//! 2. A mapping without `type` is mixed when empty, otherwise an embedded
//!    schema whose entries are resolved recursively. A mapping with `type`
//!    resolves that value: a name as in (1), a mapping as an embedded
//!    schema, a sequence as in (3).
//! 3. A sequence is a list field. `[]` is untyped, `[spec]` resolves `spec`
//!    as the element field.
//!
//! Embedded schemas are named `<parent>__<field>`, so names grow with depth
//! and stay unique among siblings.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use super::descriptor::{Descriptor, ScalarType};
use super::errors::{FieldError, FieldResult};
use super::types::{FieldDescriptor, FieldKind};
use crate::schema::SchemaClass;

/// Key carrying an explicit type inside a mapping descriptor
pub const TYPE_KEY: &str = "type";

/// Separator joining parent schema and field names of embedded schemas
pub const EMBEDDED_NAME_SEPARATOR: &str = "__";

/// Name of the schema generated for an embedded field.
pub fn embedded_schema_name(schema_name: &str, field_name: &str) -> String {
    format!("{schema_name}{EMBEDDED_NAME_SEPARATOR}{field_name}")
}

/// Resolve one raw field descriptor.
///
/// # Errors
///
/// Returns `FieldError::UnknownType` for unrecognized type names and for
/// descriptors of no recognized shape, including anywhere below an
/// embedded or list field.
pub fn resolve_field(
    descriptor: &Value,
    field_name: &str,
    schema_name: &str,
) -> FieldResult<FieldDescriptor> {
    let field = match Descriptor::parse(descriptor)? {
        Descriptor::TypeName(name) => resolve_type_name(&name, field_name)?,
        Descriptor::Nested(map) => resolve_mapping(map, field_name, schema_name)?,
        Descriptor::Sequence(items) => resolve_sequence(items, field_name, schema_name)?,
    };

    debug!(
        schema = schema_name,
        field = field_name,
        field_type = field.kind().type_name(),
        "field_resolved"
    );
    Ok(field)
}

/// Resolve every entry of a field mapping into one schema.
///
/// Either all fields resolve or the first failure is returned.
pub fn resolve_fields<'a, I>(schema_name: &str, entries: I) -> FieldResult<SchemaClass>
where
    I: IntoIterator<Item = (&'a String, &'a Value)>,
{
    let fields = entries
        .into_iter()
        .map(|(name, descriptor)| resolve_field(descriptor, name, schema_name))
        .collect::<FieldResult<Vec<_>>>()?;

    Ok(SchemaClass::new(schema_name, fields))
}

fn resolve_type_name(name: &str, field_name: &str) -> FieldResult<FieldDescriptor> {
    let scalar = ScalarType::from_name(name).ok_or_else(|| FieldError::unknown_type(name))?;
    Ok(FieldDescriptor::new(
        field_name,
        FieldKind::from(scalar),
        Descriptor::TypeName(name.to_ascii_lowercase()),
    ))
}

fn resolve_mapping(
    map: Map<String, Value>,
    field_name: &str,
    schema_name: &str,
) -> FieldResult<FieldDescriptor> {
    match map.get(TYPE_KEY).cloned() {
        None if map.is_empty() => Ok(FieldDescriptor::new(
            field_name,
            FieldKind::Mixed,
            Descriptor::Nested(map),
        )),
        None => resolve_embedded(map, field_name, schema_name),
        Some(Value::String(name)) => resolve_type_name(&name, field_name),
        Some(Value::Object(inner)) => resolve_embedded(inner, field_name, schema_name),
        Some(Value::Array(items)) => resolve_sequence(items, field_name, schema_name),
        Some(other) => Err(FieldError::unknown_type(other.to_string())),
    }
}

fn resolve_embedded(
    map: Map<String, Value>,
    field_name: &str,
    schema_name: &str,
) -> FieldResult<FieldDescriptor> {
    let embedded_name = embedded_schema_name(schema_name, field_name);
    let class = resolve_fields(&embedded_name, map.iter())?;

    Ok(FieldDescriptor::new(
        field_name,
        FieldKind::Embedded(Arc::new(class)),
        Descriptor::Nested(map),
    ))
}

fn resolve_sequence(
    items: Vec<Value>,
    field_name: &str,
    schema_name: &str,
) -> FieldResult<FieldDescriptor> {
    let element = match items.as_slice() {
        [] => None,
        [element] => Some(Box::new(resolve_field(element, field_name, schema_name)?)),
        _ => return Err(FieldError::unknown_type(Value::Array(items).to_string())),
    };

    Ok(FieldDescriptor::new(
        field_name,
        FieldKind::List(element),
        Descriptor::Sequence(items),
    ))
}
