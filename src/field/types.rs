//! Resolved field descriptors
//!
//! A `FieldDescriptor` is created once when a schema is resolved and shared
//! by every instance of that schema. Per-instance state lives in the
//! instance's data mapping, never in the descriptor.

use std::sync::Arc;

use serde_json::Value;

use super::coerce;
use super::descriptor::{Descriptor, ScalarType};
use super::errors::{FieldError, FieldResult};
use crate::schema::{ChangeTracked, SchemaClass, SchemaInstance, Slot, TrackedList};

/// Declared type of a field, with the nested structure it owns.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Boolean,
    Number,
    String,
    ObjectId,
    Mixed,
    /// A structured sub-document with its own generated schema
    Embedded(Arc<SchemaClass>),
    /// An array, optionally with a resolved element field
    List(Option<Box<FieldDescriptor>>),
}

impl From<ScalarType> for FieldKind {
    fn from(scalar: ScalarType) -> Self {
        match scalar {
            ScalarType::Number => FieldKind::Number,
            ScalarType::Boolean => FieldKind::Boolean,
            ScalarType::String => FieldKind::String,
            ScalarType::ObjectId => FieldKind::ObjectId,
            ScalarType::Mixed => FieldKind::Mixed,
        }
    }
}

impl FieldKind {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Boolean => "Boolean",
            FieldKind::Number => "Number",
            FieldKind::String => "String",
            FieldKind::ObjectId => "ObjectId",
            FieldKind::Mixed => "Mixed",
            FieldKind::Embedded(_) => "EmbeddedDocument",
            FieldKind::List(_) => "List",
        }
    }

    /// Convert a raw value into this type's canonical representation.
    pub fn coerce(&self, raw: Value) -> FieldResult<Value> {
        match self {
            FieldKind::Boolean => coerce::coerce_boolean(raw),
            FieldKind::Number => coerce::coerce_number(raw),
            FieldKind::String => coerce::coerce_string(raw),
            FieldKind::ObjectId => coerce::coerce_object_id(raw),
            FieldKind::Mixed => coerce::coerce_mixed(raw),
            FieldKind::Embedded(class) => match raw {
                Value::Null => Ok(raw),
                Value::Object(doc) => class.coerce_document(doc).map(Value::Object),
                other => Err(FieldError::conversion(self.type_name(), &other)),
            },
            FieldKind::List(element) => match (raw, element) {
                (Value::Null, _) => Ok(Value::Null),
                (Value::Array(items), None) => Ok(Value::Array(items)),
                (Value::Array(items), Some(element)) => items
                    .into_iter()
                    .map(|item| element.kind.coerce(item))
                    .collect::<FieldResult<Vec<_>>>()
                    .map(Value::Array),
                (other, _) => Err(FieldError::conversion(self.type_name(), &other)),
            },
        }
    }
}

/// Read/write access to one named field of a schema instance.
pub trait Field {
    /// Field name within its schema
    fn name(&self) -> &str;

    /// Returns the stored slot, materializing containers on first access.
    ///
    /// An unset scalar is `None` and nothing is stored for it. Never
    /// touches the instance's change-set.
    fn get<'a>(&self, instance: &'a mut SchemaInstance) -> Option<&'a mut Slot>;

    /// Coerces and stores a value.
    ///
    /// Returns whether the stored value changed; only then is the field
    /// marked in the instance's change-set.
    fn set(&self, instance: &mut SchemaInstance, value: Value) -> FieldResult<bool>;
}

/// A named, typed field of a resolved schema.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    name: String,
    kind: FieldKind,
    spec: Descriptor,
}

impl FieldDescriptor {
    /// Create a descriptor from its resolved kind and normalized type specification
    pub fn new(name: impl Into<String>, kind: FieldKind, spec: Descriptor) -> Self {
        Self {
            name: name.into(),
            kind,
            spec,
        }
    }

    /// Returns the declared kind
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Returns the type specification this field was resolved from
    pub fn spec(&self) -> &Descriptor {
        &self.spec
    }

    /// Returns the generated schema of an embedded field
    pub fn embedded_schema(&self) -> Option<&Arc<SchemaClass>> {
        match &self.kind {
            FieldKind::Embedded(class) => Some(class),
            _ => None,
        }
    }

    /// Returns the element field of a typed list
    pub fn element(&self) -> Option<&FieldDescriptor> {
        match &self.kind {
            FieldKind::List(element) => element.as_deref(),
            _ => None,
        }
    }

    /// Coerce a raw value through this field's type
    pub fn coerce(&self, raw: Value) -> FieldResult<Value> {
        self.kind.coerce(raw)
    }
}

/// Descriptors are equal when their type specifications are equal.
impl PartialEq for FieldDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.spec == other.spec
    }
}

impl Field for FieldDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn get<'a>(&self, instance: &'a mut SchemaInstance) -> Option<&'a mut Slot> {
        let owner = instance.changes().link(&self.name);
        let stored = instance.data_mut().remove(&self.name);

        let slot = match (&self.kind, stored) {
            (FieldKind::List(element), Some(Slot::Value(Value::Array(items)))) => {
                Slot::List(TrackedList::with_element(items, owner, element_kind(element)))
            }
            (FieldKind::List(element), None | Some(Slot::Value(Value::Null))) => {
                Slot::List(TrackedList::with_element(Vec::new(), owner, element_kind(element)))
            }
            (FieldKind::Mixed, Some(Slot::Value(Value::Object(map)))) => {
                Slot::Mixed(ChangeTracked::new(map, owner))
            }
            (FieldKind::Mixed, None | Some(Slot::Value(Value::Null))) => {
                Slot::Mixed(ChangeTracked::new(Default::default(), owner))
            }
            (FieldKind::Embedded(class), Some(Slot::Value(Value::Object(doc)))) => {
                let mut embedded = SchemaInstance::embedded(Arc::clone(class), owner);
                embedded.set_data(doc);
                Slot::Embedded(Box::new(embedded))
            }
            (FieldKind::Embedded(class), None | Some(Slot::Value(Value::Null))) => {
                Slot::Embedded(Box::new(SchemaInstance::embedded(Arc::clone(class), owner)))
            }
            (_, Some(slot)) => slot,
            (_, None) => return None,
        };

        Some(instance.data_mut().entry(self.name.clone()).or_insert(slot))
    }

    fn set(&self, instance: &mut SchemaInstance, value: Value) -> FieldResult<bool> {
        let coerced = self.kind.coerce(value)?;

        let unchanged = instance
            .data()
            .get(&self.name)
            .is_some_and(|slot| slot.to_value() == coerced);
        if unchanged {
            return Ok(false);
        }

        instance.changes().mark(&self.name);
        instance
            .data_mut()
            .insert(self.name.clone(), Slot::Value(coerced));
        Ok(true)
    }
}

fn element_kind(element: &Option<Box<FieldDescriptor>>) -> Option<FieldKind> {
    element.as_ref().map(|element| element.kind.clone())
}
