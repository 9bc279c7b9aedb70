//! Raw field descriptors
//!
//! A field's type specification arrives as one of three JSON shapes. The
//! shape is decided once, here, and the resolver dispatches on the result.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::{FieldError, FieldResult};

/// The three recognized shapes of a field type specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Descriptor {
    /// A type name such as `"number"` or `"ObjectId"`
    TypeName(String),
    /// A mapping: a typed descriptor, an embedded schema, or mixed
    Nested(Map<String, Value>),
    /// An array field: `[]` or `[<element spec>]`
    Sequence(Vec<Value>),
}

impl Descriptor {
    /// Decide the shape of a raw descriptor.
    ///
    /// Booleans, numbers and null are not descriptors.
    pub fn parse(raw: &Value) -> FieldResult<Self> {
        Self::deserialize(raw).map_err(|_| FieldError::unknown_type(raw.to_string()))
    }

    /// Returns the raw JSON form
    pub fn to_value(&self) -> Value {
        match self {
            Descriptor::TypeName(name) => Value::String(name.clone()),
            Descriptor::Nested(map) => Value::Object(map.clone()),
            Descriptor::Sequence(items) => Value::Array(items.clone()),
        }
    }
}

/// Scalar types addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Number,
    Boolean,
    String,
    ObjectId,
    Mixed,
}

impl ScalarType {
    /// Look up a type name, ignoring case.
    ///
    /// `ipaddress` has no dedicated representation and maps to mixed.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "number" => Some(ScalarType::Number),
            "boolean" => Some(ScalarType::Boolean),
            "string" => Some(ScalarType::String),
            "objectid" => Some(ScalarType::ObjectId),
            "ipaddress" | "mixed" => Some(ScalarType::Mixed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_shapes() {
        assert_eq!(
            Descriptor::parse(&json!("number")).unwrap(),
            Descriptor::TypeName("number".into())
        );
        assert!(matches!(
            Descriptor::parse(&json!({"type": "string"})).unwrap(),
            Descriptor::Nested(map) if map.len() == 1
        ));
        assert!(matches!(
            Descriptor::parse(&json!(["string"])).unwrap(),
            Descriptor::Sequence(items) if items.len() == 1
        ));
    }

    #[test]
    fn test_parse_rejects_scalars() {
        for raw in [json!(true), json!(3), Value::Null] {
            let err = Descriptor::parse(&raw).unwrap_err();
            assert_eq!(err.code(), "SIS_UNKNOWN_FIELD_TYPE");
        }
    }

    #[test]
    fn test_to_value_round_trips_shape() {
        let raw = json!({"type": "number", "required": true});
        assert_eq!(Descriptor::parse(&raw).unwrap().to_value(), raw);
    }

    #[test]
    fn test_type_names_are_case_insensitive() {
        assert_eq!(ScalarType::from_name("ObjectId"), Some(ScalarType::ObjectId));
        assert_eq!(ScalarType::from_name("NUMBER"), Some(ScalarType::Number));
        assert_eq!(ScalarType::from_name("IpAddress"), Some(ScalarType::Mixed));
        assert_eq!(ScalarType::from_name("date"), None);
    }
}
