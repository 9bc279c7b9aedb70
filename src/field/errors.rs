//! Field error types
//!
//! Error codes:
//! - SIS_FIELD_CONVERSION: a raw value cannot be represented in a field type
//! - SIS_UNKNOWN_FIELD_TYPE: a descriptor names no recognized type or shape
//! - SIS_NO_SUCH_FIELD: an instance was addressed by an undeclared field name
//!
//! Both are raised at the point of failure and propagate unmodified.

use serde_json::Value;
use thiserror::Error;

/// Result type for field resolution and coercion
pub type FieldResult<T> = Result<T, FieldError>;

/// Field errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    /// A value could not be coerced into the declared field type
    #[error("Cannot convert {value} to {field_type}")]
    Conversion {
        /// Declared field type name
        field_type: &'static str,
        /// Offending value, rendered as JSON
        value: String,
    },

    /// A descriptor names an unrecognized type or has no recognized shape
    #[error("Unknown type: {0}")]
    UnknownType(String),

    /// A schema instance was asked for a field its schema does not declare
    #[error("Schema '{schema}' has no field '{field}'")]
    NoSuchField {
        /// Schema name
        schema: String,
        /// Requested field name
        field: String,
    },
}

impl FieldError {
    /// Create a conversion error for the given target type and raw value
    pub fn conversion(field_type: &'static str, value: &Value) -> Self {
        Self::Conversion {
            field_type,
            value: value.to_string(),
        }
    }

    /// Create an unknown type error
    pub fn unknown_type(descriptor: impl Into<String>) -> Self {
        Self::UnknownType(descriptor.into())
    }

    /// Create a missing field error
    pub fn no_such_field(schema: impl Into<String>, field: impl Into<String>) -> Self {
        Self::NoSuchField {
            schema: schema.into(),
            field: field.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Conversion { .. } => "SIS_FIELD_CONVERSION",
            Self::UnknownType(_) => "SIS_UNKNOWN_FIELD_TYPE",
            Self::NoSuchField { .. } => "SIS_NO_SUCH_FIELD",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            FieldError::conversion("Number", &json!("abc")).code(),
            "SIS_FIELD_CONVERSION"
        );
        assert_eq!(
            FieldError::unknown_type("widget").code(),
            "SIS_UNKNOWN_FIELD_TYPE"
        );
    }

    #[test]
    fn test_conversion_message_names_value_and_type() {
        let err = FieldError::conversion("Number", &json!("abc"));
        let display = err.to_string();
        assert!(display.contains("\"abc\""));
        assert!(display.contains("Number"));
    }

    #[test]
    fn test_unknown_type_message() {
        let err = FieldError::unknown_type("widget");
        assert_eq!(err.to_string(), "Unknown type: widget");
    }
}
