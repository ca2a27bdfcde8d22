//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Invalid clock kind value.
    #[error("clock kind must be 'in' or 'out', got {value}")]
    InvalidClockKind { value: String },

    /// Invalid role value.
    #[error("invalid role: {value}")]
    InvalidRole { value: String },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated attendance event identifier.
    ///
    /// Event IDs must be non-empty strings. Uniqueness is enforced at the
    /// database level.
    EventId, "event ID"
);

define_string_id!(
    /// A validated employee identifier.
    ///
    /// Pairing always keys on the employee ID, never on the display name.
    EmployeeId, "employee ID"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_id_rejects_empty() {
        assert!(EventId::new("").is_err());
        assert!(EventId::new("valid-id").is_ok());
    }

    #[test]
    fn employee_id_rejects_empty() {
        assert!(EmployeeId::new("").is_err());
        assert!(EmployeeId::new("emp-1").is_ok());
    }

    #[test]
    fn employee_id_serde_roundtrip() {
        let id = EmployeeId::new("emp-123").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"emp-123\"");
        let parsed: EmployeeId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn employee_id_serde_rejects_empty() {
        let result: Result<EmployeeId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn event_id_as_ref() {
        let id = EventId::new("event-123").unwrap();
        let s: &str = id.as_ref();
        assert_eq!(s, "event-123");
    }
}
