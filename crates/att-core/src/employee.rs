//! Employee accounts referenced by attendance events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{EmployeeId, ValidationError};

/// Access role of an employee account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Can manage accounts and view every employee's ledger.
    Admin,
    /// Can clock in/out and view their own ledger.
    #[default]
    Employee,
}

impl Role {
    /// Returns the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Employee => "employee",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "employee" => Ok(Self::Employee),
            _ => Err(ValidationError::InvalidRole {
                value: s.to_string(),
            }),
        }
    }
}

/// An employee account.
///
/// The `(name, surname)` pair is unique in normalized form and used as a
/// display key only; event pairing always operates on `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub surname: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Employee {
    /// Display name used in listings and admin exports.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.surname, self.name)
    }
}

/// Normalizes a name component: trims and collapses internal whitespace.
///
/// Returns an error when the result is empty, so blank names never reach
/// the store.
pub fn normalize_name(raw: &str) -> Result<String, ValidationError> {
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return Err(ValidationError::Empty { field: "name" });
    }
    Ok(normalized)
}
