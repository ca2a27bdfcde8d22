//! Attendance events: clock-in/clock-out records with optional GPS location.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{EmployeeId, EventId, ValidationError};

/// The direction of a clock event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockKind {
    /// Clock-in: the employee starts a work session.
    In,
    /// Clock-out: the employee ends a work session.
    Out,
}

impl ClockKind {
    /// Returns the string representation for storage and display.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }
}

impl std::fmt::Display for ClockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for ClockKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(Self::In),
            "out" => Ok(Self::Out),
            _ => Err(ValidationError::InvalidClockKind {
                value: s.to_string(),
            }),
        }
    }
}

/// A GPS capture with best-effort reverse-geocoded address fields.
///
/// Coordinates are always present when a location was captured; `address`
/// and `city` stay `None` when geocoding was skipped or failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl GeoPoint {
    /// Creates a bare coordinate pair with no geocoded fields.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            address: None,
            city: None,
        }
    }
}

/// A single attendance event.
///
/// Events are immutable once created; the domain has no update or delete
/// primitive. Out-of-order and duplicate kinds (IN after IN) are tolerated
/// and handled by the ledger, never rejected at write time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceEvent {
    /// Unique identifier for this event.
    pub id: EventId,
    /// The employee who clocked.
    pub employee_id: EmployeeId,
    /// Clock direction.
    pub kind: ClockKind,
    /// When the event occurred. The ordering source of truth.
    pub timestamp: DateTime<Utc>,
    /// Optional GPS capture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_kind_roundtrip() {
        for kind in [ClockKind::In, ClockKind::Out] {
            let s = kind.as_str();
            let parsed: ClockKind = s.parse().unwrap();
            assert_eq!(parsed, kind);
            assert_eq!(kind.to_string(), s);
        }
    }

    #[test]
    fn clock_kind_rejects_unknown() {
        assert!("lunch".parse::<ClockKind>().is_err());
        assert!("IN".parse::<ClockKind>().is_err());
    }

    #[test]
    fn clock_kind_serde_matches_as_str() {
        for kind in [ClockKind::In, ClockKind::Out] {
            let value = serde_json::to_value(kind).unwrap();
            assert_eq!(value.as_str().unwrap(), kind.as_str());
        }
    }

    #[test]
    fn event_serialization_roundtrip() {
        let event = AttendanceEvent {
            id: EventId::new("evt-1").unwrap(),
            employee_id: EmployeeId::new("emp-1").unwrap(),
            kind: ClockKind::In,
            timestamp: Utc::now(),
            location: Some(GeoPoint::new(45.4642, 9.19)),
        };

        let json = serde_json::to_string(&event).unwrap();
        let parsed: AttendanceEvent = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.id, event.id);
        assert_eq!(parsed.employee_id, event.employee_id);
        assert_eq!(parsed.kind, event.kind);
        assert_eq!(parsed.location, event.location);
    }

    #[test]
    fn event_without_location_omits_field() {
        let event = AttendanceEvent {
            id: EventId::new("evt-2").unwrap(),
            employee_id: EmployeeId::new("emp-1").unwrap(),
            kind: ClockKind::Out,
            timestamp: Utc::now(),
            location: None,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("location"));
    }
}
