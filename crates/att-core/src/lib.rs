//! Core domain logic for the attendance ledger.
//!
//! This crate contains the fundamental types and logic for:
//! - Events: clock-in/clock-out records with optional GPS location
//! - Ledger: pairing events into work sessions and computing hours
//! - Windows: resolving query date ranges with inclusive day bounds

pub mod employee;
pub mod event;
pub mod ledger;
pub mod types;
pub mod window;

pub use employee::{Employee, Role, normalize_name};
pub use event::{AttendanceEvent, ClockKind, GeoPoint};
pub use ledger::{LedgerRow, build_ledger, round_hours, total_hours, totals_by_employee};
pub use types::{EmployeeId, EventId, ValidationError};
pub use window::QueryWindow;
