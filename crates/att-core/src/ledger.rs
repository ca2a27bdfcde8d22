//! The attendance ledger: pairing clock events into work sessions.
//!
//! The pairing engine consumes a slice of [`AttendanceEvent`]s, re-sorts it
//! ascending by timestamp, and walks it with one pending-entry slot per
//! employee. Every input event produces exactly one output row; a duration
//! is attached only to the OUT row of a successful IN/OUT pairing.
//!
//! The engine is deliberately lenient and total: duplicate INs silently
//! replace the pending entry, orphan OUTs and trailing INs become rows with
//! an empty duration, and no input sequence is ever rejected. Attendance
//! data is never dropped, only annotated as incomplete.
//!
//! # Rounding policy
//!
//! Per-row durations are rounded to 2 decimal places for display. Period
//! totals are computed from full-precision millisecond sums and rounded
//! once at the end, so rounding error never compounds across rows.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::event::{AttendanceEvent, ClockKind};
use crate::types::EmployeeId;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// One display row of the ledger, derived from exactly one event.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerRow {
    /// The underlying event.
    pub event: AttendanceEvent,
    /// Entry timestamp: the event's own for IN rows, the matched entry's
    /// for a paired OUT row, `None` for an unmatched OUT.
    pub entry_time: Option<DateTime<Utc>>,
    /// Worked hours rounded to 2 decimals; present on paired OUT rows only.
    pub duration_hours: Option<f64>,
    /// Full-precision session length in milliseconds, the basis for totals.
    #[serde(skip)]
    pub session_ms: Option<i64>,
}

/// Per-employee pairing state.
///
/// `Idle` means no entry is waiting for an exit; `PendingEntry` holds the
/// captured clock-in timestamp. The map of these lives on the stack of one
/// [`build_ledger`] call and is discarded afterwards, so no pairing state
/// survives across queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum PairingState {
    #[default]
    Idle,
    PendingEntry(DateTime<Utc>),
}

/// Pairs clock events into work sessions, one output row per input event.
///
/// The input may interleave events from multiple employees; pending state
/// is keyed per employee and never shared. Events are sorted ascending by
/// timestamp before pairing (stable, so same-instant captures keep their
/// insertion order) regardless of the order they were fetched in.
#[must_use]
pub fn build_ledger(mut events: Vec<AttendanceEvent>) -> Vec<LedgerRow> {
    events.sort_by_key(|event| event.timestamp);

    let mut pending: HashMap<EmployeeId, PairingState> = HashMap::new();
    let mut rows = Vec::with_capacity(events.len());

    for event in events {
        let state = pending.entry(event.employee_id.clone()).or_default();
        let row = match (event.kind, *state) {
            (ClockKind::In, previous) => {
                if let PairingState::PendingEntry(stale) = previous {
                    tracing::debug!(
                        employee_id = %event.employee_id,
                        stale_entry = %stale,
                        "replacing pending entry with newer clock-in"
                    );
                }
                *state = PairingState::PendingEntry(event.timestamp);
                LedgerRow {
                    entry_time: Some(event.timestamp),
                    duration_hours: None,
                    session_ms: None,
                    event,
                }
            }
            (ClockKind::Out, PairingState::PendingEntry(entry)) => {
                *state = PairingState::Idle;
                let ms = event
                    .timestamp
                    .signed_duration_since(entry)
                    .num_milliseconds();
                LedgerRow {
                    entry_time: Some(entry),
                    duration_hours: Some(round_hours(hours_from_ms(ms))),
                    session_ms: Some(ms),
                    event,
                }
            }
            (ClockKind::Out, PairingState::Idle) => LedgerRow {
                entry_time: None,
                duration_hours: None,
                session_ms: None,
                event,
            },
        };
        rows.push(row);
    }

    rows
}

/// Total worked hours across all paired sessions in the rows.
///
/// Sums full-precision milliseconds first, then rounds once.
#[must_use]
pub fn total_hours(rows: &[LedgerRow]) -> f64 {
    let ms: i64 = rows.iter().filter_map(|row| row.session_ms).sum();
    round_hours(hours_from_ms(ms))
}

/// Total worked hours per employee, for admin-wide reporting.
#[must_use]
pub fn totals_by_employee(rows: &[LedgerRow]) -> HashMap<EmployeeId, f64> {
    let mut ms_totals: HashMap<EmployeeId, i64> = HashMap::new();
    for row in rows {
        if let Some(ms) = row.session_ms {
            *ms_totals.entry(row.event.employee_id.clone()).or_insert(0) += ms;
        }
    }
    ms_totals
        .into_iter()
        .map(|(id, ms)| (id, round_hours(hours_from_ms(ms))))
        .collect()
}

/// Rounds hours to 2 decimal places.
#[must_use]
pub fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

#[allow(clippy::cast_precision_loss)]
fn hours_from_ms(ms: i64) -> f64 {
    ms as f64 / MS_PER_HOUR
}
