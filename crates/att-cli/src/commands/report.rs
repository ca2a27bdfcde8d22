//! Report command: paired work sessions and hour totals.

use std::collections::HashMap;
use std::fmt::Write;

use anyhow::{Context, Result};
use chrono::{Local, TimeZone};
use serde::Serialize;

use att_core::{
    ClockKind, EmployeeId, LedgerRow, QueryWindow, build_ledger, total_hours, totals_by_employee,
};
use att_db::{Database, SortOrder};

use super::log::display_names;

/// A ledger row rendered for display, timestamps already localized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedRow {
    pub date: String,
    pub time: String,
    pub employee: String,
    pub kind: String,
    /// Paired clock-in date and time, present only on rows that close a
    /// session. Carries the full date so overnight sessions stay readable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
    /// Session duration in hours, rounded to two decimals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

/// Computed report data.
#[derive(Debug, Serialize)]
pub struct ReportData {
    /// Display name when scoped to one employee.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub period: String,
    pub rows: Vec<RenderedRow>,
    /// Per-employee hour totals, present in the company-wide view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_employee: Option<Vec<(String, f64)>>,
    pub total_hours: f64,
}

/// Renders ledger rows for display in the given timezone.
pub fn render_rows<Tz: TimeZone>(
    rows: &[LedgerRow],
    names: &HashMap<EmployeeId, String>,
    tz: &Tz,
) -> Vec<RenderedRow>
where
    Tz::Offset: std::fmt::Display,
{
    rows.iter()
        .map(|row| {
            let local = row.event.timestamp.with_timezone(tz);
            let location = row.event.location.as_ref();
            RenderedRow {
                date: local.format("%Y-%m-%d").to_string(),
                time: local.format("%H:%M").to_string(),
                employee: names
                    .get(&row.event.employee_id)
                    .cloned()
                    .unwrap_or_else(|| row.event.employee_id.to_string()),
                kind: row.event.kind.to_string(),
                entry: match row.event.kind {
                    // The IN row's entry is itself; only OUT rows show the
                    // paired clock-in date and time.
                    ClockKind::In => None,
                    ClockKind::Out => row.entry_time.map(|entry| {
                        entry.with_timezone(tz).format("%Y-%m-%d %H:%M").to_string()
                    }),
                },
                hours: row.duration_hours,
                latitude: location.map(|point| point.latitude),
                longitude: location.map(|point| point.longitude),
                address: location.and_then(|point| point.address.clone()),
                city: location.and_then(|point| point.city.clone()),
            }
        })
        .collect()
}

/// Describes the window for the report header, matching the naming the
/// export filenames use for open bounds.
pub fn describe_window<Tz: TimeZone>(window: QueryWindow, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let start = window.start.map_or_else(
        || "start".to_string(),
        |bound| bound.with_timezone(tz).format("%Y-%m-%d").to_string(),
    );
    let end = window.end.map_or_else(
        || "today".to_string(),
        |bound| bound.with_timezone(tz).format("%Y-%m-%d").to_string(),
    );
    format!("{start} to {end}")
}

/// Builds report data from the store.
pub fn generate<Tz: TimeZone>(
    db: &Database,
    scope: Option<&EmployeeId>,
    window: QueryWindow,
    tz: &Tz,
) -> Result<ReportData>
where
    Tz::Offset: std::fmt::Display,
{
    let scope_name = scope
        .map(|id| db.get_employee(id).context("failed to load employee"))
        .transpose()?
        .map(|employee| employee.display_name());

    let events = db
        .list_events(scope, window, SortOrder::Ascending)
        .context("failed to list events")?;
    let ledger = build_ledger(events);
    let total = total_hours(&ledger);
    let names = display_names(db)?;

    let by_employee = if scope.is_none() {
        let mut totals: Vec<(String, f64)> = totals_by_employee(&ledger)
            .into_iter()
            .map(|(id, hours)| {
                let name = names.get(&id).cloned().unwrap_or_else(|| id.to_string());
                (name, hours)
            })
            .collect();
        totals.sort_by(|a, b| a.0.cmp(&b.0));
        Some(totals)
    } else {
        None
    };

    Ok(ReportData {
        scope: scope_name,
        period: describe_window(window, tz),
        rows: render_rows(&ledger, &names, tz),
        by_employee,
        total_hours: total,
    })
}

/// Formats the human-readable report output.
pub fn format_report(data: &ReportData) -> String {
    let mut output = String::new();

    match &data.scope {
        Some(name) => writeln!(output, "ATTENDANCE: {name}").unwrap(),
        None => writeln!(output, "ATTENDANCE: all employees").unwrap(),
    }
    writeln!(output, "Period: {}", data.period).unwrap();
    writeln!(output).unwrap();

    if data.rows.is_empty() {
        writeln!(output, "No events in this period.").unwrap();
        return output;
    }

    writeln!(
        output,
        "{:<12}{:<7}{:<24}{:<7}{:<18}{:>6}  {}",
        "DATE", "TIME", "EMPLOYEE", "EVENT", "ENTRY", "HOURS", "CITY"
    )
    .unwrap();
    for row in &data.rows {
        let entry = row.entry.as_deref().unwrap_or("-");
        let hours = row
            .hours
            .map_or_else(|| "-".to_string(), |hours| format!("{hours:.2}"));
        let city = row.city.as_deref().unwrap_or("-");
        writeln!(
            output,
            "{:<12}{:<7}{:<24}{:<7}{:<18}{:>6}  {}",
            row.date, row.time, row.employee, row.kind, entry, hours, city
        )
        .unwrap();
    }

    if let Some(by_employee) = &data.by_employee {
        writeln!(output).unwrap();
        writeln!(output, "BY EMPLOYEE").unwrap();
        for (name, hours) in by_employee {
            writeln!(output, "{name:<30}{hours:>6.2}").unwrap();
        }
    }

    writeln!(output).unwrap();
    writeln!(output, "TOTAL: {:.2} hours", data.total_hours).unwrap();
    output
}

/// Runs the report command.
pub fn run(
    db: &Database,
    scope: Option<&EmployeeId>,
    window: QueryWindow,
    json: bool,
) -> Result<()> {
    let data = generate(db, scope, window, &Local)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        print!("{}", format_report(&data));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use insta::assert_snapshot;

    use att_core::{AttendanceEvent, ClockKind, EventId, GeoPoint};

    fn event(id: &str, kind: ClockKind, day: u32, hour: u32, minute: u32) -> AttendanceEvent {
        AttendanceEvent {
            id: EventId::new(id).unwrap(),
            employee_id: EmployeeId::new("emp-1").unwrap(),
            kind,
            timestamp: Utc.with_ymd_and_hms(2025, 3, day, hour, minute, 0).unwrap(),
            location: None,
        }
    }

    fn names() -> HashMap<EmployeeId, String> {
        HashMap::from([(
            EmployeeId::new("emp-1").unwrap(),
            "Rossi Anna".to_string(),
        )])
    }

    #[test]
    fn report_empty_period() {
        let data = ReportData {
            scope: Some("Rossi Anna".to_string()),
            period: "2025-03-01 to 2025-03-31".to_string(),
            rows: vec![],
            by_employee: None,
            total_hours: 0.0,
        };
        assert_snapshot!(format_report(&data), @r"
        ATTENDANCE: Rossi Anna
        Period: 2025-03-01 to 2025-03-31

        No events in this period.
        ");
    }

    #[test]
    fn report_paired_sessions() {
        let mut events = vec![
            event("evt-1", ClockKind::In, 10, 9, 0),
            event("evt-2", ClockKind::Out, 10, 13, 0),
            event("evt-3", ClockKind::In, 10, 14, 0),
            event("evt-4", ClockKind::Out, 10, 17, 30),
        ];
        events[0].location = Some(GeoPoint {
            latitude: 45.4642,
            longitude: 9.19,
            address: None,
            city: Some("Milano".to_string()),
        });

        let ledger = build_ledger(events);
        let data = ReportData {
            scope: Some("Rossi Anna".to_string()),
            period: "2025-03-01 to 2025-03-31".to_string(),
            total_hours: total_hours(&ledger),
            rows: render_rows(&ledger, &names(), &Utc),
            by_employee: None,
        };

        assert_snapshot!(format_report(&data), @r"
        ATTENDANCE: Rossi Anna
        Period: 2025-03-01 to 2025-03-31

        DATE        TIME   EMPLOYEE                EVENT  ENTRY              HOURS  CITY
        2025-03-10  09:00  Rossi Anna              in     -                      -  Milano
        2025-03-10  13:00  Rossi Anna              out    2025-03-10 09:00    4.00  -
        2025-03-10  14:00  Rossi Anna              in     -                      -  -
        2025-03-10  17:30  Rossi Anna              out    2025-03-10 14:00    3.50  -

        TOTAL: 7.50 hours
        ");
    }

    #[test]
    fn overnight_session_entry_keeps_its_date() {
        // IN 23:00 → OUT 07:00 the next day: the OUT row must show which
        // day the session started on.
        let ledger = build_ledger(vec![
            event("evt-1", ClockKind::In, 10, 23, 0),
            event("evt-2", ClockKind::Out, 11, 7, 0),
        ]);
        let rows = render_rows(&ledger, &names(), &Utc);

        assert_eq!(rows[1].date, "2025-03-11");
        assert_eq!(rows[1].entry.as_deref(), Some("2025-03-10 23:00"));
        assert_eq!(rows[1].hours, Some(8.0));
    }

    #[test]
    fn rendered_rows_carry_location_fields() {
        let mut clock_in = event("evt-1", ClockKind::In, 10, 9, 0);
        clock_in.location = Some(GeoPoint {
            latitude: 45.4642,
            longitude: 9.19,
            address: Some("Piazza del Duomo, Milano".to_string()),
            city: Some("Milano".to_string()),
        });

        let ledger = build_ledger(vec![clock_in]);
        let rows = render_rows(&ledger, &names(), &Utc);

        assert_eq!(rows[0].latitude, Some(45.4642));
        assert_eq!(rows[0].longitude, Some(9.19));
        assert_eq!(rows[0].address.as_deref(), Some("Piazza del Duomo, Milano"));
        assert_eq!(rows[0].city.as_deref(), Some("Milano"));
    }

    #[test]
    fn report_orphan_out_has_empty_duration() {
        let ledger = build_ledger(vec![event("evt-1", ClockKind::Out, 10, 13, 0)]);
        let rows = render_rows(&ledger, &names(), &Utc);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].entry.is_none());
        assert!(rows[0].hours.is_none());
    }

    #[test]
    fn company_wide_report_lists_by_employee() {
        let ledger = build_ledger(vec![
            event("evt-1", ClockKind::In, 10, 9, 0),
            event("evt-2", ClockKind::Out, 10, 13, 0),
        ]);
        let data = ReportData {
            scope: None,
            period: "2025-03-01 to 2025-03-10".to_string(),
            total_hours: total_hours(&ledger),
            by_employee: Some(vec![("Rossi Anna".to_string(), 4.0)]),
            rows: render_rows(&ledger, &names(), &Utc),
        };

        let output = format_report(&data);
        assert!(output.contains("ATTENDANCE: all employees"));
        assert!(output.contains("BY EMPLOYEE"));
        assert!(output.contains("Rossi Anna"));
        assert!(output.contains("TOTAL: 4.00 hours"));
    }

    #[test]
    fn describe_window_names_open_bounds() {
        assert_eq!(describe_window(QueryWindow::open(), &Utc), "start to today");

        let window = QueryWindow {
            start: Some(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()),
            end: None,
        };
        assert_eq!(describe_window(window, &Utc), "2025-03-01 to today");
    }

    #[test]
    fn json_report_skips_empty_fields() {
        let data = ReportData {
            scope: None,
            period: "start to today".to_string(),
            rows: vec![],
            by_employee: None,
            total_hours: 0.0,
        };
        let json = serde_json::to_string(&data).unwrap();
        assert!(!json.contains("scope"));
        assert!(!json.contains("by_employee"));
        assert!(json.contains("total_hours"));
    }
}
