//! Log command: raw clock events, newest first.

use std::collections::HashMap;
use std::fmt::Write;

use anyhow::{Context, Result};
use chrono::{Local, TimeZone};

use att_core::{AttendanceEvent, EmployeeId, QueryWindow};
use att_db::{Database, SortOrder};

/// Runs the log command.
pub fn run(
    db: &Database,
    scope: Option<&EmployeeId>,
    window: QueryWindow,
    json: bool,
) -> Result<()> {
    let events = db
        .list_events(scope, window, SortOrder::Descending)
        .context("failed to list events")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }

    let names = display_names(db)?;
    print!("{}", format_log(&events, &names, &Local));
    Ok(())
}

/// Maps employee IDs to display names for rendering.
pub(crate) fn display_names(db: &Database) -> Result<HashMap<EmployeeId, String>> {
    let employees = db.list_employees().context("failed to list employees")?;
    Ok(employees
        .into_iter()
        .map(|summary| (summary.employee.id.clone(), summary.employee.display_name()))
        .collect())
}

fn format_log<Tz: TimeZone>(
    events: &[AttendanceEvent],
    names: &HashMap<EmployeeId, String>,
    tz: &Tz,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut output = String::new();
    if events.is_empty() {
        writeln!(output, "No events recorded.").unwrap();
        return output;
    }
    writeln!(
        output,
        "{:<12}{:<7}{:<24}{:<6}{}",
        "DATE", "TIME", "EMPLOYEE", "EVENT", "CITY"
    )
    .unwrap();
    for event in events {
        let local = event.timestamp.with_timezone(tz);
        let name = names
            .get(&event.employee_id)
            .map_or(event.employee_id.as_str(), String::as_str);
        let city = event
            .location
            .as_ref()
            .and_then(|point| point.city.as_deref())
            .unwrap_or("-");
        writeln!(
            output,
            "{:<12}{:<7}{:<24}{:<6}{}",
            local.format("%Y-%m-%d"),
            local.format("%H:%M"),
            name,
            event.kind,
            city
        )
        .unwrap();
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use insta::assert_snapshot;

    use att_core::{ClockKind, EventId, GeoPoint};

    fn event(id: &str, kind: ClockKind, hour: u32, minute: u32) -> AttendanceEvent {
        AttendanceEvent {
            id: EventId::new(id).unwrap(),
            employee_id: EmployeeId::new("emp-1").unwrap(),
            kind,
            timestamp: Utc.with_ymd_and_hms(2025, 3, 10, hour, minute, 0).unwrap(),
            location: None,
        }
    }

    #[test]
    fn format_log_empty() {
        assert_snapshot!(format_log(&[], &HashMap::new(), &Utc), @"No events recorded.");
    }

    #[test]
    fn format_log_renders_rows() {
        let mut events = vec![event("evt-2", ClockKind::Out, 13, 0), {
            let mut clocked_in = event("evt-1", ClockKind::In, 9, 0);
            clocked_in.location = Some(GeoPoint {
                latitude: 45.4642,
                longitude: 9.19,
                address: None,
                city: Some("Milano".to_string()),
            });
            clocked_in
        }];
        let names = HashMap::from([(
            EmployeeId::new("emp-1").unwrap(),
            "Rossi Anna".to_string(),
        )]);

        assert_snapshot!(format_log(&events, &names, &Utc), @r"
        DATE        TIME   EMPLOYEE                EVENT CITY
        2025-03-10  13:00  Rossi Anna              out   -
        2025-03-10  09:00  Rossi Anna              in    Milano
        ");

        // Unknown employees fall back to the raw ID.
        events[0].employee_id = EmployeeId::new("ghost").unwrap();
        let rendered = format_log(&events, &names, &Utc);
        assert!(rendered.contains("ghost"));
    }
}
