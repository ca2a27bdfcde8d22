//! Clock command: record an attendance event, geocoding best-effort.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use att_core::{AttendanceEvent, ClockKind, EmployeeId, GeoPoint};
use att_db::{Database, new_event_id};

use crate::Config;
use crate::cli::ClockArgs;

/// Runs the clock command.
///
/// The event is always recorded, even when reverse geocoding fails: a
/// resolver outage must never block an employee from clocking.
pub fn run(db: &Database, config: &Config, kind: ClockKind, args: &ClockArgs) -> Result<()> {
    let employee_id = EmployeeId::new(args.employee.clone()).context("invalid employee ID")?;
    let employee = db
        .get_employee(&employee_id)
        .context("failed to load employee")?;

    let timestamp = args.at.unwrap_or_else(Utc::now);
    let location = match (args.latitude, args.longitude) {
        (Some(latitude), Some(longitude)) => Some(resolve_location(config, latitude, longitude)),
        _ => None,
    };

    let event = AttendanceEvent {
        id: new_event_id(),
        employee_id,
        kind,
        timestamp,
        location,
    };
    db.insert_event(&event).context("failed to record event")?;

    println!(
        "{} clocked {} at {}",
        employee.display_name(),
        kind,
        format_local(timestamp)
    );
    if let Some(point) = &event.location {
        match &point.city {
            Some(city) => println!("Location: {city}"),
            None => println!("Location: {:.4}, {:.4}", point.latitude, point.longitude),
        }
    }
    Ok(())
}

/// Reverse-geocodes the capture point, degrading to bare coordinates.
fn resolve_location(config: &Config, latitude: f64, longitude: f64) -> GeoPoint {
    let client = match &config.geocoder_url {
        Some(url) => att_geo::Client::with_base_url(url.clone()),
        None => att_geo::Client::new(),
    };
    let client = match client {
        Ok(client) => client,
        Err(err) => {
            tracing::warn!(error = %err, "failed to build geocoding client");
            return GeoPoint::new(latitude, longitude);
        }
    };
    match tokio::runtime::Runtime::new() {
        Ok(runtime) => {
            let place = runtime.block_on(client.resolve_best_effort(latitude, longitude));
            att_geo::located(latitude, longitude, place)
        }
        Err(err) => {
            tracing::warn!(error = %err, "failed to start async runtime for geocoding");
            GeoPoint::new(latitude, longitude)
        }
    }
}

fn format_local(timestamp: DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&chrono::Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}
