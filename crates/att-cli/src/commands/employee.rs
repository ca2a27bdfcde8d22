//! Employee account management commands.

use std::fmt::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use att_core::{EmployeeId, Role, normalize_name};
use att_db::{Database, EmployeeSummary, EmployeeUpdate};

/// Creates an employee account and prints its ID.
pub fn add(db: &Database, name: &str, surname: &str, admin: bool) -> Result<()> {
    let name = normalize_name(name).context("invalid name")?;
    let surname = normalize_name(surname).context("invalid surname")?;
    let role = if admin { Role::Admin } else { Role::Employee };

    let employee = db
        .create_employee(&name, &surname, role)
        .context("failed to create employee")?;
    println!(
        "Created {} {} ({})",
        employee.display_name(),
        employee.role,
        employee.id
    );
    Ok(())
}

#[derive(Debug, Serialize)]
struct JsonEmployee<'a> {
    id: &'a str,
    name: &'a str,
    surname: &'a str,
    role: &'a str,
    event_count: i64,
}

/// Lists employees, surname ascending, with event counts.
pub fn list(db: &Database, json: bool) -> Result<()> {
    let employees = db.list_employees().context("failed to list employees")?;

    if json {
        let payload: Vec<JsonEmployee<'_>> = employees
            .iter()
            .map(|summary| JsonEmployee {
                id: summary.employee.id.as_str(),
                name: &summary.employee.name,
                surname: &summary.employee.surname,
                role: summary.employee.role.as_str(),
                event_count: summary.event_count,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print!("{}", format_list(&employees));
    }
    Ok(())
}

fn format_list(employees: &[EmployeeSummary]) -> String {
    let mut output = String::new();
    if employees.is_empty() {
        writeln!(output, "No employees registered.").unwrap();
        return output;
    }
    writeln!(output, "{:<38}{:<24}{:<10}{}", "ID", "EMPLOYEE", "ROLE", "EVENTS").unwrap();
    for summary in employees {
        writeln!(
            output,
            "{:<38}{:<24}{:<10}{}",
            summary.employee.id,
            summary.employee.display_name(),
            summary.employee.role,
            summary.event_count
        )
        .unwrap();
    }
    output
}

/// Applies a partial update to an employee account.
pub fn update(
    db: &Database,
    id: &str,
    name: Option<&str>,
    surname: Option<&str>,
    role: Option<&str>,
) -> Result<()> {
    let id = EmployeeId::new(id).context("invalid employee ID")?;
    let update = EmployeeUpdate {
        name: name
            .map(|raw| normalize_name(raw).context("invalid name"))
            .transpose()?,
        surname: surname
            .map(|raw| normalize_name(raw).context("invalid surname"))
            .transpose()?,
        role: role
            .map(|raw| raw.parse::<Role>().context("invalid role"))
            .transpose()?,
    };

    let employee = db
        .update_employee(&id, &update)
        .context("failed to update employee")?;
    println!(
        "Updated {} {} ({})",
        employee.display_name(),
        employee.role,
        employee.id
    );
    Ok(())
}

/// Deletes an employee account and their events.
pub fn remove(db: &Database, id: &str) -> Result<()> {
    let id = EmployeeId::new(id).context("invalid employee ID")?;
    let employee = db.get_employee(&id).context("failed to load employee")?;
    db.delete_employee(&id)
        .context("failed to remove employee")?;
    println!("Removed {} ({})", employee.display_name(), employee.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use insta::assert_snapshot;

    use att_core::Employee;

    fn summary(id: &str, name: &str, surname: &str, role: Role, count: i64) -> EmployeeSummary {
        EmployeeSummary {
            employee: Employee {
                id: EmployeeId::new(id).unwrap(),
                name: name.to_string(),
                surname: surname.to_string(),
                role,
                created_at: Utc::now(),
            },
            event_count: count,
        }
    }

    #[test]
    fn format_list_empty() {
        assert_snapshot!(format_list(&[]), @"No employees registered.");
    }

    #[test]
    fn format_list_aligns_columns() {
        let employees = vec![
            summary("emp-1", "Luca", "Bianchi", Role::Employee, 12),
            summary("emp-2", "Anna", "Rossi", Role::Admin, 0),
        ];
        assert_snapshot!(format_list(&employees), @r"
        ID                                    EMPLOYEE                ROLE      EVENTS
        emp-1                                 Bianchi Luca            employee  12
        emp-2                                 Rossi Anna              admin     0
        ");
    }
}
