//! Init command: create the database and its schema.

use anyhow::Result;

use att_db::Database;

/// Runs the init command. Opening the database creates the schema, so this
/// only needs to report where it landed.
pub fn run(db: &Database, path: &std::path::Path) -> Result<()> {
    // Schema creation happened in Database::open; prove the store answers.
    let employees = db.list_employees()?;
    println!("Database ready at {}", path.display());
    println!("{} employee(s) registered", employees.len());
    Ok(())
}
