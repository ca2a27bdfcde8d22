//! Storage layer for the attendance ledger.
//!
//! Provides persistence for employees and attendance events using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but
//! not `Sync`. For multi-threaded access, serialize with a `Mutex` or open
//! separate instances per thread.
//!
//! # Schema
//!
//! Timestamps are stored as TEXT in RFC 3339 format with millisecond
//! precision, always UTC (e.g., `2025-03-10T09:00:00.000Z`). This keeps
//! lexicographic ordering aligned with chronological ordering and the
//! values human-readable.
//!
//! The events table is append-only: the domain has no update or delete
//! primitive for attendance events (deleting an employee cascades, which is
//! an account-management operation, not a ledger one).

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;
use uuid::Uuid;

use att_core::{
    AttendanceEvent, ClockKind, Employee, EmployeeId, EventId, GeoPoint, QueryWindow, Role,
};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// The referenced employee does not exist.
    #[error("employee not found: {employee_id}")]
    EmployeeNotFound { employee_id: String },
    /// An employee with the same normalized name and surname already exists.
    #[error("an employee named {surname} {name} already exists")]
    DuplicateEmployee { name: String, surname: String },
    /// Deleting this account would leave no admin.
    #[error("cannot remove the last admin account")]
    LastAdmin,
    /// A stored value failed validation when read back.
    #[error("invalid stored value in {table}.{column}: {message}")]
    InvalidStoredValue {
        table: &'static str,
        column: &'static str,
        message: String,
    },
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp for {id}: {timestamp}")]
    TimestampParse {
        id: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Sort order for event queries.
///
/// Listings fetch descending for display; the pairing engine re-sorts
/// ascending internally either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// An employee with their recorded event count, for admin listings.
#[derive(Debug, Clone)]
pub struct EmployeeSummary {
    pub employee: Employee,
    pub event_count: i64,
}

/// Partial update for an employee account.
#[derive(Debug, Clone, Default)]
pub struct EmployeeUpdate {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub role: Option<Role>,
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection
    /// closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS employees (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                surname TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'employee',
                created_at TEXT NOT NULL,
                UNIQUE (name, surname)
            );

            CREATE INDEX IF NOT EXISTS idx_employees_surname ON employees(surname);

            -- Events table: append-only attendance ledger
            -- timestamp: RFC 3339 UTC with millisecond precision
            CREATE TABLE IF NOT EXISTS events (
                id TEXT PRIMARY KEY,
                employee_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                latitude REAL,
                longitude REAL,
                address TEXT,
                city TEXT,
                FOREIGN KEY (employee_id) REFERENCES employees(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(timestamp);
            CREATE INDEX IF NOT EXISTS idx_events_employee ON events(employee_id);
            ",
        )?;
        Ok(())
    }

    // ========== Employee registry ==========

    /// Creates an employee account. Names must already be normalized.
    pub fn create_employee(
        &self,
        name: &str,
        surname: &str,
        role: Role,
    ) -> Result<Employee, DbError> {
        if self.find_by_name(name, surname)?.is_some() {
            return Err(DbError::DuplicateEmployee {
                name: name.to_string(),
                surname: surname.to_string(),
            });
        }

        let employee = Employee {
            id: new_employee_id(),
            name: name.to_string(),
            surname: surname.to_string(),
            role,
            created_at: Utc::now(),
        };
        self.conn.execute(
            "INSERT INTO employees (id, name, surname, role, created_at) VALUES (?, ?, ?, ?, ?)",
            params![
                employee.id.as_str(),
                employee.name,
                employee.surname,
                employee.role.as_str(),
                format_timestamp(employee.created_at),
            ],
        )?;
        tracing::info!(employee_id = %employee.id, "employee created");
        Ok(employee)
    }

    /// Fetches an employee by ID.
    pub fn get_employee(&self, id: &EmployeeId) -> Result<Employee, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, surname, role, created_at FROM employees WHERE id = ?",
                [id.as_str()],
                employee_columns,
            )
            .optional()?;
        match row {
            Some(raw) => parse_employee(raw),
            None => Err(DbError::EmployeeNotFound {
                employee_id: id.to_string(),
            }),
        }
    }

    /// Lists all employees with their event counts, surname ascending.
    pub fn list_employees(&self) -> Result<Vec<EmployeeSummary>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT e.id, e.name, e.surname, e.role, e.created_at, COUNT(ev.id)
            FROM employees e
            LEFT JOIN events ev ON ev.employee_id = e.id
            GROUP BY e.id
            ORDER BY e.surname ASC, e.name ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((employee_columns(row)?, row.get::<_, i64>(5)?))
        })?;
        let mut employees = Vec::new();
        for row in rows {
            let (raw, event_count) = row?;
            employees.push(EmployeeSummary {
                employee: parse_employee(raw)?,
                event_count,
            });
        }
        Ok(employees)
    }

    /// Applies a partial update, checking the unique name constraint when
    /// the display name changes.
    pub fn update_employee(
        &self,
        id: &EmployeeId,
        update: &EmployeeUpdate,
    ) -> Result<Employee, DbError> {
        let existing = self.get_employee(id)?;

        let name = update.name.clone().unwrap_or(existing.name);
        let surname = update.surname.clone().unwrap_or(existing.surname);
        let role = update.role.unwrap_or(existing.role);

        if let Some(conflict) = self.find_by_name(&name, &surname)? {
            if conflict != *id {
                return Err(DbError::DuplicateEmployee { name, surname });
            }
        }

        self.conn.execute(
            "UPDATE employees SET name = ?, surname = ?, role = ? WHERE id = ?",
            params![name, surname, role.as_str(), id.as_str()],
        )?;
        self.get_employee(id)
    }

    /// Deletes an employee and, by cascade, their events.
    ///
    /// Refuses to remove the last remaining admin account so the registry
    /// can never become unmanageable.
    pub fn delete_employee(&self, id: &EmployeeId) -> Result<(), DbError> {
        let existing = self.get_employee(id)?;
        if existing.role == Role::Admin && self.admin_count()? <= 1 {
            return Err(DbError::LastAdmin);
        }
        self.conn
            .execute("DELETE FROM employees WHERE id = ?", [id.as_str()])?;
        tracing::info!(employee_id = %id, "employee removed");
        Ok(())
    }

    fn find_by_name(&self, name: &str, surname: &str) -> Result<Option<EmployeeId>, DbError> {
        let id: Option<String> = self
            .conn
            .query_row(
                "SELECT id FROM employees WHERE name = ? AND surname = ?",
                params![name, surname],
                |row| row.get(0),
            )
            .optional()?;
        match id {
            Some(raw) => Ok(Some(EmployeeId::new(raw).map_err(|err| {
                DbError::InvalidStoredValue {
                    table: "employees",
                    column: "id",
                    message: err.to_string(),
                }
            })?)),
            None => Ok(None),
        }
    }

    fn admin_count(&self) -> Result<i64, DbError> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM employees WHERE role = 'admin'",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ========== Event store ==========

    /// Appends an attendance event. Events are never updated or deleted.
    ///
    /// Returns [`DbError::EmployeeNotFound`] when the owning employee does
    /// not exist, keeping not-found distinct from validation failures.
    pub fn insert_event(&self, event: &AttendanceEvent) -> Result<(), DbError> {
        // Surface a domain error instead of a foreign-key violation.
        self.get_employee(&event.employee_id)?;

        let (latitude, longitude, address, city) = match &event.location {
            Some(point) => (
                Some(point.latitude),
                Some(point.longitude),
                point.address.clone(),
                point.city.clone(),
            ),
            None => (None, None, None, None),
        };
        self.conn.execute(
            "
            INSERT INTO events (id, employee_id, kind, timestamp, latitude, longitude, address, city)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ",
            params![
                event.id.as_str(),
                event.employee_id.as_str(),
                event.kind.as_str(),
                format_timestamp(event.timestamp),
                latitude,
                longitude,
                address,
                city,
            ],
        )?;
        tracing::debug!(event_id = %event.id, kind = %event.kind, "event recorded");
        Ok(())
    }

    /// Lists events, optionally scoped to one employee and a query window.
    ///
    /// Window bounds are inclusive on both ends. Timestamp ties are broken
    /// by insertion order so same-instant captures stay deterministic.
    pub fn list_events(
        &self,
        scope: Option<&EmployeeId>,
        window: QueryWindow,
        order: SortOrder,
    ) -> Result<Vec<AttendanceEvent>, DbError> {
        let mut sql = String::from(
            "SELECT id, employee_id, kind, timestamp, latitude, longitude, address, city
             FROM events WHERE 1=1",
        );
        let mut bindings: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(employee_id) = scope {
            sql.push_str(" AND employee_id = ?");
            bindings.push(Box::new(employee_id.as_str().to_string()));
        }
        if let Some(start) = window.start {
            sql.push_str(" AND timestamp >= ?");
            bindings.push(Box::new(format_timestamp(start)));
        }
        if let Some(end) = window.end {
            sql.push_str(" AND timestamp <= ?");
            bindings.push(Box::new(format_timestamp(end)));
        }
        sql.push_str(match order {
            SortOrder::Ascending => " ORDER BY timestamp ASC, rowid ASC",
            SortOrder::Descending => " ORDER BY timestamp DESC, rowid DESC",
        });

        let mut stmt = self.conn.prepare(&sql)?;
        let params = rusqlite::params_from_iter(bindings.iter().map(Box::as_ref));
        let rows = stmt.query_map(params, event_columns)?;

        let mut events = Vec::new();
        for row in rows {
            events.push(parse_event(row?)?);
        }
        Ok(events)
    }
}

fn new_employee_id() -> EmployeeId {
    // UUID v4 strings are never empty, so validation cannot fail here.
    EmployeeId::new(Uuid::new_v4().to_string()).unwrap_or_else(|_| unreachable!())
}

/// Generates a fresh event ID.
#[must_use]
pub fn new_event_id() -> EventId {
    EventId::new(Uuid::new_v4().to_string()).unwrap_or_else(|_| unreachable!())
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(timestamp: &str, id: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            id: id.to_string(),
            timestamp: timestamp.to_string(),
            source,
        })
}

type RawEmployee = (String, String, String, String, String);

fn employee_columns(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEmployee> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

fn parse_employee(raw: RawEmployee) -> Result<Employee, DbError> {
    let (id, name, surname, role, created_at) = raw;
    let created_at = parse_timestamp(&created_at, &id)?;
    let role = role
        .parse::<Role>()
        .map_err(|err| DbError::InvalidStoredValue {
            table: "employees",
            column: "role",
            message: err.to_string(),
        })?;
    let id = EmployeeId::new(id).map_err(|err| DbError::InvalidStoredValue {
        table: "employees",
        column: "id",
        message: err.to_string(),
    })?;
    Ok(Employee {
        id,
        name,
        surname,
        role,
        created_at,
    })
}

#[allow(clippy::type_complexity)]
type RawEvent = (
    String,
    String,
    String,
    String,
    Option<f64>,
    Option<f64>,
    Option<String>,
    Option<String>,
);

fn event_columns(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEvent> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn parse_event(raw: RawEvent) -> Result<AttendanceEvent, DbError> {
    let (id, employee_id, kind, timestamp, latitude, longitude, address, city) = raw;
    let timestamp = parse_timestamp(&timestamp, &id)?;
    let kind = kind
        .parse::<ClockKind>()
        .map_err(|err| DbError::InvalidStoredValue {
            table: "events",
            column: "kind",
            message: err.to_string(),
        })?;
    let location = match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Some(GeoPoint {
            latitude,
            longitude,
            address,
            city,
        }),
        _ => None,
    };
    let id = EventId::new(id).map_err(|err| DbError::InvalidStoredValue {
        table: "events",
        column: "id",
        message: err.to_string(),
    })?;
    let employee_id = EmployeeId::new(employee_id).map_err(|err| DbError::InvalidStoredValue {
        table: "events",
        column: "employee_id",
        message: err.to_string(),
    })?;
    Ok(AttendanceEvent {
        id,
        employee_id,
        kind,
        timestamp,
        location,
    })
}
