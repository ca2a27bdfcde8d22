//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};

/// Employee attendance ledger.
///
/// Records clock-in/clock-out events, pairs them into work sessions and
/// produces reports and spreadsheet exports.
#[derive(Debug, Parser)]
#[command(name = "att", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Initialize the database.
    Init,

    /// Manage employee accounts.
    Employee {
        #[command(subcommand)]
        action: EmployeeAction,
    },

    /// Record a clock event.
    Clock {
        #[command(subcommand)]
        action: ClockAction,
    },

    /// List raw clock events, newest first.
    Log {
        /// Only show events for this employee.
        #[arg(long)]
        employee: Option<String>,

        #[command(flatten)]
        window: WindowArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show paired work sessions and totals.
    Report {
        /// Report on a single employee; omit for the company-wide view.
        #[arg(long)]
        employee: Option<String>,

        #[command(flatten)]
        window: WindowArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Export work sessions to an XLSX spreadsheet.
    Export {
        /// Export a single employee; omit for the company-wide view.
        #[arg(long)]
        employee: Option<String>,

        #[command(flatten)]
        window: WindowArgs,

        /// Directory to write the spreadsheet into.
        #[arg(long, short, default_value = ".")]
        output: PathBuf,
    },
}

/// Employee account management.
#[derive(Debug, Subcommand)]
pub enum EmployeeAction {
    /// Create an employee account.
    Add {
        name: String,
        surname: String,

        /// Grant the admin role.
        #[arg(long)]
        admin: bool,
    },

    /// List all employees.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Update an employee account.
    Update {
        /// Employee ID.
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        surname: Option<String>,

        /// New role: admin or employee.
        #[arg(long)]
        role: Option<String>,
    },

    /// Delete an employee account and their events.
    Remove {
        /// Employee ID.
        id: String,
    },
}

/// Clock event recording. Any ordering is accepted; pairing happens at
/// read time.
#[derive(Debug, Subcommand)]
pub enum ClockAction {
    /// Clock in.
    In {
        #[command(flatten)]
        args: ClockArgs,
    },

    /// Clock out.
    Out {
        #[command(flatten)]
        args: ClockArgs,
    },
}

/// Shared clock event arguments.
#[derive(Debug, Args)]
pub struct ClockArgs {
    /// Employee ID.
    #[arg(long)]
    pub employee: String,

    /// Latitude of the capture point.
    #[arg(long, requires = "longitude")]
    pub latitude: Option<f64>,

    /// Longitude of the capture point.
    #[arg(long, requires = "latitude")]
    pub longitude: Option<f64>,

    /// Event timestamp (RFC 3339). Defaults to now.
    #[arg(long, value_parser = parse_rfc3339)]
    pub at: Option<DateTime<Utc>>,
}

/// Query window arguments shared by log, report and export.
#[derive(Debug, Args)]
pub struct WindowArgs {
    /// Start date, inclusive (YYYY-MM-DD).
    #[arg(long, conflicts_with = "month")]
    pub from: Option<NaiveDate>,

    /// End date, inclusive (YYYY-MM-DD).
    #[arg(long, conflicts_with = "month")]
    pub to: Option<NaiveDate>,

    /// Calendar month (YYYY-MM).
    #[arg(long, value_parser = parse_month)]
    pub month: Option<NaiveDate>,
}

fn parse_rfc3339(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| format!("invalid RFC 3339 timestamp: {err}"))
}

/// Parses `YYYY-MM` into the first day of that month.
pub fn parse_month(raw: &str) -> Result<NaiveDate, String> {
    let (year, month) = raw
        .split_once('-')
        .ok_or_else(|| format!("invalid month {raw:?}, expected YYYY-MM"))?;
    let year: i32 = year
        .parse()
        .map_err(|_| format!("invalid year in {raw:?}"))?;
    let month: u32 = month
        .parse()
        .map_err(|_| format!("invalid month in {raw:?}"))?;
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| format!("month out of range in {raw:?}"))
}
