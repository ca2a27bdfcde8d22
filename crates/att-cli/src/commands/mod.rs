//! CLI subcommand implementations.

pub mod clock;
pub mod employee;
pub mod export;
pub mod init;
pub mod log;
pub mod report;

use chrono::Local;

use att_core::QueryWindow;

use crate::cli::WindowArgs;

/// Resolves query window arguments against the defaults: a month flag wins,
/// explicit dates come next, and with neither an employee-scoped query
/// defaults to the current calendar month while the company-wide view
/// defaults to month-to-date.
pub fn resolve_window(args: &WindowArgs, employee_scoped: bool) -> QueryWindow {
    if let Some(month) = args.month {
        return QueryWindow::calendar_month(month);
    }
    if args.from.is_some() || args.to.is_some() {
        return QueryWindow::from_dates(args.from, args.to);
    }
    let today = Local::now().date_naive();
    if employee_scoped {
        QueryWindow::calendar_month(today)
    } else {
        QueryWindow::month_to_date(today)
    }
}
