//! Export command: write paired work sessions to an XLSX spreadsheet.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, TimeZone};
use rust_xlsxwriter::{Color, Format, FormatBorder, FormatPattern, Workbook, Worksheet};
use unicode_width::UnicodeWidthStr;

use att_core::{EmployeeId, QueryWindow};
use att_db::Database;

use super::report::{ReportData, RenderedRow, generate};

const HEADER_BG: Color = Color::RGB(0x2F75B5);
const BAND_BLUE: Color = Color::RGB(0xEAF3FB);
const BAND_WHITE: Color = Color::RGB(0xFFFFFF);

/// Runs the export command. Returns the path of the written file.
pub fn run(
    db: &Database,
    scope: Option<&EmployeeId>,
    window: QueryWindow,
    output_dir: &Path,
) -> Result<PathBuf> {
    let data = generate(db, scope, window, &Local)?;

    let surname = scope
        .map(|id| db.get_employee(id).context("failed to load employee"))
        .transpose()?
        .map(|employee| employee.surname);
    let filename = export_filename(surname.as_deref(), window, &Local);

    std::fs::create_dir_all(output_dir).context("failed to create output directory")?;
    let path = output_dir.join(filename);
    write_workbook(&data, &path).context("failed to write spreadsheet")?;

    println!("Exported {} row(s) to {}", data.rows.len(), path.display());
    Ok(path)
}

/// Builds the export filename.
///
/// A single employee gets `attendance_{surname}_{YYYY-MM}.xlsx` keyed on the
/// month the window starts in; the company-wide export names both bounds,
/// with `start` and `today` standing in for open ones.
pub fn export_filename<Tz: TimeZone>(
    surname: Option<&str>,
    window: QueryWindow,
    tz: &Tz,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match surname {
        Some(surname) => {
            let month = window
                .start
                .unwrap_or_else(chrono::Utc::now)
                .with_timezone(tz)
                .format("%Y-%m")
                .to_string();
            format!("attendance_{}_{month}.xlsx", surname.to_lowercase())
        }
        None => {
            let from = window.start.map_or_else(
                || "start".to_string(),
                |bound| bound.with_timezone(tz).format("%Y-%m-%d").to_string(),
            );
            let to = window.end.map_or_else(
                || "today".to_string(),
                |bound| bound.with_timezone(tz).format("%Y-%m-%d").to_string(),
            );
            format!("attendance_admin_{from}_{to}.xlsx")
        }
    }
}

/// The personal export carries the raw capture coordinates; the
/// company-wide one names the employee instead.
fn headers(company_wide: bool) -> Vec<&'static str> {
    if company_wide {
        vec![
            "Date", "Time", "Employee", "Event", "Entry", "Hours", "Address", "City",
        ]
    } else {
        vec![
            "Date",
            "Time",
            "Event",
            "Entry",
            "Hours",
            "Latitude",
            "Longitude",
            "Address",
            "City",
        ]
    }
}

fn row_cells(row: &RenderedRow, company_wide: bool) -> Vec<Cell<'_>> {
    let mut cells = vec![Cell::Text(&row.date), Cell::Text(&row.time)];
    if company_wide {
        cells.push(Cell::Text(&row.employee));
    }
    cells.push(Cell::Text(&row.kind));
    cells.push(opt_text(row.entry.as_deref()));
    cells.push(row.hours.map_or(Cell::Empty, Cell::Hours));
    if !company_wide {
        cells.push(row.latitude.map_or(Cell::Empty, Cell::Number));
        cells.push(row.longitude.map_or(Cell::Empty, Cell::Number));
    }
    cells.push(opt_text(row.address.as_deref()));
    cells.push(opt_text(row.city.as_deref()));
    cells
}

fn opt_text(value: Option<&str>) -> Cell<'_> {
    value.map_or(Cell::Empty, Cell::Text)
}

enum Cell<'a> {
    Text(&'a str),
    Hours(f64),
    Number(f64),
    Empty,
}

impl Cell<'_> {
    fn width(&self) -> usize {
        match self {
            Self::Text(text) => UnicodeWidthStr::width(*text),
            Self::Hours(_) => 6,
            Self::Number(_) => 10,
            Self::Empty => 0,
        }
    }
}

/// Writes the spreadsheet: styled header row, frozen panes, banded data
/// rows, auto column widths and a bold TOTAL row when hours were worked.
fn write_workbook(data: &ReportData, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Attendance")?;

    if data.rows.is_empty() {
        worksheet.write(0, 0, "No data available")?;
        workbook.save(path)?;
        return Ok(());
    }

    let company_wide = data.by_employee.is_some();
    let headers = headers(company_wide);

    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::RGB(0xFF_FFFF))
        .set_background_color(HEADER_BG)
        .set_pattern(FormatPattern::Solid)
        .set_border(FormatBorder::Thin);

    for (col, header) in headers.iter().enumerate() {
        worksheet.write_with_format(0, col_index(col), *header, &header_format)?;
    }
    worksheet.set_freeze_panes(1, 0)?;

    let mut col_widths: Vec<usize> = headers.iter().map(|h| UnicodeWidthStr::width(*h)).collect();

    for (row_index, rendered) in data.rows.iter().enumerate() {
        let row = row_number(row_index + 1);
        let band = if row_index % 2 == 0 { BAND_BLUE } else { BAND_WHITE };
        let format = banded_format(band);

        for (col, cell) in row_cells(rendered, company_wide).iter().enumerate() {
            match cell {
                Cell::Text(text) => {
                    worksheet.write_with_format(row, col_index(col), *text, &format)?;
                }
                Cell::Hours(hours) => {
                    let numeric = format.clone().set_num_format("0.00");
                    worksheet.write_with_format(row, col_index(col), *hours, &numeric)?;
                }
                Cell::Number(value) => {
                    worksheet.write_with_format(row, col_index(col), *value, &format)?;
                }
                Cell::Empty => {
                    worksheet.write_with_format(row, col_index(col), "", &format)?;
                }
            }
            col_widths[col] = col_widths[col].max(cell.width());
        }
    }

    if data.total_hours > 0.0 {
        write_total_row(worksheet, data, &headers)?;
    }

    for (col, width) in col_widths.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        worksheet.set_column_width(col_index(col), *width as f64 + 2.0)?;
    }

    workbook.save(path)?;
    Ok(())
}

fn write_total_row(worksheet: &mut Worksheet, data: &ReportData, headers: &[&str]) -> Result<()> {
    let row = row_number(data.rows.len() + 1);
    let bold = Format::new().set_bold().set_border(FormatBorder::Thin);
    let numeric = bold.clone().set_num_format("0.00");

    worksheet.write_with_format(row, 0, "TOTAL", &bold)?;
    let hours_col = headers
        .iter()
        .position(|header| *header == "Hours")
        .unwrap_or(headers.len() - 2);
    worksheet.write_with_format(row, col_index(hours_col), data.total_hours, &numeric)?;
    Ok(())
}

fn banded_format(band: Color) -> Format {
    Format::new()
        .set_background_color(band)
        .set_pattern(FormatPattern::Solid)
        .set_border(FormatBorder::Thin)
}

#[allow(clippy::cast_possible_truncation)]
fn col_index(col: usize) -> u16 {
    col as u16
}

#[allow(clippy::cast_possible_truncation)]
fn row_number(row: usize) -> u32 {
    row as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn march() -> QueryWindow {
        QueryWindow::from_dates(
            NaiveDate::from_ymd_opt(2025, 3, 1),
            NaiveDate::from_ymd_opt(2025, 3, 31),
        )
    }

    #[test]
    fn personal_filename_uses_surname_and_month() {
        let window = QueryWindow {
            start: Some(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()),
            end: Some(Utc.with_ymd_and_hms(2025, 3, 31, 23, 59, 59).unwrap()),
        };
        let filename = export_filename(Some("Rossi"), window, &Utc);
        assert_eq!(filename, "attendance_rossi_2025-03.xlsx");
    }

    #[test]
    fn admin_filename_names_both_bounds() {
        let window = QueryWindow {
            start: Some(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()),
            end: Some(Utc.with_ymd_and_hms(2025, 3, 10, 23, 59, 59).unwrap()),
        };
        let filename = export_filename(None, window, &Utc);
        assert_eq!(filename, "attendance_admin_2025-03-01_2025-03-10.xlsx");
    }

    #[test]
    fn admin_filename_open_bounds_use_placeholders() {
        let filename = export_filename(None, QueryWindow::open(), &Utc);
        assert_eq!(filename, "attendance_admin_start_today.xlsx");
    }

    #[test]
    fn row_cells_drop_employee_column_for_personal_export() {
        let row = RenderedRow {
            date: "2025-03-10".to_string(),
            time: "09:00".to_string(),
            employee: "Rossi Anna".to_string(),
            kind: "in".to_string(),
            entry: None,
            hours: None,
            latitude: Some(45.4642),
            longitude: Some(9.19),
            address: Some("Piazza del Duomo, Milano".to_string()),
            city: Some("Milano".to_string()),
        };
        assert_eq!(row_cells(&row, false).len(), headers(false).len());
        assert_eq!(row_cells(&row, true).len(), headers(true).len());
    }

    #[test]
    fn personal_headers_carry_coordinate_columns() {
        let personal = headers(false);
        assert!(personal.contains(&"Latitude"));
        assert!(personal.contains(&"Longitude"));
        assert!(personal.contains(&"Address"));

        let company = headers(true);
        assert!(!company.contains(&"Latitude"));
        assert!(company.contains(&"Address"));
    }

    #[test]
    fn generate_is_deterministic_for_a_fixed_event_set() {
        let db = Database::open_in_memory().unwrap();
        let anna = db
            .create_employee("Anna", "Rossi", att_core::Role::Employee)
            .unwrap();

        for (kind, hour) in [
            (att_core::ClockKind::In, 9),
            (att_core::ClockKind::Out, 13),
            (att_core::ClockKind::In, 14),
            (att_core::ClockKind::Out, 17),
        ] {
            let event = att_core::AttendanceEvent {
                id: att_db::new_event_id(),
                employee_id: anna.id.clone(),
                kind,
                timestamp: Utc.with_ymd_and_hms(2025, 3, 10, hour, 0, 0).unwrap(),
                location: None,
            };
            db.insert_event(&event).unwrap();
        }

        let first = generate(&db, Some(&anna.id), march(), &Utc).unwrap();
        let second = generate(&db, Some(&anna.id), march(), &Utc).unwrap();
        assert_eq!(first.rows, second.rows);
        assert!((first.total_hours - second.total_hours).abs() < f64::EPSILON);
    }

    #[test]
    fn export_writes_file_with_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let anna = db
            .create_employee("Anna", "Rossi", att_core::Role::Employee)
            .unwrap();

        for (kind, hour) in [(att_core::ClockKind::In, 9), (att_core::ClockKind::Out, 13)] {
            let event = att_core::AttendanceEvent {
                id: att_db::new_event_id(),
                employee_id: anna.id.clone(),
                kind,
                timestamp: Utc.with_ymd_and_hms(2025, 3, 10, hour, 0, 0).unwrap(),
                location: None,
            };
            db.insert_event(&event).unwrap();
        }

        let path = run(&db, Some(&anna.id), march(), dir.path()).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "attendance_rossi_2025-03.xlsx"
        );
        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn export_empty_period_still_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let anna = db
            .create_employee("Anna", "Rossi", att_core::Role::Employee)
            .unwrap();

        let path = run(&db, Some(&anna.id), march(), dir.path()).unwrap();
        assert!(path.exists());
    }
}
