//! Query window resolution with inclusive day-bound semantics.
//!
//! Date bounds follow the convention the exports depend on: a start date is
//! inclusive from local `00:00:00.000`, an end date is inclusive through
//! local `23:59:59.999`. Bounds are resolved in local time and converted to
//! UTC for comparison against stored timestamps.

use chrono::{
    DateTime, Datelike, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};

/// A resolved query window; either bound may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryWindow {
    /// Inclusive lower bound.
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound.
    pub end: Option<DateTime<Utc>>,
}

impl QueryWindow {
    /// An unbounded window.
    #[must_use]
    pub const fn open() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    /// Window from optional dates: `from` 00:00:00.000 through `to`
    /// 23:59:59.999, local time.
    #[must_use]
    pub fn from_dates(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self {
            start: from.map(day_start_utc),
            end: to.map(day_end_utc),
        }
    }

    /// The full calendar month containing `date`: first through last day.
    ///
    /// Default window for an employee's own view.
    #[must_use]
    pub fn calendar_month(date: NaiveDate) -> Self {
        let (first, last) = month_bounds(date.year(), date.month());
        Self::from_dates(Some(first), Some(last))
    }

    /// First of the current month through `today`, inclusive.
    ///
    /// Default window for the admin-wide view.
    #[must_use]
    pub fn month_to_date(today: NaiveDate) -> Self {
        let first = first_of_month(today.year(), today.month());
        Self::from_dates(Some(first), Some(today))
    }

    /// True when `timestamp` falls within the window.
    #[must_use]
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| timestamp >= start)
            && self.end.is_none_or(|end| timestamp <= end)
    }
}

/// First and last day of the given month.
#[must_use]
pub fn month_bounds(year: i32, month: u32) -> (NaiveDate, NaiveDate) {
    let first = first_of_month(year, month);
    let next_first = if month == 12 {
        first_of_month(year + 1, 1)
    } else {
        first_of_month(year, month + 1)
    };
    (first, next_first - chrono::Duration::days(1))
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    // Month is validated upstream (clap value parsing / chrono dates), and
    // day 1 exists in every month.
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or_default()
}

/// Local midnight of `date` as UTC.
#[must_use]
pub fn day_start_utc(date: NaiveDate) -> DateTime<Utc> {
    local_to_utc(date.and_time(NaiveTime::MIN))
}

/// Local 23:59:59.999 of `date` as UTC.
#[must_use]
pub fn day_end_utc(date: NaiveDate) -> DateTime<Utc> {
    let end = date.and_time(NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN));
    local_to_utc(end)
}

/// Converts a local datetime to UTC.
/// Handles DST ambiguity by picking the earlier time; a DST gap falls
/// forward one hour.
fn local_to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => {
            let shifted = naive + chrono::Duration::hours(1);
            match Local.from_local_datetime(&shifted) {
                LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
                // Two consecutive gap hours do not occur in real timezones.
                LocalResult::None => Utc.from_utc_datetime(&naive),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_bounds_regular_month() {
        let (first, last) = month_bounds(2025, 4);
        assert_eq!(first, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2025, 4, 30).unwrap());
    }

    #[test]
    fn month_bounds_december_wraps_year() {
        let (first, last) = month_bounds(2025, 12);
        assert_eq!(first, NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    }

    #[test]
    fn month_bounds_leap_february() {
        let (_, last) = month_bounds(2024, 2);
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn day_bounds_cover_whole_day() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let start = day_start_utc(date);
        let end = day_end_utc(date);

        // End is 86_399_999 ms after start: 23:59:59.999 inclusive.
        let span = end.signed_duration_since(start).num_milliseconds();
        assert_eq!(span, 86_399_999);
    }

    #[test]
    fn from_dates_open_bounds() {
        let window = QueryWindow::from_dates(None, None);
        assert_eq!(window, QueryWindow::open());
        assert!(window.contains(Utc::now()));
    }

    #[test]
    fn from_dates_start_only() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let window = QueryWindow::from_dates(Some(date), None);
        assert!(window.start.is_some());
        assert!(window.end.is_none());
        assert!(window.contains(day_start_utc(date)));
        assert!(!window.contains(day_start_utc(date) - chrono::Duration::milliseconds(1)));
    }

    #[test]
    fn calendar_month_spans_first_to_last() {
        let date = NaiveDate::from_ymd_opt(2025, 2, 14).unwrap();
        let window = QueryWindow::calendar_month(date);

        assert!(window.contains(day_start_utc(
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()
        )));
        assert!(window.contains(day_end_utc(
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        )));
        assert!(!window.contains(day_start_utc(
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
        )));
    }

    #[test]
    fn month_to_date_ends_today() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let window = QueryWindow::month_to_date(today);

        assert!(window.contains(day_end_utc(today)));
        assert!(!window.contains(day_end_utc(today) + chrono::Duration::milliseconds(1)));
        assert!(window.contains(day_start_utc(
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
        )));
    }

    #[test]
    fn end_bound_is_inclusive_through_last_millisecond() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let window = QueryWindow::from_dates(None, Some(date));
        let end = day_end_utc(date);

        assert!(window.contains(end));
        assert!(!window.contains(end + chrono::Duration::milliseconds(1)));
    }
}
