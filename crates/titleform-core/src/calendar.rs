//! Date handling for the title form
//!
//! All date rules evaluate against a [`Clock`] so "current year" and
//! "not in the future" stay deterministic under test.

use chrono::{Datelike, Local, NaiveDate};

/// Display format used by every date field on the form
pub const DATE_FORMAT: &str = "%m-%d-%Y";

/// Source of "today" for date and year rules
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;

    fn current_year(&self) -> i32 {
        self.today().year()
    }
}

/// Wall clock in the local timezone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to a single day
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Why a date string was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateProblem {
    /// Not shaped like MM-DD-YYYY
    Format,
    /// Shaped correctly but no such day exists (e.g. 02-30-2024)
    Calendar,
    /// A real day after today
    Future,
}

/// Parse an MM-DD-YYYY string, rejecting impossible calendar days.
///
/// The month/day/year triple is rebuilt into a date and compared back, so
/// rollover dates like 02-30 never sneak through as March 1st.
pub fn parse_form_date(value: &str) -> Result<NaiveDate, DateProblem> {
    let value = value.trim();
    if !crate::patterns::DATE_SHAPE.is_match(value) {
        return Err(DateProblem::Format);
    }

    let mut parts = value.splitn(3, '-');
    let (Some(month), Some(day), Some(year)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(DateProblem::Format);
    };
    let month: u32 = month.parse().map_err(|_| DateProblem::Format)?;
    let day: u32 = day.parse().map_err(|_| DateProblem::Format)?;
    let year: i32 = year.parse().map_err(|_| DateProblem::Format)?;

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(DateProblem::Calendar)?;
    if date.month() != month || date.day() != day || date.year() != year {
        return Err(DateProblem::Calendar);
    }
    Ok(date)
}

/// Validate a form date against today (end-of-day precision: today is fine).
pub fn check_form_date(value: &str, today: NaiveDate) -> Result<NaiveDate, DateProblem> {
    let date = parse_form_date(value)?;
    if date > today {
        return Err(DateProblem::Future);
    }
    Ok(date)
}

/// Render a date the way the form displays it
pub fn format_form_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_valid_date() {
        assert_eq!(parse_form_date("01-01-2020"), Ok(day(2020, 1, 1)));
        assert_eq!(parse_form_date("02-29-2024"), Ok(day(2024, 2, 29)));
    }

    #[test]
    fn test_rejects_impossible_days() {
        assert_eq!(parse_form_date("02-30-2024"), Err(DateProblem::Calendar));
        assert_eq!(parse_form_date("02-29-2023"), Err(DateProblem::Calendar));
        assert_eq!(parse_form_date("13-01-2020"), Err(DateProblem::Calendar));
        assert_eq!(parse_form_date("00-10-2020"), Err(DateProblem::Calendar));
    }

    #[test]
    fn test_rejects_wrong_shape() {
        assert_eq!(parse_form_date("2020-01-01"), Err(DateProblem::Format));
        assert_eq!(parse_form_date("1-1-2020"), Err(DateProblem::Format));
        assert_eq!(parse_form_date("01/01/2020"), Err(DateProblem::Format));
        assert_eq!(parse_form_date(""), Err(DateProblem::Format));
    }

    #[test]
    fn test_non_ascii_digits_are_format_errors() {
        assert_eq!(parse_form_date("1\u{0660}-01-2020"), Err(DateProblem::Format));
        assert_eq!(parse_form_date("01-\u{0966}1-2020"), Err(DateProblem::Format));
        assert_eq!(parse_form_date("01-01-202\u{0664}"), Err(DateProblem::Format));
    }

    #[test]
    fn test_today_is_not_future() {
        let today = day(2026, 10, 19);
        assert!(check_form_date("10-19-2026", today).is_ok());
        assert_eq!(
            check_form_date("10-20-2026", today),
            Err(DateProblem::Future)
        );
        assert_eq!(
            check_form_date("01-01-2999", today),
            Err(DateProblem::Future)
        );
    }

    #[test]
    fn test_format_round_trips() {
        let date = day(2025, 3, 7);
        assert_eq!(format_form_date(date), "03-07-2025");
        assert_eq!(parse_form_date(&format_form_date(date)), Ok(date));
    }
}
