//! Parsing of month names from query parameters and the date spans they cover.

use serde::Deserialize;
use time::{Date, Duration, Month as CalendarMonth, OffsetDateTime, Time};

use crate::Error;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Query parameters for endpoints that only take a month.
#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    /// The name of a month, e.g. "March".
    pub month: Option<String>,
}

/// A calendar month parsed from a month name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Month(CalendarMonth);

impl Month {
    /// Parse a month from its English name or three letter abbreviation,
    /// ignoring case.
    ///
    /// # Errors
    /// Returns [Error::InvalidMonth] if `text` is missing, empty, contains
    /// anything other than ASCII letters, or does not name a month.
    pub fn parse(text: Option<&str>) -> Result<Self, Error> {
        let text = alphabetic(text)?;

        MONTH_NAMES
            .iter()
            .position(|name| {
                name.eq_ignore_ascii_case(text)
                    || (text.len() == 3 && name[..3].eq_ignore_ascii_case(text))
            })
            .and_then(Self::from_index)
            .ok_or(Error::InvalidMonth)
    }

    /// Parse a month from its full English name, ignoring case.
    ///
    /// # Errors
    /// Returns [Error::InvalidMonth] if `text` is not a full month name.
    pub fn parse_full_name(text: Option<&str>) -> Result<Self, Error> {
        let text = alphabetic(text)?;

        MONTH_NAMES
            .iter()
            .position(|name| name.eq_ignore_ascii_case(text))
            .and_then(Self::from_index)
            .ok_or(Error::InvalidMonth)
    }

    fn from_index(index: usize) -> Option<Self> {
        let number = u8::try_from(index + 1).ok()?;
        CalendarMonth::try_from(number).ok().map(Self)
    }

    /// The month number, January is 1.
    pub fn number(self) -> u8 {
        u8::from(self.0)
    }

    /// The month's name in title case, e.g. "February".
    pub fn name(self) -> &'static str {
        MONTH_NAMES[usize::from(self.number()) - 1]
    }

    /// The inclusive span of the month in `year`.
    pub fn span_in_year(self, year: i32) -> Result<MonthSpan, Error> {
        MonthSpan::in_year(self, year)
    }
}

impl From<Month> for CalendarMonth {
    fn from(value: Month) -> Self {
        value.0
    }
}

fn alphabetic(text: Option<&str>) -> Result<&str, Error> {
    match text {
        Some(text) if !text.is_empty() && text.chars().all(|c| c.is_ascii_alphabetic()) => {
            Ok(text)
        }
        _ => Err(Error::InvalidMonth),
    }
}

/// The first and last millisecond of a month in a specific year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthSpan {
    /// Midnight UTC on the first day of the month.
    pub start: OffsetDateTime,
    /// 23:59:59.999 UTC on the last day of the month.
    pub end: OffsetDateTime,
}

impl MonthSpan {
    /// Build the span covering `month` in `year`.
    ///
    /// # Errors
    /// Returns [Error::InvalidMonth] if `year` is outside the supported date range.
    pub fn in_year(month: Month, year: i32) -> Result<Self, Error> {
        let start = Date::from_calendar_date(year, month.into(), 1)
            .map_err(|_| Error::InvalidMonth)?
            .with_time(Time::MIDNIGHT)
            .assume_utc();

        let (next_year, next_month) = match CalendarMonth::from(month) {
            CalendarMonth::December => (year + 1, CalendarMonth::January),
            other => (year, other.next()),
        };
        let end = Date::from_calendar_date(next_year, next_month, 1)
            .map_err(|_| Error::InvalidMonth)?
            .with_time(Time::MIDNIGHT)
            .assume_utc()
            - Duration::milliseconds(1);

        Ok(Self { start, end })
    }

    /// The start of the span in Unix milliseconds.
    pub fn start_millis(&self) -> i64 {
        to_unix_millis(self.start)
    }

    /// The end of the span in Unix milliseconds.
    pub fn end_millis(&self) -> i64 {
        to_unix_millis(self.end)
    }
}

/// Convert a timestamp to whole milliseconds since the Unix epoch.
pub fn to_unix_millis(date_time: OffsetDateTime) -> i64 {
    (date_time.unix_timestamp_nanos() / 1_000_000) as i64
}
