//! Calendar months in the `YYYY-MM` format used to key budgets.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::{Date, Month as CalendarMonth};

use crate::Error;

/// The three-letter labels used for chart axes, January first.
pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// A calendar month of a specific year, e.g. `2024-03`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Month {
    year: i32,
    month: CalendarMonth,
}

impl Month {
    /// Create a month from a year and a calendar month.
    pub fn new(year: i32, month: CalendarMonth) -> Self {
        Self { year, month }
    }

    /// The month containing `date`.
    pub fn of(date: Date) -> Self {
        Self::new(date.year(), date.month())
    }

    /// Parse a month from the `YYYY-MM` format.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::InvalidMonth] if `text` is not
    /// exactly four digits, a dash and two digits forming a month 01-12.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidMonth(text.to_owned());

        let bytes = text.as_bytes();
        if bytes.len() != 7
            || bytes[4] != b'-'
            || !bytes[..4].iter().all(u8::is_ascii_digit)
            || !bytes[5..].iter().all(u8::is_ascii_digit)
        {
            return Err(invalid());
        }

        let year: i32 = text[..4].parse().map_err(|_| invalid())?;
        let month: u8 = text[5..].parse().map_err(|_| invalid())?;
        let month = CalendarMonth::try_from(month).map_err(|_| invalid())?;

        Ok(Self::new(year, month))
    }

    /// The year of the month.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The calendar month, e.g. March.
    pub fn calendar_month(&self) -> CalendarMonth {
        self.month
    }

    /// The month immediately before this one, wrapping into the previous year
    /// from January.
    pub fn previous(&self) -> Self {
        match self.month {
            CalendarMonth::January => Self::new(self.year - 1, CalendarMonth::December),
            month => Self::new(self.year, month.previous()),
        }
    }

    /// Whether `date` falls within this month.
    pub fn contains(&self, date: Date) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// The current month in UTC.
    pub fn current() -> Self {
        Self::of(time::OffsetDateTime::now_utc().date())
    }
}

impl Ord for Month {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.year, u8::from(self.month)).cmp(&(other.year, u8::from(other.month)))
    }
}

impl PartialOrd for Month {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, u8::from(self.month))
    }
}

impl FromStr for Month {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Month::parse(s)
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Month {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Month::parse(&text).map_err(serde::de::Error::custom)
    }
}

impl rusqlite::ToSql for Month {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(rusqlite::types::ToSqlOutput::from(self.to_string()))
    }
}

impl rusqlite::types::FromSql for Month {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        let text = value.as_str()?;
        Month::parse(text).map_err(|error| rusqlite::types::FromSqlError::Other(Box::new(error)))
    }
}
