//! Calendar month value with `MM-YYYY` wire format.

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Reasons a `MM-YYYY` string is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonthYearError {
    #[error("expected format MM-YYYY")]
    Format,
    #[error("month must be between 01 and 12")]
    Month,
    #[error("year must be between 0001 and 9999")]
    Year,
}

/// A date truncated to calendar-month resolution.
///
/// Ordering is chronological: `(year, month)` compared lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthYear {
    year: i32,
    month: u32,
}

impl MonthYear {
    pub fn new(year: i32, month: u32) -> Result<Self, MonthYearError> {
        if !(1..=12).contains(&month) {
            return Err(MonthYearError::Month);
        }
        if !(1..=9999).contains(&year) {
            return Err(MonthYearError::Year);
        }
        Ok(Self { year, month })
    }

    /// The month containing today's UTC date.
    pub fn current() -> Self {
        Self::from(Utc::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Months elapsed since January of year 0.
    pub fn month_index(&self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }

    /// First day of the month, the form stored in `DATE` columns.
    ///
    /// `new` already bounds year and month to what `chrono` can represent.
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }
}

impl From<NaiveDate> for MonthYear {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl FromStr for MonthYear {
    type Err = MonthYearError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (month, year) = s.split_once('-').ok_or(MonthYearError::Format)?;
        if month.len() != 2 || year.len() != 4 {
            return Err(MonthYearError::Format);
        }
        if !month.bytes().chain(year.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(MonthYearError::Format);
        }
        let month: u32 = month.parse().map_err(|_| MonthYearError::Format)?;
        let year: i32 = year.parse().map_err(|_| MonthYearError::Format)?;
        Self::new(year, month)
    }
}

impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:04}", self.month, self.year)
    }
}

impl Serialize for MonthYear {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthYear {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
