//! Month-precision calendar dates
//!
//! Subscriptions are billed per month, so callers only ever supply a month and a
//! year (`MM-YYYY`). Internally the value is a `NaiveDate` pinned to the first
//! day of the month, which keeps comparisons and storage consistent no matter
//! which day a caller or a database row happened to carry.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Lexical format used on the wire.
pub const MONTH_FORMAT: &str = "MM-YYYY";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MonthDateError {
    #[error("invalid month date '{input}', expected MM-YYYY")]
    Format { input: String },

    #[error("month out of range: {month}")]
    MonthOutOfRange { month: u32 },
}

/// A calendar month (year + month), always normalized to day 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthDate(NaiveDate);

impl MonthDate {
    pub fn new(year: i32, month: u32) -> Result<Self, MonthDateError> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Self)
            .ok_or(MonthDateError::MonthOutOfRange { month })
    }

    /// Normalize any calendar date to its month.
    pub fn from_date(date: NaiveDate) -> Self {
        // Day 1 exists in every month, so `with_day(1)` cannot fail.
        Self(date.with_day(1).unwrap_or(date))
    }

    /// Parse the `MM-YYYY` wire form.
    pub fn parse(input: &str) -> Result<Self, MonthDateError> {
        let format_err = || MonthDateError::Format { input: input.to_string() };

        let (month, year) = input.split_once('-').ok_or_else(format_err)?;
        if month.len() != 2 || year.len() != 4 {
            return Err(format_err());
        }
        if !month.bytes().chain(year.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(format_err());
        }

        let month: u32 = month.parse().map_err(|_| format_err())?;
        let year: i32 = year.parse().map_err(|_| format_err())?;
        Self::new(year, month)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// The underlying date (always the first of the month), for storage.
    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for MonthDate {
    fn from(date: NaiveDate) -> Self {
        Self::from_date(date)
    }
}

impl fmt::Display for MonthDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:04}", self.month(), self.year())
    }
}

impl FromStr for MonthDate {
    type Err = MonthDateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for MonthDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let date = MonthDate::parse("07-2025").unwrap();
        assert_eq!(date.month(), 7);
        assert_eq!(date.year(), 2025);
        assert_eq!(date.as_naive(), NaiveDate::from_ymd_opt(2025, 7, 1).unwrap());
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        for input in ["7-2025", "2025-07", "13-2025", "00-2025", "07/2025", "ab-2025", "07-25", ""] {
            assert!(MonthDate::parse(input).is_err(), "expected error for {:?}", input);
        }
    }

    #[test]
    fn test_same_month_is_equal_regardless_of_day() {
        let a = MonthDate::from_date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let b = MonthDate::from_date(NaiveDate::from_ymd_opt(2024, 3, 28).unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn test_ordering_follows_calendar() {
        let dec = MonthDate::parse("12-2023").unwrap();
        let jan = MonthDate::parse("01-2024").unwrap();
        assert!(dec < jan);
    }

    #[test]
    fn test_display_and_serde_use_wire_format() {
        let date = MonthDate::new(2024, 5).unwrap();
        assert_eq!(date.to_string(), "05-2024");

        let json = serde_json::to_string(&date).unwrap();
        assert_eq!(json, "\"05-2024\"");

        let back: MonthDate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, date);
        assert!(serde_json::from_str::<MonthDate>("\"2024-05\"").is_err());
    }
}
