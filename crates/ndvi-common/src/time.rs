//! Calendar date handling for observation windows.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Look-back applied when the caller omits the start date.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 365;

/// An inclusive range of UTC calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, TimeParseError> {
        if start > end {
            return Err(TimeParseError::Inverted {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Apply the defaulting policy for optional bounds.
    ///
    /// A missing end is `today`; a missing start is the end minus
    /// [`DEFAULT_LOOKBACK_DAYS`].
    pub fn resolve(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Self, TimeParseError> {
        let end = end.unwrap_or(today);
        let start = start.unwrap_or(end - Duration::days(DEFAULT_LOOKBACK_DAYS));
        Self::new(start, end)
    }

    /// Number of days between start and end.
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Check whether a calendar day falls inside the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// STAC `datetime` interval covering both days in full.
    ///
    /// Example: `2024-01-01T00:00:00Z/2024-03-31T23:59:59Z`.
    pub fn to_stac_interval(&self) -> String {
        format!(
            "{}T00:00:00Z/{}T23:59:59Z",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// Parse an ISO date (`YYYY-MM-DD`), also accepting a full RFC 3339 timestamp.
pub fn parse_date(s: &str) -> Result<NaiveDate, TimeParseError> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc).date_naive());
    }
    Err(TimeParseError::InvalidFormat(s.to_string()))
}

/// Format a timestamp as its UTC calendar day.
pub fn iso_date(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d").to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid date format: {0}. Expected YYYY-MM-DD")]
    InvalidFormat(String),

    #[error("Start date {start} is after end date {end}")]
    Inverted { start: String, end: String },
}
