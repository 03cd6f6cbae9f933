//! Inclusive calendar windows used by expansion and forecasting.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::common::shift_days;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
/// A closed date range `[start, end]`.
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateWindowError> {
        if end < start {
            return Err(DateWindowError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The window of `days` days following `start`, both ends included.
    pub fn starting(start: NaiveDate, days: i64) -> Self {
        Self {
            start,
            end: shift_days(start, days.max(0)),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Difference between end and start in days (0 for a single-day window).
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Iterates every day of the window in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Errors that can occur when constructing [`DateWindow`] values.
pub enum DateWindowError {
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

impl fmt::Display for DateWindowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateWindowError::InvalidRange { start, end } => {
                write!(f, "date window start {start} is after end {end}")
            }
        }
    }
}

impl std::error::Error for DateWindowError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn window_rejects_reversed_range() {
        assert!(DateWindow::new(date(2025, 2, 1), date(2025, 1, 1)).is_err());
        assert!(DateWindow::new(date(2025, 1, 1), date(2025, 1, 1)).is_ok());
    }

    #[test]
    fn days_are_inclusive() {
        let window = DateWindow::new(date(2025, 1, 30), date(2025, 2, 2)).unwrap();
        let days: Vec<_> = window.days().collect();
        assert_eq!(days.len(), 4);
        assert_eq!(days.first(), Some(&date(2025, 1, 30)));
        assert_eq!(days.last(), Some(&date(2025, 2, 2)));
        assert_eq!(window.span_days(), 3);
        assert!(window.contains(date(2025, 2, 2)));
    }
}
