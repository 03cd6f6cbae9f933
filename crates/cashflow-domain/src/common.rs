//! Shared traits and calendar helpers.

use chrono::{Datelike, Duration, NaiveDate};
use uuid::Uuid;

/// Sentinel `day_of_month` value meaning "last calendar day of the month".
pub const LAST_DAY_OF_MONTH: i32 = -1;

/// Entities scoped to a single owner.
pub trait Owned {
    fn user_id(&self) -> Uuid;

    fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id() == user_id
    }
}

/// Number of days in `month` of `year`.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first_next| first_next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

/// Resolves a recurrence day inside a concrete month.
///
/// `-1` selects the last day of the month. Any other request larger than the
/// month's length clamps to the last day (31 in February gives the 28th or 29th).
pub fn resolve_day(year: i32, month: u32, day_of_month: i32) -> NaiveDate {
    let last = days_in_month(year, month);
    let day = if day_of_month == LAST_DAY_OF_MONTH {
        last
    } else {
        (day_of_month.max(1) as u32).min(last)
    };
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MAX)
}

/// Returns the month following `(year, month)`.
pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// Shifts a date by a signed number of days, saturating at the calendar bounds.
pub fn shift_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days))
        .unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2025, 2), 28);
        assert_eq!(days_in_month(2025, 12), 31);
        assert_eq!(days_in_month(2025, 4), 30);
    }

    #[test]
    fn resolve_day_clamps_to_month_length() {
        assert_eq!(resolve_day(2025, 2, 31), date(2025, 2, 28));
        assert_eq!(resolve_day(2024, 2, 30), date(2024, 2, 29));
        assert_eq!(resolve_day(2025, 4, 31), date(2025, 4, 30));
        assert_eq!(resolve_day(2025, 1, 15), date(2025, 1, 15));
    }

    #[test]
    fn resolve_day_last_day_sentinel() {
        assert_eq!(resolve_day(2025, 2, LAST_DAY_OF_MONTH), date(2025, 2, 28));
        assert_eq!(resolve_day(2025, 1, LAST_DAY_OF_MONTH), date(2025, 1, 31));
        assert_eq!(resolve_day(2024, 2, LAST_DAY_OF_MONTH), date(2024, 2, 29));
    }

    #[test]
    fn next_month_rolls_year() {
        assert_eq!(next_month(2025, 12), (2026, 1));
        assert_eq!(next_month(2025, 3), (2025, 4));
    }
}
