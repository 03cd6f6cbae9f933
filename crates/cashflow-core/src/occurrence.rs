//! Occurrence generation for recurrence rules.
//!
//! Produces the calendar dates a rule fires on inside an inclusive window. Days
//! past the end of a month clamp to the month's last day instead of being skipped.

use chrono::{Datelike, NaiveDate};
use tracing::warn;

use cashflow_domain::{common::*, DateWindow, RecurrenceRule, Schedule};

/// Upper bound on generator steps for a single rule and window.
pub const MAX_ITERATIONS: usize = 10_000;

/// First date strictly after `after` on which `rule` fires, ignoring `start_date`.
///
/// Returns `None` for one-time rules and once the candidate passes the end date.
pub fn next_occurrence_after(rule: &RecurrenceRule, after: NaiveDate) -> Option<NaiveDate> {
    let candidate = match rule.schedule {
        Schedule::Once => return None,
        Schedule::Monthly { day_of_month } => {
            let target = resolve_day(after.year(), after.month(), day_of_month);
            if target > after {
                target
            } else {
                let (year, month) = next_month(after.year(), after.month());
                resolve_day(year, month, day_of_month)
            }
        }
        Schedule::Yearly {
            day_of_month,
            month_of_year,
        } => {
            let target = resolve_day(after.year(), month_of_year, day_of_month);
            if target > after {
                target
            } else {
                resolve_day(after.year().checked_add(1)?, month_of_year, day_of_month)
            }
        }
    };
    match rule.end_date {
        Some(end) if candidate > end => None,
        _ => Some(candidate),
    }
}

/// Dates on which `rule` fires inside `window`, ascending and without duplicates.
pub fn generate(rule: &RecurrenceRule, window: DateWindow) -> Vec<NaiveDate> {
    if !rule.is_recurring() {
        return if window.contains(rule.start_date) {
            vec![rule.start_date]
        } else {
            Vec::new()
        };
    }

    let upper = match rule.end_date {
        Some(end) => end.min(window.end),
        None => window.end,
    };
    let first = window.start.max(rule.start_date);
    if first > upper {
        return Vec::new();
    }

    let mut dates = Vec::new();
    let mut cursor = shift_days(first, -1);
    let mut iterations = 0usize;
    while let Some(next) = next_occurrence_after(rule, cursor) {
        if next > upper {
            break;
        }
        iterations += 1;
        if iterations > MAX_ITERATIONS {
            warn!(
                rule_id = %rule.id,
                rule = %rule.name,
                window = %window,
                "occurrence generation hit the iteration cap; returning partial results"
            );
            break;
        }
        dates.push(next);
        cursor = next;
    }
    dates
}

/// Next date on or after `today` on which `rule` fires.
pub fn next_occurrence(rule: &RecurrenceRule, today: NaiveDate) -> Option<NaiveDate> {
    if !rule.is_recurring() {
        return (rule.start_date >= today).then_some(rule.start_date);
    }
    let from = today.max(rule.start_date);
    next_occurrence_after(rule, shift_days(from, -1))
}
