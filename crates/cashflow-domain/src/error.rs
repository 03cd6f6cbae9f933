use chrono::NaiveDate;
use thiserror::Error;

/// Validation failures raised while building or editing domain entities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("frequency is required for recurring rules")]
    MissingFrequency,
    #[error("day_of_month is required for {0} recurrence")]
    MissingDayOfMonth(&'static str),
    #[error("month_of_year is required for YEARLY recurrence")]
    MissingMonthOfYear,
    #[error("month_of_year is only valid for YEARLY recurrence")]
    UnexpectedMonthOfYear,
    #[error("{0} should only be set when the rule is recurring")]
    OneTimeField(&'static str),
    #[error("day_of_month must be between 1 and 31, or -1 for the last day (got {0})")]
    DayOutOfRange(i32),
    #[error("month_of_year must be between 1 and 12 (got {0})")]
    MonthOutOfRange(u32),
    #[error("end date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    #[error("amount must be greater than zero")]
    NonPositiveAmount,
    #[error("currency must be a 3-letter code (got `{0}`)")]
    InvalidCurrency(String),
    #[error("name must not be empty")]
    EmptyName,
    #[error("exception must either delete the occurrence or override at least one field")]
    EmptyException,
    #[error("unknown {kind} `{value}`")]
    UnknownKind { kind: &'static str, value: String },
}
