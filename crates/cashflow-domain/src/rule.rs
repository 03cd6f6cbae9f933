//! Recurrence rules: the templates that scheduled transactions are expanded from.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::{common::*, money, DomainError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    Monthly,
    Yearly,
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Frequency::Monthly => "MONTHLY",
            Frequency::Yearly => "YEARLY",
        };
        f.write_str(label)
    }
}

/// When a rule fires. `Once` rules fire a single time on the rule's start date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "frequency", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Schedule {
    Once,
    Monthly {
        day_of_month: i32,
    },
    Yearly {
        day_of_month: i32,
        month_of_year: u32,
    },
}

impl Schedule {
    pub fn frequency(&self) -> Option<Frequency> {
        match self {
            Schedule::Once => None,
            Schedule::Monthly { .. } => Some(Frequency::Monthly),
            Schedule::Yearly { .. } => Some(Frequency::Yearly),
        }
    }

    pub fn day_of_month(&self) -> Option<i32> {
        match *self {
            Schedule::Once => None,
            Schedule::Monthly { day_of_month } | Schedule::Yearly { day_of_month, .. } => {
                Some(day_of_month)
            }
        }
    }

    pub fn month_of_year(&self) -> Option<u32> {
        match *self {
            Schedule::Yearly { month_of_year, .. } => Some(month_of_year),
            _ => None,
        }
    }

    pub fn label(&self) -> String {
        let day_label = |day: i32| {
            if day == LAST_DAY_OF_MONTH {
                "last day".to_string()
            } else {
                format!("day {day}")
            }
        };
        match *self {
            Schedule::Once => "One-time".into(),
            Schedule::Monthly { day_of_month } => format!("Monthly on {}", day_label(day_of_month)),
            Schedule::Yearly {
                day_of_month,
                month_of_year,
            } => format!(
                "Yearly on {} of month {}",
                day_label(day_of_month),
                month_of_year
            ),
        }
    }

    fn validate(&self) -> Result<(), DomainError> {
        if let Some(day) = self.day_of_month() {
            if day != LAST_DAY_OF_MONTH && !(1..=31).contains(&day) {
                return Err(DomainError::DayOutOfRange(day));
            }
        }
        if let Some(month) = self.month_of_year() {
            if !(1..=12).contains(&month) {
                return Err(DomainError::MonthOutOfRange(month));
            }
        }
        Ok(())
    }
}

/// A validated scheduled-transaction template.
///
/// Amounts are positive magnitudes. Whether an occurrence adds or removes money
/// is decided by the category kind, or by `to_account_id` for transfers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecurrenceRule {
    pub id: Uuid,
    pub user_id: Uuid,
    pub account_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_account_id: Option<Uuid>,
    pub category_id: Uuid,
    pub name: String,
    pub amount: Decimal,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub schedule: Schedule,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl RecurrenceRule {
    pub fn is_recurring(&self) -> bool {
        !matches!(self.schedule, Schedule::Once)
    }

    pub fn is_transfer(&self) -> bool {
        self.to_account_id.is_some()
    }

    pub fn frequency(&self) -> Option<Frequency> {
        self.schedule.frequency()
    }

    /// Checks every structural invariant of the rule.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::EmptyName);
        }
        money::ensure_positive(self.amount)?;
        money::normalize_currency(&self.currency)?;
        self.schedule.validate()?;
        if let Some(end) = self.end_date {
            if !self.is_recurring() {
                return Err(DomainError::OneTimeField("end_date"));
            }
            if end < self.start_date {
                return Err(DomainError::EndBeforeStart {
                    start: self.start_date,
                    end,
                });
            }
        }
        Ok(())
    }
}

impl Owned for RecurrenceRule {
    fn user_id(&self) -> Uuid {
        self.user_id
    }
}

/// Flat creation payload mirroring how rules arrive from forms and files.
///
/// [`RuleDraft::build`] is the single place the recurrence field combinations are
/// checked; everything downstream assumes a built rule is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleDraft {
    pub user_id: Uuid,
    pub account_id: Uuid,
    #[serde(default)]
    pub to_account_id: Option<Uuid>,
    pub category_id: Uuid,
    pub name: String,
    pub amount: Decimal,
    pub currency: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub frequency: Option<Frequency>,
    #[serde(default)]
    pub day_of_month: Option<i32>,
    #[serde(default)]
    pub month_of_year: Option<u32>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl RuleDraft {
    /// Creates a one-time draft. Recurrence fields can be filled in afterwards.
    #[allow(clippy::too_many_arguments)]
    pub fn one_time(
        user_id: Uuid,
        account_id: Uuid,
        category_id: Uuid,
        name: impl Into<String>,
        amount: Decimal,
        currency: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            user_id,
            account_id,
            to_account_id: None,
            category_id,
            name: name.into(),
            amount,
            currency: currency.into(),
            note: None,
            is_recurring: false,
            frequency: None,
            day_of_month: None,
            month_of_year: None,
            start_date: date,
            end_date: None,
        }
    }

    pub fn monthly(mut self, day_of_month: i32) -> Self {
        self.is_recurring = true;
        self.frequency = Some(Frequency::Monthly);
        self.day_of_month = Some(day_of_month);
        self.month_of_year = None;
        self
    }

    pub fn yearly(mut self, day_of_month: i32, month_of_year: u32) -> Self {
        self.is_recurring = true;
        self.frequency = Some(Frequency::Yearly);
        self.day_of_month = Some(day_of_month);
        self.month_of_year = Some(month_of_year);
        self
    }

    pub fn until(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn transfer_to(mut self, to_account_id: Uuid) -> Self {
        self.to_account_id = Some(to_account_id);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    fn schedule(&self) -> Result<Schedule, DomainError> {
        if !self.is_recurring {
            if self.frequency.is_some() {
                return Err(DomainError::OneTimeField("frequency"));
            }
            if self.day_of_month.is_some() {
                return Err(DomainError::OneTimeField("day_of_month"));
            }
            if self.month_of_year.is_some() {
                return Err(DomainError::OneTimeField("month_of_year"));
            }
            if self.end_date.is_some() {
                return Err(DomainError::OneTimeField("end_date"));
            }
            return Ok(Schedule::Once);
        }
        match self.frequency.ok_or(DomainError::MissingFrequency)? {
            Frequency::Monthly => {
                let day_of_month = self
                    .day_of_month
                    .ok_or(DomainError::MissingDayOfMonth("MONTHLY"))?;
                if self.month_of_year.is_some() {
                    return Err(DomainError::UnexpectedMonthOfYear);
                }
                Ok(Schedule::Monthly { day_of_month })
            }
            Frequency::Yearly => {
                let day_of_month = self
                    .day_of_month
                    .ok_or(DomainError::MissingDayOfMonth("YEARLY"))?;
                let month_of_year = self.month_of_year.ok_or(DomainError::MissingMonthOfYear)?;
                Ok(Schedule::Yearly {
                    day_of_month,
                    month_of_year,
                })
            }
        }
    }

    /// Validates the draft and produces a rule with a fresh identifier.
    pub fn build(self) -> Result<RecurrenceRule, DomainError> {
        let schedule = self.schedule()?;
        let rule = RecurrenceRule {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            account_id: self.account_id,
            to_account_id: self.to_account_id,
            category_id: self.category_id,
            name: self.name.trim().to_string(),
            amount: money::normalize_amount(self.amount),
            currency: money::normalize_currency(&self.currency)?,
            note: self.note,
            schedule,
            start_date: self.start_date,
            end_date: self.end_date,
        };
        rule.validate()?;
        Ok(rule)
    }
}

/// Sparse set of rule field overrides. Unset fields keep the original value.
///
/// The optional rule fields take `Option<Option<_>>`: `Some(None)` clears the
/// field, and an explicit JSON `null` deserializes to `Some(None)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RulePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub account_id: Option<Uuid>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub to_account_id: Option<Option<Uuid>>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub note: Option<Option<String>>,
    #[serde(default)]
    pub schedule: Option<Schedule>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<Option<NaiveDate>>,
}

/// Marks a field that appeared in the input, even as `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl RulePatch {
    pub fn is_empty(&self) -> bool {
        *self == RulePatch::default()
    }

    /// Returns a new rule with the patch applied, re-validated as a whole.
    pub fn merge(&self, rule: &RecurrenceRule) -> Result<RecurrenceRule, DomainError> {
        let currency = match &self.currency {
            Some(code) => money::normalize_currency(code)?,
            None => rule.currency.clone(),
        };
        let merged = RecurrenceRule {
            id: rule.id,
            user_id: rule.user_id,
            account_id: self.account_id.unwrap_or(rule.account_id),
            to_account_id: self.to_account_id.unwrap_or(rule.to_account_id),
            category_id: self.category_id.unwrap_or(rule.category_id),
            name: self
                .name
                .as_deref()
                .map(str::trim)
                .map(str::to_string)
                .unwrap_or_else(|| rule.name.clone()),
            amount: self
                .amount
                .map(money::normalize_amount)
                .unwrap_or(rule.amount),
            currency,
            note: match &self.note {
                Some(note) => note.clone(),
                None => rule.note.clone(),
            },
            schedule: self.schedule.unwrap_or(rule.schedule),
            start_date: self.start_date.unwrap_or(rule.start_date),
            end_date: self.end_date.unwrap_or(rule.end_date),
        };
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft() -> RuleDraft {
        RuleDraft::one_time(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Rent",
            Decimal::from_str("1200.00").unwrap(),
            "usd",
            date(2025, 1, 1),
        )
    }

    #[test]
    fn one_time_draft_builds_once_schedule() {
        let rule = draft().build().expect("valid draft");
        assert_eq!(rule.schedule, Schedule::Once);
        assert!(!rule.is_recurring());
        assert_eq!(rule.currency, "USD");
    }

    #[test]
    fn monthly_requires_day_and_forbids_month() {
        let mut missing_day = draft().monthly(1);
        missing_day.day_of_month = None;
        assert_eq!(
            missing_day.build(),
            Err(DomainError::MissingDayOfMonth("MONTHLY"))
        );

        let mut with_month = draft().monthly(1);
        with_month.month_of_year = Some(3);
        assert_eq!(with_month.build(), Err(DomainError::UnexpectedMonthOfYear));
    }

    #[test]
    fn yearly_requires_both_fields() {
        let mut missing_month = draft().yearly(10, 4);
        missing_month.month_of_year = None;
        assert_eq!(missing_month.build(), Err(DomainError::MissingMonthOfYear));
        assert!(draft().yearly(-1, 2).build().is_ok());
    }

    #[test]
    fn one_time_rejects_recurrence_fields() {
        let mut with_end = draft();
        with_end.end_date = Some(date(2025, 6, 1));
        assert_eq!(with_end.build(), Err(DomainError::OneTimeField("end_date")));
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert_eq!(
            draft().monthly(32).build(),
            Err(DomainError::DayOutOfRange(32))
        );
        assert_eq!(
            draft().monthly(0).build(),
            Err(DomainError::DayOutOfRange(0))
        );
        assert_eq!(
            draft().yearly(1, 13).build(),
            Err(DomainError::MonthOutOfRange(13))
        );
        assert!(matches!(
            draft().monthly(1).until(date(2024, 12, 31)).build(),
            Err(DomainError::EndBeforeStart { .. })
        ));
    }

    #[test]
    fn patch_merges_only_set_fields() {
        let rule = draft().monthly(15).build().unwrap();
        let patch = RulePatch {
            note: Some(Some("bonus month".into())),
            ..RulePatch::default()
        };
        let merged = patch.merge(&rule).unwrap();
        assert_eq!(merged.note.as_deref(), Some("bonus month"));
        assert_eq!(merged.amount, rule.amount);
        assert_eq!(merged.account_id, rule.account_id);
        assert_eq!(merged.schedule, rule.schedule);
        assert_eq!(merged.id, rule.id);
    }

    #[test]
    fn explicit_null_clears_destination_and_note() {
        let rule = draft()
            .monthly(15)
            .transfer_to(Uuid::new_v4())
            .with_note("old")
            .build()
            .unwrap();
        assert!(rule.is_transfer());

        let patch: RulePatch =
            serde_json::from_str(r#"{"to_account_id": null, "note": null}"#).unwrap();
        assert_eq!(patch.to_account_id, Some(None));
        assert_eq!(patch.note, Some(None));

        let merged = patch.merge(&rule).unwrap();
        assert_eq!(merged.to_account_id, None);
        assert_eq!(merged.note, None);
        assert!(!merged.is_transfer());
    }

    #[test]
    fn absent_fields_are_left_alone() {
        let rule = draft()
            .monthly(15)
            .transfer_to(Uuid::new_v4())
            .with_note("old")
            .build()
            .unwrap();
        let patch: RulePatch = serde_json::from_str(r#"{"name": "Rent share"}"#).unwrap();
        assert_eq!(patch.to_account_id, None);
        assert_eq!(patch.end_date, None);

        let merged = patch.merge(&rule).unwrap();
        assert_eq!(merged.name, "Rent share");
        assert_eq!(merged.to_account_id, rule.to_account_id);
        assert_eq!(merged.note.as_deref(), Some("old"));

        let json = serde_json::to_value(&patch).unwrap();
        assert!(json.get("note").is_none());
    }

    #[test]
    fn patch_that_breaks_invariants_is_rejected() {
        let rule = draft().monthly(15).build().unwrap();
        let patch = RulePatch {
            end_date: Some(Some(date(2024, 1, 1))),
            ..RulePatch::default()
        };
        assert!(patch.merge(&rule).is_err());
        assert!(RulePatch::default().is_empty());
    }

    #[test]
    fn schedule_serializes_with_frequency_tag() {
        let json = serde_json::to_value(Schedule::Monthly { day_of_month: -1 }).unwrap();
        assert_eq!(json["frequency"], "MONTHLY");
        assert_eq!(json["day_of_month"], -1);
        let once = serde_json::to_value(Schedule::Once).unwrap();
        assert_eq!(once["frequency"], "ONCE");
    }
}
