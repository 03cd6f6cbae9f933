//! Per-occurrence overrides attached to a rule and a concrete date.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{money, DomainError};

/// Lifecycle of a materialized occurrence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    Pending,
    Completed,
    Confirmed,
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InstanceStatus::Pending => "pending",
            InstanceStatus::Completed => "completed",
            InstanceStatus::Confirmed => "confirmed",
        };
        f.write_str(label)
    }
}

/// Override or suppression of a single occurrence, keyed by `(rule_id, date)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleException {
    pub id: Uuid,
    pub rule_id: Uuid,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_account_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<InstanceStatus>,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl RuleException {
    /// An exception with no overrides yet. Not valid until something is set.
    pub fn new(rule_id: Uuid, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            rule_id,
            date,
            amount: None,
            note: None,
            account_id: None,
            to_account_id: None,
            status: None,
            is_deleted: false,
            completed_at: None,
            confirmed_at: None,
        }
    }

    /// Suppresses the occurrence at `date`.
    pub fn deleted(rule_id: Uuid, date: NaiveDate) -> Self {
        Self {
            is_deleted: true,
            ..Self::new(rule_id, date)
        }
    }

    pub fn has_overrides(&self) -> bool {
        self.amount.is_some()
            || self.note.is_some()
            || self.account_id.is_some()
            || self.to_account_id.is_some()
            || self.status.is_some()
            || self.completed_at.is_some()
            || self.confirmed_at.is_some()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.is_deleted && !self.has_overrides() {
            return Err(DomainError::EmptyException);
        }
        if let Some(amount) = self.amount {
            money::ensure_positive(amount)?;
        }
        Ok(())
    }
}

/// Sparse exception edit. Merging onto an existing exception keeps its unset fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExceptionPatch {
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub account_id: Option<Uuid>,
    #[serde(default)]
    pub to_account_id: Option<Uuid>,
    #[serde(default)]
    pub status: Option<InstanceStatus>,
    #[serde(default)]
    pub is_deleted: Option<bool>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl ExceptionPatch {
    pub fn delete() -> Self {
        Self {
            is_deleted: Some(true),
            ..Self::default()
        }
    }

    pub fn confirm(account_id: Uuid, at: DateTime<Utc>) -> Self {
        Self {
            account_id: Some(account_id),
            status: Some(InstanceStatus::Confirmed),
            confirmed_at: Some(at),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == ExceptionPatch::default()
    }

    /// Builds the exception that results from applying this patch to `existing`
    /// (or to a blank exception for `rule_id`/`date` when none exists yet).
    pub fn merge(
        &self,
        existing: Option<&RuleException>,
        rule_id: Uuid,
        date: NaiveDate,
    ) -> Result<RuleException, DomainError> {
        let base = existing
            .cloned()
            .unwrap_or_else(|| RuleException::new(rule_id, date));
        let merged = RuleException {
            amount: self.amount.map(money::normalize_amount).or(base.amount),
            note: self.note.clone().or(base.note),
            account_id: self.account_id.or(base.account_id),
            to_account_id: self.to_account_id.or(base.to_account_id),
            status: self.status.or(base.status),
            is_deleted: self.is_deleted.unwrap_or(base.is_deleted),
            completed_at: self.completed_at.or(base.completed_at),
            confirmed_at: self.confirmed_at.or(base.confirmed_at),
            ..base
        };
        merged.validate()?;
        Ok(merged)
    }
}
