//! Creation, editing and deletion of recurrence rules.
//!
//! Edits of a recurring rule can target the whole series, one occurrence or an
//! occurrence and everything after it.

use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use cashflow_domain::{
    shift_days, ExceptionPatch, Owned, RecurrenceRule, RuleDraft, RuleException, RulePatch,
};

use crate::{storage::PlannerStore, CoreError};

/// Which occurrences an edit or deletion applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    All,
    /// Only the occurrence on this date.
    ThisOnly(NaiveDate),
    /// The occurrence on this date and every later one.
    ThisAndFuture(NaiveDate),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuleUpdate {
    Replaced(RecurrenceRule),
    Overridden(RuleException),
    Split {
        original: RecurrenceRule,
        successor: RecurrenceRule,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuleDeletion {
    Deleted { exceptions_removed: usize },
    Skipped(RuleException),
    Ended(RecurrenceRule),
}

pub struct RuleService;

impl RuleService {
    /// Validates `draft`, checks that everything it references belongs to its owner
    /// and stores the resulting rule.
    pub fn create<S: PlannerStore>(
        store: &mut S,
        draft: RuleDraft,
    ) -> Result<RecurrenceRule, CoreError> {
        let rule = draft.build()?;
        Self::check_references(&*store, &rule)?;
        store.insert_rule(rule.clone())?;
        info!(rule_id = %rule.id, user_id = %rule.user_id, recurring = rule.is_recurring(), "rule created");
        Ok(rule)
    }

    pub fn list<S: PlannerStore>(
        store: &S,
        user_id: Uuid,
    ) -> Result<Vec<RecurrenceRule>, CoreError> {
        store.rules_for_user(user_id)
    }

    pub fn update<S: PlannerStore>(
        store: &mut S,
        user_id: Uuid,
        rule_id: Uuid,
        mode: EditMode,
        patch: RulePatch,
    ) -> Result<RuleUpdate, CoreError> {
        let rule = Self::owned_rule(&*store, user_id, rule_id)?;
        match mode {
            EditMode::All => {
                let updated = patch.merge(&rule)?;
                Self::check_references(&*store, &updated)?;
                store.replace_rule(updated.clone())?;
                info!(%rule_id, "rule updated");
                Ok(RuleUpdate::Replaced(updated))
            }
            EditMode::ThisOnly(date) => {
                Self::require_recurring(&rule, "THIS_ONLY")?;
                // An occurrence can only override, so a cleared field counts as unset.
                let overrides = ExceptionPatch {
                    amount: patch.amount,
                    note: patch.note.clone().flatten(),
                    account_id: patch.account_id,
                    to_account_id: patch.to_account_id.flatten(),
                    ..ExceptionPatch::default()
                };
                if overrides.is_empty() {
                    return Err(CoreError::Validation(
                        "no per-occurrence fields provided (amount, note, account, destination)"
                            .into(),
                    ));
                }
                let target = RulePatch {
                    account_id: overrides.account_id,
                    to_account_id: overrides.to_account_id.map(Some),
                    ..RulePatch::default()
                }
                .merge(&rule)?;
                Self::check_references(&*store, &target)?;

                let existing = store.exception(rule_id, date)?;
                let exception = overrides.merge(existing.as_ref(), rule_id, date)?;
                store.upsert_exception(exception.clone())?;
                info!(%rule_id, %date, "occurrence overridden");
                Ok(RuleUpdate::Overridden(exception))
            }
            EditMode::ThisAndFuture(date) => {
                Self::require_recurring(&rule, "THIS_AND_FUTURE")?;
                let original = RulePatch {
                    end_date: Some(Some(shift_days(date, -1))),
                    ..RulePatch::default()
                }
                .merge(&rule)?;
                let mut successor = RulePatch {
                    schedule: None,
                    start_date: Some(date),
                    end_date: Some(rule.end_date),
                    ..patch
                }
                .merge(&rule)?;
                successor.id = Uuid::new_v4();
                Self::check_references(&*store, &successor)?;

                store.atomically(|tx| {
                    tx.replace_rule(original.clone())?;
                    tx.insert_rule(successor.clone())
                })?;
                info!(
                    %rule_id,
                    successor_id = %successor.id,
                    split_at = %date,
                    "rule split"
                );
                Ok(RuleUpdate::Split {
                    original,
                    successor,
                })
            }
        }
    }

    pub fn delete<S: PlannerStore>(
        store: &mut S,
        user_id: Uuid,
        rule_id: Uuid,
        mode: EditMode,
    ) -> Result<RuleDeletion, CoreError> {
        let rule = Self::owned_rule(&*store, user_id, rule_id)?;
        match mode {
            EditMode::All => {
                let exceptions_removed = store.atomically(|tx| {
                    let removed = tx.delete_exceptions_for_rule(rule_id)?;
                    tx.delete_rule(rule_id)?;
                    Ok(removed)
                })?;
                info!(%rule_id, exceptions_removed, "rule deleted");
                Ok(RuleDeletion::Deleted { exceptions_removed })
            }
            EditMode::ThisOnly(date) => {
                Self::require_recurring(&rule, "THIS_ONLY")?;
                let existing = store.exception(rule_id, date)?;
                let exception = ExceptionPatch::delete().merge(existing.as_ref(), rule_id, date)?;
                store.upsert_exception(exception.clone())?;
                info!(%rule_id, %date, "occurrence skipped");
                Ok(RuleDeletion::Skipped(exception))
            }
            EditMode::ThisAndFuture(date) => {
                Self::require_recurring(&rule, "THIS_AND_FUTURE")?;
                let ended = RulePatch {
                    end_date: Some(Some(shift_days(date, -1))),
                    ..RulePatch::default()
                }
                .merge(&rule)?;
                store.replace_rule(ended.clone())?;
                info!(%rule_id, %date, "rule ended");
                Ok(RuleDeletion::Ended(ended))
            }
        }
    }

    /// Loads a rule, distinguishing a missing rule from someone else's rule.
    pub fn owned_rule<S: PlannerStore>(
        store: &S,
        user_id: Uuid,
        rule_id: Uuid,
    ) -> Result<RecurrenceRule, CoreError> {
        let rule = store
            .rule(rule_id)?
            .ok_or(CoreError::RuleNotFound(rule_id))?;
        if !rule.is_owned_by(user_id) {
            return Err(CoreError::Forbidden(format!("rule {rule_id}")));
        }
        Ok(rule)
    }

    fn require_recurring(rule: &RecurrenceRule, mode: &str) -> Result<(), CoreError> {
        if rule.is_recurring() {
            Ok(())
        } else {
            Err(CoreError::InvalidOperation(format!(
                "{mode} only applies to recurring rules"
            )))
        }
    }

    fn check_references<S: PlannerStore>(store: &S, rule: &RecurrenceRule) -> Result<(), CoreError> {
        let owned_account = |id: Uuid| -> Result<(), CoreError> {
            match store.account(id)? {
                Some(account) if account.is_owned_by(rule.user_id) => Ok(()),
                _ => Err(CoreError::AccountNotFound(id)),
            }
        };
        owned_account(rule.account_id)?;
        if let Some(destination) = rule.to_account_id {
            owned_account(destination)?;
            if destination == rule.account_id {
                return Err(CoreError::Validation(
                    "source and destination accounts must be different".into(),
                ));
            }
        }

        let category = store
            .categories_by_ids(&[rule.category_id])?
            .into_iter()
            .next()
            .ok_or(CoreError::CategoryNotFound(rule.category_id))?;
        if !category.is_system && category.user_id != Some(rule.user_id) {
            return Err(CoreError::Forbidden(format!("category {}", category.id)));
        }
        Ok(())
    }
}
