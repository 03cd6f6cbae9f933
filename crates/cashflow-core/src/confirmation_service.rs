//! Confirmation of occurrences booked against placeholder (planning) accounts.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;
use uuid::Uuid;

use cashflow_domain::{shift_days, DateWindow, ExceptionPatch, Owned, TransactionInstance};

use crate::{
    overlay,
    recurrence_service::RecurrenceService,
    rule_service::RuleService,
    storage::{AccountQuery, PlannerStore},
    CoreError,
};

/// Default look-back used when searching for unconfirmed occurrences.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 365;

/// Which occurrences of a rule a bulk confirmation reassigns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmTarget {
    /// Move the whole series to the confirmed account.
    All,
    /// Every occurrence from the look-back start through today.
    Past,
    Dates(Vec<NaiveDate>),
}

pub struct ConfirmationService;

impl ConfirmationService {
    /// Past occurrences sitting on an active planning account that nobody has confirmed.
    pub fn pending<S: PlannerStore>(
        store: &S,
        user_id: Uuid,
        today: NaiveDate,
        lookback_days: i64,
    ) -> Result<Vec<TransactionInstance>, CoreError> {
        let planning: Vec<_> = store
            .active_accounts(user_id, &AccountQuery::all())?
            .into_iter()
            .filter(|account| account.is_planning())
            .collect();
        if planning.is_empty() {
            return Ok(Vec::new());
        }

        let window = DateWindow::new(shift_days(today, -lookback_days.max(0)), today)?;
        let instances = RecurrenceService::expand(store, user_id, window, today)?;
        Ok(instances
            .into_iter()
            .filter(|instance| {
                planning.iter().any(|account| {
                    account.id == instance.account_id
                        && overlay::needs_confirmation(instance, account.kind)
                })
            })
            .collect())
    }

    /// Assigns `account_id` to the targeted occurrences of a rule and marks them
    /// confirmed. Returns how many occurrences were touched; `All` counts as one.
    #[allow(clippy::too_many_arguments)]
    pub fn bulk_confirm<S: PlannerStore>(
        store: &mut S,
        user_id: Uuid,
        rule_id: Uuid,
        account_id: Uuid,
        target: ConfirmTarget,
        today: NaiveDate,
        lookback_days: i64,
        now: DateTime<Utc>,
    ) -> Result<usize, CoreError> {
        let rule = RuleService::owned_rule(&*store, user_id, rule_id)?;
        match store.account(account_id)? {
            Some(account) if account.is_owned_by(user_id) => {}
            _ => return Err(CoreError::AccountNotFound(account_id)),
        }

        let dates: Vec<NaiveDate> = match target {
            ConfirmTarget::All => {
                let mut moved = rule;
                moved.account_id = account_id;
                moved.validate()?;
                store.replace_rule(moved)?;
                info!(%rule_id, %account_id, "confirmed every occurrence");
                return Ok(1);
            }
            ConfirmTarget::Past => {
                let window = DateWindow::new(shift_days(today, -lookback_days.max(0)), today)?;
                RecurrenceService::expand(&*store, user_id, window, today)?
                    .into_iter()
                    .filter(|instance| instance.rule_id == rule_id)
                    .map(|instance| instance.date)
                    .collect()
            }
            ConfirmTarget::Dates(dates) => {
                if dates.is_empty() {
                    return Err(CoreError::Validation(
                        "at least one date is required".into(),
                    ));
                }
                let mut seen = HashSet::new();
                dates.into_iter().filter(|date| seen.insert(*date)).collect()
            }
        };

        let patch = ExceptionPatch::confirm(account_id, now);
        let count = store.atomically(|tx| {
            for date in &dates {
                let existing = tx.exception(rule_id, *date)?;
                let exception = patch.merge(existing.as_ref(), rule_id, *date)?;
                tx.upsert_exception(exception)?;
            }
            Ok(dates.len())
        })?;
        info!(%rule_id, %account_id, count, "confirmed occurrences");
        Ok(count)
    }
}
