//! Reconciliation of computed balances against statement balances.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use cashflow_domain::{
    money, Account, CategoryKind, DateWindow, RecurrenceRule, Reconciliation, Schedule,
    ADJUSTMENT_CATEGORY_NAME,
};

use crate::{
    forecast_service::ForecastService,
    storage::{AccountQuery, AccountStore, CategoryStore, ExceptionStore, PlannerStore, RuleStore},
    time::Clock,
    CoreError,
};

/// Statement balance reported by the user for one account on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationRequest {
    pub user_id: Uuid,
    pub account_id: Uuid,
    pub date: NaiveDate,
    pub actual_balance: Decimal,
    #[serde(default)]
    pub create_adjustment: bool,
    #[serde(default)]
    pub note: Option<String>,
}

pub struct ReconciliationService;

impl ReconciliationService {
    /// Records a reconciliation and, when asked and needed, a one-time adjustment rule.
    ///
    /// The category upsert, the adjustment rule and the record are written as one
    /// unit; a failure leaves the store untouched.
    pub fn reconcile<S, C>(
        store: &mut S,
        clock: &C,
        request: ReconciliationRequest,
    ) -> Result<Reconciliation, CoreError>
    where
        S: PlannerStore,
        C: Clock + ?Sized,
    {
        let account = Self::owned_active_account(&*store, request.user_id, request.account_id)?;
        let today = clock.today();
        let expected_balance = Self::expected_balance(&*store, &account, request.date, today)?;
        let actual_balance = money::normalize_amount(request.actual_balance);
        let difference = actual_balance - expected_balance;

        let record = store.atomically(|tx| {
            let adjustment_rule_id = if request.create_adjustment && !difference.is_zero() {
                Some(Self::insert_adjustment(tx, &account, request.date, difference)?)
            } else {
                None
            };
            let record = Reconciliation {
                id: Uuid::new_v4(),
                user_id: request.user_id,
                account_id: account.id,
                date: request.date,
                expected_balance,
                actual_balance,
                difference,
                adjustment_rule_id,
                note: request.note.clone(),
                created_at: clock.now(),
            };
            tx.insert_reconciliation(record.clone())?;
            Ok(record)
        })?;

        info!(
            reconciliation_id = %record.id,
            account_id = %record.account_id,
            date = %record.date,
            difference = %record.difference,
            adjusted = record.adjustment_rule_id.is_some(),
            "reconciliation recorded"
        );
        Ok(record)
    }

    /// Projected balance of `account` at the end of `date`.
    pub fn expected_balance<S>(
        store: &S,
        account: &Account,
        date: NaiveDate,
        today: NaiveDate,
    ) -> Result<Decimal, CoreError>
    where
        S: RuleStore + ExceptionStore + AccountStore + CategoryStore + ?Sized,
    {
        let from = account.initial_balance_date.min(date);
        let window = DateWindow::new(from, date)?;
        let forecasts = ForecastService::forecast(
            store,
            account.user_id,
            window,
            Some(std::slice::from_ref(&account.id)),
            today,
        )?;
        Ok(forecasts
            .into_iter()
            .find(|forecast| forecast.account_id == account.id)
            .map(|forecast| forecast.closing_balance())
            .unwrap_or(account.initial_balance))
    }

    /// Reconciliations of the user, newest first, optionally for one account.
    pub fn list<S>(
        store: &S,
        user_id: Uuid,
        account_id: Option<Uuid>,
    ) -> Result<Vec<Reconciliation>, CoreError>
    where
        S: PlannerStore,
    {
        store.reconciliations_for_user(user_id, account_id)
    }

    /// Deletes a reconciliation record. Its adjustment rule, if any, is kept.
    pub fn delete<S>(store: &mut S, user_id: Uuid, reconciliation_id: Uuid) -> Result<(), CoreError>
    where
        S: PlannerStore,
    {
        let record = store
            .reconciliation(reconciliation_id)?
            .ok_or(CoreError::ReconciliationNotFound(reconciliation_id))?;
        if record.user_id != user_id {
            return Err(CoreError::Forbidden(format!(
                "reconciliation {reconciliation_id}"
            )));
        }
        store.delete_reconciliation(reconciliation_id)?;
        info!(%reconciliation_id, "reconciliation deleted");
        Ok(())
    }

    fn owned_active_account<S>(
        store: &S,
        user_id: Uuid,
        account_id: Uuid,
    ) -> Result<Account, CoreError>
    where
        S: AccountStore + ?Sized,
    {
        store
            .active_accounts(user_id, &AccountQuery::only(vec![account_id]))?
            .into_iter()
            .next()
            .ok_or(CoreError::AccountNotFound(account_id))
    }

    fn insert_adjustment<S>(
        store: &mut S,
        account: &Account,
        date: NaiveDate,
        difference: Decimal,
    ) -> Result<Uuid, CoreError>
    where
        S: PlannerStore,
    {
        let kind = if difference > Decimal::ZERO {
            CategoryKind::Income
        } else {
            CategoryKind::Expense
        };
        let category = store.upsert_system_category(ADJUSTMENT_CATEGORY_NAME, kind)?;
        let sign = if difference > Decimal::ZERO { "+" } else { "" };
        let rule = RecurrenceRule {
            id: Uuid::new_v4(),
            user_id: account.user_id,
            account_id: account.id,
            to_account_id: None,
            category_id: category.id,
            name: format!("{ADJUSTMENT_CATEGORY_NAME} ({sign}{difference})"),
            amount: difference.abs(),
            currency: money::normalize_currency(&account.currency)?,
            note: Some("Automatic adjustment from reconciliation".into()),
            schedule: Schedule::Once,
            start_date: date,
            end_date: None,
        };
        rule.validate()?;
        let rule_id = rule.id;
        store.insert_rule(rule)?;
        Ok(rule_id)
    }
}
