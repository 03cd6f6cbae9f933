//! Dashboard aggregation: account summary, upcoming instances and balance trends.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use cashflow_domain::{shift_days, Account, AccountBucket, DateWindow};

use crate::{
    forecast_service::ForecastService,
    recurrence_service::RecurrenceService,
    storage::{
        AccountQuery, AccountStore, CategoryStore, ExceptionStore, ReconciliationStore, RuleStore,
    },
    CoreError,
};

/// Label used when an instance references an account or category that no longer exists.
pub const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardOptions {
    pub history_days: i64,
    pub forecast_days: i64,
    pub upcoming_days: i64,
    pub upcoming_limit: usize,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            history_days: 60,
            forecast_days: 30,
            upcoming_days: 30,
            upcoming_limit: 50,
        }
    }
}

/// Point-in-time totals over the user's real (non-planning) accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FinancialSummary {
    pub liquid_assets: Decimal,
    pub investments: Decimal,
    /// Sum of absolute balances of credit cards and loans.
    pub credit_used: Decimal,
    pub loans_receivable: Decimal,
    pub net_worth: Decimal,
    pub account_count: usize,
}

impl FinancialSummary {
    pub fn from_accounts(accounts: &[Account]) -> Self {
        let mut summary = FinancialSummary::default();
        for account in accounts {
            let balance = account.initial_balance;
            match account.bucket() {
                AccountBucket::Liquid => summary.liquid_assets += balance,
                AccountBucket::Investment => summary.investments += balance,
                AccountBucket::Credit => summary.credit_used += balance.abs(),
                AccountBucket::Receivable => summary.loans_receivable += balance,
                AccountBucket::Planning => continue,
            }
            summary.account_count += 1;
        }
        summary.net_worth = summary.liquid_assets + summary.investments - summary.credit_used
            + summary.loans_receivable;
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpcomingTransaction {
    pub rule_id: Uuid,
    pub date: NaiveDate,
    pub name: String,
    pub amount: Decimal,
    pub currency: String,
    pub account_name: String,
    pub category_name: String,
    pub is_transfer: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub balance: Decimal,
}

/// Four aligned series: every series carries a point for the same dates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BalanceTrends {
    pub overall: Vec<TrendPoint>,
    pub liquid: Vec<TrendPoint>,
    pub investments: Vec<TrendPoint>,
    /// Signed: credit balances are usually negative.
    pub credit: Vec<TrendPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub summary: FinancialSummary,
    pub upcoming: Vec<UpcomingTransaction>,
    pub trends: BalanceTrends,
    pub scheduled_count: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct BucketTotals {
    overall: Decimal,
    liquid: Decimal,
    investments: Decimal,
    credit: Decimal,
}

impl BucketTotals {
    fn add(&mut self, bucket: AccountBucket, balance: Decimal) {
        self.overall += balance;
        match bucket {
            AccountBucket::Liquid => self.liquid += balance,
            AccountBucket::Investment => self.investments += balance,
            AccountBucket::Credit => self.credit += balance,
            AccountBucket::Receivable | AccountBucket::Planning => {}
        }
    }
}

pub struct DashboardService;

impl DashboardService {
    pub fn dashboard<S>(
        store: &S,
        user_id: Uuid,
        today: NaiveDate,
        options: DashboardOptions,
    ) -> Result<Dashboard, CoreError>
    where
        S: RuleStore
            + ExceptionStore
            + AccountStore
            + CategoryStore
            + ReconciliationStore
            + ?Sized,
    {
        let accounts = store.active_accounts(user_id, &AccountQuery::without_planning())?;
        let summary = FinancialSummary::from_accounts(&accounts);
        let upcoming = Self::upcoming(store, user_id, today, options)?;
        let trends = Self::trends(store, user_id, today, options, &accounts)?;
        let scheduled_count = store.count_rules_for_user(user_id)?;

        debug!(
            %user_id,
            accounts = summary.account_count,
            upcoming = upcoming.len(),
            trend_points = trends.overall.len(),
            "assembled dashboard"
        );
        Ok(Dashboard {
            summary,
            upcoming,
            trends,
            scheduled_count,
        })
    }

    /// Instances from today through `upcoming_days`, capped at `upcoming_limit`.
    pub fn upcoming<S>(
        store: &S,
        user_id: Uuid,
        today: NaiveDate,
        options: DashboardOptions,
    ) -> Result<Vec<UpcomingTransaction>, CoreError>
    where
        S: RuleStore + ExceptionStore + AccountStore + CategoryStore + ?Sized,
    {
        let window = DateWindow::starting(today, options.upcoming_days);
        let mut instances = RecurrenceService::expand(store, user_id, window, today)?;
        instances.truncate(options.upcoming_limit);

        let account_names: HashMap<Uuid, String> = store
            .accounts_for_user(user_id)?
            .into_iter()
            .map(|account| (account.id, account.name))
            .collect();
        let mut category_ids: Vec<Uuid> = instances.iter().map(|i| i.category_id).collect();
        category_ids.sort();
        category_ids.dedup();
        let category_names: HashMap<Uuid, String> = store
            .categories_by_ids(&category_ids)?
            .into_iter()
            .map(|category| (category.id, category.name))
            .collect();

        Ok(instances
            .into_iter()
            .map(|instance| UpcomingTransaction {
                account_name: account_names
                    .get(&instance.account_id)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
                category_name: category_names
                    .get(&instance.category_id)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
                is_transfer: instance.is_transfer(),
                rule_id: instance.rule_id,
                date: instance.date,
                name: instance.name,
                amount: instance.amount,
                currency: instance.currency,
            })
            .collect())
    }

    /// Historical checkpoints with forward-fill followed by the daily forecast.
    ///
    /// `accounts` are the active non-planning accounts; anything else is ignored.
    pub fn trends<S>(
        store: &S,
        user_id: Uuid,
        today: NaiveDate,
        options: DashboardOptions,
        accounts: &[Account],
    ) -> Result<BalanceTrends, CoreError>
    where
        S: RuleStore
            + ExceptionStore
            + AccountStore
            + CategoryStore
            + ReconciliationStore
            + ?Sized,
    {
        let buckets: HashMap<Uuid, AccountBucket> = accounts
            .iter()
            .filter(|account| !account.is_planning())
            .map(|account| (account.id, account.bucket()))
            .collect();
        let history_start = shift_days(today, -options.history_days.max(0));

        let mut events: Vec<(NaiveDate, Uuid, Decimal)> = accounts
            .iter()
            .filter(|account| buckets.contains_key(&account.id))
            .filter(|account| account.initial_balance_date <= today)
            .map(|account| {
                (
                    account.initial_balance_date,
                    account.id,
                    account.initial_balance,
                )
            })
            .collect();
        let mut reconciliations = store.reconciliations_for_user(user_id, None)?;
        reconciliations.sort_by_key(|record| (record.date, record.created_at));
        events.extend(
            reconciliations
                .into_iter()
                .filter(|record| record.date <= today && buckets.contains_key(&record.account_id))
                .map(|record| (record.date, record.account_id, record.actual_balance)),
        );
        events.sort_by_key(|(date, _, _)| *date);

        let mut totals: BTreeMap<NaiveDate, BucketTotals> = BTreeMap::new();
        let mut last_known: HashMap<Uuid, Decimal> = HashMap::new();
        let mut pending = events.iter().peekable();
        let mut emit_dates: Vec<NaiveDate> = events
            .iter()
            .map(|(date, _, _)| *date)
            .filter(|date| *date >= history_start && *date < today)
            .collect();
        emit_dates.dedup();

        for date in emit_dates {
            while let Some((_, account_id, balance)) =
                pending.next_if(|(event_date, _, _)| *event_date <= date)
            {
                last_known.insert(*account_id, *balance);
            }
            let entry = totals.entry(date).or_default();
            for (account_id, balance) in &last_known {
                if let Some(bucket) = buckets.get(account_id) {
                    entry.add(*bucket, *balance);
                }
            }
        }

        let forecast_window = DateWindow::starting(today, options.forecast_days);
        for forecast in ForecastService::forecast(store, user_id, forecast_window, None, today)? {
            let Some(bucket) = buckets.get(&forecast.account_id) else {
                continue;
            };
            for point in &forecast.points {
                totals.entry(point.date).or_default().add(*bucket, point.balance);
            }
        }

        let mut trends = BalanceTrends::default();
        for (date, total) in totals {
            trends.overall.push(TrendPoint {
                date,
                balance: total.overall,
            });
            trends.liquid.push(TrendPoint {
                date,
                balance: total.liquid,
            });
            trends.investments.push(TrendPoint {
                date,
                balance: total.investments,
            });
            trends.credit.push(TrendPoint {
                date,
                balance: total.credit,
            });
        }
        Ok(trends)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashflow_domain::AccountKind;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn account(kind: AccountKind, balance: i64) -> Account {
        Account::new(
            Uuid::new_v4(),
            "Acct",
            kind,
            "USD",
            Decimal::new(balance, 0),
            date(2025, 1, 1),
        )
    }

    #[test]
    fn summary_groups_accounts_by_bucket() {
        let accounts = vec![
            account(AccountKind::Checking, 1000),
            account(AccountKind::Savings, 500),
            account(AccountKind::Investment, 2000),
            account(AccountKind::CreditCard, -300),
            account(AccountKind::LoanGiven, 150),
        ];
        let summary = FinancialSummary::from_accounts(&accounts);
        assert_eq!(summary.liquid_assets, Decimal::new(1500, 0));
        assert_eq!(summary.investments, Decimal::new(2000, 0));
        assert_eq!(summary.credit_used, Decimal::new(300, 0));
        assert_eq!(summary.loans_receivable, Decimal::new(150, 0));
        assert_eq!(summary.net_worth, Decimal::new(3350, 0));
        assert_eq!(summary.account_count, 5);
    }

    #[test]
    fn summary_skips_planning_accounts() {
        let accounts = vec![
            account(AccountKind::Cash, 10),
            account(AccountKind::Planning, 9999),
        ];
        let summary = FinancialSummary::from_accounts(&accounts);
        assert_eq!(summary.net_worth, Decimal::new(10, 0));
        assert_eq!(summary.account_count, 1);
    }

    #[test]
    fn default_options_match_dashboard_defaults() {
        let options = DashboardOptions::default();
        assert_eq!(options.history_days, 60);
        assert_eq!(options.forecast_days, 30);
        assert_eq!(options.upcoming_days, 30);
        assert_eq!(options.upcoming_limit, 50);
    }
}
