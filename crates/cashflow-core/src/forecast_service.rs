//! Daily balance projection built on top of recurrence expansion.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use cashflow_domain::{
    Account, AccountKind, CategoryKind, DateWindow, TransactionInstance,
};

use crate::{
    recurrence_service::RecurrenceService,
    storage::{AccountQuery, AccountStore, CategoryStore, ExceptionStore, RuleStore},
    CoreError,
};

/// End-of-day balance of one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalancePoint {
    pub date: NaiveDate,
    pub balance: Decimal,
}

/// Day-by-day projection for a single account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountForecast {
    pub account_id: Uuid,
    pub name: String,
    pub kind: AccountKind,
    pub currency: String,
    pub starting_balance: Decimal,
    pub points: Vec<BalancePoint>,
}

impl AccountForecast {
    pub fn balance_on(&self, date: NaiveDate) -> Option<Decimal> {
        self.points
            .binary_search_by_key(&date, |point| point.date)
            .ok()
            .map(|index| self.points[index].balance)
    }

    /// Balance at the last day of the window, or the starting balance when empty.
    pub fn closing_balance(&self) -> Decimal {
        self.points
            .last()
            .map(|point| point.balance)
            .unwrap_or(self.starting_balance)
    }
}

/// Signed balance movement of one account caused by one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceLeg {
    pub account_id: Uuid,
    pub date: NaiveDate,
    pub delta: Decimal,
}

/// Splits instances into signed per-account legs.
///
/// Transfers produce an outflow on the source and an inflow on the destination.
/// Other instances are signed by their category kind; income adds, everything
/// else subtracts. Unknown categories count as expenses.
pub fn balance_legs(
    instances: &[TransactionInstance],
    category_kinds: &HashMap<Uuid, CategoryKind>,
) -> Vec<BalanceLeg> {
    let mut legs = Vec::with_capacity(instances.len());
    for instance in instances {
        if let Some(destination) = instance.to_account_id {
            legs.push(BalanceLeg {
                account_id: instance.account_id,
                date: instance.date,
                delta: -instance.amount,
            });
            legs.push(BalanceLeg {
                account_id: destination,
                date: instance.date,
                delta: instance.amount,
            });
            continue;
        }
        let delta = match category_kinds.get(&instance.category_id) {
            Some(CategoryKind::Income) => instance.amount,
            Some(_) => -instance.amount,
            None => {
                warn!(
                    rule_id = %instance.rule_id,
                    category_id = %instance.category_id,
                    "category not found; treating occurrence as an expense"
                );
                -instance.amount
            }
        };
        legs.push(BalanceLeg {
            account_id: instance.account_id,
            date: instance.date,
            delta,
        });
    }
    legs
}

/// Net movement per account and day.
pub fn net_by_account_day(legs: &[BalanceLeg]) -> HashMap<Uuid, BTreeMap<NaiveDate, Decimal>> {
    let mut totals: HashMap<Uuid, BTreeMap<NaiveDate, Decimal>> = HashMap::new();
    for leg in legs {
        *totals
            .entry(leg.account_id)
            .or_default()
            .entry(leg.date)
            .or_insert(Decimal::ZERO) += leg.delta;
    }
    totals
}

pub struct ForecastService;

impl ForecastService {
    /// Projects the balances of the user's active accounts over `window`.
    ///
    /// `account_ids` restricts the result; `None` or an empty slice selects every
    /// active account. Each account walks forward from its stored initial balance.
    pub fn forecast<S>(
        store: &S,
        user_id: Uuid,
        window: DateWindow,
        account_ids: Option<&[Uuid]>,
        today: NaiveDate,
    ) -> Result<Vec<AccountForecast>, CoreError>
    where
        S: RuleStore + ExceptionStore + AccountStore + CategoryStore + ?Sized,
    {
        let query = match account_ids {
            Some(ids) if !ids.is_empty() => AccountQuery::only(ids.to_vec()),
            _ => AccountQuery::all(),
        };
        let accounts = store.active_accounts(user_id, &query)?;
        if accounts.is_empty() {
            return Ok(Vec::new());
        }

        let instances = RecurrenceService::expand(store, user_id, window, today)?;
        let category_kinds = Self::category_kinds(store, &instances)?;
        let legs = balance_legs(&instances, &category_kinds);
        let deltas = net_by_account_day(&legs);

        let forecasts: Vec<AccountForecast> = accounts
            .iter()
            .map(|account| Self::project_account(account, window, deltas.get(&account.id)))
            .collect();

        debug!(
            %user_id,
            %window,
            accounts = forecasts.len(),
            instances = instances.len(),
            "computed balance forecast"
        );
        Ok(forecasts)
    }

    /// Category kinds for every category referenced by `instances`.
    pub fn category_kinds<S>(
        store: &S,
        instances: &[TransactionInstance],
    ) -> Result<HashMap<Uuid, CategoryKind>, CoreError>
    where
        S: CategoryStore + ?Sized,
    {
        let mut ids: Vec<Uuid> = instances.iter().map(|instance| instance.category_id).collect();
        ids.sort();
        ids.dedup();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        Ok(store
            .categories_by_ids(&ids)?
            .into_iter()
            .map(|category| (category.id, category.kind))
            .collect())
    }

    fn project_account(
        account: &Account,
        window: DateWindow,
        deltas: Option<&BTreeMap<NaiveDate, Decimal>>,
    ) -> AccountForecast {
        let mut balance = account.initial_balance;
        let points = window
            .days()
            .map(|date| {
                if let Some(delta) = deltas.and_then(|by_day| by_day.get(&date)) {
                    balance += *delta;
                }
                BalancePoint { date, balance }
            })
            .collect();
        AccountForecast {
            account_id: account.id,
            name: account.name.clone(),
            kind: account.kind,
            currency: account.currency.clone(),
            starting_balance: account.initial_balance,
            points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashflow_domain::InstanceStatus;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn instance(account: Uuid, to: Option<Uuid>, category: Uuid, amount: i64) -> TransactionInstance {
        TransactionInstance {
            date: date(2025, 1, 10),
            rule_id: Uuid::new_v4(),
            exception_id: None,
            name: "Item".into(),
            amount: Decimal::new(amount, 0),
            currency: "USD".into(),
            account_id: account,
            to_account_id: to,
            category_id: category,
            note: None,
            is_exception: false,
            is_recurring: false,
            is_deleted: false,
            status: InstanceStatus::Pending,
        }
    }

    #[test]
    fn legs_follow_category_kind() {
        let account = Uuid::new_v4();
        let salary = Uuid::new_v4();
        let rent = Uuid::new_v4();
        let kinds = HashMap::from([(salary, CategoryKind::Income), (rent, CategoryKind::Expense)]);
        let legs = balance_legs(
            &[instance(account, None, salary, 100), instance(account, None, rent, 40)],
            &kinds,
        );
        let deltas: Vec<Decimal> = legs.iter().map(|leg| leg.delta).collect();
        assert_eq!(deltas, vec![Decimal::new(100, 0), Decimal::new(-40, 0)]);
    }

    #[test]
    fn transfers_fan_out_into_two_legs() {
        let source = Uuid::new_v4();
        let destination = Uuid::new_v4();
        let legs = balance_legs(
            &[instance(source, Some(destination), Uuid::new_v4(), 25)],
            &HashMap::new(),
        );
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[0].account_id, source);
        assert_eq!(legs[0].delta, Decimal::new(-25, 0));
        assert_eq!(legs[1].account_id, destination);
        assert_eq!(legs[1].delta, Decimal::new(25, 0));
    }

    #[test]
    fn unknown_category_counts_as_expense() {
        let account = Uuid::new_v4();
        let legs = balance_legs(&[instance(account, None, Uuid::new_v4(), 10)], &HashMap::new());
        assert_eq!(legs[0].delta, Decimal::new(-10, 0));
    }

    #[test]
    fn net_by_account_day_sums_same_day_legs() {
        let account = Uuid::new_v4();
        let legs = vec![
            BalanceLeg {
                account_id: account,
                date: date(2025, 1, 1),
                delta: Decimal::new(5, 0),
            },
            BalanceLeg {
                account_id: account,
                date: date(2025, 1, 1),
                delta: Decimal::new(-2, 0),
            },
        ];
        let totals = net_by_account_day(&legs);
        assert_eq!(totals[&account][&date(2025, 1, 1)], Decimal::new(3, 0));
    }
}
