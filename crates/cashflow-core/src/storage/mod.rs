//! Persistence seams consumed by the services.
//!
//! Reads take `&self`; writes take `&mut self`. Multi-step mutations go through
//! [`Transactional::atomically`] so a failure leaves no partial writes behind.

mod memory;

use chrono::NaiveDate;
use uuid::Uuid;

use cashflow_domain::{
    Account, Category, CategoryKind, DateWindow, RecurrenceRule, Reconciliation, RuleException,
};

use crate::CoreError;

pub use memory::PlannerData;

pub trait RuleStore {
    /// Every rule owned by `user_id`, in insertion order.
    fn rules_for_user(&self, user_id: Uuid) -> Result<Vec<RecurrenceRule>, CoreError>;
    fn rules_by_ids(&self, ids: &[Uuid]) -> Result<Vec<RecurrenceRule>, CoreError>;
    fn rule(&self, id: Uuid) -> Result<Option<RecurrenceRule>, CoreError>;
    fn insert_rule(&mut self, rule: RecurrenceRule) -> Result<(), CoreError>;
    fn replace_rule(&mut self, rule: RecurrenceRule) -> Result<(), CoreError>;
    /// Removes the rule and its exceptions. Returns `false` when nothing matched.
    fn delete_rule(&mut self, id: Uuid) -> Result<bool, CoreError>;

    fn count_rules_for_user(&self, user_id: Uuid) -> Result<usize, CoreError> {
        Ok(self.rules_for_user(user_id)?.len())
    }
}

pub trait ExceptionStore {
    /// Exceptions of the given rules whose date falls inside `window`.
    fn exceptions_in_window(
        &self,
        rule_ids: &[Uuid],
        window: DateWindow,
    ) -> Result<Vec<RuleException>, CoreError>;
    fn exception(&self, rule_id: Uuid, date: NaiveDate)
        -> Result<Option<RuleException>, CoreError>;
    /// Inserts or replaces the exception keyed by `(rule_id, date)`.
    fn upsert_exception(&mut self, exception: RuleException) -> Result<(), CoreError>;
    fn delete_exceptions_for_rule(&mut self, rule_id: Uuid) -> Result<usize, CoreError>;
}

/// Filter applied when listing a user's active accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountQuery {
    pub account_ids: Option<Vec<Uuid>>,
    pub exclude_planning: bool,
}

impl AccountQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn only(account_ids: Vec<Uuid>) -> Self {
        Self {
            account_ids: Some(account_ids),
            exclude_planning: false,
        }
    }

    pub fn without_planning() -> Self {
        Self {
            account_ids: None,
            exclude_planning: true,
        }
    }

    pub fn matches(&self, account: &Account) -> bool {
        if self.exclude_planning && account.is_planning() {
            return false;
        }
        self.account_ids
            .as_ref()
            .map_or(true, |ids| ids.contains(&account.id))
    }
}

pub trait AccountStore {
    fn active_accounts(
        &self,
        user_id: Uuid,
        query: &AccountQuery,
    ) -> Result<Vec<Account>, CoreError>;
    /// All accounts of the user, inactive ones included.
    fn accounts_for_user(&self, user_id: Uuid) -> Result<Vec<Account>, CoreError>;
    fn account(&self, id: Uuid) -> Result<Option<Account>, CoreError>;
}

pub trait CategoryStore {
    fn categories_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Category>, CoreError>;
    /// Returns the system category `(name, kind)`, creating it when missing.
    fn upsert_system_category(
        &mut self,
        name: &str,
        kind: CategoryKind,
    ) -> Result<Category, CoreError>;
}

pub trait ReconciliationStore {
    /// Newest first.
    fn reconciliations_for_user(
        &self,
        user_id: Uuid,
        account_id: Option<Uuid>,
    ) -> Result<Vec<Reconciliation>, CoreError>;
    fn reconciliation(&self, id: Uuid) -> Result<Option<Reconciliation>, CoreError>;
    fn insert_reconciliation(&mut self, reconciliation: Reconciliation) -> Result<(), CoreError>;
    fn delete_reconciliation(&mut self, id: Uuid) -> Result<bool, CoreError>;
}

pub trait Transactional: Sized {
    /// Runs `work` as one unit: either every write it performs is kept or none is.
    fn atomically<T, F>(&mut self, work: F) -> Result<T, CoreError>
    where
        F: FnOnce(&mut Self) -> Result<T, CoreError>;
}

/// Everything the services need from a backend.
pub trait PlannerStore:
    RuleStore + ExceptionStore + AccountStore + CategoryStore + ReconciliationStore + Transactional
{
}

impl<T> PlannerStore for T where
    T: RuleStore
        + ExceptionStore
        + AccountStore
        + CategoryStore
        + ReconciliationStore
        + Transactional
{
}
