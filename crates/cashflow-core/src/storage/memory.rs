use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cashflow_domain::{
    Account, Category, CategoryKind, DateWindow, RecurrenceRule, Reconciliation, RuleException,
};

use super::{
    AccountQuery, AccountStore, CategoryStore, ExceptionStore, ReconciliationStore, RuleStore,
    Transactional,
};
use crate::CoreError;

/// In-memory snapshot of every planner collection.
///
/// Serves as the reference store for tests and as the document persisted by
/// file-backed stores.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlannerData {
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub rules: Vec<RecurrenceRule>,
    #[serde(default)]
    pub exceptions: Vec<RuleException>,
    #[serde(default)]
    pub reconciliations: Vec<Reconciliation>,
}

impl PlannerData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_account(&mut self, account: Account) -> Uuid {
        let id = account.id;
        self.accounts.push(account);
        id
    }

    pub fn add_category(&mut self, category: Category) -> Uuid {
        let id = category.id;
        self.categories.push(category);
        id
    }
}

impl RuleStore for PlannerData {
    fn rules_for_user(&self, user_id: Uuid) -> Result<Vec<RecurrenceRule>, CoreError> {
        Ok(self
            .rules
            .iter()
            .filter(|rule| rule.user_id == user_id)
            .cloned()
            .collect())
    }

    fn rules_by_ids(&self, ids: &[Uuid]) -> Result<Vec<RecurrenceRule>, CoreError> {
        Ok(self
            .rules
            .iter()
            .filter(|rule| ids.contains(&rule.id))
            .cloned()
            .collect())
    }

    fn rule(&self, id: Uuid) -> Result<Option<RecurrenceRule>, CoreError> {
        Ok(self.rules.iter().find(|rule| rule.id == id).cloned())
    }

    fn insert_rule(&mut self, rule: RecurrenceRule) -> Result<(), CoreError> {
        if self.rules.iter().any(|existing| existing.id == rule.id) {
            return Err(CoreError::Storage(format!("rule {} already exists", rule.id)));
        }
        self.rules.push(rule);
        Ok(())
    }

    fn replace_rule(&mut self, rule: RecurrenceRule) -> Result<(), CoreError> {
        let slot = self
            .rules
            .iter_mut()
            .find(|existing| existing.id == rule.id)
            .ok_or(CoreError::RuleNotFound(rule.id))?;
        *slot = rule;
        Ok(())
    }

    fn delete_rule(&mut self, id: Uuid) -> Result<bool, CoreError> {
        let before = self.rules.len();
        self.rules.retain(|rule| rule.id != id);
        if self.rules.len() == before {
            return Ok(false);
        }
        self.exceptions.retain(|exception| exception.rule_id != id);
        Ok(true)
    }
}

impl ExceptionStore for PlannerData {
    fn exceptions_in_window(
        &self,
        rule_ids: &[Uuid],
        window: DateWindow,
    ) -> Result<Vec<RuleException>, CoreError> {
        Ok(self
            .exceptions
            .iter()
            .filter(|exception| {
                rule_ids.contains(&exception.rule_id) && window.contains(exception.date)
            })
            .cloned()
            .collect())
    }

    fn exception(
        &self,
        rule_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<RuleException>, CoreError> {
        Ok(self
            .exceptions
            .iter()
            .find(|exception| exception.rule_id == rule_id && exception.date == date)
            .cloned())
    }

    fn upsert_exception(&mut self, exception: RuleException) -> Result<(), CoreError> {
        match self
            .exceptions
            .iter_mut()
            .find(|existing| existing.rule_id == exception.rule_id && existing.date == exception.date)
        {
            Some(existing) => *existing = exception,
            None => self.exceptions.push(exception),
        }
        Ok(())
    }

    fn delete_exceptions_for_rule(&mut self, rule_id: Uuid) -> Result<usize, CoreError> {
        let before = self.exceptions.len();
        self.exceptions.retain(|exception| exception.rule_id != rule_id);
        Ok(before - self.exceptions.len())
    }
}

impl AccountStore for PlannerData {
    fn active_accounts(
        &self,
        user_id: Uuid,
        query: &AccountQuery,
    ) -> Result<Vec<Account>, CoreError> {
        Ok(self
            .accounts
            .iter()
            .filter(|account| account.user_id == user_id && account.is_active)
            .filter(|account| query.matches(account))
            .cloned()
            .collect())
    }

    fn accounts_for_user(&self, user_id: Uuid) -> Result<Vec<Account>, CoreError> {
        Ok(self
            .accounts
            .iter()
            .filter(|account| account.user_id == user_id)
            .cloned()
            .collect())
    }

    fn account(&self, id: Uuid) -> Result<Option<Account>, CoreError> {
        Ok(self.accounts.iter().find(|account| account.id == id).cloned())
    }
}

impl CategoryStore for PlannerData {
    fn categories_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Category>, CoreError> {
        Ok(self
            .categories
            .iter()
            .filter(|category| ids.contains(&category.id))
            .cloned()
            .collect())
    }

    fn upsert_system_category(
        &mut self,
        name: &str,
        kind: CategoryKind,
    ) -> Result<Category, CoreError> {
        if let Some(existing) = self
            .categories
            .iter()
            .find(|category| category.is_system && category.name == name && category.kind == kind)
        {
            return Ok(existing.clone());
        }
        let category = Category::system(name, kind);
        self.categories.push(category.clone());
        Ok(category)
    }
}

impl ReconciliationStore for PlannerData {
    fn reconciliations_for_user(
        &self,
        user_id: Uuid,
        account_id: Option<Uuid>,
    ) -> Result<Vec<Reconciliation>, CoreError> {
        let mut records: Vec<Reconciliation> = self
            .reconciliations
            .iter()
            .filter(|record| record.user_id == user_id)
            .filter(|record| account_id.map_or(true, |id| record.account_id == id))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        Ok(records)
    }

    fn reconciliation(&self, id: Uuid) -> Result<Option<Reconciliation>, CoreError> {
        Ok(self
            .reconciliations
            .iter()
            .find(|record| record.id == id)
            .cloned())
    }

    fn insert_reconciliation(&mut self, reconciliation: Reconciliation) -> Result<(), CoreError> {
        self.reconciliations.push(reconciliation);
        Ok(())
    }

    fn delete_reconciliation(&mut self, id: Uuid) -> Result<bool, CoreError> {
        let before = self.reconciliations.len();
        self.reconciliations.retain(|record| record.id != id);
        Ok(self.reconciliations.len() != before)
    }
}

impl Transactional for PlannerData {
    fn atomically<T, F>(&mut self, work: F) -> Result<T, CoreError>
    where
        F: FnOnce(&mut Self) -> Result<T, CoreError>,
    {
        let checkpoint = self.clone();
        work(self).map_err(|err| {
            *self = checkpoint;
            err
        })
    }
}
