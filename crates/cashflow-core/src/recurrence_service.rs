//! Expansion of a user's rules into dated transaction instances.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;
use uuid::Uuid;

use cashflow_domain::{DateWindow, RuleException, TransactionInstance};

use crate::{
    occurrence, overlay,
    storage::{ExceptionStore, RuleStore},
    CoreError,
};

pub struct RecurrenceService;

impl RecurrenceService {
    /// Every non-suppressed instance of the user's rules inside `window`, sorted by date.
    ///
    /// Instances on the same date keep rule load order. Planning accounts are not
    /// filtered here.
    pub fn expand<S>(
        store: &S,
        user_id: Uuid,
        window: DateWindow,
        today: NaiveDate,
    ) -> Result<Vec<TransactionInstance>, CoreError>
    where
        S: RuleStore + ExceptionStore + ?Sized,
    {
        let rules = store.rules_for_user(user_id)?;
        if rules.is_empty() {
            return Ok(Vec::new());
        }

        let rule_ids: Vec<Uuid> = rules.iter().map(|rule| rule.id).collect();
        let exceptions: HashMap<(Uuid, NaiveDate), RuleException> = store
            .exceptions_in_window(&rule_ids, window)?
            .into_iter()
            .map(|exception| ((exception.rule_id, exception.date), exception))
            .collect();

        let mut instances = Vec::new();
        for rule in &rules {
            for date in occurrence::generate(rule, window) {
                let exception = exceptions.get(&(rule.id, date));
                if let Some(instance) = overlay::apply(rule, date, exception, today) {
                    instances.push(instance);
                }
            }
        }
        instances.sort_by_key(|instance| instance.date);

        debug!(
            %user_id,
            %window,
            rules = rules.len(),
            exceptions = exceptions.len(),
            instances = instances.len(),
            "expanded recurrence rules"
        );
        Ok(instances)
    }
}
