//! Applies a per-date exception to a rule occurrence.

use chrono::NaiveDate;

use cashflow_domain::{
    AccountKind, InstanceStatus, RecurrenceRule, RuleException, TransactionInstance,
};

/// Materializes the occurrence of `rule` at `date`, or `None` when it is suppressed.
///
/// Amount, note, account and destination come from the exception when it sets
/// them. Name, category and currency always come from the rule.
pub fn apply(
    rule: &RecurrenceRule,
    date: NaiveDate,
    exception: Option<&RuleException>,
    today: NaiveDate,
) -> Option<TransactionInstance> {
    if exception.is_some_and(|exc| exc.is_deleted) {
        return None;
    }

    let amount = exception
        .and_then(|exc| exc.amount)
        .unwrap_or(rule.amount);
    let note = match exception.and_then(|exc| exc.note.clone()) {
        Some(note) => Some(note),
        None => rule.note.clone(),
    };
    let account_id = exception
        .and_then(|exc| exc.account_id)
        .unwrap_or(rule.account_id);
    let to_account_id = exception
        .and_then(|exc| exc.to_account_id)
        .or(rule.to_account_id);

    Some(TransactionInstance {
        date,
        rule_id: rule.id,
        exception_id: exception.map(|exc| exc.id),
        name: rule.name.clone(),
        amount,
        currency: rule.currency.clone(),
        account_id,
        to_account_id,
        category_id: rule.category_id,
        note,
        is_exception: exception.is_some(),
        is_recurring: rule.is_recurring(),
        is_deleted: false,
        status: default_status(date, exception, today),
    })
}

/// Status before the account kind is known: explicit status, else by date.
pub fn default_status(
    date: NaiveDate,
    exception: Option<&RuleException>,
    today: NaiveDate,
) -> InstanceStatus {
    if let Some(status) = exception.and_then(|exc| exc.status) {
        return status;
    }
    if date > today {
        InstanceStatus::Pending
    } else {
        InstanceStatus::Completed
    }
}

/// Whether a past occurrence still needs the user to say where the money went.
///
/// Only placeholder (planning) accounts hold instances that need confirmation;
/// elsewhere a completed instance is final.
pub fn needs_confirmation(instance: &TransactionInstance, account_kind: AccountKind) -> bool {
    account_kind == AccountKind::Planning && instance.status == InstanceStatus::Completed
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashflow_domain::Schedule;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rule() -> RecurrenceRule {
        RecurrenceRule {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            to_account_id: None,
            category_id: Uuid::new_v4(),
            name: "Gym".into(),
            amount: Decimal::new(4000, 2),
            currency: "EUR".into(),
            note: Some("membership".into()),
            schedule: Schedule::Monthly { day_of_month: 3 },
            start_date: date(2025, 1, 3),
            end_date: None,
        }
    }

    #[test]
    fn plain_occurrence_copies_rule_fields() {
        let rule = rule();
        let instance = apply(&rule, date(2025, 2, 3), None, date(2025, 1, 10)).unwrap();
        assert_eq!(instance.amount, rule.amount);
        assert_eq!(instance.account_id, rule.account_id);
        assert_eq!(instance.note.as_deref(), Some("membership"));
        assert!(!instance.is_exception);
        assert!(instance.is_recurring);
        assert_eq!(instance.status, InstanceStatus::Pending);
    }

    #[test]
    fn exception_overrides_only_its_fields() {
        let rule = rule();
        let mut exception = RuleException::new(rule.id, date(2025, 2, 3));
        exception.amount = Some(Decimal::new(2000, 2));
        let instance = apply(&rule, exception.date, Some(&exception), date(2025, 1, 10)).unwrap();
        assert_eq!(instance.amount, Decimal::new(2000, 2));
        assert_eq!(instance.note, rule.note);
        assert_eq!(instance.name, rule.name);
        assert_eq!(instance.exception_id, Some(exception.id));
        assert!(instance.is_exception);
    }

    #[test]
    fn deleted_exception_suppresses_occurrence() {
        let rule = rule();
        let exception = RuleException::deleted(rule.id, date(2025, 2, 3));
        assert!(apply(&rule, exception.date, Some(&exception), date(2025, 1, 1)).is_none());
    }

    #[test]
    fn status_defaults_by_date_and_respects_explicit_value() {
        let today = date(2025, 3, 1);
        assert_eq!(default_status(date(2025, 3, 1), None, today), InstanceStatus::Completed);
        assert_eq!(default_status(date(2025, 3, 2), None, today), InstanceStatus::Pending);

        let mut exception = RuleException::new(Uuid::new_v4(), date(2025, 2, 1));
        exception.status = Some(InstanceStatus::Confirmed);
        assert_eq!(
            default_status(exception.date, Some(&exception), today),
            InstanceStatus::Confirmed
        );
    }

    #[test]
    fn only_planning_accounts_need_confirmation() {
        let rule = rule();
        let instance = apply(&rule, date(2025, 1, 3), None, date(2025, 2, 1)).unwrap();
        assert!(needs_confirmation(&instance, AccountKind::Planning));
        assert!(!needs_confirmation(&instance, AccountKind::Checking));
    }
}
