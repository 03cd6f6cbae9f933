use std::{
    fs,
    panic::{self, AssertUnwindSafe},
    str::FromStr,
};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tempfile::tempdir;
use uuid::Uuid;

use cashflow_core::{
    api_create_reconciliation, CoreError, EditMode, FixedClock, ReconciliationRequest,
    RuleService, RuleStore, Transactional,
};
use cashflow_domain::{Account, AccountKind, Category, CategoryKind, RuleDraft};
use cashflow_storage_json::JsonPlannerStore;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn seeded(store: &mut JsonPlannerStore, user: Uuid) -> (Uuid, Uuid) {
    let account = store
        .add_account(Account::new(
            user,
            "Checking",
            AccountKind::Checking,
            "USD",
            Decimal::from_str("1000.00").unwrap(),
            date(2025, 1, 1),
        ))
        .expect("add account");
    let category = store
        .add_category(Category::new(user, "Rent", CategoryKind::Expense))
        .expect("add category");
    (account, category)
}

#[test]
fn writes_are_persisted_and_reloaded() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("planner.json");
    let user = Uuid::new_v4();

    let rule_id = {
        let mut store = JsonPlannerStore::open(&path).expect("open store");
        let (account, category) = seeded(&mut store, user);
        let draft = RuleDraft::one_time(
            user,
            account,
            category,
            "Rent",
            Decimal::from_str("900").unwrap(),
            "usd",
            date(2025, 1, 1),
        )
        .monthly(1);
        RuleService::create(&mut store, draft).expect("create rule").id
    };

    let reopened = JsonPlannerStore::open(&path).expect("reopen store");
    let rule = reopened.rule(rule_id).unwrap().expect("rule persisted");
    assert_eq!(rule.currency, "USD");
    assert_eq!(reopened.data().accounts.len(), 1);
    assert!(!path.with_extension("json.tmp").exists());
}

#[test]
fn failed_transaction_leaves_file_and_memory_untouched() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("planner.json");
    let user = Uuid::new_v4();
    let mut store = JsonPlannerStore::open(&path).expect("open store");
    let (account, category) = seeded(&mut store, user);
    let before = fs::read_to_string(&path).expect("read file");

    let draft = RuleDraft::one_time(
        user,
        account,
        category,
        "Temp",
        Decimal::ONE,
        "USD",
        date(2025, 1, 1),
    );
    let result: Result<(), CoreError> = store.atomically(|tx| {
        tx.insert_rule(draft.build()?)?;
        Err(CoreError::Validation("abort".into()))
    });

    assert!(result.is_err());
    assert!(store.data().rules.is_empty());
    assert_eq!(fs::read_to_string(&path).expect("read file"), before);
}

#[test]
fn panicking_transaction_does_not_stop_later_writes() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("planner.json");
    let user = Uuid::new_v4();
    let mut store = JsonPlannerStore::open(&path).expect("open store");
    seeded(&mut store, user);

    let unwound = panic::catch_unwind(AssertUnwindSafe(|| {
        let _: Result<(), CoreError> = store.atomically(|tx| {
            tx.add_category(Category::new(user, "Half-written", CategoryKind::Expense))?;
            panic!("work closure panicked");
        });
    }));
    assert!(unwound.is_err());
    assert_eq!(store.data().categories.len(), 1);

    let savings = store
        .add_account(Account::new(
            user,
            "Savings",
            AccountKind::Savings,
            "USD",
            Decimal::ZERO,
            date(2025, 1, 1),
        ))
        .expect("add account after panic");

    let reopened = JsonPlannerStore::open(&path).expect("reopen store");
    assert!(reopened.data().accounts.iter().any(|a| a.id == savings));
    assert!(reopened
        .data()
        .categories
        .iter()
        .all(|c| c.name != "Half-written"));
}

#[test]
fn reconciliation_with_adjustment_survives_reload() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("planner.json");
    let user = Uuid::new_v4();
    let mut store = JsonPlannerStore::open(&path).expect("open store");
    let (account, _) = seeded(&mut store, user);

    let record = api_create_reconciliation(
        &mut store,
        &FixedClock::on(date(2025, 2, 1)),
        ReconciliationRequest {
            user_id: user,
            account_id: account,
            date: date(2025, 1, 31),
            actual_balance: Decimal::from_str("1010.00").unwrap(),
            create_adjustment: true,
            note: None,
        },
    )
    .expect("reconcile");

    let reopened = JsonPlannerStore::open(&path).expect("reopen store");
    assert_eq!(reopened.data().reconciliations.len(), 1);
    let adjustment = record.adjustment_rule_id.expect("adjustment id");
    assert!(reopened.rule(adjustment).unwrap().is_some());
    assert!(reopened.data().categories.iter().any(|c| c.is_system));
}

#[test]
fn series_edits_write_backups_with_retention() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("planner.json");
    let backups = dir.path().join("backups");
    let user = Uuid::new_v4();
    let mut store =
        JsonPlannerStore::with_retention(path.clone(), backups.clone(), 2).expect("open store");
    let (account, category) = seeded(&mut store, user);
    let rule = RuleService::create(
        &mut store,
        RuleDraft::one_time(
            user,
            account,
            category,
            "Gym",
            Decimal::from(30),
            "USD",
            date(2025, 1, 5),
        )
        .monthly(5),
    )
    .expect("create rule");
    RuleService::delete(&mut store, user, rule.id, EditMode::ThisOnly(date(2025, 2, 5)))
        .expect("skip occurrence");

    let labelled = store.backup(Some("before cleanup")).expect("manual backup");
    assert!(labelled.id.ends_with("_before-cleanup.json"));
    let listed = store.list_backups().expect("list backups");
    assert!(!listed.is_empty());
    assert!(listed.len() <= 2);

    store.restore_backup(&labelled.id).expect("restore");
    assert_eq!(store.data().exceptions.len(), 1);
}

#[test]
fn restoring_a_missing_backup_fails() {
    let dir = tempdir().expect("tempdir");
    let mut store = JsonPlannerStore::open(dir.path().join("planner.json")).expect("open store");
    assert!(store.restore_backup("planner_20990101_0000.json").is_err());
}
