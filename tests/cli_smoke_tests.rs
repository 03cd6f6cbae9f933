use std::path::{Path, PathBuf};
use std::str::FromStr;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};
use rust_decimal::Decimal;
use serde_json::Value;
use tempfile::{tempdir, TempDir};
use uuid::Uuid;

const BIN_NAME: &str = "cashflow";

struct Workspace {
    _dir: TempDir,
    config: PathBuf,
    data: PathBuf,
    user: Uuid,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempdir().expect("tempdir");
        let config = dir.path().join("config.json");
        let data = dir.path().join("planner.json");
        Self {
            _dir: dir,
            config,
            data,
            user: Uuid::new_v4(),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin(BIN_NAME).expect("binary exists");
        cmd.env("NO_COLOR", "1")
            .arg("--config")
            .arg(&self.config)
            .arg("--data")
            .arg(&self.data)
            .args(["--today", "2025-01-01"]);
        cmd
    }

    fn as_user(&self) -> Command {
        let mut cmd = self.command();
        cmd.arg("--user").arg(self.user.to_string());
        cmd
    }

    /// Runs a `--json` command as the workspace user and parses stdout.
    fn json(&self, args: &[&str]) -> Value {
        let output = self
            .as_user()
            .arg("--json")
            .args(args)
            .output()
            .expect("run cashflow");
        assert!(
            output.status.success(),
            "cashflow {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("json output")
    }
}

fn id_of(value: &Value) -> String {
    value["id"].as_str().expect("id field").to_string()
}

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(text) => Decimal::from_str(text).expect("decimal string"),
        other => Decimal::from_str(&other.to_string()).expect("decimal number"),
    }
}

fn seed_salary(ws: &Workspace) -> (String, String) {
    let account = ws.json(&[
        "account", "add", "Checking", "--kind", "checking", "--balance", "1000", "--as-of",
        "2025-01-01", "--currency", "USD",
    ]);
    let category = ws.json(&["category", "add", "Salary", "--kind", "income"]);
    let account_id = id_of(&account);
    ws.json(&[
        "rule",
        "add",
        "Salary",
        "--account",
        &account_id,
        "--category",
        &id_of(&category),
        "--amount",
        "500",
        "--start",
        "2025-01-15",
        "--monthly",
        "15",
        "--currency",
        "USD",
    ]);
    (account_id, id_of(&category))
}

#[test]
fn version_command_prints_build_metadata() {
    Command::cargo_bin(BIN_NAME)
        .expect("binary exists")
        .arg("version")
        .assert()
        .success()
        .stdout(contains("cashflow").and(contains("Build hash")));
}

#[test]
fn init_writes_config_with_a_user() {
    let ws = Workspace::new();
    ws.command()
        .args(["init", "--currency", "eur"])
        .assert()
        .success()
        .stdout(contains("Initialized"));

    let raw = std::fs::read_to_string(&ws.config).expect("config written");
    let config: Value = serde_json::from_str(&raw).expect("config json");
    assert_eq!(config["currency"], "EUR");
    assert!(config["default_user"].as_str().is_some());
    assert_eq!(
        Path::new(config["data_file"].as_str().expect("data file")),
        ws.data.as_path()
    );
}

#[test]
fn commands_without_a_user_fail_with_usage_exit_code() {
    let ws = Workspace::new();
    ws.command()
        .args(["expand", "--from", "2025-01-01", "--to", "2025-01-31"])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("No user selected"));
}

#[test]
fn expand_and_forecast_follow_a_monthly_rule() {
    let ws = Workspace::new();
    let (account_id, _) = seed_salary(&ws);

    let instances = ws.json(&["expand", "--from", "2025-01-01", "--to", "2025-03-31"]);
    let dates: Vec<&str> = instances
        .as_array()
        .expect("instance list")
        .iter()
        .map(|instance| instance["date"].as_str().expect("date"))
        .collect();
    assert_eq!(dates, vec!["2025-01-15", "2025-02-15", "2025-03-15"]);

    let forecasts = ws.json(&[
        "forecast",
        "--from",
        "2025-01-01",
        "--to",
        "2025-03-31",
        "--account",
        &account_id,
    ]);
    let forecast = &forecasts[0];
    let points = forecast["points"].as_array().expect("points");
    assert_eq!(points.len(), 90);
    assert_eq!(decimal(&points[13]["balance"]), Decimal::from(1000));
    assert_eq!(decimal(&points[14]["balance"]), Decimal::from(1500));
    assert_eq!(decimal(&points[89]["balance"]), Decimal::from(2500));
}

#[test]
fn oversized_ranges_are_rejected() {
    let ws = Workspace::new();
    ws.as_user()
        .args(["expand", "--from", "2025-01-01", "--to", "2028-01-01"])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("Date range too large"));
}

#[test]
fn reconcile_books_an_adjustment_and_lists_it() {
    let ws = Workspace::new();
    let (account_id, _) = seed_salary(&ws);

    let record = ws.json(&[
        "reconcile",
        "add",
        "--account",
        &account_id,
        "--date",
        "2025-02-01",
        "--balance",
        "1400",
        "--adjust",
    ]);
    assert_eq!(decimal(&record["expected_balance"]), Decimal::from(1500));
    assert_eq!(decimal(&record["difference"]), Decimal::from(-100));
    assert!(record["adjustment_rule_id"].as_str().is_some());

    let listed = ws.json(&["reconcile", "list", "--account", &account_id]);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let rules = ws.json(&["rule", "list"]);
    assert!(rules
        .as_array()
        .expect("rules")
        .iter()
        .filter_map(|rule| rule["name"].as_str())
        .any(|name| name.starts_with("Reconciliation Adjustment (-100")));

    let id = id_of(&listed[0]);
    ws.json(&["reconcile", "delete", &id]);
    assert_eq!(
        ws.json(&["reconcile", "list"]).as_array().map(Vec::len),
        Some(0)
    );
}

#[test]
fn dashboard_renders_summary_text() {
    let ws = Workspace::new();
    seed_salary(&ws);

    ws.as_user()
        .arg("dashboard")
        .assert()
        .success()
        .stdout(contains("Net worth").and(contains("1000.00 USD")).and(contains("Salary")));
}

#[test]
fn config_set_backup_and_restore() {
    let ws = Workspace::new();
    ws.command()
        .args(["config", "set", "locale", "fr-FR"])
        .assert()
        .success()
        .stdout(contains("Set locale = fr-FR"));

    let backup = ws.json(&["config", "backup", "--note", "before gbp"]);
    let name = backup["backup"].as_str().expect("backup name").to_string();
    ws.json(&["config", "set", "currency", "gbp"]);
    assert_eq!(ws.json(&["config", "show"])["currency"], "GBP");

    let listed = ws.json(&["config", "backups"]);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let restored = ws.json(&["config", "restore", &name]);
    assert_eq!(restored["currency"], "USD");
    assert_eq!(restored["locale"], "fr-FR");

    ws.command()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(contains("Locale").and(contains("fr-FR")));

    ws.command()
        .args(["config", "set", "theme", "dark"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn rule_edit_can_clear_a_transfer_and_list_shows_next_date() {
    let ws = Workspace::new();
    let (checking, category) = seed_salary(&ws);
    let savings = ws.json(&[
        "account", "add", "Savings", "--kind", "savings", "--as-of", "2025-01-01",
    ]);
    let sweep = ws.json(&[
        "rule",
        "add",
        "Sweep",
        "--account",
        &checking,
        "--category",
        &category,
        "--amount",
        "50",
        "--start",
        "2025-01-20",
        "--monthly",
        "20",
        "--to-account",
        &id_of(&savings),
        "--note",
        "monthly sweep",
    ]);
    assert!(sweep["to_account_id"].as_str().is_some());

    ws.json(&["rule", "edit", &id_of(&sweep), "--clear-transfer", "--clear-note"]);

    let rules = ws.json(&["rule", "list"]);
    let listed = rules
        .as_array()
        .expect("rules")
        .iter()
        .find(|rule| rule["name"] == "Sweep")
        .expect("sweep rule");
    assert!(listed["to_account_id"].is_null());
    assert!(listed["note"].is_null());
    assert_eq!(listed["next_occurrence"], "2025-01-20");

    ws.as_user()
        .args(["rule", "list"])
        .assert()
        .success()
        .stdout(contains("Next").and(contains("2025-01-15")));
}
