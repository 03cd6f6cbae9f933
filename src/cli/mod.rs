//! Command-line frontend over the public planner API.
//!
//! Every invocation opens the configured planner file, runs one command and
//! exits. Global flags select the config file, the data file, the acting user
//! and the output format.

pub mod commands;
pub mod context;
pub mod output;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use uuid::Uuid;

use cashflow_domain::{AccountKind, CategoryKind};

use crate::errors::CliResult;
pub use context::CliContext;

#[derive(Parser, Debug)]
#[command(name = "cashflow")]
#[command(version)]
#[command(about = "Plan recurring income and expenses and forecast account balances", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Planner data file; overrides the configured location
    #[arg(long, global = true, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Acting user; overrides `default_user` from the config
    #[arg(long, global = true)]
    pub user: Option<Uuid>,

    /// Treat this date as today
    #[arg(long, global = true, value_name = "YYYY-MM-DD")]
    pub today: Option<NaiveDate>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a user id and write the config file
    Init {
        #[arg(long)]
        currency: Option<String>,
    },
    /// Manage accounts
    #[command(subcommand)]
    Account(AccountCommand),
    /// Manage categories
    #[command(subcommand)]
    Category(CategoryCommand),
    /// Manage recurrence rules
    #[command(subcommand)]
    Rule(RuleCommand),
    /// List transaction instances in a date range
    Expand(RangeArgs),
    /// Project daily balances per account
    Forecast {
        #[command(flatten)]
        range: RangeArgs,
        /// Restrict to these accounts (repeatable)
        #[arg(long = "account")]
        accounts: Vec<Uuid>,
    },
    /// Summary, upcoming transactions and balance trends
    Dashboard(DashboardArgs),
    /// Record and review statement balances
    #[command(subcommand)]
    Reconcile(ReconcileCommand),
    /// Planning-account occurrences waiting for confirmation
    Pending {
        #[arg(long)]
        lookback_days: Option<i64>,
    },
    /// Move occurrences of a rule onto a real account
    Confirm(ConfirmArgs),
    /// Snapshot and restore the planner file
    #[command(subcommand)]
    Backup(BackupCommand),
    /// View and manage preferences
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Show build metadata
    Version,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct RangeArgs {
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub from: NaiveDate,
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub to: NaiveDate,
}

#[derive(Args, Debug, Clone, Copy, Default)]
pub struct DashboardArgs {
    #[arg(long)]
    pub history_days: Option<i64>,
    #[arg(long)]
    pub forecast_days: Option<i64>,
    #[arg(long)]
    pub upcoming_days: Option<i64>,
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum AccountCommand {
    Add {
        name: String,
        /// checking, savings, cash, investment, retirement, credit_card, loan, loan_given, planning
        #[arg(long)]
        kind: AccountKind,
        #[arg(long, default_value = "0")]
        balance: Decimal,
        /// Date the opening balance refers to (defaults to today)
        #[arg(long)]
        as_of: Option<NaiveDate>,
        #[arg(long)]
        currency: Option<String>,
        #[arg(long)]
        credit_limit: Option<Decimal>,
    },
    List,
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommand {
    Add {
        name: String,
        /// income, expense or transfer
        #[arg(long)]
        kind: CategoryKind,
    },
    List,
}

#[derive(Subcommand, Debug)]
pub enum RuleCommand {
    Add(RuleAddArgs),
    List,
    Edit(RuleEditArgs),
    Delete {
        rule: Uuid,
        #[command(flatten)]
        scope: ScopeArgs,
    },
}

#[derive(Args, Debug)]
pub struct RuleAddArgs {
    pub name: String,
    #[arg(long)]
    pub account: Uuid,
    #[arg(long)]
    pub category: Uuid,
    #[arg(long)]
    pub amount: Decimal,
    /// First (or only) occurrence
    #[arg(long)]
    pub start: NaiveDate,
    /// Repeat monthly on this day; -1 means the last day of the month
    #[arg(long, allow_hyphen_values = true, conflicts_with = "yearly")]
    pub monthly: Option<i32>,
    /// Repeat yearly on this day of `--month`
    #[arg(long, allow_hyphen_values = true, requires = "month")]
    pub yearly: Option<i32>,
    #[arg(long)]
    pub month: Option<u32>,
    #[arg(long)]
    pub until: Option<NaiveDate>,
    /// Destination account; makes the rule a transfer
    #[arg(long)]
    pub to_account: Option<Uuid>,
    #[arg(long)]
    pub currency: Option<String>,
    #[arg(long)]
    pub note: Option<String>,
}

#[derive(Args, Debug)]
pub struct RuleEditArgs {
    pub rule: Uuid,
    #[command(flatten)]
    pub scope: ScopeArgs,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub amount: Option<Decimal>,
    #[arg(long)]
    pub account: Option<Uuid>,
    /// New destination account
    #[arg(long, conflicts_with = "clear_transfer")]
    pub to_account: Option<Uuid>,
    /// Turn a transfer back into a plain income or expense rule
    #[arg(long)]
    pub clear_transfer: bool,
    #[arg(long, conflicts_with = "clear_note")]
    pub note: Option<String>,
    #[arg(long)]
    pub clear_note: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scope {
    All,
    This,
    Future,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct ScopeArgs {
    #[arg(long, value_enum, default_value_t = Scope::All)]
    pub scope: Scope,
    /// Occurrence the scope applies to (required for `this` and `future`)
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

#[derive(Subcommand, Debug)]
pub enum ReconcileCommand {
    Add {
        #[arg(long)]
        account: Uuid,
        #[arg(long)]
        date: NaiveDate,
        /// Balance shown on the statement
        #[arg(long, allow_hyphen_values = true)]
        balance: Decimal,
        /// Book the difference as a one-time adjustment
        #[arg(long)]
        adjust: bool,
        #[arg(long)]
        note: Option<String>,
    },
    List {
        #[arg(long)]
        account: Option<Uuid>,
    },
    Delete {
        id: Uuid,
    },
}

#[derive(Args, Debug)]
pub struct ConfirmArgs {
    #[arg(long)]
    pub rule: Uuid,
    /// Account the occurrences are moved to
    #[arg(long)]
    pub account: Uuid,
    #[arg(long, conflicts_with_all = ["past", "date"])]
    pub all: bool,
    #[arg(long, conflicts_with = "date")]
    pub past: bool,
    #[arg(long)]
    pub date: Vec<NaiveDate>,
}

#[derive(Subcommand, Debug)]
pub enum BackupCommand {
    Create {
        #[arg(long)]
        note: Option<String>,
    },
    List,
    Restore {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    Show,
    /// Keys: locale, currency, color, data_file, default_user
    Set { key: String, value: String },
    Backup {
        #[arg(long)]
        note: Option<String>,
    },
    Backups,
    Restore { name: String },
}

/// Parses the process arguments and runs the selected command.
pub fn run_cli() -> CliResult {
    let cli = Cli::parse();
    run(cli)
}

pub fn run(cli: Cli) -> CliResult {
    match cli.command {
        Command::Init { ref currency } => commands::system::init(&cli, currency.as_deref()),
        Command::Version => commands::system::version(cli.json),
        Command::Config(ref action) => commands::config::run(&cli, action),
        _ => {
            let mut ctx = CliContext::open(&cli)?;
            commands::dispatch(&mut ctx, cli.command)
        }
    }
}
