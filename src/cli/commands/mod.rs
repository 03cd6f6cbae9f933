pub mod account;
pub mod backup;
pub mod config;
pub mod planner;
pub mod reconcile;
pub mod rule;
pub mod system;

use super::{CliContext, Command};
use crate::errors::CliResult;

pub fn dispatch(ctx: &mut CliContext, command: Command) -> CliResult {
    match command {
        Command::Account(action) => account::run(ctx, action),
        Command::Category(action) => account::run_category(ctx, action),
        Command::Rule(action) => rule::run(ctx, action),
        Command::Expand(range) => planner::expand(ctx, range),
        Command::Forecast { range, accounts } => planner::forecast(ctx, range, &accounts),
        Command::Dashboard(args) => planner::dashboard(ctx, args),
        Command::Pending { lookback_days } => planner::pending(ctx, lookback_days),
        Command::Confirm(args) => planner::confirm(ctx, args),
        Command::Reconcile(action) => reconcile::run(ctx, action),
        Command::Backup(action) => backup::run(ctx, action),
        Command::Init { .. } | Command::Version | Command::Config(_) => Ok(()),
    }
}
