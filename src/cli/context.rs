use chrono::NaiveDate;
use tracing::debug;
use uuid::Uuid;

use cashflow_config::{Config, ConfigManager};
use cashflow_core::{Clock, DashboardOptions, FixedClock, SystemClock, WindowLimits};
use cashflow_storage_json::JsonPlannerStore;

use super::{output::Output, Cli};
use crate::errors::{CliError, CliResult};

/// Everything a command needs: the loaded config, the open store and the acting user.
pub struct CliContext {
    pub config: Config,
    pub config_manager: ConfigManager,
    pub store: JsonPlannerStore,
    pub out: Output,
    pub(crate) clock: Box<dyn Clock>,
    user: Option<Uuid>,
}

impl CliContext {
    pub fn open(cli: &Cli) -> CliResult<Self> {
        let config_manager = config_manager(cli);
        let config = config_manager.load()?;
        let data_file = cli
            .data
            .clone()
            .unwrap_or_else(|| config.resolve_data_file());
        let store = JsonPlannerStore::open(data_file)?;
        debug!(
            config = %config_manager.config_path().display(),
            data = %store.path().display(),
            "cli context ready"
        );

        let clock: Box<dyn Clock> = match cli.today {
            Some(date) => Box::new(FixedClock::on(date)),
            None => Box::new(SystemClock),
        };
        Ok(Self {
            out: Output::new(cli.json, config.ui_color_enabled),
            user: cli.user.or(config.default_user),
            config,
            config_manager,
            store,
            clock,
        })
    }

    pub fn user(&self) -> CliResult<Uuid> {
        self.user.ok_or(CliError::NoUser)
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn window_limits(&self) -> WindowLimits {
        WindowLimits {
            max_expansion_days: self.config.limits.max_expansion_days,
            max_forecast_days: self.config.limits.max_forecast_days,
        }
    }

    pub fn dashboard_options(&self) -> DashboardOptions {
        let limits = &self.config.limits;
        DashboardOptions {
            history_days: limits.history_days,
            forecast_days: limits.forecast_days,
            upcoming_days: limits.upcoming_days,
            upcoming_limit: limits.upcoming_limit,
        }
    }
}

pub fn config_manager(cli: &Cli) -> ConfigManager {
    match &cli.config {
        Some(path) => ConfigManager::for_file(path.clone()),
        None => ConfigManager::default_location(),
    }
}
