use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Directory created under the documents (or home) folder for planner data.
pub const DATA_DIR_NAME: &str = "Cashflow";
pub const DATA_FILE_NAME: &str = "planner.json";

/// Stores user-configurable planner preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub locale: String,
    /// Currency suggested for new accounts and rules.
    pub currency: String,
    #[serde(default = "Config::default_ui_color_enabled")]
    pub ui_color_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom planner file. Defaults to `~/Documents/Cashflow/planner.json`.
    pub data_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_user: Option<Uuid>,
    #[serde(default)]
    pub limits: PlannerLimits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "en-US".into(),
            currency: "USD".into(),
            ui_color_enabled: Self::default_ui_color_enabled(),
            data_file: None,
            default_user: None,
            limits: PlannerLimits::default(),
        }
    }
}

impl Config {
    pub fn default_ui_color_enabled() -> bool {
        true
    }

    pub fn resolve_data_file(&self) -> PathBuf {
        if let Some(path) = &self.data_file {
            return path.clone();
        }

        let base = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        base.join(DATA_DIR_NAME).join(DATA_FILE_NAME)
    }

    /// Sets one preference by its `config set` key.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), crate::ConfigError> {
        let value = value.trim();
        match key.to_lowercase().as_str() {
            "locale" => self.locale = value.to_string(),
            "currency" => self.currency = value.to_ascii_uppercase(),
            "color" | "ui_color_enabled" => {
                self.ui_color_enabled = match value.to_lowercase().as_str() {
                    "on" | "true" | "yes" => true,
                    "off" | "false" | "no" => false,
                    other => {
                        return Err(crate::ConfigError::Invalid(format!(
                            "color must be on or off (got `{other}`)"
                        )))
                    }
                }
            }
            "data_file" => {
                self.data_file = match value {
                    "" | "none" | "default" => None,
                    path => Some(PathBuf::from(path)),
                }
            }
            "default_user" => {
                self.default_user = match value {
                    "" | "none" => None,
                    id => Some(Uuid::parse_str(id).map_err(|_| {
                        crate::ConfigError::Invalid(format!("`{id}` is not a user id"))
                    })?),
                }
            }
            other => {
                return Err(crate::ConfigError::Invalid(format!(
                    "unknown config key `{other}`"
                )))
            }
        }
        self.validate()
    }

    /// Rejects values no frontend can work with.
    pub fn validate(&self) -> Result<(), crate::ConfigError> {
        let tag = self.locale.as_str();
        if tag.is_empty() || !tag.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-') {
            return Err(crate::ConfigError::Invalid(format!(
                "locale `{}` is not a language tag",
                self.locale
            )));
        }
        let code = self.currency.trim();
        if code.len() != 3 || !code.chars().all(|ch| ch.is_ascii_alphabetic()) {
            return Err(crate::ConfigError::Invalid(format!(
                "currency `{}` is not a 3-letter code",
                self.currency
            )));
        }
        self.limits.validate()
    }
}

/// Window sizes used by the dashboard and the caps enforced on queries, in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerLimits {
    pub history_days: i64,
    pub forecast_days: i64,
    pub upcoming_days: i64,
    pub upcoming_limit: usize,
    pub max_expansion_days: i64,
    pub max_forecast_days: i64,
    pub confirmation_lookback_days: i64,
}

impl Default for PlannerLimits {
    fn default() -> Self {
        Self {
            history_days: 60,
            forecast_days: 30,
            upcoming_days: 30,
            upcoming_limit: 50,
            max_expansion_days: 730,
            max_forecast_days: 1096,
            confirmation_lookback_days: 365,
        }
    }
}

impl PlannerLimits {
    pub fn validate(&self) -> Result<(), crate::ConfigError> {
        let days = [
            ("history_days", self.history_days),
            ("forecast_days", self.forecast_days),
            ("upcoming_days", self.upcoming_days),
            ("max_expansion_days", self.max_expansion_days),
            ("max_forecast_days", self.max_forecast_days),
            ("confirmation_lookback_days", self.confirmation_lookback_days),
        ];
        if let Some((name, value)) = days.iter().find(|(_, value)| *value < 0) {
            return Err(crate::ConfigError::Invalid(format!(
                "{name} must not be negative (got {value})"
            )));
        }
        if self.forecast_days > self.max_forecast_days {
            return Err(crate::ConfigError::Invalid(
                "forecast_days exceeds max_forecast_days".into(),
            ));
        }
        Ok(())
    }
}
