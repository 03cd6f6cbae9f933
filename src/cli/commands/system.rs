use serde_json::json;
use tracing::info;
use uuid::Uuid;

use cashflow_domain::normalize_currency;

use crate::cli::{context::config_manager, output::Output, Cli};
use crate::errors::CliResult;
use crate::utils::build_info;

/// Writes the config file, generating a user id unless one is configured or passed.
pub fn init(cli: &Cli, currency: Option<&str>) -> CliResult {
    let manager = config_manager(cli);
    let config = manager.update(|config| {
        if let Some(user) = cli.user {
            config.default_user = Some(user);
        }
        if config.default_user.is_none() {
            config.default_user = Some(Uuid::new_v4());
        }
        if let Some(data) = &cli.data {
            config.data_file = Some(data.clone());
        }
    })?;
    let config = match currency {
        Some(code) => {
            let code = normalize_currency(code)?;
            manager.update(|config| config.currency = code)?
        }
        None => config,
    };
    info!(config = %manager.config_path().display(), "config initialized");

    let out = Output::new(cli.json, config.ui_color_enabled);
    let user = config.default_user.map(|id| id.to_string()).unwrap_or_default();
    if out.is_json() {
        return out.json(&json!({
            "user": user,
            "config": manager.config_path(),
            "data_file": config.resolve_data_file(),
            "currency": config.currency,
        }));
    }
    out.success(format!("Initialized {}", manager.config_path().display()));
    out.pairs(&[
        ("User", user),
        ("Data file", config.resolve_data_file().display().to_string()),
        ("Currency", config.currency.clone()),
    ]);
    Ok(())
}

pub fn version(json: bool) -> CliResult {
    let meta = build_info::current();
    let out = Output::new(json, true);
    if out.is_json() {
        return out.json(&meta);
    }
    out.header(format!("cashflow {}", meta.version));
    out.pairs(&[
        ("Build hash", format!("{} ({})", meta.git_hash, meta.git_status)),
        ("Built at", meta.timestamp.to_string()),
        ("Target", meta.target.to_string()),
        ("Profile", meta.profile.to_string()),
        ("Rustc", meta.rustc.to_string()),
    ]);
    Ok(())
}
