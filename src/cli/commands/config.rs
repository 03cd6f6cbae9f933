use serde_json::json;
use tracing::info;

use cashflow_config::{Config, ConfigManager};

use crate::cli::{context::config_manager, output::Output, Cli, ConfigCommand};
use crate::errors::CliResult;

/// Config commands work on the config file alone and never open the planner store.
pub fn run(cli: &Cli, action: &ConfigCommand) -> CliResult {
    let manager = config_manager(cli);
    let config = manager.load()?;
    let out = Output::new(cli.json, config.ui_color_enabled);
    match action {
        ConfigCommand::Show => show(&out, &manager, &config),
        ConfigCommand::Set { key, value } => {
            let mut config = config;
            config.set_value(key, value)?;
            manager.save(&config)?;
            info!(%key, "config value set");
            if out.is_json() {
                return out.json(&config);
            }
            out.success(format!("Set {key} = {value}"));
            Ok(())
        }
        ConfigCommand::Backup { note } => {
            let name = manager.backup(&config, note.as_deref())?;
            if out.is_json() {
                return out.json(&json!({ "backup": name }));
            }
            out.success(format!("Config backup written: {name}"));
            Ok(())
        }
        ConfigCommand::Backups => {
            let names = manager.list_backups()?;
            if out.is_json() {
                return out.json(&names);
            }
            out.header(format!("Config backups ({})", names.len()));
            let rows: Vec<Vec<String>> = names.into_iter().map(|name| vec![name]).collect();
            out.table(&["Name"], &rows);
            Ok(())
        }
        ConfigCommand::Restore { name } => {
            let restored = manager.restore(name)?;
            info!(backup = %name, "config restored");
            if out.is_json() {
                return out.json(&restored);
            }
            out.success(format!("Restored {name}"));
            show(&out, &manager, &restored)
        }
    }
}

fn show(out: &Output, manager: &ConfigManager, config: &Config) -> CliResult {
    if out.is_json() {
        return out.json(config);
    }
    out.header(format!("Config {}", manager.config_path().display()));
    out.pairs(&[
        ("Locale", config.locale.clone()),
        ("Currency", config.currency.clone()),
        ("Color", if config.ui_color_enabled { "on" } else { "off" }.to_string()),
        ("Data file", config.resolve_data_file().display().to_string()),
        (
            "User",
            config
                .default_user
                .map(|id| id.to_string())
                .unwrap_or_else(|| "none".into()),
        ),
        ("Max expansion", format!("{} days", config.limits.max_expansion_days)),
        ("Max forecast", format!("{} days", config.limits.max_forecast_days)),
    ]);
    Ok(())
}
