use std::path::PathBuf;

use cashflow_config::{Config, ConfigError, ConfigManager, PlannerLimits};
use tempfile::tempdir;
use uuid::Uuid;

#[test]
fn default_config_carries_planner_limits() {
    let cfg = Config::default();

    assert_eq!(cfg.currency, "USD");
    assert!(!cfg.locale.is_empty());
    assert_eq!(cfg.limits.history_days, 60);
    assert_eq!(cfg.limits.max_expansion_days, 730);
    assert_eq!(cfg.limits.max_forecast_days, 1096);
    assert!(cfg.resolve_data_file().ends_with("Cashflow/planner.json"));
}

#[test]
fn config_manager_persists_and_loads_config() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::for_file(dir.path().join("config.json"));

    let user = Uuid::new_v4();
    let mut cfg = Config::default();
    cfg.currency = "EUR".to_string();
    cfg.default_user = Some(user);
    cfg.data_file = Some(PathBuf::from("/tmp/planner.json"));

    manager.save(&cfg).expect("save config");
    let loaded = manager.load().expect("load config");

    assert_eq!(loaded, cfg);
}

#[test]
fn missing_limits_fall_back_to_defaults() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{ "locale": "en-GB", "currency": "GBP", "limits": { "forecast_days": 90 } }"#,
    )
    .expect("write config");

    let loaded = ConfigManager::for_file(path).load().expect("load config");
    assert_eq!(loaded.limits.forecast_days, 90);
    assert_eq!(loaded.limits.upcoming_limit, PlannerLimits::default().upcoming_limit);
    assert!(loaded.ui_color_enabled);
}

#[test]
fn invalid_values_are_rejected_on_save() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::for_file(dir.path().join("config.json"));
    let mut cfg = Config::default();
    cfg.limits.history_days = -1;
    assert!(matches!(manager.save(&cfg), Err(ConfigError::Invalid(_))));

    let mut cfg = Config::default();
    cfg.currency = "EURO".into();
    assert!(matches!(manager.save(&cfg), Err(ConfigError::Invalid(_))));
}

#[test]
fn backups_can_be_listed_and_restored() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::for_file(dir.path().join("config.json"));

    let original = manager
        .update(|cfg| cfg.currency = "CHF".into())
        .expect("update config");
    let name = manager
        .backup(&original, Some("before reset"))
        .expect("backup config");
    assert!(name.ends_with("_before-reset.json"));

    manager
        .update(|cfg| cfg.currency = "JPY".into())
        .expect("update config");
    let restored = manager.restore(&name).expect("restore backup");
    assert_eq!(restored.currency, "CHF");
    assert_eq!(manager.load().expect("load").currency, "CHF");
    assert_eq!(manager.list_backups().expect("list"), vec![name]);

    assert!(matches!(
        manager.restore("config_20990101_0000.json"),
        Err(ConfigError::BackupNotFound(_))
    ));
}

#[test]
fn set_value_updates_known_keys() {
    let mut cfg = Config::default();
    cfg.set_value("locale", "fr-FR").expect("locale");
    cfg.set_value("currency", "eur").expect("currency");
    cfg.set_value("color", "off").expect("color");
    assert_eq!(cfg.locale, "fr-FR");
    assert_eq!(cfg.currency, "EUR");
    assert!(!cfg.ui_color_enabled);

    let user = Uuid::new_v4();
    cfg.set_value("default_user", &user.to_string()).expect("user");
    assert_eq!(cfg.default_user, Some(user));
    cfg.set_value("default_user", "none").expect("clear user");
    assert_eq!(cfg.default_user, None);

    assert!(matches!(cfg.set_value("theme", "dark"), Err(ConfigError::Invalid(_))));
    assert!(matches!(cfg.set_value("locale", "en US"), Err(ConfigError::Invalid(_))));
    assert!(matches!(cfg.set_value("color", "maybe"), Err(ConfigError::Invalid(_))));
}
