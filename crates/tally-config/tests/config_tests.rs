use std::path::{Path, PathBuf};

use tally_config::{Config, ConfigError, ConfigManager};
use tempfile::tempdir;

#[test]
fn default_config_has_non_empty_fields() {
    let cfg = Config::default();

    assert!(!cfg.currency.is_empty());
    assert!(!cfg.locale.is_empty());
    assert_eq!(cfg.warning_threshold_percent, 80);
    assert_eq!(cfg.insights.api_key_env, "GEMINI_API_KEY");
    assert_eq!(cfg.insights.recent_limit, 50);
    assert_eq!(cfg.resolve_data_root(Path::new("/base")), PathBuf::from("/base/data"));
}

#[test]
fn config_manager_persists_and_loads_config() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");
    assert_eq!(manager.config_path(), dir.path().join("config").join("config.json"));

    let mut cfg = Config::default();
    cfg.set("currency", "eur").expect("currency");
    cfg.set("active_user", "ana").expect("user");
    cfg.set("insights.command", "gemini-cli").expect("command");

    manager.save(&cfg).expect("save config");
    let loaded = manager.load().expect("load config");

    assert_eq!(loaded.currency, "EUR");
    assert_eq!(loaded.active_user.as_deref(), Some("ana"));
    assert_eq!(loaded.insights.command.as_deref(), Some("gemini-cli"));
}

#[test]
fn missing_fields_fall_back_to_defaults() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::new(dir.path().join("config.json"), dir.path().join("backups"));
    std::fs::write(manager.config_path(), r#"{"locale":"pt-PT","currency":"EUR"}"#)
        .expect("write legacy config");

    let loaded = manager.load().expect("load config");
    assert_eq!(loaded.locale, "pt-PT");
    assert_eq!(loaded.default_budget_period, "monthly");
    assert!(loaded.ui_color_enabled);
    assert_eq!(loaded.insights.model, "gemini-2.5-flash");
}

#[test]
fn set_rejects_unknown_keys_and_bad_values() {
    let mut cfg = Config::default();
    assert!(matches!(cfg.set("theme", "dark"), Err(ConfigError::UnknownKey(_))));
    assert!(matches!(
        cfg.set("warning_threshold_percent", "150"),
        Err(ConfigError::InvalidValue { .. })
    ));
    assert!(matches!(
        cfg.set("default_budget_period", "daily"),
        Err(ConfigError::InvalidValue { .. })
    ));

    cfg.set("warning_threshold_percent", "90").unwrap();
    cfg.set("default_budget_period", "Weekly").unwrap();
    cfg.set("ui_color_enabled", "off").unwrap();
    assert_eq!(cfg.get("warning_threshold_percent").as_deref(), Some("90"));
    assert_eq!(cfg.default_budget_period, "weekly");
    assert!(!cfg.ui_color_enabled);
    assert_eq!(cfg.entries().len(), Config::KEYS.len());
}

#[test]
fn backups_round_trip_through_restore() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");

    let mut original = Config::default();
    original.set("currency", "GBP").unwrap();
    manager.save(&original).unwrap();
    let name = manager.backup(&original, Some("before change")).expect("backup");
    assert!(name.starts_with("config_"));
    assert!(name.ends_with("_before-change.json"));

    let mut changed = original.clone();
    changed.set("currency", "JPY").unwrap();
    manager.save(&changed).unwrap();
    manager.backup(&changed, None).unwrap();

    let backups = manager.list_backups().unwrap();
    assert_eq!(backups.len(), 2);
    assert!(backups.contains(&name));

    let restored = manager.restore(&name).expect("restore");
    assert_eq!(restored.currency, "GBP");
    assert_eq!(manager.load().unwrap().currency, "GBP");

    assert!(manager.restore("config_missing.json").is_err());
}
