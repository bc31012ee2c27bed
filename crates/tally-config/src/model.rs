use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ConfigError;

const PERIODS: [&str; 3] = ["weekly", "monthly", "yearly"];

/// Stores user-configurable CLI preferences and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub locale: String,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_user: Option<String>,
    #[serde(default = "Config::default_warning_threshold")]
    pub warning_threshold_percent: u8,
    #[serde(default = "Config::default_budget_period_value")]
    pub default_budget_period: String,
    #[serde(default = "Config::default_ui_color_enabled")]
    pub ui_color_enabled: bool,
    #[serde(default)]
    pub currency_precision: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom directory for the book file. Defaults to `<base>/data`.
    pub data_root: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom directory for book backups. Defaults to `<base>/backups`.
    pub backup_root: Option<PathBuf>,

    #[serde(default)]
    pub insights: InsightsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "en-US".into(),
            currency: "USD".into(),
            active_user: None,
            warning_threshold_percent: Self::default_warning_threshold(),
            default_budget_period: Self::default_budget_period_value(),
            ui_color_enabled: Self::default_ui_color_enabled(),
            currency_precision: None,
            data_root: None,
            backup_root: None,
            insights: InsightsConfig::default(),
        }
    }
}

/// How insight prompts are answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightsConfig {
    /// Environment variable holding the API key; no key means insights are unavailable.
    #[serde(default = "InsightsConfig::default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "InsightsConfig::default_model")]
    pub model: String,
    /// External program that reads a prompt on stdin and writes the answer to stdout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "InsightsConfig::default_recent_limit")]
    pub recent_limit: usize,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            api_key_env: Self::default_api_key_env(),
            model: Self::default_model(),
            command: None,
            args: Vec::new(),
            recent_limit: Self::default_recent_limit(),
        }
    }
}

impl InsightsConfig {
    pub fn default_api_key_env() -> String {
        "GEMINI_API_KEY".into()
    }

    pub fn default_model() -> String {
        "gemini-2.5-flash".into()
    }

    pub fn default_recent_limit() -> usize {
        50
    }
}

impl Config {
    pub const KEYS: [&'static str; 14] = [
        "locale",
        "currency",
        "active_user",
        "warning_threshold_percent",
        "default_budget_period",
        "ui_color_enabled",
        "currency_precision",
        "data_root",
        "backup_root",
        "insights.api_key_env",
        "insights.model",
        "insights.command",
        "insights.args",
        "insights.recent_limit",
    ];

    pub fn default_budget_period_value() -> String {
        "monthly".into()
    }

    pub fn default_ui_color_enabled() -> bool {
        true
    }

    pub fn default_warning_threshold() -> u8 {
        80
    }

    pub fn resolve_data_root(&self, base: &Path) -> PathBuf {
        self.data_root
            .clone()
            .unwrap_or_else(|| base.join("data"))
    }

    pub fn resolve_backup_root(&self, base: &Path) -> PathBuf {
        self.backup_root
            .clone()
            .unwrap_or_else(|| base.join("backups"))
    }

    /// Current value of `key` rendered for display; `None` for unknown keys.
    pub fn get(&self, key: &str) -> Option<String> {
        let optional = |value: Option<String>| value.unwrap_or_else(|| "(unset)".into());
        let value = match key {
            "locale" => self.locale.clone(),
            "currency" => self.currency.clone(),
            "active_user" => optional(self.active_user.clone()),
            "warning_threshold_percent" => self.warning_threshold_percent.to_string(),
            "default_budget_period" => self.default_budget_period.clone(),
            "ui_color_enabled" => self.ui_color_enabled.to_string(),
            "currency_precision" => optional(self.currency_precision.map(|p| p.to_string())),
            "data_root" => optional(self.data_root.as_ref().map(|p| p.display().to_string())),
            "backup_root" => optional(self.backup_root.as_ref().map(|p| p.display().to_string())),
            "insights.api_key_env" => self.insights.api_key_env.clone(),
            "insights.model" => self.insights.model.clone(),
            "insights.command" => optional(self.insights.command.clone()),
            "insights.args" => self.insights.args.join(" "),
            "insights.recent_limit" => self.insights.recent_limit.to_string(),
            _ => return None,
        };
        Some(value)
    }

    /// Every known key paired with its display value, in [`Config::KEYS`] order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        Self::KEYS
            .iter()
            .filter_map(|key| self.get(key).map(|value| (*key, value)))
            .collect()
    }

    /// Parses and assigns `value` to `key`. An empty value clears optional keys.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let trimmed = value.trim();
        let optional = |value: &str| (!value.is_empty()).then(|| value.to_string());
        match key {
            "locale" => self.locale = required(key, trimmed)?,
            "currency" => self.currency = required(key, trimmed)?.to_ascii_uppercase(),
            "active_user" => self.active_user = optional(trimmed),
            "warning_threshold_percent" => {
                let percent: u8 = trimmed
                    .parse()
                    .map_err(|_| ConfigError::invalid(key, "expected a whole number"))?;
                if !(1..=100).contains(&percent) {
                    return Err(ConfigError::invalid(key, "must be between 1 and 100"));
                }
                self.warning_threshold_percent = percent;
            }
            "default_budget_period" => {
                let period = trimmed.to_ascii_lowercase();
                if !PERIODS.contains(&period.as_str()) {
                    return Err(ConfigError::invalid(key, "expected weekly, monthly or yearly"));
                }
                self.default_budget_period = period;
            }
            "ui_color_enabled" => self.ui_color_enabled = parse_bool(key, trimmed)?,
            "currency_precision" => {
                self.currency_precision = match trimmed {
                    "" => None,
                    raw => {
                        let precision: u8 = raw
                            .parse()
                            .map_err(|_| ConfigError::invalid(key, "expected a whole number"))?;
                        if precision > 4 {
                            return Err(ConfigError::invalid(key, "must be at most 4"));
                        }
                        Some(precision)
                    }
                }
            }
            "data_root" => self.data_root = optional(trimmed).map(PathBuf::from),
            "backup_root" => self.backup_root = optional(trimmed).map(PathBuf::from),
            "insights.api_key_env" => self.insights.api_key_env = required(key, trimmed)?,
            "insights.model" => self.insights.model = required(key, trimmed)?,
            "insights.command" => self.insights.command = optional(trimmed),
            "insights.args" => {
                self.insights.args = trimmed.split_whitespace().map(str::to_string).collect()
            }
            "insights.recent_limit" => {
                let limit: usize = trimmed
                    .parse()
                    .map_err(|_| ConfigError::invalid(key, "expected a whole number"))?;
                if limit == 0 {
                    return Err(ConfigError::invalid(key, "must be at least 1"));
                }
                self.insights.recent_limit = limit;
            }
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }
}

fn required(key: &str, value: &str) -> Result<String, ConfigError> {
    if value.is_empty() {
        Err(ConfigError::invalid(key, "value cannot be empty"))
    } else {
        Ok(value.to_string())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ConfigError::invalid(key, "expected true or false")),
    }
}
