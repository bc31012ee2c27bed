use std::{
    env, fs,
    path::{Path, PathBuf},
};

use chrono::{NaiveDateTime, Utc};

use crate::{Config, ConfigError};

/// Environment variable that overrides the base directory.
pub const BASE_DIR_ENV: &str = "TALLY_HOME";
const CONFIG_FILE: &str = "config.json";
const BACKUP_PREFIX: &str = "config_";
const BACKUP_SUFFIX: &str = ".json";
const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// `$TALLY_HOME`, else the platform data directory joined with `tally`.
pub fn default_base_dir() -> PathBuf {
    match env::var_os(BASE_DIR_ENV) {
        Some(custom) if !custom.is_empty() => PathBuf::from(custom),
        _ => dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tally"),
    }
}

/// Reads and writes `config/config.json` and keeps snapshots of it under
/// `config/backups/`.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
    backups_dir: PathBuf,
}

impl ConfigManager {
    pub fn new(config_path: PathBuf, backups_dir: PathBuf) -> Self {
        Self {
            config_path,
            backups_dir,
        }
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, ConfigError> {
        let config_dir = base.join("config");
        let backups_dir = config_dir.join("backups");
        fs::create_dir_all(&backups_dir)?;
        Ok(Self::new(config_dir.join(CONFIG_FILE), backups_dir))
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    /// Missing file means defaults; a present but unreadable one is an error.
    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }
        let config = decode(&fs::read_to_string(&self.config_path)?)?;
        tracing::debug!(path = %self.config_path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        write_replacing(&self.config_path, &encode(config)?)?;
        tracing::info!(path = %self.config_path.display(), "saved configuration");
        Ok(())
    }

    /// Writes `config_<stamp>[_<note>].json` and returns the file name.
    pub fn backup(&self, config: &Config, note: Option<&str>) -> Result<String, ConfigError> {
        fs::create_dir_all(&self.backups_dir)?;
        let mut stem = format!(
            "{}{}",
            BACKUP_PREFIX,
            Utc::now().format(STAMP_FORMAT)
        );
        if let Some(label) = note.and_then(slug) {
            stem = format!("{}_{}", stem, label);
        }
        let name = (1..)
            .map(|n| match n {
                1 => format!("{}{}", stem, BACKUP_SUFFIX),
                n => format!("{}_n{}{}", stem, n, BACKUP_SUFFIX),
            })
            .find(|candidate| !self.backups_dir.join(candidate).exists())
            .unwrap_or_else(|| format!("{}{}", stem, BACKUP_SUFFIX));
        write_replacing(&self.backups_dir.join(&name), &encode(config)?)?;
        tracing::info!(backup = %name, "wrote configuration backup");
        Ok(name)
    }

    /// Reads a backup and makes it the active configuration.
    pub fn restore(&self, backup_name: &str) -> Result<Config, ConfigError> {
        let name = backup_name.trim();
        let path = self.backups_dir.join(name);
        if name.contains(['/', '\\']) || !path.is_file() {
            return Err(ConfigError::BackupNotFound(name.to_string()));
        }
        let config = decode(&fs::read_to_string(&path)?)?;
        self.save(&config)?;
        tracing::info!(backup = %name, "restored configuration");
        Ok(config)
    }

    /// Backup file names, newest first.
    pub fn list_backups(&self) -> Result<Vec<String>, ConfigError> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let name = entry?.file_name().to_string_lossy().into_owned();
            if name.ends_with(BACKUP_SUFFIX) {
                names.push(name);
            }
        }
        names.sort_by(|a, b| {
            backup_stamp(b)
                .cmp(&backup_stamp(a))
                .then_with(|| b.cmp(a))
        });
        Ok(names)
    }
}

fn encode(config: &Config) -> Result<String, ConfigError> {
    serde_json::to_string_pretty(config).map_err(|err| ConfigError::Serde(err.to_string()))
}

fn decode(data: &str) -> Result<Config, ConfigError> {
    serde_json::from_str(data).map_err(|err| ConfigError::Serde(err.to_string()))
}

/// Lowercase alphanumerics joined by single dashes.
fn slug(note: &str) -> Option<String> {
    let words: Vec<String> = note
        .split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect();
    (!words.is_empty()).then(|| words.join("-"))
}

fn backup_stamp(name: &str) -> Option<NaiveDateTime> {
    let rest = name.strip_prefix(BACKUP_PREFIX)?;
    let stamp = rest.get(..15)?;
    NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok()
}

/// Writes through a sibling `.tmp` file so readers never see a partial document.
fn write_replacing(path: &Path, data: &str) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_follows_the_prefix() {
        let stamp = backup_stamp("config_20240305_101112_before-upgrade.json").unwrap();
        assert_eq!(stamp.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-03-05 10:11:12");
        assert!(backup_stamp("config.json").is_none());
        assert!(backup_stamp("notes_20240305_101112.json").is_none());
    }

    #[test]
    fn notes_become_slugs() {
        assert_eq!(slug("Pre release_1"), Some("pre-release-1".into()));
        assert_eq!(slug("  --  "), None);
    }

    #[test]
    fn restore_rejects_paths_outside_the_backup_dir() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        let err = manager.restore("../config.json").unwrap_err();
        assert!(matches!(err, ConfigError::BackupNotFound(_)));
    }
}
