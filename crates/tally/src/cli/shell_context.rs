use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tally_config::{default_base_dir, Config, ConfigManager};
use tally_core::{book_warnings, BookStorage, Clock, CoreResult};
use tally_domain::Book;
use tally_storage_json::{JsonBookStorage, StoragePaths};
use uuid::Uuid;

use crate::cli::commands;
use crate::cli::core::{CliError, CliMode, CommandError};
use crate::cli::formatters::CliFormatters;
use crate::cli::output;
use crate::cli::registry::{CommandEntry, CommandRegistry};
use crate::cli::system_clock::clock_from_env;

/// Storage name of the single book every user shares.
pub const BOOK_NAME: &str = "tally";

/// Session state shared by every command handler.
pub struct ShellContext {
    pub(crate) mode: CliMode,
    pub(crate) registry: CommandRegistry,
    pub(crate) base_dir: PathBuf,
    pub(crate) config_manager: ConfigManager,
    pub(crate) config: Config,
    pub(crate) storage: JsonBookStorage,
    pub(crate) book: Book,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) running: bool,
    pub(crate) last_command: Option<String>,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        Self::with_base_dir(mode, default_base_dir(), clock_from_env()?)
    }

    /// Opens the configuration and book stored under `base_dir`.
    pub fn with_base_dir(
        mode: CliMode,
        base_dir: PathBuf,
        clock: Box<dyn Clock>,
    ) -> Result<Self, CliError> {
        let config_manager = ConfigManager::with_base_dir(base_dir.clone())?;
        let config = config_manager.load()?;
        let storage = open_storage(&config, &base_dir)?;
        let book = storage.load_or_default(BOOK_NAME)?;
        output::set_color_enabled(config.ui_color_enabled);
        tracing::debug!(base = %base_dir.display(), ?mode, "shell context ready");

        Ok(Self {
            mode,
            registry: commands::registry(),
            base_dir,
            config_manager,
            config,
            storage,
            book,
            clock,
            running: true,
            last_command: None,
        })
    }

    pub(crate) fn prompt(&self) -> String {
        match self.config.active_user.as_deref() {
            Some(user) => format!("tally({})> ", user),
            None => "tally> ".to_string(),
        }
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    pub(crate) fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub(crate) fn threshold(&self) -> u8 {
        self.config.warning_threshold_percent
    }

    pub(crate) fn formatters(&self) -> CliFormatters {
        CliFormatters::from_config(&self.config)
    }

    pub(crate) fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Id of the user named by `active_user` in the configuration.
    pub(crate) fn active_user_id(&self) -> Result<Uuid, CommandError> {
        let name = self
            .config
            .active_user
            .as_deref()
            .ok_or(CommandError::NoActiveUser)?;
        self.book
            .user_by_name(name)
            .map(|user| user.id)
            .ok_or_else(|| {
                CommandError::Message(format!(
                    "Active user `{}` is not in the book. Use `user use <name>` to switch.",
                    name
                ))
            })
    }

    /// Applies `change` to a copy of the book and keeps it only once it is saved.
    pub(crate) fn with_book_mut<T, F>(&mut self, change: F) -> Result<T, CommandError>
    where
        F: FnOnce(&mut Book, &dyn Clock) -> CoreResult<T>,
    {
        let mut draft = self.book.clone();
        let value = change(&mut draft, self.clock.as_ref())?;
        self.storage.save_book(BOOK_NAME, &draft)?;
        self.book = draft;
        Ok(value)
    }

    /// Replaces the in-memory book, e.g. after a restore.
    pub(crate) fn replace_book(&mut self, book: Book) {
        for warning in book_warnings(&book) {
            tracing::warn!("{}", warning);
        }
        self.book = book;
    }

    pub(crate) fn save_config(&self) -> Result<(), CommandError> {
        self.config_manager.save(&self.config)?;
        Ok(())
    }

    /// Re-applies settings that are cached outside `config`.
    pub(crate) fn apply_config(&mut self) -> Result<(), CommandError> {
        output::set_color_enabled(self.config.ui_color_enabled);
        self.storage = open_storage(&self.config, &self.base_dir)?;
        Ok(())
    }
}

fn open_storage(config: &Config, base_dir: &Path) -> CoreResult<JsonBookStorage> {
    JsonBookStorage::new(StoragePaths {
        book_root: config.resolve_data_root(base_dir),
        backup_root: config.resolve_backup_root(base_dir),
    })
}
