use std::io;

use rustyline::error::ReadlineError;
use tally_config::ConfigError;
use tally_core::CoreError;
use thiserror::Error;

/// Fatal errors that stop the shell.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Terminal error: {0}")]
    Readline(#[from] ReadlineError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("Invalid input: {0}")]
    Input(String),
}
