pub(crate) mod args;
pub mod commands;
pub mod core;
pub mod formatters;
pub mod help;
pub mod io;
pub mod output;
pub mod registry;
pub mod shell;
pub mod shell_context;
pub mod system_clock;

pub use self::core::{CliMode, CommandError, CommandResult, LoopControl};
pub use shell::run_cli;
pub use shell_context::ShellContext;

#[cfg(test)]
mod tests;
