pub mod backup;
pub mod budget;
pub mod category;
pub mod config;
pub mod expense;
pub mod insights;
pub mod report;
pub mod system;
pub mod user;

use crate::cli::core::CommandError;
use crate::cli::registry::{CommandEntry, CommandRegistry};

pub(crate) fn registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    for entry in all_definitions() {
        registry.register(entry);
    }
    registry
}

fn all_definitions() -> Vec<CommandEntry> {
    let mut commands = Vec::new();
    commands.extend(system::definitions());
    commands.extend(user::definitions());
    commands.extend(category::definitions());
    commands.extend(expense::definitions());
    commands.extend(budget::definitions());
    commands.extend(report::definitions());
    commands.extend(insights::definitions());
    commands.extend(config::definitions());
    commands.extend(backup::definitions());
    commands
}

/// Splits `args` into a lower-cased subcommand and its arguments.
pub(crate) fn split_subcommand<'a, 'b>(
    args: &'b [&'a str],
    usage: &[&str],
) -> Result<(String, &'b [&'a str]), CommandError> {
    match args.split_first() {
        Some((first, rest)) => Ok((first.to_lowercase(), rest)),
        None => Err(usage_error(usage)),
    }
}

pub(crate) fn usage_error(usage: &[&str]) -> CommandError {
    CommandError::InvalidArguments(format!("usage: {}", usage.join(" | ")))
}
