use crate::cli::core::{CommandError, CommandResult};
use crate::cli::io;
use crate::cli::output::{self, RowTone};
use crate::cli::registry::CommandEntry;
use crate::cli::shell_context::ShellContext;

use super::usage_error;

const USAGE: &[&str] = &[
    "config [show]",
    "config set <key> <value>",
    "config backup [note]",
    "config backups",
    "config restore <file>",
];

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "config",
        "View and manage CLI preferences",
        USAGE,
        cmd_config,
    )]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.is_empty() || args[0].eq_ignore_ascii_case("show") {
        return show(context);
    }

    match args[0].to_lowercase().as_str() {
        "set" => {
            if args.len() < 2 {
                return Err(usage_error(&USAGE[1..2]));
            }
            let key = args[1].to_ascii_lowercase();
            let value = args[2..].join(" ");
            context.config.set(&key, &value)?;
            context.save_config()?;
            context.apply_config()?;
            let shown = context.config.get(&key).unwrap_or_default();
            io::print_success(format!("{} = {}", key, shown));
            Ok(())
        }
        "backup" => {
            let note = (args.len() > 1).then(|| args[1..].join(" "));
            let name = context
                .config_manager
                .backup(&context.config, note.as_deref())?;
            io::print_success(format!("Configuration backed up to {}.", name));
            Ok(())
        }
        "backups" => {
            let backups = context.config_manager.list_backups()?;
            if backups.is_empty() {
                io::print_info("No configuration backups yet.");
            }
            for name in backups {
                io::print_info(format!("  {}", name));
            }
            Ok(())
        }
        "restore" => {
            let [_, name] = args else {
                return Err(usage_error(&USAGE[4..]));
            };
            context.config = context.config_manager.restore(name)?;
            context.apply_config()?;
            io::print_success(format!("Configuration restored from {}.", name));
            Ok(())
        }
        other => Err(CommandError::InvalidArguments(format!(
            "unknown config action `{}`; usage: {}",
            other,
            USAGE.join(" | ")
        ))),
    }
}

fn show(context: &ShellContext) -> CommandResult {
    output::section("Configuration");
    let rows: Vec<_> = context
        .config
        .entries()
        .into_iter()
        .map(|(key, value)| (vec![key.to_string(), value], RowTone::Plain))
        .collect();
    output::table(&["Key", "Value"], &rows);
    io::print_info(format!(
        "Stored in {} (base {})",
        context.config_manager.config_path().display(),
        context.base_dir().display()
    ));
    Ok(())
}
