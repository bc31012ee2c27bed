use tally_domain::CURRENT_SCHEMA_VERSION;

use crate::cli::core::{CommandError, CommandResult};
use crate::cli::help;
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::cli::shell_context::ShellContext;
use crate::utils::build_info;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "help",
            "Show available commands",
            &["help [command]"],
            cmd_help,
        ),
        CommandEntry::new("version", "Show build metadata", &["version"], cmd_version),
        CommandEntry::new("exit", "Exit the shell", &["exit"], cmd_exit)
            .with_aliases(&["quit"]),
    ]
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first() {
        match context.command(&name.to_lowercase()) {
            Some(entry) => help::print_command(entry),
            None => context.suggest_command(name),
        }
        return Ok(());
    }

    help::print_overview(&context.registry);
    Ok(())
}

fn cmd_version(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let meta = build_info::current();
    output_section(format!("Tally {}", meta.version));
    for (label, value) in meta.rows() {
        io::print_info(format!("  {:<12}: {}", label, value));
    }
    io::print_info(format!("  {:<12}: v{}", "Book schema", CURRENT_SCHEMA_VERSION));
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}
