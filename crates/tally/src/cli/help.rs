use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::{CommandEntry, CommandRegistry};

pub fn print_overview(registry: &CommandRegistry) {
    output_section("Available commands");
    for entry in registry.list() {
        io::print_info(format!("  {:<12} {}", entry.name, entry.description));
    }
    io::print_info("Use `help <command>` for details.");
}

pub fn print_command(entry: &CommandEntry) {
    output_section(format!("Help: {}", entry.name));
    io::print_info(format!("  Description: {}", entry.description));
    if !entry.aliases.is_empty() {
        io::print_info(format!("  Aliases:     {}", entry.aliases.join(", ")));
    }
    for (index, line) in entry.usage.iter().enumerate() {
        let label = if index == 0 { "Usage:" } else { "" };
        io::print_info(format!("  {:<12} {}", label, line));
    }
}
