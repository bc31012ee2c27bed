use std::collections::HashMap;

use crate::cli::core::CommandResult;
use crate::cli::shell_context::ShellContext;

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

/// A top-level shell command. Subcommands are parsed by the handler itself.
pub struct CommandEntry {
    pub name: &'static str,
    pub description: &'static str,
    /// One line per subcommand form.
    pub usage: &'static [&'static str],
    pub aliases: &'static [&'static str],
    pub handler: CommandHandler,
}

impl CommandEntry {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static [&'static str],
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            aliases: &[],
            handler,
        }
    }

    pub fn with_aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }
}

/// Commands in registration order, looked up by name or alias.
#[derive(Default)]
pub struct CommandRegistry {
    entries: Vec<CommandEntry>,
    lookup: HashMap<&'static str, usize>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A later entry replaces an earlier one with the same name.
    pub fn register(&mut self, entry: CommandEntry) {
        let slot = match self.lookup.get(entry.name) {
            Some(&index) if self.entries[index].name == entry.name => {
                self.entries[index] = entry;
                index
            }
            _ => {
                self.entries.push(entry);
                self.entries.len() - 1
            }
        };
        let entry = &self.entries[slot];
        for key in std::iter::once(entry.name).chain(entry.aliases.iter().copied()) {
            self.lookup.insert(key, slot);
        }
    }

    pub fn get(&self, name: &str) -> Option<&CommandEntry> {
        self.lookup.get(name).map(|&index| &self.entries[index])
    }

    pub fn list(&self) -> &[CommandEntry] {
        &self.entries
    }

    /// Names and aliases, for completion and suggestions.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries
            .iter()
            .flat_map(|entry| std::iter::once(entry.name).chain(entry.aliases.iter().copied()))
    }

    pub fn handler(&self, name: &str) -> Option<CommandHandler> {
        self.get(name).map(|entry| entry.handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut ShellContext, _: &[&str]) -> CommandResult {
        Ok(())
    }

    #[test]
    fn aliases_resolve_to_their_entry() {
        let mut registry = CommandRegistry::new();
        registry.register(
            CommandEntry::new("exit", "Leave", &["exit"], noop).with_aliases(&["quit"]),
        );
        registry.register(CommandEntry::new("help", "Help", &["help"], noop));

        assert_eq!(registry.get("quit").map(|entry| entry.name), Some("exit"));
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["exit", "quit", "help"]);
        assert_eq!(registry.list().len(), 2);
    }

    #[test]
    fn re_registering_replaces_in_place() {
        let mut registry = CommandRegistry::new();
        registry.register(CommandEntry::new("help", "Old", &["help"], noop));
        registry.register(CommandEntry::new("version", "Build", &["version"], noop));
        registry.register(CommandEntry::new("help", "New", &["help"], noop));

        let names: Vec<_> = registry.list().iter().map(|entry| entry.name).collect();
        assert_eq!(names, vec!["help", "version"]);
        assert_eq!(registry.get("help").map(|entry| entry.description), Some("New"));
    }
}
