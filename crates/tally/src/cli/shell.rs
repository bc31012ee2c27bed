use std::{
    borrow::Cow,
    fmt,
    io::{self, BufRead, Lines, StdinLock},
};

use colored::Colorize;
use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::Validator,
    Cmd, Context as ReadlineContext, Editor, Helper, KeyEvent,
};

use crate::cli::core::{CliError, CliMode, LoopControl};
use crate::cli::io as cli_io;
use crate::cli::shell_context::ShellContext;

pub fn run_cli() -> Result<(), CliError> {
    let mut context = ShellContext::new(CliMode::from_env())?;
    match context.mode {
        CliMode::Interactive => {
            let mut source = TerminalSource::new(&context)?;
            cli_io::print_info("Type `help` to list commands, `exit` to quit.");
            drive(&mut context, &mut source)
        }
        CliMode::Script => drive(&mut context, &mut ScriptSource::stdin()),
    }
}

/// Where command lines come from.
trait LineSource {
    /// `Ok(None)` ends the session.
    fn next_line(&mut self, prompt: &str) -> Result<Option<String>, CliError>;
}

fn drive(context: &mut ShellContext, source: &mut dyn LineSource) -> Result<(), CliError> {
    while context.running {
        let Some(line) = source.next_line(&context.prompt())? else {
            break;
        };
        match context.process_line(&line) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => context.report_error(err),
        }
    }
    Ok(())
}

struct TerminalSource {
    editor: Editor<CommandHelper, DefaultHistory>,
}

impl TerminalSource {
    fn new(context: &ShellContext) -> Result<Self, CliError> {
        let mut editor = Editor::<CommandHelper, DefaultHistory>::new()?;
        editor.set_helper(Some(CommandHelper::new(context.command_names())));
        editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);
        Ok(Self { editor })
    }
}

impl LineSource for TerminalSource {
    fn next_line(&mut self, prompt: &str) -> Result<Option<String>, CliError> {
        loop {
            match self.editor.readline(prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    self.editor.add_history_entry(trimmed).ok();
                    return Ok(Some(trimmed.to_string()));
                }
                Err(ReadlineError::Interrupted) => {
                    cli_io::print_info("Use `exit` to leave the shell.");
                }
                Err(ReadlineError::Eof) => {
                    cli_io::print_info("Exiting shell.");
                    return Ok(None);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

/// Reads stdin line by line; blank lines and `#` comments are skipped.
struct ScriptSource<R: BufRead> {
    lines: Lines<R>,
}

impl ScriptSource<StdinLock<'static>> {
    fn stdin() -> Self {
        Self {
            lines: io::stdin().lock().lines(),
        }
    }
}

impl<R: BufRead> LineSource for ScriptSource<R> {
    fn next_line(&mut self, _prompt: &str) -> Result<Option<String>, CliError> {
        for line in self.lines.by_ref() {
            let line = line?;
            let trimmed = line.trim();
            if !trimmed.is_empty() && !trimmed.starts_with('#') {
                return Ok(Some(trimmed.to_string()));
            }
        }
        Ok(None)
    }
}

/// Completes and hints the command word; arguments are left alone.
struct CommandHelper {
    commands: Vec<String>,
}

impl CommandHelper {
    fn new(names: Vec<&'static str>) -> Self {
        let mut commands: Vec<String> = names.into_iter().map(str::to_ascii_lowercase).collect();
        commands.sort();
        commands.dedup();
        Self { commands }
    }

    /// The word being typed, if the cursor is still on the first word.
    fn command_prefix<'l>(line: &'l str, pos: usize) -> Option<(usize, &'l str)> {
        let before = line.get(..pos)?;
        let start = before.len() - before.trim_start().len();
        let word = &before[start..];
        (!word.contains(char::is_whitespace)).then_some((start, word))
    }

    fn matching<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a String> + 'a {
        let needle = prefix.to_ascii_lowercase();
        self.commands
            .iter()
            .filter(move |name| name.starts_with(&needle))
    }
}

impl Helper for CommandHelper {}

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let Some((start, word)) = Self::command_prefix(line, pos) else {
            return Ok((pos, Vec::new()));
        };
        let candidates = self
            .matching(word)
            .map(|name| Pair {
                display: name.clone(),
                replacement: name.clone(),
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Hinter for CommandHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &ReadlineContext<'_>) -> Option<String> {
        if pos < line.len() {
            return None;
        }
        let (_, word) = Self::command_prefix(line, pos)?;
        if word.is_empty() {
            return None;
        }
        let mut matches = self.matching(word);
        let only = matches.next()?;
        if matches.next().is_some() {
            return None;
        }
        only.get(word.len()..)
            .filter(|rest| !rest.is_empty())
            .map(str::to_string)
    }
}

impl Highlighter for CommandHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(hint.dimmed().to_string())
    }
}

impl Validator for CommandHelper {}

pub(crate) fn parse_command_line(input: &str) -> Result<Vec<String>, ParseError> {
    shell_words::split(input).map_err(|err| ParseError(err.to_string()))
}

#[derive(Debug)]
pub(crate) struct ParseError(String);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Could not parse input: {}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn quoted_arguments_stay_together() {
        let tokens = parse_command_line(r#"expense add 12.50 "Lunch with Ana" --category Food"#)
            .unwrap();
        assert_eq!(
            tokens,
            vec!["expense", "add", "12.50", "Lunch with Ana", "--category", "Food"]
        );
    }

    #[test]
    fn unbalanced_quotes_are_reported() {
        assert!(parse_command_line("expense add 5 \"open").is_err());
    }

    #[test]
    fn script_source_skips_blanks_and_comments() {
        let input = "# setup\n\nuser add ana\n   \n  dashboard  \n";
        let mut source = ScriptSource {
            lines: Cursor::new(input).lines(),
        };
        assert_eq!(source.next_line("").unwrap().as_deref(), Some("user add ana"));
        assert_eq!(source.next_line("").unwrap().as_deref(), Some("dashboard"));
        assert_eq!(source.next_line("").unwrap(), None);
    }

    #[test]
    fn only_the_first_word_is_completed() {
        let helper = CommandHelper::new(vec!["budget", "backup", "budget", "Backups"]);
        assert_eq!(helper.commands, vec!["backup", "backups", "budget"]);
        assert_eq!(CommandHelper::command_prefix("  bu", 4), Some((2, "bu")));
        assert_eq!(CommandHelper::command_prefix("budget li", 9), None);
        let found: Vec<_> = helper.matching("BAC").collect();
        assert_eq!(found, vec!["backup", "backups"]);
    }
}
