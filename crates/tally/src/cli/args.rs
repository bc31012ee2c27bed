//! Positional arguments and `--flag [value]` options for subcommands.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_core::money::parse_amount;
use tally_domain::PeriodKind;

use crate::cli::core::CommandError;

/// Whether a flag consumes the following token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Flag {
    Value(&'static str),
    Switch(&'static str),
}

impl Flag {
    fn name(self) -> &'static str {
        match self {
            Flag::Value(name) | Flag::Switch(name) => name,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct ParsedArgs<'a> {
    positionals: Vec<&'a str>,
    values: Vec<(&'static str, &'a str)>,
    switches: Vec<&'static str>,
}

impl<'a> ParsedArgs<'a> {
    /// Splits `args` using the accepted `flags`; unknown `--` options are rejected.
    pub(crate) fn parse(args: &[&'a str], flags: &[Flag]) -> Result<Self, CommandError> {
        let mut parsed = ParsedArgs::default();
        let mut iter = args.iter().copied();
        while let Some(token) = iter.next() {
            let Some(option) = token.strip_prefix("--") else {
                parsed.positionals.push(token);
                continue;
            };
            let (name, inline) = match option.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (option, None),
            };
            let flag = flags
                .iter()
                .copied()
                .find(|flag| flag.name() == name)
                .ok_or_else(|| {
                    CommandError::InvalidArguments(format!("unknown option `--{}`", name))
                })?;
            match flag {
                Flag::Switch(name) => {
                    if inline.is_some() {
                        return Err(CommandError::InvalidArguments(format!(
                            "`--{}` does not take a value",
                            name
                        )));
                    }
                    parsed.switches.push(name);
                }
                Flag::Value(name) => {
                    let value = inline.or_else(|| iter.next()).ok_or_else(|| {
                        CommandError::InvalidArguments(format!("`--{}` expects a value", name))
                    })?;
                    parsed.values.retain(|(existing, _)| *existing != name);
                    parsed.values.push((name, value));
                }
            }
        }
        Ok(parsed)
    }

    pub(crate) fn positionals(&self) -> &[&'a str] {
        &self.positionals
    }

    pub(crate) fn positional(&self, index: usize) -> Option<&'a str> {
        self.positionals.get(index).copied()
    }

    /// The positional at `index`, or an error naming what `usage` expects.
    pub(crate) fn require(&self, index: usize, usage: &str) -> Result<&'a str, CommandError> {
        self.positional(index)
            .ok_or_else(|| CommandError::InvalidArguments(format!("usage: {}", usage)))
    }

    /// Positionals from `index` on, joined with single spaces.
    pub(crate) fn joined_from(&self, index: usize) -> Option<String> {
        let rest = self.positionals.get(index..)?;
        (!rest.is_empty()).then(|| rest.join(" "))
    }

    pub(crate) fn value(&self, name: &str) -> Option<&'a str> {
        self.values
            .iter()
            .find(|(flag, _)| *flag == name)
            .map(|(_, value)| *value)
    }

    pub(crate) fn has(&self, name: &str) -> bool {
        self.switches.contains(&name)
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        CommandError::InvalidArguments(format!("invalid date `{}` (use YYYY-MM-DD)", raw))
    })
}

pub(crate) fn parse_money(raw: &str) -> Result<Decimal, CommandError> {
    parse_amount(raw).map_err(CommandError::from)
}

pub(crate) fn parse_period(raw: &str) -> Result<PeriodKind, CommandError> {
    raw.parse::<PeriodKind>()
        .map_err(|err| CommandError::InvalidArguments(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLAGS: &[Flag] = &[Flag::Value("date"), Flag::Switch("all")];

    #[test]
    fn separates_positionals_values_and_switches() {
        let parsed =
            ParsedArgs::parse(&["12.50", "--date", "2024-03-01", "Lunch", "out", "--all"], FLAGS)
                .unwrap();
        assert_eq!(parsed.positionals(), &["12.50", "Lunch", "out"]);
        assert_eq!(parsed.value("date"), Some("2024-03-01"));
        assert!(parsed.has("all"));
        assert_eq!(parsed.joined_from(1).as_deref(), Some("Lunch out"));
        assert_eq!(parsed.joined_from(3), None);
    }

    #[test]
    fn accepts_inline_values_and_keeps_the_last() {
        let parsed = ParsedArgs::parse(&["--date=2024-01-01", "--date", "2024-02-01"], FLAGS)
            .unwrap();
        assert_eq!(parsed.value("date"), Some("2024-02-01"));
    }

    #[test]
    fn rejects_unknown_and_incomplete_options() {
        assert!(matches!(
            ParsedArgs::parse(&["--colour"], FLAGS),
            Err(CommandError::InvalidArguments(_))
        ));
        assert!(matches!(
            ParsedArgs::parse(&["--date"], FLAGS),
            Err(CommandError::InvalidArguments(_))
        ));
        assert!(matches!(
            ParsedArgs::parse(&["--all=yes"], FLAGS),
            Err(CommandError::InvalidArguments(_))
        ));
    }

    #[test]
    fn parses_dates_and_periods() {
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(parse_date("2023-02-29").is_err());
        assert_eq!(parse_period("Weekly").unwrap(), PeriodKind::Weekly);
        assert!(parse_period("daily").is_err());
    }
}
