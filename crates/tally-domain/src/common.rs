//! Shared traits and enums for budgeting primitives.

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Number of fractional digits carried by every monetary amount.
pub const MONEY_SCALE: u32 = 2;

/// Supplies a common contract for retrieving monetary amounts.
pub trait Amounted {
    fn amount(&self) -> Decimal;
}

/// Converts an entity into a user-facing display label.
pub trait Displayable {
    fn display_label(&self) -> String;
}

/// Recurrence cadence of a budget cap.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl PeriodKind {
    pub const ALL: [PeriodKind; 3] = [PeriodKind::Weekly, PeriodKind::Monthly, PeriodKind::Yearly];

    pub fn as_str(self) -> &'static str {
        match self {
            PeriodKind::Weekly => "weekly",
            PeriodKind::Monthly => "monthly",
            PeriodKind::Yearly => "yearly",
        }
    }
}

impl fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a period label is not one of `weekly`, `monthly`, `yearly`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePeriodKindError(pub String);

impl fmt::Display for ParsePeriodKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown period `{}` (expected weekly, monthly or yearly)",
            self.0
        )
    }
}

impl std::error::Error for ParsePeriodKindError {}

impl FromStr for PeriodKind {
    type Err = ParsePeriodKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "weekly" | "week" => Ok(PeriodKind::Weekly),
            "monthly" | "month" => Ok(PeriodKind::Monthly),
            "yearly" | "year" | "annual" => Ok(PeriodKind::Yearly),
            _ => Err(ParsePeriodKindError(value.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_kind_parses_case_insensitively() {
        assert_eq!("Weekly".parse::<PeriodKind>(), Ok(PeriodKind::Weekly));
        assert_eq!(" MONTHLY ".parse::<PeriodKind>(), Ok(PeriodKind::Monthly));
        assert_eq!("yearly".parse::<PeriodKind>(), Ok(PeriodKind::Yearly));
        assert!("fortnightly".parse::<PeriodKind>().is_err());
    }

    #[test]
    fn period_kind_serializes_lowercase() {
        let json = serde_json::to_string(&PeriodKind::Yearly).unwrap();
        assert_eq!(json, "\"yearly\"");
    }
}
