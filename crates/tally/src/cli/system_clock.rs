use std::env;

use chrono::{DateTime, NaiveDate, Utc};
use tally_core::{Clock, FixedClock};

use crate::errors::CliError;

/// Pins "today" for the whole session, e.g. `TALLY_TODAY=2024-03-15`.
pub const TODAY_ENV: &str = "TALLY_TODAY";

/// Real-time clock backed by the system UTC time source.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// The system clock, or a [`FixedClock`] when `TALLY_TODAY` is set.
pub fn clock_from_env() -> Result<Box<dyn Clock>, CliError> {
    match env::var(TODAY_ENV) {
        Ok(raw) if !raw.trim().is_empty() => {
            let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
                CliError::Input(format!("{} must be YYYY-MM-DD, got `{}`", TODAY_ENV, raw))
            })?;
            tracing::debug!(%date, "using fixed clock");
            Ok(Box::new(FixedClock::on(date)))
        }
        _ => Ok(Box::new(SystemClock)),
    }
}
