//! Inclusive date windows used to measure budget periods.

use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
/// A contiguous range of calendar days; both `start` and `end` are inclusive.
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateWindowError> {
        if end < start {
            return Err(DateWindowError::InvalidRange);
        }
        Ok(Self { start, end })
    }

    /// A window covering exactly one day.
    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of days covered, counting both ends.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// First day after the window closes.
    pub fn next_day(&self) -> Option<NaiveDate> {
        self.end.checked_add_signed(Duration::days(1))
    }

    /// Where the window sits relative to `reference`.
    pub fn scope(&self, reference: NaiveDate) -> BudgetScope {
        if reference > self.end {
            BudgetScope::Past
        } else if reference < self.start {
            BudgetScope::Future
        } else {
            BudgetScope::Current
        }
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Errors that can occur when constructing [`DateWindow`] values.
pub enum DateWindowError {
    InvalidRange,
}

impl fmt::Display for DateWindowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateWindowError::InvalidRange => f.write_str("date window end must not precede start"),
        }
    }
}

impl std::error::Error for DateWindowError {}

/// Position of a period relative to a reference day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BudgetScope {
    Past,
    Current,
    Future,
}

impl fmt::Display for BudgetScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BudgetScope::Past => "past",
            BudgetScope::Current => "current",
            BudgetScope::Future => "upcoming",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let window = DateWindow::new(date(2024, 3, 1), date(2024, 3, 31)).unwrap();
        assert!(window.contains(date(2024, 3, 1)));
        assert!(window.contains(date(2024, 3, 31)));
        assert!(!window.contains(date(2024, 4, 1)));
        assert_eq!(window.days(), 31);
        assert_eq!(window.next_day(), Some(date(2024, 4, 1)));
    }

    #[test]
    fn single_day_window_is_valid() {
        let window = DateWindow::single(date(2024, 2, 29));
        assert_eq!(window.days(), 1);
        assert!(DateWindow::new(date(2024, 2, 29), date(2024, 2, 29)).is_ok());
        assert_eq!(
            DateWindow::new(date(2024, 3, 1), date(2024, 2, 29)),
            Err(DateWindowError::InvalidRange)
        );
    }

    #[test]
    fn scope_places_reference_before_inside_or_after() {
        let window = DateWindow::new(date(2024, 1, 8), date(2024, 1, 14)).unwrap();
        assert_eq!(window.scope(date(2024, 1, 8)), BudgetScope::Current);
        assert_eq!(window.scope(date(2024, 1, 14)), BudgetScope::Current);
        assert_eq!(window.scope(date(2024, 1, 15)), BudgetScope::Past);
        assert_eq!(window.scope(date(2024, 1, 7)), BudgetScope::Future);
        assert_eq!(BudgetScope::Future.to_string(), "upcoming");
    }
}
