//! Budget period calculation.
//!
//! Every period is derived from the budget's anchor (`start_date`) by offset, never
//! by calendar alignment, so repeated evaluations cannot drift. Monthly and yearly
//! anchors whose day does not exist in a target month are clamped to that month's
//! last day.

use chrono::{Datelike, Duration, Months, NaiveDate};
use tally_domain::{DateWindow, PeriodKind};

/// Returns the inclusive period of a budget anchored at `start` that applies on
/// `reference`.
///
/// Before the anchor the budget is not active yet, which is reported as the
/// single-day window `start..=start`.
pub fn period_bounds(start: NaiveDate, kind: PeriodKind, reference: NaiveDate) -> DateWindow {
    if reference < start {
        return DateWindow::single(start);
    }
    match kind {
        PeriodKind::Weekly => weekly_bounds(start, reference),
        PeriodKind::Monthly => anchored_bounds(start, months_elapsed(start, reference), 1),
        PeriodKind::Yearly => {
            let years = (reference.year() - start.year()).max(0) as u32;
            anchored_bounds(start, years.saturating_mul(12), 12)
        }
    }
}

/// The period that follows `current` for the same anchor.
pub fn next_period(start: NaiveDate, kind: PeriodKind, current: &DateWindow) -> Option<DateWindow> {
    current
        .next_day()
        .map(|day| period_bounds(start, kind, day))
        .filter(|next| next.start > current.end)
}

/// Consecutive periods touching `[from, to]`, starting with the one that applies on `from`.
pub fn periods_between(
    start: NaiveDate,
    kind: PeriodKind,
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<DateWindow> {
    let mut periods = Vec::new();
    let mut current = period_bounds(start, kind, from.max(start));
    while current.start <= to {
        periods.push(current);
        match next_period(start, kind, &current) {
            Some(next) => current = next,
            None => break,
        }
    }
    periods
}

/// Shifts the anchor by whole calendar months, clamping the day of month.
///
/// Saturates at the latest representable date.
pub fn shift_anchor(anchor: NaiveDate, months: u32) -> NaiveDate {
    anchor
        .checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}

fn weekly_bounds(start: NaiveDate, reference: NaiveDate) -> DateWindow {
    let index = (reference - start).num_days() / 7;
    let period_start = start
        .checked_add_signed(Duration::days(index * 7))
        .unwrap_or(NaiveDate::MAX);
    let period_end = period_start
        .checked_add_signed(Duration::days(6))
        .unwrap_or(NaiveDate::MAX);
    DateWindow {
        start: period_start,
        end: period_end,
    }
}

/// Whole calendar months between the two dates; the day of month is ignored,
/// so a reference earlier in its month than the anchor day still selects the
/// period that begins later in that month.
fn months_elapsed(start: NaiveDate, reference: NaiveDate) -> u32 {
    let months = (reference.year() - start.year()) * 12 + reference.month() as i32
        - start.month() as i32;
    months.max(0) as u32
}

fn anchored_bounds(anchor: NaiveDate, offset: u32, step: u32) -> DateWindow {
    let period_start = shift_anchor(anchor, offset);
    let next_start = shift_anchor(anchor, offset.saturating_add(step));
    let period_end = next_start.pred_opt().unwrap_or(next_start).max(period_start);
    DateWindow {
        start: period_start,
        end: period_end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn bounds(
        start: NaiveDate,
        kind: PeriodKind,
        reference: NaiveDate,
    ) -> (NaiveDate, NaiveDate) {
        let window = period_bounds(start, kind, reference);
        (window.start, window.end)
    }

    #[test]
    fn before_anchor_yields_single_day_at_anchor() {
        let start = date(2024, 6, 15);
        for kind in PeriodKind::ALL {
            assert_eq!(bounds(start, kind, date(2024, 6, 14)), (start, start));
            assert_eq!(bounds(start, kind, date(2020, 1, 1)), (start, start));
        }
    }

    #[test]
    fn weekly_periods_are_seven_days_from_anchor() {
        let start = date(2024, 1, 3);
        assert_eq!(
            bounds(start, PeriodKind::Weekly, date(2024, 1, 3)),
            (date(2024, 1, 3), date(2024, 1, 9))
        );
        assert_eq!(
            bounds(start, PeriodKind::Weekly, date(2024, 1, 9)),
            (date(2024, 1, 3), date(2024, 1, 9))
        );
        assert_eq!(
            bounds(start, PeriodKind::Weekly, date(2024, 1, 10)),
            (date(2024, 1, 10), date(2024, 1, 16))
        );
        assert_eq!(
            bounds(start, PeriodKind::Weekly, date(2025, 1, 1)),
            (date(2025, 1, 1), date(2025, 1, 7))
        );
    }

    #[test]
    fn monthly_anchor_on_31st_clamps_into_short_months() {
        let start = date(2024, 1, 31);
        assert_eq!(
            bounds(start, PeriodKind::Monthly, date(2024, 2, 15)),
            (date(2024, 2, 29), date(2024, 3, 30))
        );
        assert_eq!(
            bounds(start, PeriodKind::Monthly, date(2024, 1, 31)),
            (date(2024, 1, 31), date(2024, 2, 28))
        );
        assert_eq!(
            bounds(start, PeriodKind::Monthly, date(2024, 4, 30)),
            (date(2024, 4, 30), date(2024, 5, 30))
        );
        assert_eq!(
            bounds(start, PeriodKind::Monthly, date(2025, 2, 28)),
            (date(2025, 2, 28), date(2025, 3, 30))
        );
    }

    #[test]
    fn monthly_period_crosses_year_boundary() {
        let start = date(2023, 11, 15);
        assert_eq!(
            bounds(start, PeriodKind::Monthly, date(2023, 12, 20)),
            (date(2023, 12, 15), date(2024, 1, 14))
        );
        assert_eq!(
            bounds(start, PeriodKind::Monthly, date(2024, 1, 20)),
            (date(2024, 1, 15), date(2024, 2, 14))
        );
    }

    #[test]
    fn yearly_leap_day_anchor_clamps_to_feb_28() {
        let start = date(2024, 2, 29);
        assert_eq!(
            bounds(start, PeriodKind::Yearly, date(2027, 6, 1)),
            (date(2027, 2, 28), date(2028, 2, 28))
        );
        assert_eq!(
            bounds(start, PeriodKind::Yearly, date(2028, 3, 1)),
            (date(2028, 2, 29), date(2029, 2, 27))
        );
        assert_eq!(
            bounds(start, PeriodKind::Yearly, date(2024, 12, 31)),
            (date(2024, 2, 29), date(2025, 2, 27))
        );
    }

    #[test]
    fn next_period_starts_the_day_after() {
        let start = date(2024, 1, 31);
        let first = period_bounds(start, PeriodKind::Monthly, start);
        let second = next_period(start, PeriodKind::Monthly, &first).unwrap();
        assert_eq!(second.start, date(2024, 2, 29));
        assert_eq!(second.end, date(2024, 3, 30));
    }

    #[test]
    fn far_future_saturates_instead_of_panicking() {
        let start = date(2024, 1, 31);
        let window = period_bounds(start, PeriodKind::Yearly, NaiveDate::MAX);
        assert!(window.start <= window.end);
    }
}
