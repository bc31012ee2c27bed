use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use tally_core::{current_spending, next_period, period_bounds, periods_between};
use tally_domain::{DateWindow, Expense, PeriodKind};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn days(from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    from.iter_days().take_while(move |day| *day <= to)
}

#[test]
fn weekly_periods_always_contain_reference_and_span_seven_days() {
    let anchor = date(2024, 1, 3);
    for reference in days(anchor, date(2025, 6, 30)) {
        let window = period_bounds(anchor, PeriodKind::Weekly, reference);
        assert!(window.contains(reference), "{} not in {}", reference, window);
        assert_eq!(window.days(), 7);
        assert_eq!((window.start - anchor).num_days() % 7, 0);
    }
}

#[test]
fn weekly_periods_advance_by_exactly_seven_days() {
    let anchor = date(2024, 1, 3);
    for reference in days(anchor, date(2024, 12, 31)) {
        let window = period_bounds(anchor, PeriodKind::Weekly, reference);
        let following = period_bounds(anchor, PeriodKind::Weekly, reference + Duration::days(7));
        assert_eq!(following.start, window.start + Duration::days(7));
        assert_eq!(following.start, window.end + Duration::days(1));
        assert_eq!(next_period(anchor, PeriodKind::Weekly, &window), Some(following));
    }
}

#[test]
fn monthly_periods_tile_a_year_anchored_on_the_31st() {
    let anchor = date(2024, 1, 31);
    let periods = periods_between(anchor, PeriodKind::Monthly, anchor, date(2024, 12, 31));
    assert_eq!(periods.first().map(|p| p.start), Some(anchor));
    for pair in periods.windows(2) {
        assert_eq!(pair[0].end + Duration::days(1), pair[1].start);
    }
    for window in &periods {
        assert!(window.start <= window.end);
    }
    assert_eq!(periods.len(), 12);
}

#[test]
fn monthly_reference_on_or_after_anchor_day_is_contained() {
    let anchor = date(2023, 11, 15);
    for reference in days(anchor, date(2025, 3, 1)) {
        // Covered by monthly_reference_before_anchor_day_selects_that_months_period.
        if reference.day() < anchor.day() {
            continue;
        }
        let window = period_bounds(anchor, PeriodKind::Monthly, reference);
        assert!(window.contains(reference), "{} not in {}", reference, window);
        assert_eq!(window.start.day(), 15);
        assert_eq!(window.end.day(), 14);
    }
}

#[test]
fn monthly_reference_before_anchor_day_selects_that_months_period() {
    let anchor = date(2023, 11, 15);
    let window = period_bounds(anchor, PeriodKind::Monthly, date(2024, 3, 10));
    assert_eq!(window, DateWindow::new(date(2024, 3, 15), date(2024, 4, 14)).unwrap());
    assert!(!window.contains(date(2024, 3, 10)));

    for reference in days(date(2024, 1, 1), date(2024, 12, 31)) {
        if reference.day() >= anchor.day() {
            continue;
        }
        let window = period_bounds(anchor, PeriodKind::Monthly, reference);
        assert_eq!(window.start, reference.with_day(15).unwrap());
        assert!(window.start > reference);
    }
}

#[test]
fn every_evaluation_is_independent_of_history() {
    let anchor = date(2024, 1, 31);
    let reference = date(2026, 5, 31);
    let direct = period_bounds(anchor, PeriodKind::Monthly, reference);
    let walked = periods_between(anchor, PeriodKind::Monthly, anchor, reference)
        .into_iter()
        .last()
        .unwrap();
    assert_eq!(direct, walked);
    assert_eq!(direct.start, date(2026, 5, 31));
}

#[test]
fn leap_day_yearly_anchor_clamps_in_common_years() {
    let anchor = date(2024, 2, 29);
    let first = period_bounds(anchor, PeriodKind::Yearly, date(2024, 6, 1));
    assert_eq!(first, DateWindow::new(date(2024, 2, 29), date(2025, 2, 27)).unwrap());

    let next = next_period(anchor, PeriodKind::Yearly, &first).unwrap();
    assert_eq!(next.start, date(2025, 2, 28));
    assert_eq!(next.end, date(2026, 2, 27));
}

#[test]
fn before_anchor_is_single_day_at_anchor() {
    let anchor = date(2024, 5, 10);
    for kind in PeriodKind::ALL {
        let window = period_bounds(anchor, kind, date(2024, 5, 9));
        assert_eq!(window, DateWindow::single(anchor));
    }
}

#[test]
fn spending_over_disjoint_periods_adds_up_to_whole_range() {
    let anchor = date(2024, 1, 10);
    let expenses: Vec<Expense> = days(anchor, date(2024, 12, 31))
        .enumerate()
        .map(|(idx, day)| {
            let amount = Decimal::from_str(&format!("{}.{:02}", idx % 40, idx % 100)).unwrap();
            Expense::new(None, None, amount, day, "daily", Utc::now())
        })
        .collect();

    for kind in PeriodKind::ALL {
        let periods = periods_between(anchor, kind, anchor, date(2024, 12, 31));
        let overall = DateWindow::new(anchor, periods.last().unwrap().end).unwrap();
        let by_period: Decimal = periods
            .iter()
            .map(|window| current_spending(&expenses, window, None))
            .sum();
        assert_eq!(by_period, current_spending(&expenses, &overall, None), "{}", kind);
    }
}
