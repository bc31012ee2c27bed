use std::str::FromStr;

use chrono::{Duration, NaiveDate, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rust_decimal::Decimal;
use tally_core::{current_spending, period_bounds, BudgetService, DEFAULT_WARNING_THRESHOLD};
use tally_domain::{Book, BudgetCap, Expense, PeriodKind, User};

fn build_sample_book(expense_count: usize) -> (Book, BudgetCap) {
    let mut book = Book::new("Benchmark");
    let user = book.add_user(User::new("bench", Utc::now()));
    let start = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();

    for idx in 0..expense_count {
        let day = start + Duration::days((idx % 730) as i64);
        let amount = Decimal::from_str(&format!("{}.{:02}", 5 + idx % 90, idx % 100)).unwrap();
        book.add_expense(Expense::new(Some(user), None, amount, day, "bench", Utc::now()));
    }

    let cap = BudgetCap::new(
        user,
        "Monthly",
        Decimal::from(1500),
        PeriodKind::Monthly,
        start,
        Utc::now(),
    );
    (book, cap)
}

fn bench_period_bounds(c: &mut Criterion) {
    let anchor = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
    let reference = NaiveDate::from_ymd_opt(2031, 7, 15).unwrap();

    for kind in PeriodKind::ALL {
        c.bench_function(&format!("period_bounds_{}", kind), |b| {
            b.iter(|| period_bounds(black_box(anchor), kind, black_box(reference)))
        });
    }
}

fn bench_spending(c: &mut Criterion) {
    let (book, cap) = build_sample_book(10_000);
    let reference = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
    let window = period_bounds(cap.start_date, cap.period, reference);

    c.bench_function("current_spending_10k", |b| {
        b.iter(|| current_spending(black_box(&book.expenses), &window, None))
    });

    c.bench_function("budget_usage_10k", |b| {
        b.iter(|| BudgetService::usage(&book, &cap, reference, DEFAULT_WARNING_THRESHOLD))
    });
}

criterion_group!(benches, bench_period_bounds, bench_spending);
criterion_main!(benches);
