//! Aggregated spending overview for a single user.

use std::collections::HashMap;

use chrono::{Datelike, Duration, Months, NaiveDate};
use rust_decimal::Decimal;
use tally_domain::{Book, DateWindow, Expense};
use uuid::Uuid;

use crate::{
    budget_service::BudgetService,
    expense_service::ExpenseService,
    query::{ExpenseFilter, ExpenseQuery},
    spending::{current_spending, BudgetAlert, BudgetUsage},
    CoreError, CoreResult,
};

const RECENT_EXPENSES: usize = 5;
const TREND_MONTHS: u32 = 6;

/// Total spent under one category label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTotal {
    pub category_id: Option<Uuid>,
    pub label: String,
    pub total: Decimal,
}

/// Per-category sums, largest first and by label on ties. Uncategorized
/// expenses share one bucket.
pub(crate) fn category_totals(book: &Book, expenses: &[&Expense]) -> Vec<CategoryTotal> {
    let mut totals: HashMap<Option<Uuid>, Decimal> = HashMap::new();
    for expense in expenses {
        *totals.entry(expense.category_id).or_default() += expense.amount;
    }
    let mut rows: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category_id, total)| CategoryTotal {
            category_id,
            label: book.category_label(category_id),
            total,
        })
        .collect();
    rows.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.label.cmp(&b.label)));
    rows
}

/// Total spent in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthTotal {
    pub label: String,
    pub window: DateWindow,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSummary {
    pub today: NaiveDate,
    pub total: Decimal,
    pub month_total: Decimal,
    pub week_total: Decimal,
    pub average_daily: Decimal,
    pub month_label: String,
    pub by_category: Vec<CategoryTotal>,
    pub monthly: Vec<MonthTotal>,
    pub recent: Vec<Expense>,
    pub exceeded: Vec<BudgetUsage>,
    pub warnings: Vec<BudgetUsage>,
}

pub struct DashboardService;

impl DashboardService {
    pub fn summary(
        book: &Book,
        user_id: Uuid,
        today: NaiveDate,
        threshold: u8,
    ) -> CoreResult<DashboardSummary> {
        if book.user(user_id).is_none() {
            return Err(CoreError::UserNotFound(user_id.to_string()));
        }
        let expenses = ExpenseService::list(book, user_id, &ExpenseFilter::default());
        let total = ExpenseService::total(&expenses);

        let month_window = DateWindow::new(month_start(today), today)?;
        let month_total = current_spending(expenses.iter().copied(), &month_window, None);

        let week_start = today
            .checked_sub_signed(Duration::days(7))
            .unwrap_or(NaiveDate::MIN);
        let week_window = DateWindow::new(week_start, today)?;
        let week_total = current_spending(expenses.iter().copied(), &week_window, None);

        let average_daily = (month_total / Decimal::from(today.day())).round_dp(2);

        let by_category = category_totals(book, &expenses);

        let monthly = Self::monthly_totals(book, user_id, today)?;
        let recent = expenses
            .iter()
            .take(RECENT_EXPENSES)
            .map(|expense| (*expense).clone())
            .collect();

        let usages = BudgetService::usages(book, user_id, today, threshold, true);
        let (exceeded, rest): (Vec<_>, Vec<_>) = usages
            .into_iter()
            .partition(|usage| usage.alert == BudgetAlert::Exceeded);
        let warnings = rest
            .into_iter()
            .filter(|usage| usage.alert == BudgetAlert::Warning)
            .collect();

        tracing::debug!(%user_id, %today, %total, %month_total, "built dashboard summary");
        Ok(DashboardSummary {
            today,
            total,
            month_total,
            week_total,
            average_daily,
            month_label: today.format("%B %Y").to_string(),
            by_category,
            monthly,
            recent,
            exceeded,
            warnings,
        })
    }

    /// The current calendar month and the five before it, oldest first.
    fn monthly_totals(book: &Book, user_id: Uuid, today: NaiveDate) -> CoreResult<Vec<MonthTotal>> {
        let current = month_start(today);
        let mut months = Vec::with_capacity(TREND_MONTHS as usize);
        for back in (0..TREND_MONTHS).rev() {
            let Some(start) = current.checked_sub_months(Months::new(back)) else {
                continue;
            };
            let end = start
                .checked_add_months(Months::new(1))
                .and_then(|next| next.pred_opt())
                .unwrap_or(NaiveDate::MAX);
            let window = DateWindow::new(start, end)?;
            let matching = book.matching_expenses(user_id, &window, None);
            months.push(MonthTotal {
                label: start.format("%b %Y").to_string(),
                window,
                total: current_spending(&matching, &window, None),
            });
        }
        Ok(months)
    }
}

fn month_start(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}
