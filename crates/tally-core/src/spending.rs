//! Spending aggregation and the values derived from it for a budget cap.

use std::fmt;

use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::{Deserialize, Serialize};
use tally_domain::{BudgetCap, DateWindow, Expense};
use uuid::Uuid;

/// Usage percentage from which a cap is flagged as a warning.
pub const DEFAULT_WARNING_THRESHOLD: u8 = 80;

/// Sums the amounts dated inside `window` (inclusive), restricted to
/// `category` when one is given. Returns zero when nothing matches.
pub fn current_spending<'a, I>(expenses: I, window: &DateWindow, category: Option<Uuid>) -> Decimal
where
    I: IntoIterator<Item = &'a Expense>,
{
    expenses
        .into_iter()
        .filter(|expense| window.contains(expense.date))
        .filter(|expense| category.map_or(true, |id| expense.category_id == Some(id)))
        .map(|expense| expense.amount)
        .sum()
}

/// Presentation state of a cap: red, yellow or normal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BudgetAlert {
    Normal,
    Warning,
    Exceeded,
}

impl fmt::Display for BudgetAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BudgetAlert::Normal => "OK",
            BudgetAlert::Warning => "Warning",
            BudgetAlert::Exceeded => "Exceeded",
        };
        f.write_str(label)
    }
}

/// Live evaluation of one budget cap for its current period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BudgetUsage {
    pub budget_id: Uuid,
    pub name: String,
    pub window: DateWindow,
    pub amount: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub is_exceeded: bool,
    pub percentage_used: u8,
    pub over_amount: Decimal,
    pub alert: BudgetAlert,
}

impl BudgetUsage {
    pub fn evaluate(cap: &BudgetCap, window: DateWindow, spent: Decimal, threshold: u8) -> Self {
        let remaining = cap.amount - spent;
        let is_exceeded = spent > cap.amount;
        let percentage_used = percentage_used(cap.amount, spent);
        let over_amount = (-remaining).max(Decimal::ZERO);
        let alert = if is_exceeded {
            BudgetAlert::Exceeded
        } else if percentage_used >= threshold {
            BudgetAlert::Warning
        } else {
            BudgetAlert::Normal
        };
        Self {
            budget_id: cap.id,
            name: cap.name.clone(),
            window,
            amount: cap.amount,
            spent,
            remaining,
            is_exceeded,
            percentage_used,
            over_amount,
            alert,
        }
    }
}

/// `floor(spent / amount * 100)` clamped to `0..=100`; zero for caps that are not positive.
pub fn percentage_used(amount: Decimal, spent: Decimal) -> u8 {
    if amount <= Decimal::ZERO {
        return 0;
    }
    spent
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.checked_div(amount))
        .map(|ratio| ratio.floor().clamp(Decimal::ZERO, Decimal::ONE_HUNDRED))
        .and_then(|ratio| ratio.to_u8())
        .unwrap_or(100)
}
