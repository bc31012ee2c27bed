//! Explicit expense lookup used by the spending aggregator and listings.

use chrono::NaiveDate;
use tally_domain::{Book, DateWindow, Expense};
use uuid::Uuid;

/// Supplies a user's expense records for a date window, optionally narrowed to
/// one category. Implemented by whatever holds the records.
pub trait ExpenseQuery {
    fn matching_expenses(
        &self,
        user_id: Uuid,
        window: &DateWindow,
        category: Option<Uuid>,
    ) -> Vec<Expense>;
}

impl ExpenseQuery for Book {
    fn matching_expenses(
        &self,
        user_id: Uuid,
        window: &DateWindow,
        category: Option<Uuid>,
    ) -> Vec<Expense> {
        self.expenses
            .iter()
            .filter(|expense| expense.is_owned_by(user_id))
            .filter(|expense| window.contains(expense.date))
            .filter(|expense| category.map_or(true, |id| expense.category_id == Some(id)))
            .cloned()
            .collect()
    }
}

/// Optional narrowing applied to expense listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpenseFilter {
    pub category: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ExpenseFilter {
    pub fn matches(&self, expense: &Expense) -> bool {
        if let Some(category) = self.category {
            if expense.category_id != Some(category) {
                return false;
            }
        }
        if let Some(from) = self.from {
            if expense.date < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if expense.date > to {
                return false;
            }
        }
        true
    }
}
