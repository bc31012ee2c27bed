//! Recording, editing and listing expenses.

use std::cmp::Reverse;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_domain::{Amounted, Book, Expense};
use uuid::Uuid;

use crate::{
    category_service::CategoryService,
    money::validate_expense_amount,
    query::ExpenseFilter,
    time::Clock,
    CoreError, CoreResult,
};

/// Input for a new expense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExpense {
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category_id: Option<Uuid>,
    pub description: String,
}

/// Field-level patch applied by [`ExpenseService::edit`]. `None` leaves a field untouched;
/// `category: Some(None)` clears the category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseChanges {
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub category: Option<Option<Uuid>>,
    pub description: Option<String>,
}

impl ExpenseChanges {
    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.date.is_none()
            && self.category.is_none()
            && self.description.is_none()
    }
}

pub struct ExpenseService;

impl ExpenseService {
    pub fn add(
        book: &mut Book,
        user_id: Uuid,
        input: NewExpense,
        clock: &dyn Clock,
    ) -> CoreResult<Uuid> {
        if book.user(user_id).is_none() {
            return Err(CoreError::UserNotFound(user_id.to_string()));
        }
        let amount = validate_expense_amount(input.amount)?;
        let description = validate_description(&input.description)?;
        if let Some(category_id) = input.category_id {
            CategoryService::ensure_owned(book, user_id, category_id)?;
        }
        let expense = Expense::new(
            Some(user_id),
            input.category_id,
            amount,
            input.date,
            description,
            clock.now(),
        );
        let id = book.add_expense(expense);
        tracing::info!(expense_id = %id, %user_id, %amount, date = %input.date, "recorded expense");
        Ok(id)
    }

    pub fn edit(
        book: &mut Book,
        user_id: Uuid,
        id: Uuid,
        changes: ExpenseChanges,
        clock: &dyn Clock,
    ) -> CoreResult<()> {
        let amount = changes.amount.map(validate_expense_amount).transpose()?;
        let description = changes
            .description
            .as_deref()
            .map(validate_description)
            .transpose()?;
        if let Some(Some(category_id)) = changes.category {
            CategoryService::ensure_owned(book, user_id, category_id)?;
        }

        let expense = book
            .expense_mut(id)
            .filter(|expense| expense.is_owned_by(user_id))
            .ok_or_else(|| CoreError::expense_not_found(id))?;
        if let Some(amount) = amount {
            expense.amount = amount;
        }
        if let Some(date) = changes.date {
            expense.date = date;
        }
        if let Some(category) = changes.category {
            expense.category_id = category;
        }
        if let Some(description) = description {
            expense.description = description;
        }
        expense.updated_at = clock.now();
        book.touch();
        tracing::info!(expense_id = %id, "updated expense");
        Ok(())
    }

    pub fn remove(book: &mut Book, user_id: Uuid, id: Uuid) -> CoreResult<Expense> {
        let position = book
            .expenses
            .iter()
            .position(|expense| expense.id == id && expense.is_owned_by(user_id))
            .ok_or_else(|| CoreError::expense_not_found(id))?;
        let removed = book.expenses.remove(position);
        book.touch();
        tracing::info!(expense_id = %id, "removed expense");
        Ok(removed)
    }

    /// The user's expenses matching `filter`, newest first.
    pub fn list<'a>(book: &'a Book, user_id: Uuid, filter: &ExpenseFilter) -> Vec<&'a Expense> {
        let mut expenses: Vec<&Expense> = book
            .expenses
            .iter()
            .filter(|expense| expense.is_owned_by(user_id) && filter.matches(expense))
            .collect();
        expenses.sort_by_key(|expense| (Reverse(expense.date), Reverse(expense.created_at)));
        expenses
    }

    pub fn total<T: Amounted>(items: &[&T]) -> Decimal {
        items.iter().map(|item| item.amount()).sum()
    }

    /// Finds one of the user's expenses by full id or by an unambiguous id prefix.
    pub fn resolve<'a>(book: &'a Book, user_id: Uuid, reference: &str) -> CoreResult<&'a Expense> {
        let needle = reference.trim().to_ascii_lowercase().replace('-', "");
        if needle.is_empty() {
            return Err(CoreError::Validation("expense id is required".into()));
        }
        let mut matches = book.expenses.iter().filter(|expense| {
            expense.is_owned_by(user_id) && expense.id.simple().to_string().starts_with(&needle)
        });
        match (matches.next(), matches.next()) {
            (Some(expense), None) => Ok(expense),
            (Some(_), Some(_)) => Err(CoreError::Validation(format!(
                "expense id `{}` is ambiguous",
                reference.trim()
            ))),
            (None, _) => Err(CoreError::ExpenseNotFound(reference.trim().to_string())),
        }
    }
}

fn validate_description(description: &str) -> CoreResult<String> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("description is required".into()));
    }
    Ok(trimmed.to_string())
}
