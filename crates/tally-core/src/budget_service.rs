//! Budget cap management and live evaluation against recorded expenses.

use std::cmp::Reverse;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_domain::{Book, BudgetCap, DateWindow, PeriodKind, BUDGET_NAME_MAX};
use uuid::Uuid;

use crate::{
    category_service::CategoryService,
    money::validate_cap_amount,
    period::{next_period, period_bounds},
    query::ExpenseQuery,
    spending::{current_spending, BudgetAlert, BudgetUsage, DEFAULT_WARNING_THRESHOLD},
    time::Clock,
    CoreError, CoreResult,
};

/// Input for a new budget cap. A missing `start_date` means "today".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBudget {
    pub name: String,
    pub amount: Decimal,
    pub period: PeriodKind,
    pub category_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
}

/// Field-level patch applied by [`BudgetService::edit`]; `category: Some(None)`
/// widens the cap to all categories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BudgetChanges {
    pub name: Option<String>,
    pub amount: Option<Decimal>,
    pub period: Option<PeriodKind>,
    pub category: Option<Option<Uuid>>,
    pub start_date: Option<NaiveDate>,
}

/// Stateless budgeting utilities that operate over [`Book`] snapshots.
pub struct BudgetService;

impl BudgetService {
    pub fn add(book: &mut Book, user_id: Uuid, input: NewBudget, clock: &dyn Clock) -> CoreResult<Uuid> {
        if book.user(user_id).is_none() {
            return Err(CoreError::UserNotFound(user_id.to_string()));
        }
        let name = Self::validate_name(book, user_id, None, &input.name)?;
        let amount = validate_cap_amount(input.amount)?;
        if let Some(category_id) = input.category_id {
            CategoryService::ensure_owned(book, user_id, category_id)?;
        }
        let start_date = input.start_date.unwrap_or_else(|| clock.today());
        let mut cap = BudgetCap::new(user_id, name, amount, input.period, start_date, clock.now());
        cap.category_id = input.category_id;
        let id = book.add_budget(cap);
        tracing::info!(budget_id = %id, %user_id, %amount, period = %input.period, "added budget cap");
        Ok(id)
    }

    pub fn edit(
        book: &mut Book,
        user_id: Uuid,
        id: Uuid,
        changes: BudgetChanges,
        clock: &dyn Clock,
    ) -> CoreResult<()> {
        let name = changes
            .name
            .as_deref()
            .map(|name| Self::validate_name(book, user_id, Some(id), name))
            .transpose()?;
        let amount = changes.amount.map(validate_cap_amount).transpose()?;
        if let Some(Some(category_id)) = changes.category {
            CategoryService::ensure_owned(book, user_id, category_id)?;
        }

        let cap = Self::owned_mut(book, user_id, id)?;
        if let Some(name) = name {
            cap.name = name;
        }
        if let Some(amount) = amount {
            cap.amount = amount;
        }
        if let Some(period) = changes.period {
            cap.period = period;
        }
        if let Some(category) = changes.category {
            cap.category_id = category;
        }
        if let Some(start_date) = changes.start_date {
            cap.start_date = start_date;
        }
        cap.updated_at = clock.now();
        book.touch();
        tracing::info!(budget_id = %id, "updated budget cap");
        Ok(())
    }

    pub fn remove(book: &mut Book, user_id: Uuid, id: Uuid) -> CoreResult<BudgetCap> {
        let position = book
            .budgets
            .iter()
            .position(|cap| cap.id == id && cap.user_id == user_id)
            .ok_or_else(|| CoreError::BudgetNotFound(id.to_string()))?;
        let removed = book.budgets.remove(position);
        book.touch();
        tracing::info!(budget_id = %id, "removed budget cap");
        Ok(removed)
    }

    pub fn set_active(
        book: &mut Book,
        user_id: Uuid,
        id: Uuid,
        active: bool,
        clock: &dyn Clock,
    ) -> CoreResult<()> {
        let cap = Self::owned_mut(book, user_id, id)?;
        cap.is_active = active;
        cap.updated_at = clock.now();
        book.touch();
        Ok(())
    }

    /// The user's caps, most recently created first.
    pub fn list(book: &Book, user_id: Uuid) -> Vec<&BudgetCap> {
        let mut caps: Vec<&BudgetCap> = book
            .budgets
            .iter()
            .filter(|cap| cap.user_id == user_id)
            .collect();
        caps.sort_by_key(|cap| Reverse(cap.created_at));
        caps
    }

    pub fn resolve<'a>(book: &'a Book, user_id: Uuid, name: &str) -> CoreResult<&'a BudgetCap> {
        let wanted = name.trim();
        book.budgets
            .iter()
            .find(|cap| cap.user_id == user_id && cap.name.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CoreError::BudgetNotFound(wanted.to_string()))
    }

    /// The period of `cap` that applies on `today`.
    pub fn current_window(cap: &BudgetCap, today: NaiveDate) -> DateWindow {
        period_bounds(cap.start_date, cap.period, today)
    }

    /// Evaluates `cap` live against the expenses supplied by `source`.
    pub fn usage<Q: ExpenseQuery + ?Sized>(
        source: &Q,
        cap: &BudgetCap,
        today: NaiveDate,
        threshold: u8,
    ) -> BudgetUsage {
        let window = Self::current_window(cap, today);
        Self::usage_in_window(source, cap, window, threshold)
    }

    /// Evaluates `cap` for an explicit window, e.g. a past period.
    pub fn usage_in_window<Q: ExpenseQuery + ?Sized>(
        source: &Q,
        cap: &BudgetCap,
        window: DateWindow,
        threshold: u8,
    ) -> BudgetUsage {
        let expenses = source.matching_expenses(cap.user_id, &window, cap.category_id);
        let spent = current_spending(&expenses, &window, cap.category_id);
        tracing::debug!(budget_id = %cap.id, %window, %spent, "evaluated budget cap");
        BudgetUsage::evaluate(cap, window, spent, threshold)
    }

    /// Usage of every cap of the user, in listing order.
    pub fn usages(
        book: &Book,
        user_id: Uuid,
        today: NaiveDate,
        threshold: u8,
        active_only: bool,
    ) -> Vec<BudgetUsage> {
        Self::list(book, user_id)
            .into_iter()
            .filter(|cap| cap.is_active || !active_only)
            .map(|cap| Self::usage(book, cap, today, threshold))
            .collect()
    }

    /// Active caps whose current spending is over the limit.
    pub fn exceeded(book: &Book, user_id: Uuid, today: NaiveDate) -> Vec<BudgetUsage> {
        Self::usages(book, user_id, today, DEFAULT_WARNING_THRESHOLD, true)
            .into_iter()
            .filter(|usage| usage.alert == BudgetAlert::Exceeded)
            .collect()
    }

    /// Usage for each period of `cap` from its anchor through the period that
    /// [`period_bounds`] assigns to `today`, which is the one `usage` reports.
    pub fn history(book: &Book, cap: &BudgetCap, today: NaiveDate, threshold: u8) -> Vec<BudgetUsage> {
        if today < cap.start_date {
            return Vec::new();
        }
        let current = period_bounds(cap.start_date, cap.period, today);
        let mut windows = vec![period_bounds(cap.start_date, cap.period, cap.start_date)];
        while let Some(last) = windows.last().copied() {
            if last.start >= current.start {
                break;
            }
            match next_period(cap.start_date, cap.period, &last) {
                Some(next) => windows.push(next),
                None => break,
            }
        }
        windows
            .into_iter()
            .map(|window| Self::usage_in_window(book, cap, window, threshold))
            .collect()
    }

    fn owned_mut(book: &mut Book, user_id: Uuid, id: Uuid) -> CoreResult<&mut BudgetCap> {
        book.budget_mut(id)
            .filter(|cap| cap.user_id == user_id)
            .ok_or_else(|| CoreError::BudgetNotFound(id.to_string()))
    }

    fn validate_name(
        book: &Book,
        user_id: Uuid,
        exclude: Option<Uuid>,
        candidate: &str,
    ) -> CoreResult<String> {
        let trimmed = candidate.trim();
        if trimmed.is_empty() {
            return Err(CoreError::Validation("budget name is required".into()));
        }
        if trimmed.chars().count() > BUDGET_NAME_MAX {
            return Err(CoreError::Validation(format!(
                "budget name must be at most {} characters",
                BUDGET_NAME_MAX
            )));
        }
        let duplicate = book.budgets.iter().any(|cap| {
            cap.user_id == user_id
                && cap.name.eq_ignore_ascii_case(trimmed)
                && exclude != Some(cap.id)
        });
        if duplicate {
            return Err(CoreError::Duplicate(format!("Budget `{}`", trimmed)));
        }
        Ok(trimmed.to_string())
    }
}
