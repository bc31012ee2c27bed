//! Business logic helpers for category management.

use tally_domain::{Book, Category, CATEGORY_NAME_MAX, DEFAULT_CATEGORIES};
use uuid::Uuid;

use crate::{time::Clock, CoreError, CoreResult};

/// What a category removal detached from dependents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryRemoval {
    pub detached_expenses: usize,
    pub detached_budgets: usize,
}

/// Provides validated operations for [`Category`] entities.
pub struct CategoryService;

impl CategoryService {
    /// Adds a category for `user_id`, enforcing per-user name uniqueness.
    pub fn add(book: &mut Book, user_id: Uuid, name: &str, clock: &dyn Clock) -> CoreResult<Uuid> {
        Self::ensure_user(book, user_id)?;
        let name = Self::validate_name(book, user_id, None, name)?;
        let id = book.add_category(Category::new(user_id, name, clock.now()));
        tracing::info!(category_id = %id, %user_id, "added category");
        Ok(id)
    }

    pub fn rename(book: &mut Book, user_id: Uuid, id: Uuid, new_name: &str) -> CoreResult<()> {
        let name = Self::validate_name(book, user_id, Some(id), new_name)?;
        let category = book
            .category_mut(id)
            .filter(|category| category.user_id == user_id)
            .ok_or_else(|| CoreError::CategoryNotFound(id.to_string()))?;
        category.name = name;
        book.touch();
        Ok(())
    }

    /// Removes a category; expenses and budget caps that referenced it lose
    /// their category instead of being deleted.
    pub fn remove(book: &mut Book, user_id: Uuid, id: Uuid) -> CoreResult<CategoryRemoval> {
        let before = book.categories.len();
        book.categories
            .retain(|category| !(category.id == id && category.user_id == user_id));
        if book.categories.len() == before {
            return Err(CoreError::CategoryNotFound(id.to_string()));
        }

        let mut removal = CategoryRemoval::default();
        for expense in book
            .expenses
            .iter_mut()
            .filter(|expense| expense.category_id == Some(id))
        {
            expense.category_id = None;
            removal.detached_expenses += 1;
        }
        for budget in book
            .budgets
            .iter_mut()
            .filter(|budget| budget.category_id == Some(id))
        {
            budget.category_id = None;
            removal.detached_budgets += 1;
        }
        book.touch();
        tracing::info!(
            category_id = %id,
            expenses = removal.detached_expenses,
            budgets = removal.detached_budgets,
            "removed category"
        );
        Ok(removal)
    }

    /// The user's categories ordered by name.
    pub fn list(book: &Book, user_id: Uuid) -> Vec<&Category> {
        let mut categories: Vec<&Category> = book
            .categories
            .iter()
            .filter(|category| category.user_id == user_id)
            .collect();
        categories.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        categories
    }

    pub fn find_by_name<'a>(book: &'a Book, user_id: Uuid, name: &str) -> CoreResult<&'a Category> {
        book.categories
            .iter()
            .find(|category| category.user_id == user_id && category.matches_name(name))
            .ok_or_else(|| CoreError::CategoryNotFound(name.trim().to_string()))
    }

    /// Creates any missing default categories and returns how many were added.
    pub fn seed_defaults(book: &mut Book, user_id: Uuid, clock: &dyn Clock) -> CoreResult<usize> {
        Self::ensure_user(book, user_id)?;
        let now = clock.now();
        let mut added = 0;
        for name in DEFAULT_CATEGORIES {
            let exists = book
                .categories
                .iter()
                .any(|category| category.user_id == user_id && category.matches_name(name));
            if !exists {
                book.add_category(Category::default_for(user_id, name, now));
                added += 1;
            }
        }
        Ok(added)
    }

    /// Fails unless `category_id` names one of the user's categories.
    pub fn ensure_owned(book: &Book, user_id: Uuid, category_id: Uuid) -> CoreResult<()> {
        match book.category(category_id) {
            Some(category) if category.user_id == user_id => Ok(()),
            _ => Err(CoreError::CategoryNotFound(category_id.to_string())),
        }
    }

    fn ensure_user(book: &Book, user_id: Uuid) -> CoreResult<()> {
        book.user(user_id)
            .map(|_| ())
            .ok_or_else(|| CoreError::UserNotFound(user_id.to_string()))
    }

    fn validate_name(
        book: &Book,
        user_id: Uuid,
        exclude: Option<Uuid>,
        candidate: &str,
    ) -> CoreResult<String> {
        let trimmed = candidate.trim();
        if trimmed.is_empty() {
            return Err(CoreError::Validation("category name is required".into()));
        }
        if trimmed.chars().count() > CATEGORY_NAME_MAX {
            return Err(CoreError::Validation(format!(
                "category name must be at most {} characters",
                CATEGORY_NAME_MAX
            )));
        }
        let duplicate = book.categories.iter().any(|category| {
            category.user_id == user_id
                && category.matches_name(trimmed)
                && exclude != Some(category.id)
        });
        if duplicate {
            return Err(CoreError::Duplicate(format!("Category `{}`", trimmed)));
        }
        Ok(trimmed.to_string())
    }
}
