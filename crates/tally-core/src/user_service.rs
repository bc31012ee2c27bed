//! Registration and lookup of book users.

use tally_domain::{Book, User};
use uuid::Uuid;

use crate::{category_service::CategoryService, time::Clock, CoreError, CoreResult};

const USERNAME_MAX: usize = 150;

pub struct UserService;

impl UserService {
    /// Registers a new user and seeds the default categories for them.
    pub fn register(book: &mut Book, username: &str, clock: &dyn Clock) -> CoreResult<Uuid> {
        let username = username.trim();
        if username.is_empty() {
            return Err(CoreError::Validation("username is required".into()));
        }
        if username.chars().count() > USERNAME_MAX {
            return Err(CoreError::Validation(format!(
                "username must be at most {} characters",
                USERNAME_MAX
            )));
        }
        if book.user_by_name(username).is_some() {
            return Err(CoreError::Duplicate(format!("User `{}`", username)));
        }
        let user_id = book.add_user(User::new(username, clock.now()));
        let seeded = CategoryService::seed_defaults(book, user_id, clock)?;
        tracing::info!(%user_id, username, seeded, "registered user");
        Ok(user_id)
    }

    pub fn find_by_name<'a>(book: &'a Book, username: &str) -> CoreResult<&'a User> {
        book.user_by_name(username)
            .ok_or_else(|| CoreError::UserNotFound(username.trim().to_string()))
    }

    pub fn list(book: &Book) -> Vec<&User> {
        let mut users: Vec<&User> = book.users.iter().collect();
        users.sort_by(|a, b| a.username.to_lowercase().cmp(&b.username.to_lowercase()));
        users
    }
}
