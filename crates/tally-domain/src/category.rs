//! Domain types representing expense categories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

/// Maximum length of a category name, in characters.
pub const CATEGORY_NAME_MAX: usize = 50;

/// Categories every newly registered user starts with.
pub const DEFAULT_CATEGORIES: [&str; 8] = [
    "Food",
    "Transport",
    "Shopping",
    "Entertainment",
    "Health",
    "Bills",
    "Education",
    "Other",
];

/// Groups a user's expenses for filtering and budgeting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(user_id: Uuid, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: name.into(),
            is_default: false,
            created_at,
        }
    }

    pub fn default_for(user_id: Uuid, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            is_default: true,
            ..Self::new(user_id, name, created_at)
        }
    }

    /// Case-insensitive comparison used for per-user uniqueness.
    pub fn matches_name(&self, candidate: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(candidate.trim())
    }
}

impl Displayable for Category {
    fn display_label(&self) -> String {
        if self.is_default {
            format!("{} (default)", self.name)
        } else {
            self.name.clone()
        }
    }
}
