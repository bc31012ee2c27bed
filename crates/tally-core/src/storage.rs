use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use tally_domain::Book;

use crate::CoreError;

/// Describes a persisted backup artifact for a book.
#[derive(Debug, Clone)]
pub struct BookBackupInfo {
    pub book: String,
    pub id: String,
    pub created_at: String,
    pub path: PathBuf,
}

/// Abstraction over persistence backends capable of storing books and backups.
pub trait BookStorage: Send + Sync {
    fn save_book(&self, name: &str, book: &Book) -> Result<(), CoreError>;
    fn load_book(&self, name: &str) -> Result<Book, CoreError>;
    /// Loads the named book, or returns an empty one when nothing is stored yet.
    fn load_or_default(&self, name: &str) -> Result<Book, CoreError>;
    fn list_books(&self) -> Result<Vec<String>, CoreError>;
    fn save_book_to_path(&self, book: &Book, path: &Path) -> Result<(), CoreError>;
    fn load_book_from_path(&self, path: &Path) -> Result<Book, CoreError>;
    fn backup_book(
        &self,
        name: &str,
        book: &Book,
        note: Option<&str>,
    ) -> Result<BookBackupInfo, CoreError>;
    fn list_backups(&self, name: &str) -> Result<Vec<BookBackupInfo>, CoreError>;
    fn restore_backup(&self, backup: &BookBackupInfo) -> Result<Book, CoreError>;
}

/// Detects dangling references and other anomalies within a book snapshot.
pub fn book_warnings(book: &Book) -> Vec<String> {
    let user_ids: HashSet<_> = book.users.iter().map(|user| user.id).collect();
    let category_ids: HashSet<_> = book.categories.iter().map(|c| c.id).collect();
    let mut warnings = Vec::new();

    for category in &book.categories {
        if !user_ids.contains(&category.user_id) {
            warnings.push(format!(
                "category {} belongs to unknown user {}",
                category.name, category.user_id
            ));
        }
    }
    for expense in &book.expenses {
        if let Some(user_id) = expense.user_id {
            if !user_ids.contains(&user_id) {
                warnings.push(format!(
                    "expense {} belongs to unknown user {}",
                    expense.id, user_id
                ));
            }
        }
        if let Some(category) = expense.category_id {
            if !category_ids.contains(&category) {
                warnings.push(format!(
                    "expense {} references missing category {}",
                    expense.id, category
                ));
            }
        }
    }
    for cap in &book.budgets {
        if let Some(category) = cap.category_id {
            if !category_ids.contains(&category) {
                warnings.push(format!(
                    "budget {} references missing category {}",
                    cap.name, category
                ));
            }
        }
    }
    warnings
}
