use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("User not found: {0}")]
    UserNotFound(String),
    #[error("Category not found: {0}")]
    CategoryNotFound(String),
    #[error("Expense not found: {0}")]
    ExpenseNotFound(String),
    #[error("Budget not found: {0}")]
    BudgetNotFound(String),
    #[error("{0} already exists")]
    Duplicate(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("Export failed: {0}")]
    Export(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub fn expense_not_found(id: Uuid) -> Self {
        CoreError::ExpenseNotFound(id.to_string())
    }
}

impl From<csv::Error> for CoreError {
    fn from(err: csv::Error) -> Self {
        CoreError::Export(err.to_string())
    }
}

impl From<tally_domain::DateWindowError> for CoreError {
    fn from(err: tally_domain::DateWindowError) -> Self {
        CoreError::Validation(err.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
