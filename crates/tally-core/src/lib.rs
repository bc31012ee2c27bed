//! tally-core
//!
//! Budget period calculation, spending aggregation and the services built on them.
//! Depends on tally-domain. No CLI, no terminal I/O, no direct storage interactions.

pub mod budget_service;
pub mod category_service;
pub mod dashboard_service;
pub mod error;
pub mod expense_service;
pub mod export;
pub mod format;
pub mod insights;
pub mod money;
pub mod period;
pub mod query;
pub mod spending;
pub mod storage;
pub mod time;
pub mod user_service;

pub use budget_service::*;
pub use category_service::*;
pub use dashboard_service::*;
pub use error::{CoreError, CoreResult};
pub use expense_service::*;
pub use export::export_csv;
pub use format::{CurrencyFormatter, DateFormatter, GroupedCurrencyFormatter, IsoDateFormatter};
pub use insights::{
    GenerationError, InsightContext, InsightKind, InsightOutcome, InsightPrompt, InsightService,
    TextGenerator,
};
pub use period::{next_period, period_bounds, periods_between};
pub use query::{ExpenseFilter, ExpenseQuery};
pub use spending::{current_spending, BudgetAlert, BudgetUsage, DEFAULT_WARNING_THRESHOLD};
pub use storage::{book_warnings, BookBackupInfo, BookStorage};
pub use time::{Clock, FixedClock};
pub use user_service::*;
