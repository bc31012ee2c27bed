//! tally-domain
//!
//! Pure domain models (Book, User, Category, Expense, BudgetCap, DateWindow).
//! No I/O, no CLI, no storage. Only data types and core enums.

pub mod book;
pub mod budget;
pub mod category;
pub mod common;
pub mod expense;
pub mod user;
pub mod window;

pub use book::*;
pub use budget::*;
pub use category::*;
pub use common::*;
pub use expense::*;
pub use user::*;
pub use window::*;
