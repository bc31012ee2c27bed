use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

/// Maximum length of a budget cap name, in characters.
pub const BUDGET_NAME_MAX: usize = 100;

/// A recurring spending limit, optionally narrowed to one category.
///
/// Spending against the cap is never stored here; it is derived from the
/// expense records each time the cap is evaluated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BudgetCap {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub amount: Decimal,
    #[serde(default)]
    pub period: PeriodKind,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    pub start_date: NaiveDate,
    #[serde(default = "BudgetCap::default_active")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BudgetCap {
    pub fn new(
        user_id: Uuid,
        name: impl Into<String>,
        amount: Decimal,
        period: PeriodKind,
        start_date: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: name.into(),
            amount,
            period,
            category_id: None,
            start_date,
            is_active: true,
            created_at,
            updated_at: created_at,
        }
    }

    fn default_active() -> bool {
        true
    }
}

impl Amounted for BudgetCap {
    fn amount(&self) -> Decimal {
        self.amount
    }
}

impl Displayable for BudgetCap {
    fn display_label(&self) -> String {
        format!("{} - {}/{}", self.name, self.amount, self.period)
    }
}
