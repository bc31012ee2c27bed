use std::str::FromStr;

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use tally_domain::{BudgetCap, Category, Expense, PeriodKind};
use uuid::Uuid;

fn money(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

#[test]
fn budget_cap_defaults_to_active_without_category() {
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
    let cap = BudgetCap::new(
        Uuid::new_v4(),
        "Groceries",
        money("400.00"),
        PeriodKind::Monthly,
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        created,
    );

    assert!(cap.is_active);
    assert!(cap.category_id.is_none());
    assert_eq!(cap.created_at, cap.updated_at);
}

#[test]
fn money_is_serialized_as_decimal_text() {
    let created = Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap();
    let expense = Expense::new(
        Some(Uuid::new_v4()),
        None,
        money("0.10"),
        NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
        "Gum",
        created,
    );

    let json = serde_json::to_string(&expense).expect("serialize");
    assert!(json.contains("\"amount\":\"0.10\""), "unexpected json: {json}");

    let restored: Expense = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(restored.amount, money("0.10"));
}

#[test]
fn legacy_budget_without_flags_loads_with_defaults() {
    let user = Uuid::new_v4();
    let json = format!(
        r#"{{
            "id": "{id}",
            "user_id": "{user}",
            "name": "Fun",
            "amount": "50.00",
            "start_date": "2023-02-01",
            "created_at": "2023-02-01T00:00:00Z",
            "updated_at": "2023-02-01T00:00:00Z"
        }}"#,
        id = Uuid::new_v4(),
        user = user
    );

    let cap: BudgetCap = serde_json::from_str(&json).expect("deserialize");
    assert!(cap.is_active);
    assert_eq!(cap.period, PeriodKind::Monthly);
    assert_eq!(cap.user_id, user);
}

#[test]
fn category_names_match_case_insensitively() {
    let category = Category::new(Uuid::new_v4(), "Food", Utc::now());
    assert!(category.matches_name(" food "));
    assert!(!category.matches_name("Foods"));
}
