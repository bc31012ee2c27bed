use std::{fs, path::Path};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_core::{BudgetService, FixedClock};
use tempfile::TempDir;

use crate::cli::core::{CliMode, CommandError, LoopControl};
use crate::cli::shell_context::ShellContext;

fn context_at(base: &Path, date: NaiveDate) -> ShellContext {
    ShellContext::with_base_dir(
        CliMode::Script,
        base.to_path_buf(),
        Box::new(FixedClock::on(date)),
    )
    .expect("create shell context")
}

fn march(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
}

fn process_script(context: &mut ShellContext, lines: &[&str]) {
    for line in lines {
        if let Err(err) = context.process_line(line) {
            panic!("`{}` failed: {}", line, err);
        }
    }
}

#[test]
fn first_user_becomes_active_and_gets_default_categories() {
    let dir = TempDir::new().unwrap();
    let mut context = context_at(dir.path(), march(15));
    process_script(&mut context, &["user add ana", "user add bruno"]);

    assert_eq!(context.config.active_user.as_deref(), Some("ana"));
    let ana = context.active_user_id().unwrap();
    assert!(context
        .book
        .categories
        .iter()
        .any(|category| category.user_id == ana && category.name == "Food"));

    process_script(&mut context, &["user use BRUNO"]);
    assert_eq!(context.config.active_user.as_deref(), Some("bruno"));
}

#[test]
fn expenses_and_budgets_flow_through_the_book() {
    let dir = TempDir::new().unwrap();
    let mut context = context_at(dir.path(), march(15));
    process_script(
        &mut context,
        &[
            "user add ana",
            "budget add Food 100 --category Food --start 2024-03-01",
            "expense add 60 Groceries --category Food --date 2024-03-02",
            "expense add 45.50 \"Dinner out\" --category Food",
            "expense add 30 Bus pass --category Transport",
        ],
    );

    let user_id = context.active_user_id().unwrap();
    assert_eq!(context.book.expenses.len(), 3);
    let dinner = context
        .book
        .expenses
        .iter()
        .find(|expense| expense.description == "Dinner out")
        .unwrap();
    assert_eq!(dinner.date, march(15));
    let bus = context
        .book
        .expenses
        .iter()
        .find(|expense| expense.description == "Bus pass")
        .unwrap();
    assert_eq!(bus.amount, Decimal::new(3000, 2));

    let exceeded = BudgetService::exceeded(&context.book, user_id, march(15));
    assert_eq!(exceeded.len(), 1);
    assert_eq!(exceeded[0].spent, Decimal::new(10550, 2));

    let edit = format!("expense edit {} --amount 20 --uncategorized", dinner.short_id());
    process_script(&mut context, &[edit.as_str(), "budget deactivate food"]);
    assert!(BudgetService::exceeded(&context.book, user_id, march(15)).is_empty());
    let cap = BudgetService::resolve(&context.book, user_id, "Food").unwrap();
    assert!(!cap.is_active);
}

#[test]
fn mutations_are_persisted_between_sessions() {
    let dir = TempDir::new().unwrap();
    {
        let mut context = context_at(dir.path(), march(15));
        process_script(
            &mut context,
            &["user add ana", "expense add 12.30 Lunch", "config set currency eur"],
        );
    }

    let context = context_at(dir.path(), march(16));
    assert_eq!(context.config.currency, "EUR");
    assert_eq!(context.config.active_user.as_deref(), Some("ana"));
    assert_eq!(context.book.expenses.len(), 1);
    assert_eq!(context.book.expenses[0].amount, Decimal::new(1230, 2));
}

#[test]
fn commands_require_an_active_user() {
    let dir = TempDir::new().unwrap();
    let mut context = context_at(dir.path(), march(15));
    let err = context.process_line("expense add 5 Coffee").unwrap_err();
    assert!(matches!(err, CommandError::NoActiveUser));
}

#[test]
fn failed_save_leaves_the_book_unchanged() {
    let dir = TempDir::new().unwrap();
    let mut context = context_at(dir.path(), march(15));
    process_script(&mut context, &["user add ana"]);

    let data_dir = dir.path().join("data");
    fs::remove_dir_all(&data_dir).unwrap();
    fs::write(&data_dir, "").unwrap();

    assert!(context.process_line("expense add 12 Lunch").is_err());
    assert!(context.book.expenses.is_empty());
    assert_eq!(context.book.users.len(), 1);
}

#[test]
fn bad_arguments_are_reported_as_invalid() {
    let dir = TempDir::new().unwrap();
    let mut context = context_at(dir.path(), march(15));
    process_script(&mut context, &["user add ana"]);

    for line in [
        "expense add",
        "expense add 5 Coffee --date 2024-02-30",
        "expense add 5 Coffee --colour red",
        "budget add Food",
        "budget add Food 100 --period daily",
        "insights prompt custom",
    ] {
        let err = context.process_line(line).unwrap_err();
        assert!(
            matches!(err, CommandError::InvalidArguments(_)),
            "`{}` gave {:?}",
            line,
            err
        );
    }

    let err = context.process_line("expense add 9.999 Coffee").unwrap_err();
    assert!(matches!(err, CommandError::Core(_)));
}

#[test]
fn unknown_commands_keep_the_shell_running_and_exit_stops_it() {
    let dir = TempDir::new().unwrap();
    let mut context = context_at(dir.path(), march(15));
    assert_eq!(context.process_line("budgte").unwrap(), LoopControl::Continue);
    assert_eq!(context.process_line("help budget").unwrap(), LoopControl::Continue);
    assert_eq!(context.process_line("quit").unwrap(), LoopControl::Exit);
}

#[test]
fn backups_restore_an_earlier_book() {
    let dir = TempDir::new().unwrap();
    let mut context = context_at(dir.path(), march(15));
    process_script(
        &mut context,
        &["user add ana", "expense add 10 Coffee", "backup before cleanup"],
    );
    let backup = context
        .storage
        .list_backup_metadata(crate::cli::shell_context::BOOK_NAME)
        .unwrap()
        .into_iter()
        .find(|meta| meta.name.contains("before-cleanup"))
        .map(|meta| meta.name)
        .expect("named backup");

    let remove = format!("expense remove {}", context.book.expenses[0].short_id());
    process_script(&mut context, &[remove.as_str()]);
    assert!(context.book.expenses.is_empty());

    let restore = format!("restore {}", backup);
    process_script(&mut context, &[restore.as_str()]);
    assert_eq!(context.book.expenses.len(), 1);
}

#[test]
fn csv_export_writes_the_filtered_rows() {
    let dir = TempDir::new().unwrap();
    let mut context = context_at(dir.path(), march(15));
    let target = dir.path().join("out").join("march.csv");
    let export = format!("export csv {} --from 2024-03-01", target.display());
    process_script(
        &mut context,
        &[
            "user add ana",
            "expense add 10 Coffee --date 2024-03-01 --category Food",
            "expense add 20 Taxi --date 2024-02-01 --category Transport",
            export.as_str(),
        ],
    );

    let csv = std::fs::read_to_string(&target).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "Date,Category,Amount,Description");
    assert_eq!(lines[1], "2024-03-01,Food,10.00,Coffee");
    assert_eq!(lines.len(), 2);
}
