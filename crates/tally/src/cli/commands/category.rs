use rust_decimal::Decimal;
use tally_core::CategoryService;
use tally_domain::Displayable;

use crate::cli::core::CommandResult;
use crate::cli::io;
use crate::cli::output::{self, RowTone};
use crate::cli::registry::CommandEntry;
use crate::cli::shell_context::ShellContext;

use super::{split_subcommand, usage_error};

const USAGE: &[&str] = &[
    "category list",
    "category add <name>",
    "category rename <old> <new>",
    "category remove <name>",
];

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "category",
        "Manage the active user's expense categories",
        USAGE,
        cmd_category,
    )]
}

fn cmd_category(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (sub, rest) = split_subcommand(args, USAGE)?;
    match sub.as_str() {
        "list" | "ls" => list(context),
        "add" => add(context, rest),
        "rename" => rename(context, rest),
        "remove" | "rm" => remove(context, rest),
        _ => Err(usage_error(USAGE)),
    }
}

fn list(context: &mut ShellContext) -> CommandResult {
    let user_id = context.active_user_id()?;
    let categories = CategoryService::list(&context.book, user_id);
    if categories.is_empty() {
        io::print_info("No categories. Use `category add <name>` to create one.");
        return Ok(());
    }
    let formatters = context.formatters();
    let rows: Vec<_> = categories
        .iter()
        .map(|category| {
            let (count, total) = context
                .book
                .expenses
                .iter()
                .filter(|expense| {
                    expense.is_owned_by(user_id) && expense.category_id == Some(category.id)
                })
                .fold((0usize, Decimal::ZERO), |(count, total), expense| {
                    (count + 1, total + expense.amount)
                });
            (
                vec![
                    category.display_label(),
                    count.to_string(),
                    formatters.money(total),
                ],
                RowTone::Plain,
            )
        })
        .collect();
    output::table(&["Category", "Expenses", "Spent"], &rows);
    Ok(())
}

fn add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.is_empty() {
        return Err(usage_error(&USAGE[1..2]));
    }
    let user_id = context.active_user_id()?;
    let name = args.join(" ");
    context.with_book_mut(|book, clock| CategoryService::add(book, user_id, &name, clock))?;
    io::print_success(format!("Category `{}` added.", name.trim()));
    Ok(())
}

fn rename(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [old, new] = args else {
        return Err(usage_error(&USAGE[2..3]));
    };
    let user_id = context.active_user_id()?;
    let id = CategoryService::find_by_name(&context.book, user_id, old)?.id;
    context.with_book_mut(|book, _| CategoryService::rename(book, user_id, id, new))?;
    io::print_success(format!("Category `{}` renamed to `{}`.", old, new.trim()));
    Ok(())
}

fn remove(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.is_empty() {
        return Err(usage_error(&USAGE[3..]));
    }
    let user_id = context.active_user_id()?;
    let name = args.join(" ");
    let category = CategoryService::find_by_name(&context.book, user_id, &name)?;
    let (id, label) = (category.id, category.name.clone());
    let removal = context.with_book_mut(|book, _| CategoryService::remove(book, user_id, id))?;
    io::print_success(format!("Category `{}` removed.", label));
    if removal.detached_expenses > 0 || removal.detached_budgets > 0 {
        io::print_info(format!(
            "{} expense(s) and {} budget cap(s) are now uncategorized.",
            removal.detached_expenses, removal.detached_budgets
        ));
    }
    Ok(())
}
