use tally_core::{
    BudgetService, CategoryService, ExpenseChanges, ExpenseFilter, ExpenseService, NewExpense,
};
use tally_domain::{Book, Displayable};
use uuid::Uuid;

use crate::cli::args::{parse_date, parse_money, Flag, ParsedArgs};
use crate::cli::core::{CommandError, CommandResult};
use crate::cli::io;
use crate::cli::output::{self, RowTone};
use crate::cli::registry::CommandEntry;
use crate::cli::shell_context::ShellContext;

use super::{split_subcommand, usage_error};

const USAGE: &[&str] = &[
    "expense add <amount> <description> [--date YYYY-MM-DD] [--category NAME]",
    "expense edit <id> [--amount A] [--date D] [--category NAME | --uncategorized] [--description TEXT]",
    "expense remove <id>",
    "expense list [--category NAME] [--from D] [--to D]",
];

const ADD_FLAGS: &[Flag] = &[Flag::Value("date"), Flag::Value("category")];
const EDIT_FLAGS: &[Flag] = &[
    Flag::Value("amount"),
    Flag::Value("date"),
    Flag::Value("category"),
    Flag::Switch("uncategorized"),
    Flag::Value("description"),
];
pub(crate) const FILTER_FLAGS: &[Flag] = &[
    Flag::Value("category"),
    Flag::Value("from"),
    Flag::Value("to"),
];

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "expense",
        "Record, edit, remove and list expenses",
        USAGE,
        cmd_expense,
    )]
}

fn cmd_expense(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (sub, rest) = split_subcommand(args, USAGE)?;
    match sub.as_str() {
        "add" => add(context, rest),
        "edit" => edit(context, rest),
        "remove" | "rm" => remove(context, rest),
        "list" | "ls" => list(context, rest),
        _ => Err(usage_error(USAGE)),
    }
}

fn add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, ADD_FLAGS)?;
    let amount = parse_money(parsed.require(0, USAGE[0])?)?;
    let description = parsed
        .joined_from(1)
        .ok_or_else(|| usage_error(&USAGE[..1]))?;
    let user_id = context.active_user_id()?;
    let date = match parsed.value("date") {
        Some(raw) => parse_date(raw)?,
        None => context.today(),
    };
    let category = parsed
        .value("category")
        .map(|name| category_id(&context.book, user_id, name))
        .transpose()?;

    let input = NewExpense {
        amount,
        date,
        category_id: category,
        description,
    };
    let id = context.with_book_mut(|book, clock| ExpenseService::add(book, user_id, input, clock))?;

    if let Some(expense) = context.book.expense(id) {
        let formatters = context.formatters();
        io::print_success(format!(
            "Expense {} recorded: {} on {} ({}).",
            expense.short_id(),
            formatters.money(expense.amount),
            formatters.date(expense.date),
            context.book.category_label(expense.category_id)
        ));
    }
    warn_exceeded(context, user_id);
    Ok(())
}

fn edit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, EDIT_FLAGS)?;
    let reference = parsed.require(0, USAGE[1])?;
    let user_id = context.active_user_id()?;
    let id = ExpenseService::resolve(&context.book, user_id, reference)?.id;

    if parsed.has("uncategorized") && parsed.value("category").is_some() {
        return Err(CommandError::InvalidArguments(
            "use either --category or --uncategorized, not both".into(),
        ));
    }
    let category = if parsed.has("uncategorized") {
        Some(None)
    } else {
        parsed
            .value("category")
            .map(|name| category_id(&context.book, user_id, name).map(Some))
            .transpose()?
    };
    let changes = ExpenseChanges {
        amount: parsed.value("amount").map(parse_money).transpose()?,
        date: parsed.value("date").map(parse_date).transpose()?,
        category,
        description: parsed.value("description").map(str::to_string),
    };
    if changes.is_empty() {
        return Err(CommandError::InvalidArguments(
            "nothing to change; pass at least one of --amount, --date, --category, --uncategorized, --description".into(),
        ));
    }

    context.with_book_mut(|book, clock| ExpenseService::edit(book, user_id, id, changes, clock))?;
    if let Some(expense) = context.book.expense(id) {
        io::print_success(format!("Expense {} updated.", expense.short_id()));
    }
    warn_exceeded(context, user_id);
    Ok(())
}

fn remove(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [reference] = args else {
        return Err(usage_error(&USAGE[2..3]));
    };
    let user_id = context.active_user_id()?;
    let id = ExpenseService::resolve(&context.book, user_id, reference)?.id;
    let removed = context.with_book_mut(|book, _| ExpenseService::remove(book, user_id, id))?;
    io::print_success(format!("Expense {} deleted.", removed.display_label()));
    Ok(())
}

fn list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, FILTER_FLAGS)?;
    if !parsed.positionals().is_empty() {
        return Err(usage_error(&USAGE[3..]));
    }
    let user_id = context.active_user_id()?;
    let filter = expense_filter(&context.book, user_id, &parsed)?;
    let expenses = ExpenseService::list(&context.book, user_id, &filter);
    if expenses.is_empty() {
        io::print_info("No expenses found.");
        return Ok(());
    }

    let formatters = context.formatters();
    let rows: Vec<_> = expenses
        .iter()
        .map(|expense| {
            (
                vec![
                    expense.short_id(),
                    formatters.date(expense.date),
                    context.book.category_label(expense.category_id),
                    formatters.money(expense.amount),
                    expense.description.clone(),
                ],
                RowTone::Plain,
            )
        })
        .collect();
    output::table(&["Id", "Date", "Category", "Amount", "Description"], &rows);
    io::print_info(format!(
        "Total: {} across {} expense(s)",
        formatters.money(ExpenseService::total(&expenses)),
        expenses.len()
    ));
    Ok(())
}

/// Builds a filter from `--category`, `--from` and `--to`.
pub(crate) fn expense_filter(
    book: &Book,
    user_id: Uuid,
    parsed: &ParsedArgs<'_>,
) -> Result<ExpenseFilter, CommandError> {
    let filter = ExpenseFilter {
        category: parsed
            .value("category")
            .map(|name| category_id(book, user_id, name))
            .transpose()?,
        from: parsed.value("from").map(parse_date).transpose()?,
        to: parsed.value("to").map(parse_date).transpose()?,
    };
    if let (Some(from), Some(to)) = (filter.from, filter.to) {
        if from > to {
            return Err(CommandError::InvalidArguments(format!(
                "--from {} is after --to {}",
                from, to
            )));
        }
    }
    Ok(filter)
}

pub(crate) fn category_id(book: &Book, user_id: Uuid, name: &str) -> Result<Uuid, CommandError> {
    Ok(CategoryService::find_by_name(book, user_id, name)?.id)
}

/// Lists the active caps that the latest change pushed over their limit.
fn warn_exceeded(context: &ShellContext, user_id: Uuid) {
    let exceeded = BudgetService::exceeded(&context.book, user_id, context.today());
    if exceeded.is_empty() {
        return;
    }
    let names: Vec<&str> = exceeded.iter().map(|usage| usage.name.as_str()).collect();
    io::print_warning(format!(
        "Budget alert! You have exceeded: {}",
        names.join(", ")
    ));
}
