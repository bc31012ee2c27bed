use tally_core::{BudgetAlert, BudgetChanges, BudgetService, BudgetUsage, NewBudget};
use tally_domain::{BudgetCap, Displayable};

use crate::cli::args::{parse_date, parse_money, parse_period, Flag, ParsedArgs};
use crate::cli::core::{CommandError, CommandResult};
use crate::cli::formatters::CliFormatters;
use crate::cli::io;
use crate::cli::output::{self, RowTone};
use crate::cli::registry::CommandEntry;
use crate::cli::shell_context::ShellContext;

use super::expense::category_id;
use super::{split_subcommand, usage_error};

const USAGE: &[&str] = &[
    "budget add <name> <amount> [--period weekly|monthly|yearly] [--category NAME] [--start D]",
    "budget edit <name> [--name N] [--amount A] [--period P] [--category NAME | --all] [--start D]",
    "budget remove <name>",
    "budget list",
    "budget status [name]",
    "budget history <name>",
    "budget activate <name> | budget deactivate <name>",
];

const ADD_FLAGS: &[Flag] = &[
    Flag::Value("period"),
    Flag::Value("category"),
    Flag::Value("start"),
];
const EDIT_FLAGS: &[Flag] = &[
    Flag::Value("name"),
    Flag::Value("amount"),
    Flag::Value("period"),
    Flag::Value("category"),
    Flag::Switch("all"),
    Flag::Value("start"),
];

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "budget",
        "Manage budget caps and check their usage",
        USAGE,
        cmd_budget,
    )]
}

fn cmd_budget(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (sub, rest) = split_subcommand(args, USAGE)?;
    match sub.as_str() {
        "add" => add(context, rest),
        "edit" => edit(context, rest),
        "remove" | "rm" => remove(context, rest),
        "list" | "ls" => list(context),
        "status" => status(context, rest),
        "history" => history(context, rest),
        "activate" => set_active(context, rest, true),
        "deactivate" => set_active(context, rest, false),
        _ => Err(usage_error(USAGE)),
    }
}

fn add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, ADD_FLAGS)?;
    let [name, amount] = parsed.positionals() else {
        return Err(usage_error(&USAGE[..1]));
    };
    let user_id = context.active_user_id()?;
    let period = match parsed.value("period") {
        Some(raw) => parse_period(raw)?,
        None => parse_period(&context.config.default_budget_period)?,
    };
    let input = NewBudget {
        name: name.to_string(),
        amount: parse_money(amount)?,
        period,
        category_id: parsed
            .value("category")
            .map(|name| category_id(&context.book, user_id, name))
            .transpose()?,
        start_date: parsed.value("start").map(parse_date).transpose()?,
    };

    let id = context.with_book_mut(|book, clock| BudgetService::add(book, user_id, input, clock))?;
    if let Some(cap) = context.book.budget(id) {
        io::print_success(format!(
            "Budget cap `{}` created: {} {} from {}.",
            cap.name,
            context.formatters().money(cap.amount),
            cap.period,
            cap.start_date
        ));
    }
    Ok(())
}

fn edit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, EDIT_FLAGS)?;
    let [name] = parsed.positionals() else {
        return Err(usage_error(&USAGE[1..2]));
    };
    let user_id = context.active_user_id()?;
    let id = BudgetService::resolve(&context.book, user_id, name)?.id;

    if parsed.has("all") && parsed.value("category").is_some() {
        return Err(CommandError::InvalidArguments(
            "use either --category or --all, not both".into(),
        ));
    }
    let category = if parsed.has("all") {
        Some(None)
    } else {
        parsed
            .value("category")
            .map(|name| category_id(&context.book, user_id, name).map(Some))
            .transpose()?
    };
    let changes = BudgetChanges {
        name: parsed.value("name").map(str::to_string),
        amount: parsed.value("amount").map(parse_money).transpose()?,
        period: parsed.value("period").map(parse_period).transpose()?,
        category,
        start_date: parsed.value("start").map(parse_date).transpose()?,
    };

    context.with_book_mut(|book, clock| BudgetService::edit(book, user_id, id, changes, clock))?;
    if let Some(cap) = context.book.budget(id) {
        io::print_success(format!("Budget cap `{}` updated.", cap.name));
    }
    Ok(())
}

fn remove(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [name] = args else {
        return Err(usage_error(&USAGE[2..3]));
    };
    let user_id = context.active_user_id()?;
    let id = BudgetService::resolve(&context.book, user_id, name)?.id;
    let removed = context.with_book_mut(|book, _| BudgetService::remove(book, user_id, id))?;
    io::print_success(format!("Budget cap `{}` deleted.", removed.display_label()));
    Ok(())
}

fn set_active(context: &mut ShellContext, args: &[&str], active: bool) -> CommandResult {
    let [name] = args else {
        return Err(usage_error(&USAGE[6..]));
    };
    let user_id = context.active_user_id()?;
    let id = BudgetService::resolve(&context.book, user_id, name)?.id;
    context
        .with_book_mut(|book, clock| BudgetService::set_active(book, user_id, id, active, clock))?;
    let state = if active { "activated" } else { "deactivated" };
    io::print_success(format!("Budget cap `{}` {}.", name, state));
    Ok(())
}

/// Every cap with its current-period usage.
fn list(context: &mut ShellContext) -> CommandResult {
    let user_id = context.active_user_id()?;
    let caps = BudgetService::list(&context.book, user_id);
    if caps.is_empty() {
        io::print_info("No budget caps. Use `budget add <name> <amount>` to create one.");
        return Ok(());
    }
    let formatters = context.formatters();
    let today = context.today();
    let threshold = context.threshold();
    let rows: Vec<_> = caps
        .iter()
        .map(|cap| {
            let usage = BudgetService::usage(&context.book, *cap, today, threshold);
            let state = if cap.is_active {
                usage.alert.to_string()
            } else {
                "Inactive".to_string()
            };
            let row_tone = if cap.is_active {
                tone(usage.alert)
            } else {
                RowTone::Plain
            };
            (
                vec![
                    cap.name.clone(),
                    cap.period.to_string(),
                    context.book.category_label(cap.category_id),
                    formatters.money(cap.amount),
                    formatters.money(usage.spent),
                    format!("{}%", usage.percentage_used),
                    state,
                ],
                row_tone,
            )
        })
        .collect();
    output::table(
        &["Budget", "Period", "Category", "Limit", "Spent", "Used", "Status"],
        &rows,
    );
    Ok(())
}

/// Current period of the active caps, or the detail of one cap.
fn status(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let user_id = context.active_user_id()?;
    let formatters = context.formatters();
    let today = context.today();
    let threshold = context.threshold();

    if !args.is_empty() {
        let name = args.join(" ");
        let cap = BudgetService::resolve(&context.book, user_id, &name)?;
        let usage = BudgetService::usage(&context.book, cap, today, threshold);
        print_detail(cap, &usage, &formatters);
        return Ok(());
    }

    let usages = BudgetService::usages(&context.book, user_id, today, threshold, true);
    if usages.is_empty() {
        io::print_info("No active budget caps.");
        return Ok(());
    }
    output::section(format!("Budget status on {}", formatters.date(today)));
    let rows: Vec<_> = usages
        .iter()
        .map(|usage| {
            (
                vec![
                    usage.name.clone(),
                    usage.window.to_string(),
                    formatters.money(usage.spent),
                    formatters.money(usage.amount),
                    formatters.money(usage.remaining),
                    format!("{}%", usage.percentage_used),
                    usage.alert.to_string(),
                ],
                tone(usage.alert),
            )
        })
        .collect();
    output::table(
        &["Budget", "Period", "Spent", "Limit", "Remaining", "Used", "Status"],
        &rows,
    );
    for usage in &usages {
        report_alert(usage, &formatters);
    }
    Ok(())
}

fn history(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.is_empty() {
        return Err(usage_error(&USAGE[5..6]));
    }
    let user_id = context.active_user_id()?;
    let name = args.join(" ");
    let cap = BudgetService::resolve(&context.book, user_id, &name)?;
    let formatters = context.formatters();
    let today = context.today();
    let periods = BudgetService::history(&context.book, cap, today, context.threshold());
    if periods.is_empty() {
        io::print_info(format!(
            "Budget cap `{}` starts on {}; no periods yet.",
            cap.name, cap.start_date
        ));
        return Ok(());
    }
    output::section(format!("History: {}", cap.display_label()));
    let rows: Vec<_> = periods
        .iter()
        .map(|usage| {
            (
                vec![
                    usage.window.to_string(),
                    formatters.money(usage.spent),
                    format!("{}%", usage.percentage_used),
                    usage.alert.to_string(),
                    usage.window.scope(today).to_string(),
                ],
                tone(usage.alert),
            )
        })
        .collect();
    output::table(&["Period", "Spent", "Used", "Status", "When"], &rows);
    Ok(())
}

fn print_detail(cap: &BudgetCap, usage: &BudgetUsage, formatters: &CliFormatters) {
    output::section(format!("Budget: {}", cap.name));
    let rows = [
        ("Period", format!("{} ({})", usage.window, cap.period)),
        ("Limit", formatters.money(usage.amount)),
        ("Spent", formatters.money(usage.spent)),
        ("Remaining", formatters.money(usage.remaining)),
        ("Used", format!("{}%", usage.percentage_used)),
        ("Active", if cap.is_active { "yes" } else { "no" }.to_string()),
        ("Status", usage.alert.to_string()),
    ];
    for (label, value) in rows {
        io::print_info(format!("  {:<10}: {}", label, value));
    }
    report_alert(usage, formatters);
}

fn report_alert(usage: &BudgetUsage, formatters: &CliFormatters) {
    match usage.alert {
        BudgetAlert::Exceeded => io::print_warning(format!(
            "Budget `{}` exceeded by {}.",
            usage.name,
            formatters.money(usage.over_amount)
        )),
        BudgetAlert::Warning => io::print_warning(format!(
            "Budget `{}` is at {}% of {}.",
            usage.name,
            usage.percentage_used,
            formatters.money(usage.amount)
        )),
        BudgetAlert::Normal => {}
    }
}

fn tone(alert: BudgetAlert) -> RowTone {
    match alert {
        BudgetAlert::Exceeded => RowTone::Alert,
        BudgetAlert::Warning => RowTone::Warning,
        BudgetAlert::Normal => RowTone::Plain,
    }
}
