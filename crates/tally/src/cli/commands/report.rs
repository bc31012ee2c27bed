use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use tally_core::{export_csv, DashboardService, ExpenseService};

use crate::cli::args::ParsedArgs;
use crate::cli::core::CommandResult;
use crate::cli::io;
use crate::cli::output::{self, RowTone};
use crate::cli::registry::CommandEntry;
use crate::cli::shell_context::ShellContext;

use super::expense::{expense_filter, FILTER_FLAGS};
use super::{split_subcommand, usage_error};

const DASHBOARD_USAGE: &[&str] = &["dashboard"];
const EXPORT_USAGE: &[&str] = &["export csv <path> [--category NAME] [--from D] [--to D]"];

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "dashboard",
            "Summarize spending and budget alerts",
            DASHBOARD_USAGE,
            cmd_dashboard,
        ),
        CommandEntry::new(
            "export",
            "Write the active user's expenses to a file",
            EXPORT_USAGE,
            cmd_export,
        ),
    ]
}

fn cmd_dashboard(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if !args.is_empty() {
        return Err(usage_error(DASHBOARD_USAGE));
    }
    let user_id = context.active_user_id()?;
    let summary =
        DashboardService::summary(&context.book, user_id, context.today(), context.threshold())?;
    let formatters = context.formatters();

    output::section(format!("Dashboard: {}", summary.month_label));
    let figures = [
        ("Total spent", summary.total),
        ("This month", summary.month_total),
        ("Last 7 days", summary.week_total),
        ("Daily average", summary.average_daily),
    ];
    for (label, amount) in figures {
        io::print_info(format!("  {:<14}: {}", label, formatters.money(amount)));
    }

    if !summary.by_category.is_empty() {
        output::section("Spending by category");
        let rows: Vec<_> = summary
            .by_category
            .iter()
            .map(|entry| {
                (
                    vec![entry.label.clone(), formatters.money(entry.total)],
                    RowTone::Plain,
                )
            })
            .collect();
        output::table(&["Category", "Total"], &rows);
    }

    output::section("Last six months");
    let rows: Vec<_> = summary
        .monthly
        .iter()
        .map(|month| {
            (
                vec![month.label.clone(), formatters.money(month.total)],
                RowTone::Plain,
            )
        })
        .collect();
    output::table(&["Month", "Total"], &rows);

    if !summary.recent.is_empty() {
        output::section("Recent expenses");
        let rows: Vec<_> = summary
            .recent
            .iter()
            .map(|expense| {
                (
                    vec![
                        formatters.date(expense.date),
                        context.book.category_label(expense.category_id),
                        formatters.money(expense.amount),
                        expense.description.clone(),
                    ],
                    RowTone::Plain,
                )
            })
            .collect();
        output::table(&["Date", "Category", "Amount", "Description"], &rows);
    }

    for usage in &summary.exceeded {
        io::print_warning(format!(
            "Budget `{}` exceeded by {} ({} of {}).",
            usage.name,
            formatters.money(usage.over_amount),
            formatters.money(usage.spent),
            formatters.money(usage.amount)
        ));
    }
    for usage in &summary.warnings {
        io::print_warning(format!(
            "Budget `{}` is at {}% of {}.",
            usage.name,
            usage.percentage_used,
            formatters.money(usage.amount)
        ));
    }
    Ok(())
}

fn cmd_export(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (format, rest) = split_subcommand(args, EXPORT_USAGE)?;
    if format != "csv" {
        return Err(usage_error(EXPORT_USAGE));
    }
    let parsed = ParsedArgs::parse(rest, FILTER_FLAGS)?;
    let [path] = parsed.positionals() else {
        return Err(usage_error(EXPORT_USAGE));
    };
    let user_id = context.active_user_id()?;
    let filter = expense_filter(&context.book, user_id, &parsed)?;
    let expenses = ExpenseService::list(&context.book, user_id, &filter);

    let path = PathBuf::from(*path);
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(&path)?);
    let written = export_csv(writer, &context.book, &expenses)?;
    tracing::info!(path = %path.display(), rows = written, "exported expenses");
    io::print_success(format!(
        "Exported {} expense(s) to {}.",
        written,
        path.display()
    ));
    Ok(())
}
