use tally_core::{CategoryService, UserService};

use crate::cli::core::CommandResult;
use crate::cli::io;
use crate::cli::output::{self, RowTone};
use crate::cli::registry::CommandEntry;
use crate::cli::shell_context::ShellContext;

use super::{split_subcommand, usage_error};

const USAGE: &[&str] = &["user add <name>", "user list", "user use <name>"];

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "user",
        "Register users and pick the active one",
        USAGE,
        cmd_user,
    )]
}

fn cmd_user(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (sub, rest) = split_subcommand(args, USAGE)?;
    match sub.as_str() {
        "add" => add(context, rest),
        "list" => list(context),
        "use" | "switch" => switch(context, rest),
        _ => Err(usage_error(USAGE)),
    }
}

fn add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.is_empty() {
        return Err(usage_error(&USAGE[..1]));
    }
    let name = args.join(" ");
    let (user_id, username) = context.with_book_mut(|book, clock| {
        let id = UserService::register(book, &name, clock)?;
        let username = UserService::find_by_name(book, &name)?.username.clone();
        Ok((id, username))
    })?;
    let seeded = CategoryService::list(&context.book, user_id).len();
    io::print_success(format!(
        "User `{}` registered with {} default categories.",
        username, seeded
    ));

    if context.config.active_user.is_none() {
        context.config.active_user = Some(username.clone());
        context.save_config()?;
        io::print_info(format!("Active user is now `{}`.", username));
    }
    Ok(())
}

fn list(context: &mut ShellContext) -> CommandResult {
    let users = UserService::list(&context.book);
    if users.is_empty() {
        io::print_info("No users yet. Use `user add <name>` to register one.");
        return Ok(());
    }
    let active = context.config.active_user.as_deref();
    let formatters = context.formatters();
    let rows: Vec<_> = users
        .iter()
        .map(|user| {
            let marker = if active.is_some_and(|name| user.username.eq_ignore_ascii_case(name)) {
                "*"
            } else {
                ""
            };
            let expenses = context
                .book
                .expenses
                .iter()
                .filter(|expense| expense.is_owned_by(user.id))
                .count();
            (
                vec![
                    marker.to_string(),
                    user.username.clone(),
                    expenses.to_string(),
                    formatters.date(user.created_at.date_naive()),
                ],
                RowTone::Plain,
            )
        })
        .collect();
    output::table(&["", "User", "Expenses", "Joined"], &rows);
    Ok(())
}

fn switch(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.is_empty() {
        return Err(usage_error(&USAGE[2..]));
    }
    let name = args.join(" ");
    let username = UserService::find_by_name(&context.book, &name)?.username.clone();
    context.config.active_user = Some(username.clone());
    context.save_config()?;
    io::print_success(format!("Active user is now `{}`.", username));
    Ok(())
}
