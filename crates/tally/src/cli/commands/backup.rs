use tally_core::BookStorage;

use crate::cli::core::CommandResult;
use crate::cli::io;
use crate::cli::output::{self, RowTone};
use crate::cli::registry::CommandEntry;
use crate::cli::shell_context::{ShellContext, BOOK_NAME};

use super::usage_error;

const RESTORE_USAGE: &[&str] = &["restore <file>"];

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "backup",
            "Snapshot the book with an optional note",
            &["backup [note]"],
            cmd_backup,
        ),
        CommandEntry::new("backups", "List book backups", &["backups"], cmd_backups),
        CommandEntry::new(
            "restore",
            "Replace the book with a backup (exact name or unique prefix)",
            RESTORE_USAGE,
            cmd_restore,
        ),
    ]
}

fn cmd_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let note = (!args.is_empty()).then(|| args.join(" "));
    let info = context
        .storage
        .backup_book(BOOK_NAME, &context.book, note.as_deref())?;
    io::print_success(format!("Book backed up to {}.", info.id));
    Ok(())
}

fn cmd_backups(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let backups = context.storage.list_backup_metadata(BOOK_NAME)?;
    if backups.is_empty() {
        io::print_info("No book backups yet. Use `backup [note]` to create one.");
        return Ok(());
    }
    let rows: Vec<_> = backups
        .iter()
        .map(|backup| {
            let created = backup
                .created_at
                .map(|stamp| stamp.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "unknown".into());
            (
                vec![
                    backup.name.clone(),
                    created,
                    format!("{:.1} KiB", backup.size_bytes as f64 / 1024.0),
                ],
                RowTone::Plain,
            )
        })
        .collect();
    output::table(&["Backup", "Created (UTC)", "Size"], &rows);
    Ok(())
}

fn cmd_restore(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [reference] = args else {
        return Err(usage_error(RESTORE_USAGE));
    };
    let backup = context.storage.find_backup(BOOK_NAME, reference)?;
    let book = context.storage.restore_backup(&backup)?;
    context.replace_book(book);
    io::print_success(format!("Book restored from {}.", backup.id));
    if let Some(active) = context.config.active_user.as_deref() {
        if context.book.user_by_name(active).is_none() {
            io::print_warning(format!(
                "Active user `{}` is not in the restored book.",
                active
            ));
        }
    }
    Ok(())
}
