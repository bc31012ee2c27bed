use std::fmt;

use colored::Colorize;

/// Message categories used by the CLI output helpers.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Warning,
    Error,
    Hint,
    Section,
}

/// Highlight applied to a whole table row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowTone {
    Plain,
    Warning,
    Alert,
}

/// Turns ANSI styling off everywhere, or hands the decision back to the terminal.
pub fn set_color_enabled(enabled: bool) {
    if enabled {
        colored::control::unset_override();
    } else {
        colored::control::set_override(false);
    }
}

fn build_label(kind: MessageKind) -> Option<(&'static str, &'static str)> {
    match kind {
        MessageKind::Success => Some(("SUCCESS", "[+]")),
        MessageKind::Warning => Some(("WARNING", "[!]")),
        MessageKind::Error => Some(("ERROR", "[x]")),
        MessageKind::Hint => Some(("HINT", ">")),
        MessageKind::Info | MessageKind::Section => None,
    }
}

fn apply_style(kind: MessageKind, message: impl fmt::Display) -> String {
    let text = message.to_string();
    let formatted = match kind {
        MessageKind::Section => format!("=== {} ===", text.trim()),
        _ => match build_label(kind) {
            Some((label, icon)) => format!("{label}: {icon} {text}"),
            None => text,
        },
    };

    match kind {
        MessageKind::Success => formatted.bright_green().to_string(),
        MessageKind::Warning => formatted.bright_yellow().to_string(),
        MessageKind::Error => formatted.bright_red().to_string(),
        MessageKind::Hint => formatted.bright_cyan().to_string(),
        MessageKind::Section => formatted.bold().to_string(),
        MessageKind::Info => formatted,
    }
}

pub fn print(kind: MessageKind, message: impl fmt::Display) {
    let formatted = apply_style(kind, message);
    match kind {
        MessageKind::Section => println!("\n{}", formatted),
        _ => println!("{}", formatted),
    }
}

pub fn info(message: impl fmt::Display) {
    print(MessageKind::Info, message);
}

pub fn success(message: impl fmt::Display) {
    print(MessageKind::Success, message);
}

pub fn warning(message: impl fmt::Display) {
    print(MessageKind::Warning, message);
}

pub fn error(message: impl fmt::Display) {
    print(MessageKind::Error, message);
}

pub fn hint(message: impl fmt::Display) {
    print(MessageKind::Hint, message);
}

pub fn section(title: impl fmt::Display) {
    print(MessageKind::Section, title);
}

/// Prints left-aligned columns sized to their widest cell.
pub fn table(headers: &[&str], rows: &[(Vec<String>, RowTone)]) {
    let mut widths: Vec<usize> = headers.iter().map(|header| header.chars().count()).collect();
    for (cells, _) in rows {
        for (index, cell) in cells.iter().enumerate() {
            let width = cell.chars().count();
            match widths.get_mut(index) {
                Some(current) => *current = (*current).max(width),
                None => widths.push(width),
            }
        }
    }

    let header_cells: Vec<String> = headers.iter().map(|header| header.to_string()).collect();
    println!("{}", render_row(&header_cells, &widths).bold());
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    println!("{}", render_row(&rule, &widths));

    for (cells, tone) in rows {
        let line = render_row(cells, &widths);
        match tone {
            RowTone::Plain => println!("{}", line),
            RowTone::Warning => println!("{}", line.yellow()),
            RowTone::Alert => println!("{}", line.red()),
        }
    }
}

fn render_row(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::new();
    for (index, cell) in cells.iter().enumerate() {
        if index > 0 {
            line.push_str("  ");
        }
        let width = widths.get(index).copied().unwrap_or(0);
        line.push_str(&format!("{:<width$}", cell, width = width));
    }
    line.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_to_column_width() {
        let cells = vec!["a".to_string(), "bb".to_string(), "c".to_string()];
        assert_eq!(render_row(&cells, &[3, 4, 1]), "a    bb    c");
    }

    #[test]
    fn messages_carry_labels() {
        assert!(apply_style(MessageKind::Warning, "careful").contains("WARNING: [!] careful"));
        assert!(apply_style(MessageKind::Section, " Budgets ").contains("=== Budgets ==="));
        assert_eq!(apply_style(MessageKind::Info, "plain"), "plain");
    }
}
