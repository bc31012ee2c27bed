//! CSV export of expense listings.

use std::io::Write;

use tally_domain::{Book, Expense};

use crate::CoreResult;

pub const CSV_HEADER: [&str; 4] = ["Date", "Category", "Amount", "Description"];

/// Writes `expenses` as CSV in the order given; returns the number of data rows.
pub fn export_csv<W: Write>(writer: W, book: &Book, expenses: &[&Expense]) -> CoreResult<usize> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_HEADER)?;
    for expense in expenses {
        let date = expense.date.format("%Y-%m-%d").to_string();
        let category = book.category_label(expense.category_id);
        let amount = expense.amount.to_string();
        csv.write_record([
            date.as_str(),
            category.as_str(),
            amount.as_str(),
            expense.description.as_str(),
        ])?;
    }
    csv.flush()?;
    tracing::info!(rows = expenses.len(), "exported expenses to csv");
    Ok(expenses.len())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;
    use tally_domain::{Category, User};

    use super::*;

    #[test]
    fn writes_header_and_quotes_descriptions() {
        let mut book = Book::default();
        let user = book.add_user(User::new("ana", Utc::now()));
        let food = book.add_category(Category::new(user, "Food", Utc::now()));
        let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        book.add_expense(Expense::new(
            Some(user),
            Some(food),
            Decimal::from_str("12.50").unwrap(),
            day,
            "Lunch, with team",
            Utc::now(),
        ));
        book.add_expense(Expense::new(
            Some(user),
            None,
            Decimal::from_str("3.00").unwrap(),
            day,
            "Bus",
            Utc::now(),
        ));
        let rows: Vec<&Expense> = book.expenses.iter().collect();

        let mut out = Vec::new();
        let written = export_csv(&mut out, &book, &rows).unwrap();
        assert_eq!(written, 2);
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Date,Category,Amount,Description");
        assert_eq!(lines[1], "2024-03-05,Food,12.50,\"Lunch, with team\"");
        assert_eq!(lines[2], "2024-03-05,Uncategorized,3.00,Bus");
    }
}
