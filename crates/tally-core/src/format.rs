use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

/// Formats currency amounts for presentation.
pub trait CurrencyFormatter: Send + Sync {
    fn format_amount(&self, amount: Decimal, currency: &str) -> String;
}

/// Formats dates for presentation.
pub trait DateFormatter: Send + Sync {
    fn format_date(&self, date: NaiveDate) -> String;
}

/// `$1,234.50`-style output for USD, `1,234.50 EUR` for other codes.
#[derive(Debug, Clone, Copy)]
pub struct GroupedCurrencyFormatter {
    pub precision: u32,
}

impl Default for GroupedCurrencyFormatter {
    fn default() -> Self {
        Self { precision: 2 }
    }
}

impl CurrencyFormatter for GroupedCurrencyFormatter {
    fn format_amount(&self, amount: Decimal, currency: &str) -> String {
        let rounded =
            amount.round_dp_with_strategy(self.precision, RoundingStrategy::MidpointAwayFromZero);
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let digits = format!("{:.*}", self.precision as usize, rounded.abs());
        let (whole, fraction) = match digits.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (digits.as_str(), None),
        };
        let mut grouped = group_thousands(whole);
        if let Some(fraction) = fraction {
            grouped.push('.');
            grouped.push_str(fraction);
        }
        match currency {
            "USD" | "" => format!("{}${}", sign, grouped),
            code => format!("{}{} {}", sign, grouped, code),
        }
    }
}

fn group_thousands(whole: &str) -> String {
    let len = whole.len();
    let mut out = String::with_capacity(len + len / 3);
    for (index, ch) in whole.chars().enumerate() {
        if index > 0 && (len - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// ISO-8601 calendar dates (`2024-03-01`).
#[derive(Debug, Clone, Copy, Default)]
pub struct IsoDateFormatter;

impl DateFormatter for IsoDateFormatter {
    fn format_date(&self, date: NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn groups_thousands_and_keeps_cents() {
        let formatter = GroupedCurrencyFormatter::default();
        let amount = Decimal::from_str("1234567.5").unwrap();
        assert_eq!(formatter.format_amount(amount, "USD"), "$1,234,567.50");
        assert_eq!(formatter.format_amount(amount, "EUR"), "1,234,567.50 EUR");
    }

    #[test]
    fn negative_amounts_keep_sign_in_front() {
        let formatter = GroupedCurrencyFormatter::default();
        let amount = Decimal::from_str("-200").unwrap();
        assert_eq!(formatter.format_amount(amount, "USD"), "-$200.00");
        assert_eq!(formatter.format_amount(Decimal::ZERO, "USD"), "$0.00");
    }

    #[test]
    fn iso_dates() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(IsoDateFormatter.format_date(date), "2024-03-01");
    }
}
