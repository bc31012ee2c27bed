use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_config::Config;
use tally_core::{CurrencyFormatter, DateFormatter, GroupedCurrencyFormatter, IsoDateFormatter};

/// Formatter implementations bound to the active CLI configuration.
#[derive(Debug, Clone)]
pub struct CliFormatters {
    currency: String,
    amounts: GroupedCurrencyFormatter,
    dates: IsoDateFormatter,
}

impl CliFormatters {
    pub fn from_config(config: &Config) -> Self {
        let precision = config.currency_precision.map(u32::from).unwrap_or(2);
        Self {
            currency: config.currency.clone(),
            amounts: GroupedCurrencyFormatter { precision },
            dates: IsoDateFormatter,
        }
    }

    /// Amount in the configured currency.
    pub fn money(&self, amount: Decimal) -> String {
        self.format_amount(amount, &self.currency)
    }

    pub fn date(&self, date: NaiveDate) -> String {
        self.format_date(date)
    }
}

impl CurrencyFormatter for CliFormatters {
    fn format_amount(&self, amount: Decimal, currency: &str) -> String {
        let code = if currency.is_empty() {
            self.currency.as_str()
        } else {
            currency
        };
        self.amounts.format_amount(amount, code)
    }
}

impl DateFormatter for CliFormatters {
    fn format_date(&self, date: NaiveDate) -> String {
        self.dates.format_date(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_configured_currency_and_precision() {
        let mut config = Config::default();
        let formatters = CliFormatters::from_config(&config);
        assert_eq!(formatters.money(Decimal::new(123450, 2)), "$1,234.50");

        config.currency = "EUR".into();
        config.currency_precision = Some(0);
        let formatters = CliFormatters::from_config(&config);
        assert_eq!(formatters.money(Decimal::new(123450, 2)), "1,235 EUR");
        assert_eq!(
            formatters.date(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()),
            "2024-03-05"
        );
    }
}
