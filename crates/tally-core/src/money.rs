//! Parsing and validation of fixed-point monetary amounts.

use std::str::FromStr;

use rust_decimal::Decimal;
use tally_domain::MONEY_SCALE;

use crate::{CoreError, CoreResult};

/// Largest magnitude that fits ten digits with two of them fractional.
const MAX_WHOLE_UNITS: i64 = 100_000_000;

/// Parses user input such as `12`, `12.5` or `1,250.00` into a two-decimal amount.
pub fn parse_amount(input: &str) -> CoreResult<Decimal> {
    let cleaned: String = input
        .trim()
        .chars()
        .filter(|ch| *ch != ',' && *ch != '_')
        .collect();
    if cleaned.is_empty() {
        return Err(CoreError::Validation("amount is required".into()));
    }
    let value = Decimal::from_str(&cleaned)
        .map_err(|_| CoreError::Validation(format!("`{}` is not a valid amount", input.trim())))?;
    normalize(value)
}

/// Validates an expense amount: strictly positive, at most two decimals.
pub fn validate_expense_amount(amount: Decimal) -> CoreResult<Decimal> {
    let amount = normalize(amount)?;
    if amount <= Decimal::ZERO {
        return Err(CoreError::Validation(
            "expense amount must be greater than zero".into(),
        ));
    }
    Ok(amount)
}

/// Validates a budget cap amount: zero is allowed, negatives are not.
pub fn validate_cap_amount(amount: Decimal) -> CoreResult<Decimal> {
    let amount = normalize(amount)?;
    if amount < Decimal::ZERO {
        return Err(CoreError::Validation(
            "budget amount cannot be negative".into(),
        ));
    }
    Ok(amount)
}

fn normalize(amount: Decimal) -> CoreResult<Decimal> {
    if amount.normalize().scale() > MONEY_SCALE {
        return Err(CoreError::Validation(format!(
            "amount {} has more than {} decimal places",
            amount, MONEY_SCALE
        )));
    }
    if amount.abs() >= Decimal::from(MAX_WHOLE_UNITS) {
        return Err(CoreError::Validation(format!(
            "amount {} exceeds the supported range",
            amount
        )));
    }
    let mut scaled = amount;
    scaled.rescale(MONEY_SCALE);
    Ok(scaled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_rescales_to_cents() {
        assert_eq!(parse_amount("12").unwrap().to_string(), "12.00");
        assert_eq!(parse_amount(" 1,250.5 ").unwrap().to_string(), "1250.50");
        assert_eq!(parse_amount("0.10").unwrap().to_string(), "0.10");
    }

    #[test]
    fn rejects_sub_cent_precision() {
        let err = parse_amount("9.999").expect_err("three decimals");
        assert!(matches!(err, CoreError::Validation(ref msg) if msg.contains("decimal places")));
        // trailing zeros are not extra precision
        assert!(parse_amount("9.9900").is_ok());
    }

    #[test]
    fn rejects_garbage_and_oversized_values() {
        assert!(parse_amount("twelve").is_err());
        assert!(parse_amount("").is_err());
        assert!(parse_amount("100000000").is_err());
        assert!(parse_amount("99999999.99").is_ok());
    }

    #[test]
    fn expense_amount_must_be_positive() {
        assert!(validate_expense_amount(Decimal::ZERO).is_err());
        assert!(validate_expense_amount(Decimal::new(-500, 2)).is_err());
        assert!(validate_expense_amount(Decimal::new(1, 2)).is_ok());
    }

    #[test]
    fn cap_amount_may_be_zero() {
        assert_eq!(validate_cap_amount(Decimal::ZERO).unwrap(), Decimal::ZERO);
        assert!(validate_cap_amount(Decimal::new(-1, 0)).is_err());
    }
}
