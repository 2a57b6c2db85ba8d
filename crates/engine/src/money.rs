//! Money display and input parsing.
//!
//! Amounts are plain `f64` values, matching the `REAL` columns of the store.
//! The display format groups thousands with an apostrophe and uses a comma as
//! the decimal separator: `1234.5` becomes `1'234,50`.

use crate::LedgerError;

/// Formats an amount with apostrophe thousand separators and exactly two
/// decimal digits.
///
/// The sign is never emitted; callers pass `abs()` when the sign is conveyed
/// separately (e.g. an "over budget by" message).
///
/// # Examples
///
/// ```rust
/// assert_eq!(engine::money::format(1234.5), "1'234,50");
/// assert_eq!(engine::money::format(0.0), "0,00");
/// ```
#[must_use]
pub fn format(amount: f64) -> String {
    // Round half away from zero to whole cents, then split.
    let cents = (amount.abs() * 100.0).round() as i64;
    let units = cents / 100;
    let fraction = cents % 100;

    let digits = units.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push('\'');
        }
        grouped.push(digit);
    }
    let grouped: String = grouped.chars().rev().collect();

    format!("{grouped},{fraction:02}")
}

/// Parses a user-entered amount.
///
/// Accepts `.` or `,` as the decimal separator. Rejects anything that is not
/// a finite number with [`LedgerError::Validation`]; sign constraints are the
/// ledger operations' business, not the parser's.
pub fn parse(input: &str) -> Result<f64, LedgerError> {
    let invalid = || LedgerError::Validation("invalid amount".to_string());

    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::Validation("empty amount".to_string()));
    }

    let normalized = trimmed.replace(',', ".");
    let amount: f64 = normalized.parse().map_err(|_| invalid())?;
    if !amount.is_finite() {
        return Err(invalid());
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_groups_thousands_with_apostrophes() {
        assert_eq!(format(1234.5), "1'234,50");
        assert_eq!(format(1000000.0), "1'000'000,00");
        assert_eq!(format(999.0), "999,00");
    }

    #[test]
    fn format_zero() {
        assert_eq!(format(0.0), "0,00");
    }

    #[test]
    fn format_rounds_to_two_decimals() {
        assert_eq!(format(9.999), "10,00");
        assert_eq!(format(0.005), "0,01");
    }

    #[test]
    fn format_drops_the_sign() {
        assert_eq!(format(-1234.5), "1'234,50");
    }

    #[test]
    fn parse_accepts_dot_or_comma() {
        assert_eq!(parse("10").unwrap(), 10.0);
        assert_eq!(parse("10.5").unwrap(), 10.5);
        assert_eq!(parse("10,50").unwrap(), 10.5);
        assert_eq!(parse(" -3.20 ").unwrap(), -3.2);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse("").is_err());
        assert!(parse("abc").is_err());
        assert!(parse("12.3.4").is_err());
        assert!(parse("NaN").is_err());
        assert!(parse("inf").is_err());
    }
}
