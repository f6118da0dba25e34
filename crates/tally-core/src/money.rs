//! Exact money parsing, formatting, and cent conversion
//!
//! All amounts are `rust_decimal::Decimal` held to two decimal places and
//! stored as integer cents. Binary floating point never touches an amount;
//! the same dataset must produce the same cents on every run and platform.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::{Error, Result};

/// Parse an amount string into a `Decimal` rounded to two decimal places.
///
/// Accepts the forms found in transaction exports: `$6.15`, `6.15`,
/// `-$10.00`, `-10.00`, `$1,234.56`, `(12.00)` for negatives.
pub fn parse_amount(s: &str) -> Result<Decimal> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidData("empty amount string".to_string()));
    }

    let cleaned: String = trimmed
        .replace(['$', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    cleaned
        .parse::<Decimal>()
        .map(|d| d.round_dp(2))
        .map_err(|_| {
            Error::InvalidData(format!(
                "unable to parse amount '{}' (expected e.g. '$6.15', '-10.00')",
                s
            ))
        })
}

/// Convert a two-decimal amount to integer cents for storage.
pub fn to_cents(amount: Decimal) -> Result<i64> {
    (amount.round_dp(2) * Decimal::ONE_HUNDRED)
        .to_i64()
        .ok_or_else(|| Error::InvalidData(format!("amount out of range: {}", amount)))
}

/// Convert stored integer cents back to a two-decimal amount.
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Format an amount as a currency string: `$1,234.56`, `-$10.00`.
pub fn format_amount(amount: Decimal) -> String {
    let normalized = amount.round_dp(2);
    let negative = normalized.is_sign_negative() && !normalized.is_zero();
    let abs = normalized.abs();

    let text = format!("{:.2}", abs);
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::new();
    let digits: Vec<char> = int_part.chars().collect();
    for (i, ch) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*ch);
    }

    if negative {
        format!("-${}.{}", grouped, frac_part)
    } else {
        format!("${}.{}", grouped, frac_part)
    }
}
