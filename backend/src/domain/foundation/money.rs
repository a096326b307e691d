//! Ledger money: integer minor units plus human-facing parse/format.
//!
//! Amounts on the ledger are always `i64` cents. Operator input such as
//! `"12,50"` or `"1 000.005"` goes through [`parse_money`], which rounds
//! half-to-even to the nearest cent.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use super::ValidationError;

/// Parses a human-entered amount into cents.
///
/// Commas are read as decimal points and all whitespace is dropped.
/// An empty string parses as zero.
///
/// # Errors
///
/// Returns `InvalidFormat` for anything that is not a plain decimal
/// number, or that overflows `i64` cents.
pub fn parse_money(input: &str) -> Result<i64, ValidationError> {
    let normalized: String = input
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    if normalized.is_empty() {
        return Ok(0);
    }

    let invalid = || ValidationError::invalid_format("amount", format!("Invalid money format: {input:?}"));

    let amount = Decimal::from_str(&normalized).map_err(|_| invalid())?;
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|cents| cents.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven))
        .and_then(|cents| cents.to_i64())
        .ok_or_else(invalid)
}

/// Renders cents as `1,234.50 KZT`.
pub fn format_money(cents: i64, currency: &str) -> String {
    let negative = cents < 0;
    let abs = cents.unsigned_abs();
    let whole = (abs / 100).to_string();
    let frac = abs % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}{grouped}.{frac:02} {currency}")
}
