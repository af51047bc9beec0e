//! Conversion between whole units ("5", "0.25") and base units.
//!
//! The engine only ever sees base units. Humans, and the CLI, think in whole
//! units, so bid values typed at a prompt go through [`parse_units`] before
//! they are blinded or deposited.

use thiserror::Error;

use crate::config::{BASE_UNITS_PER_UNIT, UNIT_DECIMALS};
use crate::types::Amount;

/// Errors from [`parse_units`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitsError {
    #[error("empty amount")]
    Empty,

    #[error("invalid digit in amount '{0}'")]
    InvalidDigit(String),

    #[error("too many decimal places in '{input}' (max {max})")]
    TooPrecise { input: String, max: u32 },

    #[error("amount '{0}' does not fit in base units")]
    Overflow(String),
}

/// Parses a decimal string of whole units into base units.
///
/// # Example
///
/// ```
/// use sealed_auction::units::parse_units;
///
/// assert_eq!(parse_units("5").unwrap(), 5_000_000_000_000_000_000);
/// assert_eq!(parse_units("0.5").unwrap(), 500_000_000_000_000_000);
/// ```
pub fn parse_units(input: &str) -> Result<Amount, UnitsError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(UnitsError::Empty);
    }

    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(UnitsError::InvalidDigit(input.to_string()));
    }
    let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if !all_digits(whole) || !all_digits(frac) {
        return Err(UnitsError::InvalidDigit(input.to_string()));
    }
    if frac.len() > UNIT_DECIMALS as usize {
        return Err(UnitsError::TooPrecise {
            input: input.to_string(),
            max: UNIT_DECIMALS,
        });
    }

    let overflow = || UnitsError::Overflow(input.to_string());

    let whole_value: Amount = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| overflow())?
    };

    // Right-pad the fraction to exactly UNIT_DECIMALS digits.
    let frac_value: Amount = if frac.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac, width = UNIT_DECIMALS as usize);
        padded.parse().map_err(|_| overflow())?
    };

    whole_value
        .checked_mul(BASE_UNITS_PER_UNIT)
        .and_then(|v| v.checked_add(frac_value))
        .ok_or_else(overflow)
}

/// Formats base units as whole units, trimming trailing zeros.
///
/// `format_units(1_500_000_000_000_000_000) == "1.5"`.
pub fn format_units(amount: Amount) -> String {
    let whole = amount / BASE_UNITS_PER_UNIT;
    let frac = amount % BASE_UNITS_PER_UNIT;
    if frac == 0 {
        return whole.to_string();
    }
    let frac_str = format!("{:0>width$}", frac, width = UNIT_DECIMALS as usize);
    format!("{}.{}", whole, frac_str.trim_end_matches('0'))
}
