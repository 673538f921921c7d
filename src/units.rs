//! Conversion between human-readable decimal amounts and integer base units.
//!
//! Amounts on the ledger are integers scaled by `10^decimals` (wei for the
//! native asset, the token's smallest unit for ERC-20 balances). Formatting
//! always renders the full precision, so a 6-decimal token balance of 50
//! prints as `50.000000`.

use crate::error::{AgentError, Result};

/// Decimal precision of the native asset.
pub const NATIVE_DECIMALS: u8 = 18;

/// Largest precision that still fits `10^decimals` in a `u128`.
const MAX_DECIMALS: u8 = 38;

/// Parse a decimal string such as `"0.001"` into base units.
///
/// Rejects signs, empty components, more fractional digits than `decimals`,
/// and values that overflow `u128`.
pub fn parse_units(value: &str, decimals: u8) -> Result<u128> {
    let value = value.trim();
    if decimals > MAX_DECIMALS {
        return Err(AgentError::InvalidInput(format!(
            "unsupported decimal precision: {}",
            decimals
        )));
    }
    if value.is_empty() {
        return Err(AgentError::InvalidInput("amount must not be empty".to_string()));
    }

    let (whole, fraction) = match value.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (value, ""),
    };

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
        return Err(AgentError::InvalidInput(format!("invalid amount: '{}'", value)));
    }
    if fraction.len() > decimals as usize {
        return Err(AgentError::InvalidInput(format!(
            "amount '{}' has more than {} decimal places",
            value, decimals
        )));
    }

    let overflow = || AgentError::InvalidInput(format!("amount '{}' is too large", value));
    let scale = 10u128.pow(decimals as u32);

    let whole_units = if whole.is_empty() {
        0
    } else {
        whole.parse::<u128>().map_err(|_| overflow())?
    };

    let fraction_units = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", fraction, width = decimals as usize);
        padded.parse::<u128>().map_err(|_| overflow())?
    };

    whole_units
        .checked_mul(scale)
        .and_then(|v| v.checked_add(fraction_units))
        .ok_or_else(overflow)
}

/// Check that `value` is a well-formed non-negative decimal amount and return
/// it in units of its own last fractional digit.
pub fn validate_decimal(value: &str) -> Result<u128> {
    let fraction_len = value
        .trim()
        .split_once('.')
        .map(|(_, fraction)| fraction.len())
        .unwrap_or(0);
    let decimals = u8::try_from(fraction_len)
        .ok()
        .filter(|d| *d <= MAX_DECIMALS)
        .ok_or_else(|| AgentError::InvalidInput(format!("amount '{}' is too precise", value)))?;
    parse_units(value, decimals)
}

/// Render base units as a decimal string with exactly `decimals` fractional digits.
pub fn format_units(value: u128, decimals: u8) -> String {
    if decimals == 0 {
        return value.to_string();
    }
    let decimals = decimals.min(MAX_DECIMALS);
    let scale = 10u128.pow(decimals as u32);
    format!(
        "{}.{:0width$}",
        value / scale,
        value % scale,
        width = decimals as usize
    )
}
