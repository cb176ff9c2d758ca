//! Conversion between display amounts and raw base units.
//!
//! Display amounts are parsed as decimal strings so that `"0.1"` with nine
//! decimals is exactly `100_000_000` base units, with no float rounding.

use crate::codec::MAX_DECIMALS;
use crate::error::{EncodingError, TokenError};

/// Scale a display amount such as `"12.5"` to raw base units.
///
/// Rejects signs, exponents, empty input and more fractional digits than
/// `decimals`. Results above `u64::MAX` fail with `Overflow`.
pub fn to_base_units(ui_amount: &str, decimals: u8) -> Result<u64, TokenError> {
    check_decimals(decimals)?;

    let text = ui_amount.trim();
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (text, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(TokenError::invalid_parameter(format!(
            "amount {ui_amount:?} has no digits"
        )));
    }
    if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(TokenError::invalid_parameter(format!(
            "amount {ui_amount:?} is not a plain decimal number"
        )));
    }
    if fraction.len() > decimals as usize {
        return Err(TokenError::invalid_parameter(format!(
            "amount {ui_amount:?} has more than {decimals} fractional digits"
        )));
    }

    let overflow = || TokenError::from(EncodingError::Overflow { field: "amount" });
    let scale = 10u128.pow(decimals as u32);

    let whole_units = digits_to_u128(whole).ok_or_else(overflow)?;
    let fraction_units = digits_to_u128(fraction).ok_or_else(overflow)?
        * 10u128.pow((decimals as usize - fraction.len()) as u32);

    let raw = whole_units
        .checked_mul(scale)
        .and_then(|v| v.checked_add(fraction_units))
        .ok_or_else(overflow)?;

    u64::try_from(raw).map_err(|_| overflow())
}

/// Render raw base units as a display amount, trimming trailing zeros.
pub fn from_base_units(raw: u64, decimals: u8) -> Result<String, TokenError> {
    check_decimals(decimals)?;

    if decimals == 0 {
        return Ok(raw.to_string());
    }

    let scale = 10u64.pow(decimals as u32);
    let whole = raw / scale;
    let fraction = raw % scale;
    if fraction == 0 {
        return Ok(whole.to_string());
    }

    let digits = format!("{fraction:0width$}", width = decimals as usize);
    Ok(format!("{whole}.{}", digits.trim_end_matches('0')))
}

fn check_decimals(decimals: u8) -> Result<(), TokenError> {
    if decimals > MAX_DECIMALS {
        return Err(TokenError::invalid_parameter(format!(
            "decimals must be 0..={MAX_DECIMALS}, got {decimals}"
        )));
    }
    Ok(())
}

/// `None` on overflow. An empty string is zero.
fn digits_to_u128(digits: &str) -> Option<u128> {
    digits.bytes().try_fold(0u128, |acc, b| {
        acc.checked_mul(10)?.checked_add(u128::from(b - b'0'))
    })
}
