//! Common utility functions for tax and VAT calculations.
//!
//! Rounding to cents happens only when a result is projected for reporting;
//! the pipelines themselves carry full decimal precision.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(5873.745)), dec!(5873.75));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Clamps a value at zero from below.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::non_negative;
///
/// assert_eq!(non_negative(dec!(-3750)), dec!(0));
/// assert_eq!(non_negative(dec!(46250)), dec!(46250));
/// ```
pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// `value × percentage / 100`.
pub fn percent_of(
    value: Decimal,
    percentage: Decimal,
) -> Decimal {
    value * percentage / Decimal::ONE_HUNDRED
}

/// Formats a euro amount with thousands separators, dropping trailing zeros.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::format_euro;
///
/// assert_eq!(format_euro(dec!(2470)), "€2,470");
/// assert_eq!(format_euro(dec!(1234567.50)), "€1,234,567.5");
/// ```
pub fn format_euro(value: Decimal) -> String {
    let normalized = value.normalize();
    let digits = normalized.abs().to_string();
    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (digits.as_str(), None),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if normalized < Decimal::ZERO { "-" } else { "" };
    match fraction {
        Some(fraction) => format!("{sign}€{grouped}.{fraction}"),
        None => format!("{sign}€{grouped}"),
    }
}

/// Formats a percentage without trailing zeros, e.g. `12.7%`.
pub fn format_percentage(value: Decimal) -> String {
    format!("{}%", value.normalize())
}
