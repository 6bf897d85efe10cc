use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places every stored monetary amount is rounded to.
pub const AMOUNT_SCALE: u32 = 2;

/// Largest magnitude accepted for any monetary amount.
pub const MAX_AMOUNT: f64 = 1e15;

/// Finite and within [`MAX_AMOUNT`], so it converts to a `Decimal` losslessly.
pub fn is_valid_amount(value: f64) -> bool {
    value.is_finite() && value.abs() <= MAX_AMOUNT
}

/// Convert a caller-supplied float into its shortest decimal reading, so
/// `1.005` becomes exactly `1.005` rather than `1.00499999...`.
pub fn to_decimal(value: f64) -> Decimal {
    value
        .to_string()
        .parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_f64(value))
        .unwrap_or_default()
}

/// Convert back to the float representation exposed by the models, taking
/// the nearest float to the decimal text (`17.99` stays `17.99`).
///
/// Negative zero is normalized so serialized output never shows `-0.0`.
pub fn to_amount(value: Decimal) -> f64 {
    let amount = value
        .to_string()
        .parse::<f64>()
        .ok()
        .or_else(|| value.to_f64())
        .unwrap_or_default();
    if amount == 0.0 {
        0.0
    } else {
        amount
    }
}

/// Round to two decimal places, half away from zero.
pub fn round_decimal(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a major-unit amount to two decimal places, half away from zero.
pub fn round_amount(value: f64) -> f64 {
    to_amount(round_decimal(to_decimal(value)))
}

/// True when `value` already carries at most two decimal digits.
pub fn is_rounded(value: f64) -> bool {
    round_amount(value) == value
}
