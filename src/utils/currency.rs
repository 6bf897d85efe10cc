use std::collections::HashMap;

use crate::error::{AppError, AppResult};

/// Currency metadata supplied by the embedding application.
///
/// The finalization arithmetic never consults this; adapters use it to turn
/// major-unit amounts into the integer minor units gateways expect.
pub trait CurrencyMetadata {
    /// Number of minor-unit digits for an ISO 4217 code, `None` if unknown.
    fn decimal_places(&self, code: &str) -> Option<u32>;

    fn is_supported(&self, code: &str) -> bool {
        self.decimal_places(code).is_some()
    }
}

impl CurrencyMetadata for HashMap<String, u32> {
    fn decimal_places(&self, code: &str) -> Option<u32> {
        self.get(&code.to_uppercase()).copied()
    }
}

/// Convert a major-unit amount (e.g. 12.34 INR) to minor units (1234 paise).
pub fn to_minor_units(
    amount: f64,
    currency: &str,
    metadata: &dyn CurrencyMetadata,
) -> AppResult<i64> {
    let places = metadata
        .decimal_places(currency)
        .ok_or_else(|| AppError::UnsupportedCurrency(currency.to_string()))?;

    if !amount.is_finite() {
        return Err(AppError::invalid_input("amount must be a finite number"));
    }

    let factor = 10f64.powi(places as i32);
    Ok((amount * factor).round() as i64)
}

/// Normalize and check the shape of an ISO 4217 currency code.
pub fn normalize_currency_code(code: &str) -> AppResult<String> {
    let code = code.trim().to_uppercase();

    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::invalid_input(format!(
            "currency must be a 3-letter ISO code, got '{}'",
            code
        )));
    }

    Ok(code)
}
