use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::utils::{is_valid_amount, round_amount, round_decimal, to_amount, to_decimal, IdGenerator};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum CreditStatus {
    #[default]
    Active,
    Applied,
    Expired,
}

/// A pool of pre-existing balance that can be consumed against invoices.
///
/// Balances are held in whole cents, and `credits + credits_used` stays
/// constant across [`Credit::use_credits`].
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Credit {
    id: String,
    credits: f64,
    credits_used: f64,
    status: CreditStatus,
}

/// Either an already-built credit or its serialized form.
#[derive(Debug, Clone)]
pub enum CreditInput {
    Credit(Credit),
    Value(Value),
}

impl From<Credit> for CreditInput {
    fn from(credit: Credit) -> Self {
        CreditInput::Credit(credit)
    }
}

impl From<Value> for CreditInput {
    fn from(value: Value) -> Self {
        CreditInput::Value(value)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreditRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    credits: Option<f64>,
    #[serde(default)]
    credits_used: Option<f64>,
    #[serde(default)]
    status: Option<CreditStatus>,
}

impl Credit {
    pub fn new(id: impl Into<String>, credits: f64) -> AppResult<Self> {
        validate_balance(credits, "credits")?;

        Ok(Self {
            id: id.into(),
            credits: round_amount(credits),
            credits_used: 0.0,
            status: CreditStatus::Active,
        })
    }

    /// Normalize an instance or a serialized map into a credit. Maps without
    /// an `id` get one from `ids`.
    pub fn from_value(input: impl Into<CreditInput>, ids: &dyn IdGenerator) -> AppResult<Self> {
        let value = match input.into() {
            CreditInput::Credit(credit) => return Ok(credit),
            CreditInput::Value(value @ Value::Object(_)) => value,
            CreditInput::Value(other) => {
                return Err(AppError::invalid_input(format!(
                    "credit must be a Credit or an object, got {}",
                    other
                )))
            }
        };

        let record: CreditRecord = serde_json::from_value(value)
            .map_err(|e| AppError::invalid_input(format!("malformed credit: {}", e)))?;

        let credits = record
            .credits
            .ok_or_else(|| AppError::invalid_input("credit balance is required"))?;
        let credits_used = record.credits_used.unwrap_or(0.0);
        validate_balance(credits_used, "creditsUsed")?;

        let id = match record.id {
            Some(id) if !id.is_empty() => id,
            _ => ids.next_id("cred"),
        };

        let mut credit = Self::new(id, credits)?;
        credit.credits_used = round_amount(credits_used);
        if let Some(status) = record.status {
            credit.status = status;
        }

        Ok(credit)
    }

    pub fn to_value(&self) -> AppResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Consume up to `amount` (rounded to cents) from the balance and return
    /// what was consumed.
    ///
    /// An exhausted credit is marked applied and contributes nothing.
    pub fn use_credits(&mut self, amount: f64) -> f64 {
        to_amount(self.consume(to_decimal(amount)))
    }

    pub(crate) fn consume(&mut self, amount: Decimal) -> Decimal {
        let requested = round_decimal(amount);
        if requested <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let balance = to_decimal(self.credits);
        if balance <= Decimal::ZERO {
            self.status = CreditStatus::Applied;
            return Decimal::ZERO;
        }

        let used = requested.min(balance);
        let remaining = balance - used;
        self.credits = to_amount(remaining);
        self.credits_used = to_amount(to_decimal(self.credits_used) + used);

        if remaining.is_zero() {
            self.status = CreditStatus::Applied;
        }

        used
    }

    pub fn has_available_credits(&self) -> bool {
        self.credits > 0.0
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn credits(&self) -> f64 {
        self.credits
    }

    /// Overwrite the remaining balance. Status is left untouched.
    pub fn set_credits(&mut self, credits: f64) -> AppResult<()> {
        validate_balance(credits, "credits")?;
        self.credits = round_amount(credits);
        Ok(())
    }

    pub fn credits_used(&self) -> f64 {
        self.credits_used
    }

    pub fn status(&self) -> CreditStatus {
        self.status
    }

    pub fn set_status(&mut self, status: CreditStatus) {
        self.status = status;
    }
}

fn validate_balance(value: f64, field: &str) -> AppResult<()> {
    if !is_valid_amount(value) || value < 0.0 {
        return Err(AppError::invalid_input(format!(
            "{} must be a non-negative number",
            field
        )));
    }
    Ok(())
}
