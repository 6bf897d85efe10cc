use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::utils::{is_valid_amount, to_amount, to_decimal, IdGenerator, MAX_AMOUNT};

/// Ordering matters: fixed discounts sort before percentage ones.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    #[default]
    Fixed,
    Percentage,
}

impl std::fmt::Display for DiscountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscountType::Fixed => write!(f, "fixed"),
            DiscountType::Percentage => write!(f, "percentage"),
        }
    }
}

/// One discount line attached to an invoice.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Discount {
    id: String,
    value: f64,
    amount: f64,
    description: String,
    #[serde(rename = "type")]
    kind: DiscountType,
}

/// Either an already-built discount or its serialized form.
#[derive(Debug, Clone)]
pub enum DiscountInput {
    Discount(Discount),
    Value(Value),
}

impl From<Discount> for DiscountInput {
    fn from(discount: Discount) -> Self {
        DiscountInput::Discount(discount)
    }
}

impl From<Value> for DiscountInput {
    fn from(value: Value) -> Self {
        DiscountInput::Value(value)
    }
}

#[derive(Debug, Deserialize, Validate)]
struct DiscountRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    value: Option<f64>,
    #[serde(default)]
    amount: Option<f64>,
    #[serde(default)]
    #[validate(length(max = 255, message = "Description too long"))]
    description: Option<String>,
    #[serde(default, rename = "type")]
    kind: DiscountType,
}

impl Discount {
    pub fn new(
        id: impl Into<String>,
        value: f64,
        kind: DiscountType,
        description: impl Into<String>,
    ) -> AppResult<Self> {
        validate_value(value)?;

        let amount = match kind {
            DiscountType::Fixed => value,
            DiscountType::Percentage => 0.0,
        };

        Ok(Self {
            id: id.into(),
            value,
            amount,
            description: description.into(),
            kind,
        })
    }

    pub fn fixed(id: impl Into<String>, value: f64) -> AppResult<Self> {
        Self::new(id, value, DiscountType::Fixed, "")
    }

    pub fn percentage(id: impl Into<String>, value: f64) -> AppResult<Self> {
        Self::new(id, value, DiscountType::Percentage, "")
    }

    /// Normalize an instance or a serialized map into a discount. Maps
    /// without an `id` get one from `ids`.
    pub fn from_value(input: impl Into<DiscountInput>, ids: &dyn IdGenerator) -> AppResult<Self> {
        let value = match input.into() {
            DiscountInput::Discount(discount) => return Ok(discount),
            DiscountInput::Value(value @ Value::Object(_)) => value,
            DiscountInput::Value(other) => {
                return Err(AppError::invalid_input(format!(
                    "discount must be a Discount or an object, got {}",
                    other
                )))
            }
        };

        let record: DiscountRecord = serde_json::from_value(value)
            .map_err(|e| AppError::invalid_input(format!("malformed discount: {}", e)))?;
        record.validate()?;

        let value = record
            .value
            .ok_or_else(|| AppError::invalid_input("discount value is required"))?;
        let id = match record.id {
            Some(id) if !id.is_empty() => id,
            _ => ids.next_id("disc"),
        };

        let mut discount =
            Self::new(id, value, record.kind, record.description.unwrap_or_default())?;
        if let Some(amount) = record.amount {
            discount.set_amount(amount);
        }

        Ok(discount)
    }

    pub fn to_value(&self) -> AppResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Reduction this discount contributes when applied to `base_amount`.
    ///
    /// Never negative and never more than the base, so a percentage above
    /// 100 takes the base to zero.
    pub fn calculate_discount(&self, base_amount: f64) -> f64 {
        to_amount(self.reduction(to_decimal(base_amount)))
    }

    pub(crate) fn reduction(&self, base: Decimal) -> Decimal {
        let cap = base.max(Decimal::ZERO);
        let value = to_decimal(self.value);

        match self.kind {
            DiscountType::Fixed => value.min(cap),
            DiscountType::Percentage => {
                let rate = value / Decimal::ONE_HUNDRED;
                // Overflow only happens far past the cap.
                base
                    .checked_mul(rate)
                    .unwrap_or(cap)
                    .max(Decimal::ZERO)
                    .min(cap)
            }
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn set_value(&mut self, value: f64) -> AppResult<()> {
        validate_value(value)?;
        self.value = value;
        if self.kind == DiscountType::Fixed {
            self.amount = value;
        }
        Ok(())
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn set_amount(&mut self, amount: f64) {
        self.amount = amount;
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn kind(&self) -> DiscountType {
        self.kind
    }
}

fn validate_value(value: f64) -> AppResult<()> {
    if !is_valid_amount(value) {
        return Err(AppError::invalid_input(format!(
            "discount value must be a finite number no larger than {}",
            MAX_AMOUNT
        )));
    }
    if value < 0.0 {
        return Err(AppError::invalid_input("discount value cannot be negative"));
    }
    Ok(())
}
