use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use super::{Credit, CreditInput, Discount, DiscountInput, InvoiceStatus};
use crate::error::{AppError, AppResult};
use crate::utils::{
    is_valid_amount, normalize_currency_code, round_amount, round_decimal, to_amount, to_decimal,
    to_minor_units, CurrencyMetadata, IdGenerator, MAX_AMOUNT,
};

/// Invoices finalizing below this many major units are cancelled.
pub const DEFAULT_MINIMUM_AMOUNT: f64 = 0.50;

/// Billing address snapshot. The core never inspects it.
pub type Address = Map<String, Value>;

/// An invoice and its pricing state.
///
/// `amount` is the base price fixed at construction. Everything derived from
/// it (`gross_amount`, `discount_total`, `credits_used`) is recomputed by
/// [`Invoice::finalize`].
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    id: String,
    amount: f64,
    status: InvoiceStatus,
    currency: String,
    discounts: Vec<Discount>,
    credits: Vec<Credit>,
    address: Address,
    gross_amount: f64,
    tax_amount: f64,
    vat_amount: f64,
    credits_used: f64,
    credits_ids: Vec<String>,
    discount_total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_error: Option<String>,
    attempts: u32,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct InvoiceRecord {
    #[serde(default)]
    id: Option<String>,
    amount: f64,
    #[serde(default)]
    status: Option<String>,
    #[validate(length(equal = 3, message = "Currency must be 3 characters"))]
    currency: String,
    #[serde(default)]
    discounts: Vec<Value>,
    #[serde(default)]
    credits: Vec<Value>,
    #[serde(default)]
    address: Option<Address>,
    #[serde(default)]
    gross_amount: Option<f64>,
    #[serde(default)]
    tax_amount: f64,
    #[serde(default)]
    vat_amount: f64,
    #[serde(default)]
    credits_used: f64,
    #[serde(default)]
    credits_ids: Vec<String>,
    #[serde(default)]
    discount_total: f64,
    #[serde(default)]
    last_error: Option<String>,
    #[serde(default)]
    attempts: u32,
}

impl Invoice {
    /// A fresh draft. `gross_amount` defaults to the rounded base amount and
    /// every other derived amount starts at 0.
    pub fn new(id: impl Into<String>, amount: f64, currency: &str) -> AppResult<Self> {
        ensure_finite(amount, "amount")?;

        Ok(Self {
            id: id.into(),
            amount,
            status: InvoiceStatus::Draft,
            currency: normalize_currency_code(currency)?,
            discounts: Vec::new(),
            credits: Vec::new(),
            address: Address::new(),
            gross_amount: round_amount(amount),
            tax_amount: 0.0,
            vat_amount: 0.0,
            credits_used: 0.0,
            credits_ids: Vec::new(),
            discount_total: 0.0,
            last_error: None,
            attempts: 0,
        })
    }

    /// Rebuild an invoice from its serialized (camelCase) form.
    pub fn from_value(value: Value, ids: &dyn IdGenerator) -> AppResult<Self> {
        let record: InvoiceRecord = serde_json::from_value(value)
            .map_err(|e| AppError::invalid_input(format!("malformed invoice: {}", e)))?;
        record.validate()?;

        let id = match record.id {
            Some(id) if !id.is_empty() => id,
            _ => ids.next_id("inv"),
        };

        let mut invoice = Self::new(id, record.amount, &record.currency)?;
        if let Some(status) = record.status {
            invoice.status = status.parse().map_err(AppError::InvalidInput)?;
        }
        invoice.set_discounts(record.discounts, ids)?;
        invoice.set_credits(record.credits, ids)?;
        invoice.address = record.address.unwrap_or_default();
        // Absent grossAmount keeps the base-amount default from `new`.
        if let Some(gross_amount) = record.gross_amount {
            invoice.set_gross_amount(gross_amount)?;
        }
        invoice.set_tax_amount(record.tax_amount)?;
        invoice.set_vat_amount(record.vat_amount)?;
        ensure_finite(record.credits_used, "creditsUsed")?;
        invoice.credits_used = round_amount(record.credits_used);
        invoice.credits_ids = record.credits_ids;
        ensure_finite(record.discount_total, "discountTotal")?;
        invoice.discount_total = round_amount(record.discount_total);
        invoice.last_error = record.last_error;
        invoice.attempts = record.attempts;

        Ok(invoice)
    }

    pub fn from_json(json: &str, ids: &dyn IdGenerator) -> AppResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value, ids)
    }

    pub fn to_value(&self) -> AppResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Apply discounts to the current gross amount, fixed before percentage.
    ///
    /// `discount_total` is replaced, not accumulated.
    pub fn apply_discounts(&mut self) {
        self.discounts.sort_by_key(|discount| discount.kind());

        let mut running = to_decimal(self.gross_amount);
        let mut total = Decimal::ZERO;

        for discount in &self.discounts {
            if running <= Decimal::ZERO {
                break;
            }

            let reduction = discount.reduction(running);
            if reduction <= Decimal::ZERO {
                continue;
            }

            running -= reduction;
            total += reduction;
        }

        self.gross_amount = to_amount(round_decimal(running));
        self.discount_total = to_amount(round_decimal(total));

        tracing::debug!(
            invoice_id = %self.id,
            gross_amount = self.gross_amount,
            discount_total = self.discount_total,
            "Discounts applied"
        );
    }

    /// Consume credits, in list order, against the current gross amount.
    ///
    /// Every visited credit is recorded in `credits_ids`, even when it
    /// contributed nothing.
    pub fn apply_credits(&mut self) {
        let mut running = to_decimal(self.gross_amount);
        let mut total = Decimal::ZERO;
        let mut touched = Vec::new();

        for credit in &mut self.credits {
            if running.is_zero() {
                break;
            }

            let consumed = credit.consume(running);
            running -= consumed;
            total += consumed;
            touched.push(credit.id().to_string());
        }

        self.gross_amount = to_amount(round_decimal(running));
        self.credits_used = to_amount(round_decimal(total));
        self.credits_ids = touched;

        tracing::debug!(
            invoice_id = %self.id,
            gross_amount = self.gross_amount,
            credits_used = self.credits_used,
            credits = ?self.credits_ids,
            "Credits applied"
        );
    }

    /// Price the invoice with the default minimum chargeable amount.
    pub fn finalize(&mut self) {
        self.finalize_with_minimum(DEFAULT_MINIMUM_AMOUNT);
    }

    /// Derive gross amount and status: discounts, then tax and VAT, then
    /// credits. Starts over from the base amount on every call, but credit
    /// balances consumed by a previous call stay consumed.
    pub fn finalize_with_minimum(&mut self, minimum_amount: f64) {
        self.gross_amount = round_amount(self.amount);

        self.apply_discounts();

        let tax = round_decimal(to_decimal(self.tax_amount));
        let vat = round_decimal(to_decimal(self.vat_amount));
        self.tax_amount = to_amount(tax);
        self.vat_amount = to_amount(vat);
        self.gross_amount = to_amount(round_decimal(to_decimal(self.gross_amount) + tax + vat));

        self.apply_credits();

        self.status = if self.gross_amount == 0.0 {
            InvoiceStatus::Succeeded
        } else if self.gross_amount < minimum_amount {
            InvoiceStatus::Cancelled
        } else {
            InvoiceStatus::Due
        };

        tracing::info!(
            invoice_id = %self.id,
            amount = self.amount,
            gross_amount = self.gross_amount,
            currency = %self.currency,
            status = %self.status,
            "Invoice finalized"
        );
    }

    // Status

    pub fn can_transition_to(&self, target: InvoiceStatus) -> bool {
        self.status.can_transition_to(target)
    }

    /// Move to `target` only if the transition table allows it.
    pub fn try_transition(&mut self, target: InvoiceStatus) -> AppResult<()> {
        if !self.can_transition_to(target) {
            return Err(AppError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        Ok(())
    }

    /// Overwrite the status without consulting the transition table.
    pub fn set_status(&mut self, status: InvoiceStatus) {
        self.status = status;
    }

    pub fn mark_as_due(&mut self) {
        self.status = InvoiceStatus::Due;
    }

    /// Records a new payment attempt.
    pub fn mark_as_processing(&mut self) {
        self.attempts += 1;
        self.status = InvoiceStatus::Processing;
    }

    pub fn mark_as_requires_auth(&mut self) {
        self.status = InvoiceStatus::RequiresAuth;
    }

    pub fn mark_as_failed(&mut self, reason: impl Into<String>) {
        self.last_error = Some(reason.into());
        self.status = InvoiceStatus::Failed;
    }

    pub fn mark_as_succeeded(&mut self) {
        self.status = InvoiceStatus::Succeeded;
    }

    pub fn mark_as_disputed(&mut self) {
        self.status = InvoiceStatus::Disputed;
    }

    pub fn mark_as_cancelled(&mut self) {
        self.status = InvoiceStatus::Cancelled;
    }

    pub fn mark_as_abandoned(&mut self) {
        self.status = InvoiceStatus::Abandoned;
    }

    pub fn mark_as_refunded(&mut self) {
        self.status = InvoiceStatus::Refunded;
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Succeeded
    }

    /// True while the customer still owes money on this invoice.
    pub fn requires_payment(&self) -> bool {
        matches!(self.status, InvoiceStatus::Due | InvoiceStatus::Failed) && self.gross_amount > 0.0
    }

    // Discounts

    pub fn discounts(&self) -> &[Discount] {
        &self.discounts
    }

    pub fn discount(&self, id: &str) -> Option<&Discount> {
        self.discounts.iter().find(|discount| discount.id() == id)
    }

    pub fn add_discount(&mut self, discount: Discount) -> AppResult<()> {
        if self.discount(discount.id()).is_some() {
            return Err(AppError::invalid_input(format!(
                "discount {} is already attached",
                discount.id()
            )));
        }
        self.discounts.push(discount);
        Ok(())
    }

    pub fn remove_discount(&mut self, id: &str) -> Option<Discount> {
        let index = self.discounts.iter().position(|discount| discount.id() == id)?;
        Some(self.discounts.remove(index))
    }

    /// Replace all discounts. Nothing changes if any entry is rejected.
    pub fn set_discounts<I, T>(&mut self, inputs: I, ids: &dyn IdGenerator) -> AppResult<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<DiscountInput>,
    {
        let mut discounts: Vec<Discount> = Vec::new();
        for input in inputs {
            let discount = Discount::from_value(input, ids)?;
            if discounts.iter().any(|existing| existing.id() == discount.id()) {
                return Err(AppError::invalid_input(format!(
                    "duplicate discount id {}",
                    discount.id()
                )));
            }
            discounts.push(discount);
        }
        self.discounts = discounts;
        Ok(())
    }

    // Credits

    pub fn credits(&self) -> &[Credit] {
        &self.credits
    }

    pub fn credit(&self, id: &str) -> Option<&Credit> {
        self.credits.iter().find(|credit| credit.id() == id)
    }

    pub fn add_credit(&mut self, credit: Credit) -> AppResult<()> {
        if self.credit(credit.id()).is_some() {
            return Err(AppError::invalid_input(format!(
                "credit {} is already attached",
                credit.id()
            )));
        }
        self.credits.push(credit);
        Ok(())
    }

    pub fn remove_credit(&mut self, id: &str) -> Option<Credit> {
        let index = self.credits.iter().position(|credit| credit.id() == id)?;
        Some(self.credits.remove(index))
    }

    /// Replace all credits. Nothing changes if any entry is rejected.
    pub fn set_credits<I, T>(&mut self, inputs: I, ids: &dyn IdGenerator) -> AppResult<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<CreditInput>,
    {
        let mut credits: Vec<Credit> = Vec::new();
        for input in inputs {
            let credit = Credit::from_value(input, ids)?;
            if credits.iter().any(|existing| existing.id() == credit.id()) {
                return Err(AppError::invalid_input(format!(
                    "duplicate credit id {}",
                    credit.id()
                )));
            }
            credits.push(credit);
        }
        self.credits = credits;
        Ok(())
    }

    // Accessors

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn set_address(&mut self, address: Address) {
        self.address = address;
    }

    pub fn gross_amount(&self) -> f64 {
        self.gross_amount
    }

    /// Gross amount in the currency's minor units, as gateways expect it.
    pub fn gross_amount_minor(&self, metadata: &dyn CurrencyMetadata) -> AppResult<i64> {
        to_minor_units(self.gross_amount, &self.currency, metadata)
    }

    pub fn set_gross_amount(&mut self, gross_amount: f64) -> AppResult<()> {
        ensure_finite(gross_amount, "grossAmount")?;
        self.gross_amount = round_amount(gross_amount);
        Ok(())
    }

    pub fn tax_amount(&self) -> f64 {
        self.tax_amount
    }

    pub fn set_tax_amount(&mut self, tax_amount: f64) -> AppResult<()> {
        ensure_finite(tax_amount, "taxAmount")?;
        self.tax_amount = round_amount(tax_amount);
        Ok(())
    }

    pub fn vat_amount(&self) -> f64 {
        self.vat_amount
    }

    pub fn set_vat_amount(&mut self, vat_amount: f64) -> AppResult<()> {
        ensure_finite(vat_amount, "vatAmount")?;
        self.vat_amount = round_amount(vat_amount);
        Ok(())
    }

    pub fn credits_used(&self) -> f64 {
        self.credits_used
    }

    pub fn credits_ids(&self) -> &[String] {
        &self.credits_ids
    }

    pub fn discount_total(&self) -> f64 {
        self.discount_total
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

fn ensure_finite(value: f64, field: &str) -> AppResult<()> {
    if !is_valid_amount(value) {
        return Err(AppError::invalid_input(format!(
            "{} must be a finite number no larger than {}",
            field, MAX_AMOUNT
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;
    use crate::models::{CreditStatus, DiscountType};
    use crate::utils::SequentialIdGenerator;

    fn invoice(amount: f64) -> Invoice {
        Invoice::new("inv_1", amount, "usd").unwrap()
    }

    #[test]
    fn test_new_invoice_defaults() {
        let invoice = invoice(19.999);

        assert_eq!(invoice.status(), InvoiceStatus::Draft);
        assert_eq!(invoice.currency(), "USD");
        assert_eq!(invoice.gross_amount(), 20.0);
        assert_eq!(invoice.discount_total(), 0.0);
        assert!(invoice.credits_ids().is_empty());
        assert_eq!(invoice.attempts(), 0);
    }

    #[test]
    fn test_fixed_discounts_apply_before_percentage() {
        let mut invoice = invoice(100.0);
        invoice.add_discount(Discount::percentage("pct", 10.0).unwrap()).unwrap();
        invoice.add_discount(Discount::fixed("fix", 20.0).unwrap()).unwrap();

        invoice.apply_discounts();

        // 100 - 20 = 80, then 10% of 80
        assert_eq!(invoice.gross_amount(), 72.0);
        assert_eq!(invoice.discount_total(), 28.0);
        let order: Vec<_> = invoice.discounts().iter().map(|d| d.kind()).collect();
        assert_eq!(order, vec![DiscountType::Fixed, DiscountType::Percentage]);
    }

    #[test]
    fn test_discount_sort_is_stable() {
        let mut invoice = invoice(100.0);
        invoice.add_discount(Discount::percentage("p1", 5.0).unwrap()).unwrap();
        invoice.add_discount(Discount::fixed("f1", 1.0).unwrap()).unwrap();
        invoice.add_discount(Discount::percentage("p2", 5.0).unwrap()).unwrap();
        invoice.add_discount(Discount::fixed("f2", 1.0).unwrap()).unwrap();

        invoice.apply_discounts();

        let ids: Vec<_> = invoice.discounts().iter().map(|d| d.id()).collect();
        assert_eq!(ids, vec!["f1", "f2", "p1", "p2"]);
    }

    #[test]
    fn test_discounts_stop_at_zero() {
        let mut invoice = invoice(30.0);
        invoice.add_discount(Discount::fixed("f1", 50.0).unwrap()).unwrap();
        invoice.add_discount(Discount::fixed("f2", 10.0).unwrap()).unwrap();

        invoice.apply_discounts();

        assert_eq!(invoice.gross_amount(), 0.0);
        assert_eq!(invoice.discount_total(), 30.0);
    }

    #[test]
    fn test_zero_discounts_are_skipped() {
        let mut invoice = invoice(40.0);
        invoice.add_discount(Discount::fixed("zero", 0.0).unwrap()).unwrap();
        invoice.add_discount(Discount::percentage("half", 50.0).unwrap()).unwrap();

        invoice.apply_discounts();

        assert_eq!(invoice.gross_amount(), 20.0);
        assert_eq!(invoice.discount_total(), 20.0);
    }

    #[test]
    fn test_discount_total_is_not_cumulative() {
        let mut invoice = invoice(100.0);
        invoice.add_discount(Discount::fixed("f1", 10.0).unwrap()).unwrap();

        invoice.apply_discounts();
        invoice.apply_discounts();

        assert_eq!(invoice.gross_amount(), 80.0);
        assert_eq!(invoice.discount_total(), 10.0);
    }

    #[test]
    fn test_percentage_discount_rounds_to_cents() {
        let mut invoice = invoice(19.99);
        invoice.add_discount(Discount::percentage("p", 10.0).unwrap()).unwrap();

        invoice.apply_discounts();

        // 19.99 - 1.999
        assert_eq!(invoice.gross_amount(), 17.99);
        assert_eq!(invoice.discount_total(), 2.0);
    }

    #[test]
    fn test_credits_record_every_visited_credit() {
        let mut invoice = invoice(30.0);
        invoice.add_credit(Credit::new("empty", 0.0).unwrap()).unwrap();
        invoice.add_credit(Credit::new("c1", 20.0).unwrap()).unwrap();
        invoice.add_credit(Credit::new("c2", 20.0).unwrap()).unwrap();
        invoice.add_credit(Credit::new("unused", 20.0).unwrap()).unwrap();

        invoice.apply_credits();

        assert_eq!(invoice.gross_amount(), 0.0);
        assert_eq!(invoice.credits_used(), 30.0);
        assert_eq!(invoice.credits_ids(), ["empty", "c1", "c2"]);
        assert_eq!(invoice.credit("empty").unwrap().status(), CreditStatus::Applied);
        assert_eq!(invoice.credit("c2").unwrap().credits(), 10.0);
        assert_eq!(invoice.credit("unused").unwrap().credits(), 20.0);
    }

    #[test]
    fn test_credits_ids_reflect_latest_pass() {
        let mut invoice = invoice(10.0);
        invoice.add_credit(Credit::new("c1", 5.0).unwrap()).unwrap();

        invoice.apply_credits();
        invoice.apply_credits();

        assert_eq!(invoice.credits_ids(), ["c1"]);
        assert_eq!(invoice.credits_used(), 0.0);
        assert_eq!(invoice.gross_amount(), 5.0);
    }

    #[test]
    fn test_finalize_adds_tax_and_vat_after_discounts() {
        let mut invoice = invoice(100.0);
        invoice.add_discount(Discount::percentage("p", 10.0).unwrap()).unwrap();
        invoice.set_tax_amount(9.004).unwrap();
        invoice.set_vat_amount(4.5).unwrap();
        invoice.add_credit(Credit::new("c", 3.5).unwrap()).unwrap();

        invoice.finalize();

        // 90 + 9 + 4.5 - 3.5
        assert_eq!(invoice.tax_amount(), 9.0);
        assert_eq!(invoice.gross_amount(), 100.0);
        assert_eq!(invoice.discount_total(), 10.0);
        assert_eq!(invoice.credits_used(), 3.5);
        assert_eq!(invoice.status(), InvoiceStatus::Due);
    }

    #[test]
    fn test_finalize_restarts_from_base_amount() {
        let mut invoice = invoice(80.0);
        invoice.add_discount(Discount::fixed("f", 30.0).unwrap()).unwrap();
        invoice.set_gross_amount(5.0).unwrap();

        invoice.finalize();
        invoice.finalize();

        assert_eq!(invoice.gross_amount(), 50.0);
        assert_eq!(invoice.discount_total(), 30.0);
    }

    #[test]
    fn test_finalize_negative_amount_is_cancelled() {
        let mut invoice = invoice(-25.0);
        invoice.add_credit(Credit::new("c", 10.0).unwrap()).unwrap();

        invoice.finalize();

        assert_eq!(invoice.gross_amount(), -25.0);
        assert_eq!(invoice.credits_used(), 0.0);
        assert_eq!(invoice.status(), InvoiceStatus::Cancelled);
    }

    #[test]
    fn test_finalize_with_custom_minimum() {
        let mut invoice = invoice(0.75);
        invoice.finalize_with_minimum(1.0);
        assert_eq!(invoice.status(), InvoiceStatus::Cancelled);

        invoice.finalize();
        assert_eq!(invoice.status(), InvoiceStatus::Due);
    }

    #[test]
    fn test_mutators_bypass_transition_table() {
        let mut invoice = invoice(10.0);
        invoice.mark_as_refunded();
        assert!(invoice.is_terminal());

        invoice.mark_as_abandoned();
        assert_eq!(invoice.status(), InvoiceStatus::Abandoned);
    }

    #[test]
    fn test_try_transition_consults_table() {
        let mut invoice = invoice(10.0);

        assert!(invoice.try_transition(InvoiceStatus::Processing).is_err());
        assert_eq!(invoice.status(), InvoiceStatus::Draft);

        invoice.try_transition(InvoiceStatus::Due).unwrap();
        invoice.try_transition(InvoiceStatus::Processing).unwrap();
        invoice.try_transition(InvoiceStatus::Succeeded).unwrap();
        invoice.try_transition(InvoiceStatus::Refunded).unwrap();

        let err = invoice.try_transition(InvoiceStatus::Due).unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidTransition {
                from: InvoiceStatus::Refunded,
                to: InvoiceStatus::Due
            }
        ));
    }

    #[test]
    fn test_payment_attempt_metadata() {
        let mut invoice = invoice(10.0);
        invoice.finalize();
        assert!(invoice.requires_payment());

        invoice.mark_as_processing();
        invoice.mark_as_failed("card_declined");
        invoice.mark_as_processing();

        assert_eq!(invoice.attempts(), 2);
        assert_eq!(invoice.last_error(), Some("card_declined"));

        invoice.mark_as_succeeded();
        assert!(invoice.is_paid());
        assert!(!invoice.requires_payment());
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let mut invoice = invoice(10.0);
        invoice.add_discount(Discount::fixed("d", 1.0).unwrap()).unwrap();
        assert!(invoice.add_discount(Discount::fixed("d", 2.0).unwrap()).is_err());

        invoice.add_credit(Credit::new("c", 1.0).unwrap()).unwrap();
        assert!(invoice.add_credit(Credit::new("c", 2.0).unwrap()).is_err());
    }

    #[test]
    fn test_set_discounts_is_all_or_nothing() {
        let ids = SequentialIdGenerator::new();
        let mut invoice = invoice(10.0);
        invoice.add_discount(Discount::fixed("keep", 1.0).unwrap()).unwrap();

        let result = invoice.set_discounts(
            vec![json!({"value": 2, "type": "fixed"}), json!("not a discount")],
            &ids,
        );

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert_eq!(invoice.discounts().len(), 1);
        assert_eq!(invoice.discounts()[0].id(), "keep");
    }

    #[test]
    fn test_set_credits_from_mixed_inputs() {
        let ids = SequentialIdGenerator::new();
        let mut invoice = invoice(10.0);

        invoice
            .set_credits(
                vec![
                    CreditInput::from(Credit::new("c1", 4.0).unwrap()),
                    CreditInput::from(json!({"credits": 6})),
                ],
                &ids,
            )
            .unwrap();

        let ids: Vec<_> = invoice.credits().iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec!["c1", "cred_1"]);
    }

    #[test]
    fn test_remove_entries() {
        let mut invoice = invoice(10.0);
        invoice.add_discount(Discount::fixed("d", 1.0).unwrap()).unwrap();
        invoice.add_credit(Credit::new("c", 1.0).unwrap()).unwrap();

        assert_eq!(invoice.remove_discount("d").map(|d| d.value()), Some(1.0));
        assert!(invoice.remove_discount("d").is_none());
        assert!(invoice.remove_credit("c").is_some());
        assert!(invoice.credits().is_empty());
    }

    #[test]
    fn test_serialized_field_names() {
        let mut invoice = invoice(12.5);
        invoice.add_discount(Discount::fixed("d", 2.5).unwrap()).unwrap();
        invoice.add_credit(Credit::new("c", 5.0).unwrap()).unwrap();
        invoice.finalize();

        let value = invoice.to_value().unwrap();

        assert_eq!(value["grossAmount"], json!(5.0));
        assert_eq!(value["discountTotal"], json!(2.5));
        assert_eq!(value["creditsUsed"], json!(5.0));
        assert_eq!(value["creditsIds"], json!(["c"]));
        assert_eq!(value["taxAmount"], json!(0.0));
        assert_eq!(value["status"], json!("due"));
        assert_eq!(value["discounts"][0]["type"], json!("fixed"));
        assert_eq!(value["credits"][0]["creditsUsed"], json!(5.0));
        assert!(value.get("lastError").is_none());
    }

    #[test]
    fn test_rebuild_from_serialized_form() {
        let ids = SequentialIdGenerator::new();
        let mut original = invoice(99.99);
        original.add_discount(Discount::percentage("p", 20.0).unwrap()).unwrap();
        original.add_credit(Credit::new("c", 10.0).unwrap()).unwrap();
        original.set_tax_amount(8.0).unwrap();
        original
            .set_address(json!({"city": "Pune"}).as_object().cloned().unwrap());
        original.finalize();
        original.mark_as_failed("insufficient_funds");

        let rebuilt = Invoice::from_value(original.to_value().unwrap(), &ids).unwrap();

        assert_eq!(rebuilt, original);
    }

    #[test]
    fn test_from_value_defaults_and_validation() {
        let ids = SequentialIdGenerator::new();

        let invoice = Invoice::from_value(json!({"amount": 10, "currency": "inr"}), &ids).unwrap();
        assert_eq!(invoice.id(), "inv_1");
        assert_eq!(invoice.currency(), "INR");
        assert_eq!(invoice.gross_amount(), 10.0);
        assert_eq!(invoice.status(), InvoiceStatus::Draft);

        assert!(Invoice::from_value(json!({"currency": "INR"}), &ids).is_err());
        assert!(Invoice::from_value(json!({"amount": 1, "currency": "RUPEE"}), &ids).is_err());
        assert!(Invoice::from_value(
            json!({"amount": 1, "currency": "INR", "status": "settled"}),
            &ids
        )
        .is_err());
        assert!(Invoice::from_value(
            json!({"amount": 1, "currency": "INR", "discounts": [{"value": -3}]}),
            &ids
        )
        .is_err());
    }

    #[test]
    fn test_from_json_reports_syntax_errors() {
        let ids = SequentialIdGenerator::new();
        assert!(matches!(
            Invoice::from_json("{not json", &ids),
            Err(AppError::Serialization(_))
        ));
    }

    #[test]
    fn test_gross_amount_minor_units() {
        let meta = HashMap::from([("USD".to_string(), 2u32)]);
        let mut invoice = invoice(10.0);
        invoice.set_tax_amount(0.35).unwrap();
        invoice.finalize();

        assert_eq!(invoice.gross_amount_minor(&meta).unwrap(), 1035);
    }

    #[test]
    fn test_setters_round_midpoints_away_from_zero() {
        let mut invoice = invoice(10.0);
        invoice.set_tax_amount(1.005).unwrap();
        invoice.set_vat_amount(2.675).unwrap();
        assert_eq!(invoice.tax_amount(), 1.01);
        assert_eq!(invoice.vat_amount(), 2.68);

        invoice.finalize();
        assert_eq!(invoice.gross_amount(), 13.69);
    }

    #[test]
    fn test_split_credits_settle_exactly() {
        let mut invoice = invoice(0.3);
        for id in ["c1", "c2", "c3"] {
            invoice.add_credit(Credit::new(id, 0.1).unwrap()).unwrap();
        }

        invoice.finalize();

        assert_eq!(invoice.gross_amount(), 0.0);
        assert_eq!(invoice.credits_used(), 0.3);
        assert_eq!(invoice.status(), InvoiceStatus::Succeeded);
        for credit in invoice.credits() {
            assert_eq!(credit.credits(), 0.0);
            assert_eq!(credit.status(), CreditStatus::Applied);
            assert!(!credit.has_available_credits());
        }
    }

    #[test]
    fn test_percentage_above_hundred_zeroes_the_invoice() {
        let mut invoice = invoice(40.0);
        invoice.add_discount(Discount::percentage("p", 150.0).unwrap()).unwrap();

        invoice.finalize();

        assert_eq!(invoice.discount_total(), 40.0);
        assert_eq!(invoice.gross_amount(), 0.0);
        assert_eq!(invoice.status(), InvoiceStatus::Succeeded);
    }

    #[test]
    fn test_non_finite_amounts_are_rejected() {
        assert!(Invoice::new("inv", f64::NAN, "USD").is_err());
        let mut invoice = invoice(1.0);
        assert!(invoice.set_tax_amount(f64::INFINITY).is_err());
        assert!(invoice.set_vat_amount(1e300).is_err());
    }
}
