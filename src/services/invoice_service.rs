use std::sync::Arc;

use serde_json::Value;

use crate::config::InvoicingConfig;
use crate::error::{AppError, AppResult};
use crate::models::{Credit, Discount, DiscountType, Invoice, InvoiceStatus};
use crate::utils::{IdGenerator, UuidGenerator};

/// Assembles and prices invoices with the configured minimum amount and
/// default currency.
pub struct InvoiceService {
    config: InvoicingConfig,
    ids: Arc<dyn IdGenerator>,
}

impl InvoiceService {
    pub fn new(config: &InvoicingConfig) -> Self {
        Self::with_id_generator(config, Arc::new(UuidGenerator))
    }

    pub fn with_id_generator(config: &InvoicingConfig, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            config: config.clone(),
            ids,
        }
    }

    pub fn config(&self) -> &InvoicingConfig {
        &self.config
    }

    pub fn create_invoice(&self, amount: f64, currency: Option<&str>) -> AppResult<Invoice> {
        let currency = currency.unwrap_or(self.config.default_currency.as_str());
        Invoice::new(self.ids.next_id("inv"), amount, currency).map_err(log_rejected)
    }

    pub fn fixed_discount(&self, value: f64, description: &str) -> AppResult<Discount> {
        Discount::new(self.ids.next_id("disc"), value, DiscountType::Fixed, description)
            .map_err(log_rejected)
    }

    pub fn percentage_discount(&self, value: f64, description: &str) -> AppResult<Discount> {
        Discount::new(self.ids.next_id("disc"), value, DiscountType::Percentage, description)
            .map_err(log_rejected)
    }

    pub fn credit(&self, balance: f64) -> AppResult<Credit> {
        Credit::new(self.ids.next_id("cred"), balance).map_err(log_rejected)
    }

    pub fn invoice_from_value(&self, value: Value) -> AppResult<Invoice> {
        Invoice::from_value(value, self.ids.as_ref()).map_err(log_rejected)
    }

    pub fn invoice_from_json(&self, json: &str) -> AppResult<Invoice> {
        Invoice::from_json(json, self.ids.as_ref()).map_err(log_rejected)
    }

    pub fn finalize(&self, invoice: &mut Invoice) {
        invoice.finalize_with_minimum(self.config.minimum_amount);
    }

    /// Checked status change for callers that want the transition table
    /// enforced.
    pub fn transition(&self, invoice: &mut Invoice, target: InvoiceStatus) -> AppResult<()> {
        let from = invoice.status();
        if let Err(e) = invoice.try_transition(target) {
            tracing::warn!(
                invoice_id = %invoice.id(),
                from = %from,
                to = %target,
                "Rejected invoice status transition"
            );
            return Err(e);
        }

        tracing::info!(
            invoice_id = %invoice.id(),
            from = %from,
            to = %target,
            "Invoice status changed"
        );

        Ok(())
    }
}

fn log_rejected(error: AppError) -> AppError {
    tracing::warn!(code = error.code(), error = %error, "Rejected invoice input");
    error
}
