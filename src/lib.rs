//! Invoice finalization for payment gateways: ordered discounts, tax/VAT,
//! credits and the invoice status lifecycle.
//!
//! Provider adapters build an [`Invoice`], call [`Invoice::finalize`] and
//! transmit the result; they never redo the arithmetic.

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{
    Credit, CreditInput, CreditStatus, Discount, DiscountInput, DiscountType, Invoice,
    InvoiceStatus,
};
pub use services::InvoiceService;
