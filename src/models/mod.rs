pub mod credit;
pub mod discount;
pub mod invoice;
pub mod invoice_status;

pub use credit::*;
pub use discount::*;
pub use invoice::*;
pub use invoice_status::*;
