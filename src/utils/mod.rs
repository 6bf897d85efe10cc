pub mod currency;
pub mod ids;
pub mod rounding;

pub use currency::*;
pub use ids::*;
pub use rounding::*;
