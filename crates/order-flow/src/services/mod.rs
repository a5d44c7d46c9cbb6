//! External collaborators the engine calls out to.

pub mod shipping;

pub use shipping::{InMemoryShippingFeeService, ShippingFeeService, ShippingQuote};
