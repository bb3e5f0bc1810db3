//! Order placement.

mod request;
mod service;

pub use request::{LineRequest, MAX_LINE_QUANTITY, PlaceOrder, TotalPolicy, ValidatedOrder};
pub use service::{CheckoutService, CheckoutSettings};
