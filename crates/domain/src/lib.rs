//! Domain layer for the point-of-sale system.
//!
//! This crate provides:
//! - [`CheckoutService`], the order transaction that validates stock,
//!   decrements it and writes the order as one atomic unit
//! - [`CatalogService`] for product listing and maintenance
//! - [`InvoiceService`] for assembling invoices from stored orders and
//!   rendering them as PDF documents

pub mod catalog;
pub mod checkout;
pub mod error;
pub mod invoice;

pub use catalog::CatalogService;
pub use checkout::{
    CheckoutService, CheckoutSettings, LineRequest, PlaceOrder, TotalPolicy, ValidatedOrder,
};
pub use error::{CatalogError, CheckoutError, InvoiceError};
pub use invoice::{DEFAULT_SHOP_NAME, Invoice, InvoiceLine, InvoiceService, render_pdf};
