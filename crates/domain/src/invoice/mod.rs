//! Printable invoices for completed orders.

mod pdf;
mod service;

pub use pdf::render_pdf;
pub use service::{DEFAULT_SHOP_NAME, Invoice, InvoiceLine, InvoiceService};
