//! Checkout client for the point-of-sale system.
//!
//! A [`CheckoutClient`] owns one operator session: the loaded catalog, the
//! [`Cart`] and the id of the last sale. Orders go through a [`Storefront`],
//! either [`LocalStorefront`] (in-process) or [`HttpStorefront`].
//!
//! Stock checks made while filling the cart are advisory. The order
//! transaction on the server is what guarantees stock never goes negative.

pub mod cart;
pub mod client;
pub mod error;
pub mod http;
pub mod storefront;

pub use cart::{Cart, CartLine};
pub use client::CheckoutClient;
pub use error::{CartError, Result, StorefrontError};
pub use http::HttpStorefront;
pub use storefront::{LocalStorefront, Storefront};
