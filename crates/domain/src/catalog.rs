//! Catalog management.

use common::{Money, NewProduct, Product, ProductId};
use store::Store;

use crate::error::CatalogError;

/// Service for listing and maintaining catalog products.
///
/// Never touches stock of existing products; stock only changes through
/// [`crate::CheckoutService`].
pub struct CatalogService<S: Store> {
    store: S,
}

impl<S: Store> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists products that are not soft-deleted, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.store.list_products().await?)
    }

    /// Loads a product by id, including soft-deleted ones.
    pub async fn get_product(&self, product_id: ProductId) -> Result<Product, CatalogError> {
        self.store
            .get_product(product_id)
            .await?
            .ok_or(CatalogError::NotFound(product_id))
    }

    /// Creates a product after checking its fields.
    #[tracing::instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create_product(&self, mut product: NewProduct) -> Result<Product, CatalogError> {
        product.name = product.name.trim().to_string();
        if product.name.is_empty() {
            return Err(CatalogError::Validation("name is required".to_string()));
        }
        if product.price.is_negative() {
            return Err(CatalogError::Validation(format!(
                "price {} must not be negative",
                product.price
            )));
        }
        if product.price.exceeds_storage() {
            return Err(CatalogError::Validation(format!(
                "price {} exceeds the largest storable amount {}",
                product.price,
                Money::max_stored()
            )));
        }
        if i32::try_from(product.stock).is_err() {
            return Err(CatalogError::Validation(format!(
                "stock {} is too large",
                product.stock
            )));
        }
        product.description = product
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let created = self.store.create_product(product).await?;
        tracing::info!(product_id = %created.id, stock = created.stock, "product created");
        Ok(created)
    }

    /// Soft-deletes a product so it no longer appears in listings.
    #[tracing::instrument(skip(self))]
    pub async fn delete_product(&self, product_id: ProductId) -> Result<(), CatalogError> {
        if self.store.delete_product(product_id).await? {
            tracing::info!(%product_id, "product deleted");
            Ok(())
        } else {
            Err(CatalogError::NotFound(product_id))
        }
    }
}
