use thiserror::Error;

use crate::db_types::{NewProduct, Product, ProductId};

/// The catalog is the single authority for current prices. Order creation reads it once, at order time, and never
/// again for that order.
#[allow(async_fn_in_trait)]
pub trait ProductCatalog {
    async fn fetch_product_by_id(&self, product_id: &ProductId) -> Result<Option<Product>, CatalogError>;

    /// Adds a product to the catalog. There is no HTTP surface for this; it exists for seeding and admin tooling.
    async fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogError>;

    /// Replaces the current price of a product. Existing orders keep their snapshotted unit prices.
    async fn update_product_price(&self, product_id: &ProductId, price: cpg_common::Naira)
        -> Result<Product, CatalogError>;
}

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("The requested product {0} does not exist")]
    ProductNotFound(ProductId),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::DatabaseError(e.to_string())
    }
}
