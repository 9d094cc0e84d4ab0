//! `SqliteDatabase` is a concrete implementation of a commerce payment engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module by delegating to the plain functions in [`super::db`].
use std::fmt::Debug;

use chrono::Duration;
use cpg_common::Naira;
use log::*;
use sqlx::SqlitePool;

use super::db::{new_pool, orders, products};
use crate::{
    db_types::{DeliveryStatus, NewOrder, NewProduct, Order, OrderId, OrderItem, Product, ProductId},
    order_objects::{FullOrder, OrderQueryFilter},
    traits::{
        CatalogError,
        OrderApiError,
        OrderManagement,
        PaymentGatewayDatabase,
        PaymentGatewayError,
        ProductCatalog,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_id: &OrderId) -> Result<Vec<OrderItem>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_order_items(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn fetch_order_by_payment_reference(&self, reference: &str) -> Result<Option<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_payment_reference(reference, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_for_customer(&self, customer_id: &str) -> Result<Vec<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_customer(customer_id, &mut conn).await?;
        Ok(orders)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }

    async fn update_delivery_status(
        &self,
        order_id: &OrderId,
        status: DeliveryStatus,
    ) -> Result<Order, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::update_delivery_status(order_id, status, &mut conn).await?;
        order.ok_or(OrderApiError::OrderNotFound(*order_id))
    }
}

impl ProductCatalog for SqliteDatabase {
    async fn fetch_product_by_id(&self, product_id: &ProductId) -> Result<Option<Product>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product_by_id(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::insert_product(product, &mut conn).await?;
        debug!("🗃️ Product {} ({}) added to the catalog at {}", product.id, product.name, product.price);
        Ok(product)
    }

    async fn update_product_price(&self, product_id: &ProductId, price: Naira) -> Result<Product, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::update_product_price(product_id, price.value(), &mut conn).await?;
        product.ok_or(CatalogError::ProductNotFound(*product_id))
    }
}

impl PaymentGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<FullOrder, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        // Snapshot the authoritative catalog price for every line item inside the transaction; any missing product
        // abandons the whole order.
        let mut snapshots = Vec::with_capacity(order.items.len());
        let mut total = Naira::default();
        for item in &order.items {
            let product = products::fetch_product_by_id(&item.product_id, &mut tx)
                .await?
                .ok_or(PaymentGatewayError::ProductNotFound(item.product_id))?;
            total = total + product.price * item.quantity;
            snapshots.push((item.product_id, item.quantity, product.price));
        }
        let new_order = orders::insert_order(&order, total.value(), &mut tx).await?;
        let mut items = Vec::with_capacity(snapshots.len());
        for (product_id, quantity, unit_price) in snapshots {
            let item =
                orders::insert_order_item(new_order.id, product_id.0, quantity, unit_price.value(), &mut tx).await?;
            items.push(item);
        }
        tx.commit().await?;
        debug!("🗃️ Order {} saved with {} line items, total {total}", new_order.id, items.len());
        Ok(FullOrder { order: new_order, items })
    }

    async fn set_payment_reference(
        &self,
        order_id: &OrderId,
        reference: &str,
    ) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::set_payment_reference(order_id, reference, &mut conn).await?;
        Ok(order)
    }

    async fn confirm_order_paid(
        &self,
        order_id: &OrderId,
        transaction_id: &str,
    ) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::confirm_order_paid(order_id, transaction_id, &mut conn).await?;
        if order.is_some() {
            debug!("🗃️ Order {order_id} is now Paid (gateway transaction {transaction_id})");
        }
        Ok(order)
    }

    async fn fail_order_payment(&self, order_id: &OrderId) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fail_order_payment(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn cancel_order_payment(&self, order_id: &OrderId) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::cancel_order_payment(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn cancel_stale_pending_orders(&self, unpaid_limit: Duration) -> Result<Vec<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let cancelled = orders::cancel_stale_pending_orders(unpaid_limit, &mut conn).await?;
        Ok(cancelled)
    }

    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}
