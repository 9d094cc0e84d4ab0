use chrono::Duration;
use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderId, ProductId},
    order_objects::FullOrder,
    traits::{CatalogError, GatewayClientError, OrderApiError, OrderManagement, ProductCatalog},
};

/// This trait defines the highest level of behaviour for storage backends supporting the payment engine.
///
/// Every payment-field write is a conditional update: the status check and the mutation are one atomic statement
/// against the store, keyed on the expected prior state. Two concurrent handlers can both observe `Pending`, but
/// only one conditional update lands; the loser sees `None` and treats the order as already finalized. `Paid` is
/// the terminal state no conditional update moves out of.
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayDatabase: OrderManagement + ProductCatalog {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Persists a new order in a single atomic transaction.
    ///
    /// For each line item the catalog's current price is read and snapshotted as the item's `unit_price`;
    /// `total_amount` is the sum of the subtotals. If any referenced product is missing the whole transaction is
    /// abandoned; partial orders are never persisted.
    async fn insert_order(&self, order: NewOrder) -> Result<FullOrder, PaymentGatewayError>;

    /// Stores the payment reference assigned at initialization time.
    ///
    /// Conditional on the order not being `Paid`: re-initializing a pending order overwrites the reference
    /// (abandoned-checkout retry), but a completed order is never re-referenced. Returns the updated order, or
    /// `None` if the precondition failed.
    async fn set_payment_reference(
        &self,
        order_id: &OrderId,
        reference: &str,
    ) -> Result<Option<Order>, PaymentGatewayError>;

    /// Transition into `Paid`, recording the gateway transaction id and the payment timestamp.
    ///
    /// Conditional on the order not already being `Paid`; duplicate confirmations return `None` and leave the
    /// original `transaction_id`/`paid_at` untouched.
    async fn confirm_order_paid(
        &self,
        order_id: &OrderId,
        transaction_id: &str,
    ) -> Result<Option<Order>, PaymentGatewayError>;

    /// Transition into `Failed`. Conditional on the order not being `Paid`: a stale failure notification never
    /// downgrades a completed payment.
    async fn fail_order_payment(&self, order_id: &OrderId) -> Result<Option<Order>, PaymentGatewayError>;

    /// Transition into `Cancelled`. Conditional on the current status being `Pending` or `Failed`.
    async fn cancel_order_payment(&self, order_id: &OrderId) -> Result<Option<Order>, PaymentGatewayError>;

    /// Cancels `Pending` orders whose `updated_at` is older than the given limit. Returns the orders that were
    /// cancelled by this sweep.
    async fn cancel_stale_pending_orders(&self, unpaid_limit: Duration) -> Result<Vec<Order>, PaymentGatewayError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("Orders must contain at least one line item")]
    EmptyOrder,
    #[error("Line item quantity must be a positive integer, got {0}")]
    InvalidQuantity(i64),
    #[error("The requested product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("No order matches payment reference {0}")]
    OrderNotFoundForReference(String),
    #[error("Order {0} has already been paid")]
    OrderAlreadyPaid(OrderId),
    #[error("{0}")]
    OrderError(#[from] OrderApiError),
    #[error("{0}")]
    CatalogError(#[from] CatalogError),
    #[error("Payment gateway call failed. {0}")]
    GatewayError(#[from] GatewayClientError),
}

impl From<sqlx::Error> for PaymentGatewayError {
    fn from(e: sqlx::Error) -> Self {
        PaymentGatewayError::DatabaseError(e.to_string())
    }
}
