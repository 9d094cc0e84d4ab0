use thiserror::Error;

use crate::{
    db_types::{DeliveryStatus, Order, OrderId, OrderItem},
    order_objects::OrderQueryFilter,
};

/// Read access to the order store, plus the delivery-lifecycle write. Payment-field writes live on
/// [`super::PaymentGatewayDatabase`]; keeping them apart means query-only consumers never see the conditional-update
/// surface.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderApiError>;

    async fn fetch_order_items(&self, order_id: &OrderId) -> Result<Vec<OrderItem>, OrderApiError>;

    /// Looks an order up by the correlation token handed to the payment gateway at initialization time.
    async fn fetch_order_by_payment_reference(&self, reference: &str) -> Result<Option<Order>, OrderApiError>;

    /// All orders placed by the given customer, oldest first.
    async fn fetch_orders_for_customer(&self, customer_id: &str) -> Result<Vec<Order>, OrderApiError>;

    /// Fetches orders according to the criteria in the filter, oldest first.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderApiError>;

    /// Unconditionally writes a new delivery status. Transition legality is checked in [`crate::OrdersApi`].
    async fn update_delivery_status(
        &self,
        order_id: &OrderId,
        status: DeliveryStatus,
    ) -> Result<Order, OrderApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum OrderApiError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("The requested delivery status change would be a no-op")]
    DeliveryChangeNoOp,
    #[error("Delivery status cannot change from {from} to {to}")]
    DeliveryChangeForbidden { from: DeliveryStatus, to: DeliveryStatus },
}

impl From<sqlx::Error> for OrderApiError {
    fn from(e: sqlx::Error) -> Self {
        OrderApiError::DatabaseError(e.to_string())
    }
}
