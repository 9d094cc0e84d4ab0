use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{DeliveryStatus, Order, OrderId},
    order_objects::{CustomerOrders, FullOrder, OrderQueryFilter},
    traits::{OrderApiError, OrderManagement},
};

/// Query API over the order store, plus the delivery lifecycle. Payment mutations are the exclusive business of
/// [`crate::PaymentFlowApi`].
pub struct OrdersApi<B> {
    db: B,
}

impl<B> Debug for OrdersApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrdersApi")
    }
}

impl<B> OrdersApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrdersApi<B>
where B: OrderManagement
{
    pub async fn order_by_id(&self, order_id: &OrderId) -> Result<Option<FullOrder>, OrderApiError> {
        let order = match self.db.fetch_order_by_id(order_id).await? {
            Some(order) => order,
            None => return Ok(None),
        };
        let items = self.db.fetch_order_items(order_id).await?;
        Ok(Some(FullOrder { order, items }))
    }

    pub async fn orders_for_customer(&self, customer_id: &str) -> Result<CustomerOrders, OrderApiError> {
        let orders = self.db.fetch_orders_for_customer(customer_id).await?;
        trace!("📦️ {} orders fetched for customer {customer_id}", orders.len());
        Ok(CustomerOrders::new(customer_id.to_string(), orders))
    }

    pub async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderApiError> {
        self.db.search_orders(query).await
    }

    /// Moves an order through the delivery lifecycle.
    ///
    /// | From \ To | Shipped | Delivered | Cancelled |
    /// |-----------|---------|-----------|-----------|
    /// | Pending   | ok      | Err       | ok        |
    /// | Shipped   | Err     | ok        | ok        |
    /// | Delivered | Err     | Err       | Err       |
    /// | Cancelled | Err     | Err       | Err       |
    ///
    /// Same-status changes are rejected as no-ops. The payment state machine is untouched by any of this.
    pub async fn set_delivery_status(
        &self,
        order_id: &OrderId,
        new_status: DeliveryStatus,
    ) -> Result<Order, OrderApiError> {
        let order = self.db.fetch_order_by_id(order_id).await?.ok_or(OrderApiError::OrderNotFound(*order_id))?;
        let old_status = order.delivery_status;
        use DeliveryStatus::*;
        match (old_status, new_status) {
            (old, new) if old == new => Err(OrderApiError::DeliveryChangeNoOp),
            (Pending, Shipped) | (Shipped, Delivered) | (Pending | Shipped, Cancelled) => {
                let order = self.db.update_delivery_status(order_id, new_status).await?;
                info!("📦️ Order {} delivery status changed from {old_status} to {new_status}", order.id);
                Ok(order)
            },
            (from, to) => Err(OrderApiError::DeliveryChangeForbidden { from, to }),
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
