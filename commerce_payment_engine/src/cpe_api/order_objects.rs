use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{DeliveryStatus, Order, OrderId, OrderItem, PaymentStatus};

/// An order together with its line items, as returned to callers.
#[derive(Debug, Clone, Serialize)]
pub struct FullOrder {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl FullOrder {
    pub fn id(&self) -> OrderId {
        self.order.id
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerOrders {
    pub customer_id: String,
    pub total_orders: usize,
    pub orders: Vec<Order>,
}

impl CustomerOrders {
    pub fn new(customer_id: String, orders: Vec<Order>) -> Self {
        Self { customer_id, total_orders: orders.len(), orders }
    }
}

/// Search criteria for the admin order listing. Empty fields place no constraint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQueryFilter {
    pub customer_id: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    pub delivery_status: Option<DeliveryStatus>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl OrderQueryFilter {
    pub fn is_empty(&self) -> bool {
        self.customer_id.is_none()
            && self.payment_status.is_none()
            && self.delivery_status.is_none()
            && self.since.is_none()
            && self.until.is_none()
    }

    pub fn with_customer_id<S: Into<String>>(mut self, customer_id: S) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn with_payment_status(mut self, status: PaymentStatus) -> Self {
        self.payment_status = Some(status);
        self
    }
}

/// Result of a synchronous verification round-trip. `gateway_status` carries the gateway's verbatim status string
/// when the gateway was consulted; an already-finalized order short-circuits without gateway traffic.
#[derive(Debug, Clone, Serialize)]
pub struct VerifiedPayment {
    pub outcome: PaymentOutcome,
    pub gateway_status: Option<String>,
    pub order: Order,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    /// The order was already `Paid`; nothing was mutated.
    AlreadyPaid,
    /// The gateway reported success and this call finalized the order.
    Confirmed,
    /// The gateway reported a non-success status and the order was marked `Failed`.
    Failed,
}

/// What a webhook delivery did to the local order state.
#[derive(Debug, Clone)]
pub enum WebhookDisposition {
    /// The event finalized the order as paid.
    Confirmed(Order),
    /// The event marked the order's payment as failed.
    Failed(Order),
    /// Duplicate or stale delivery; the order was already `Paid` and nothing changed.
    AlreadyPaid(OrderId),
    /// Unrecognized event type, acknowledged and ignored.
    Ignored(String),
    /// No local order matches the reference. Acknowledged so the gateway stops retrying.
    Unmatched(String),
}
