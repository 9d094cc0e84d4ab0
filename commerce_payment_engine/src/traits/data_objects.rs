use cpg_common::Naira;
use serde::{Deserialize, Serialize};

use crate::db_types::OrderId;

//---------------------------------  Outbound gateway call objects  ---------------------------------------------------

/// Everything the gateway needs to open a checkout session for an order.
#[derive(Debug, Clone, Serialize)]
pub struct InitializeTransaction {
    /// Contact identity of the paying customer, forwarded by the auth layer.
    pub email: String,
    /// The order total. Adapters convert this to the gateway's minor-unit representation.
    pub amount: Naira,
    /// Correlation token. Unique per initialization attempt.
    pub reference: String,
    /// Attached as metadata so gateway dashboards can link back to the order.
    pub order_id: OrderId,
}

/// The gateway's answer to a successful initialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializedTransaction {
    /// Where the customer completes payment.
    pub authorization_url: String,
    pub reference: String,
}

/// Authoritative transaction state as reported by the gateway's verify endpoint.
#[derive(Debug, Clone)]
pub struct GatewayTransaction {
    /// The gateway-assigned transaction identifier.
    pub id: String,
    pub reference: String,
    pub status: GatewayPaymentStatus,
    /// The gateway's verbatim status string, reported back to callers untouched.
    pub raw_status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayPaymentStatus {
    Success,
    Failed,
}

//---------------------------------  Inbound gateway event objects  ---------------------------------------------------

/// A provider-neutral rendering of an inbound webhook notification.
#[derive(Debug, Clone)]
pub struct GatewayEvent {
    pub event_type: GatewayEventType,
    pub reference: String,
    pub transaction_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEventType {
    PaymentSuccess,
    PaymentFailed,
    /// Gateways add event types over time. These are acknowledged and ignored.
    Other(String),
}
