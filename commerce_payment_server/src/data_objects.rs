use std::fmt::Display;

use commerce_payment_engine::db_types::{DeliveryStatus, Order, ProductId, ShippingAddress};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// Body of `POST /api/orders`. The customer placing the order comes from the forwarded identity, never the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub products: Vec<OrderItemRequest>,
    pub shipping_address: ShippingAddress,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub product: ProductId,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializePaymentRequest {
    pub order_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct InitializePaymentResponse {
    pub message: String,
    /// Where the customer must be redirected to complete the checkout.
    pub authorization_url: String,
    pub order: Order,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyPaymentResponse {
    pub message: String,
    /// The gateway's verbatim status string, when the gateway was consulted.
    pub gateway_status: Option<String>,
    pub order: Order,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryUpdateRequest {
    pub status: DeliveryStatus,
}
