use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use cpg_common::Naira;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(String);

//--------------------------------------       OrderId       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub i64);

impl From<i64> for OrderId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------      ProductId      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct ProductId(pub i64);

impl From<i64> for ProductId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------    PaymentStatus    ---------------------------------------------------------
/// The payment half of an order's lifecycle.
///
/// `Paid` is terminal. `Failed` and `Cancelled` are not: a later successful charge still moves the order to `Paid`,
/// since the money has changed hands whatever the local bookkeeping said at the time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// The order exists and no definitive payment outcome has been recorded.
    Pending,
    /// The gateway confirmed the charge. Terminal.
    Paid,
    /// The gateway reported the charge as failed.
    Failed,
    /// The order was abandoned or cancelled before payment completed.
    Cancelled,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Paid => write!(f, "Paid"),
            PaymentStatus::Failed => write!(f, "Failed"),
            PaymentStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" | "pending" => Ok(Self::Pending),
            "Paid" | "paid" => Ok(Self::Paid),
            "Failed" | "failed" => Ok(Self::Failed),
            "Cancelled" | "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------   DeliveryStatus    ---------------------------------------------------------
/// The fulfilment half of an order's lifecycle. Completely independent of the payment state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Shipped,
    Delivered,
    Cancelled,
}

impl Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryStatus::Pending => write!(f, "Pending"),
            DeliveryStatus::Shipped => write!(f, "Shipped"),
            DeliveryStatus::Delivered => write!(f, "Delivered"),
            DeliveryStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for DeliveryStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" | "pending" => Ok(Self::Pending),
            "Shipped" | "shipped" => Ok(Self::Shipped),
            "Delivered" | "delivered" => Ok(Self::Delivered),
            "Cancelled" | "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid delivery status: {s}"))),
        }
    }
}

//--------------------------------------  ShippingAddress    ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: String,
    /// Σ quantity × unit_price over the line items, fixed at creation time.
    pub total_amount: Naira,
    pub payment_status: PaymentStatus,
    pub payment_reference: Option<String>,
    pub transaction_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub delivery_status: DeliveryStatus,
    #[sqlx(flatten)]
    pub shipping_address: ShippingAddress,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }
}

//--------------------------------------      OrderItem      ---------------------------------------------------------
/// A single order line. `unit_price` is the catalog price at the moment the order was created; catalog changes never
/// touch it again.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Naira,
}

impl OrderItem {
    pub fn subtotal(&self) -> Naira {
        self.unit_price * self.quantity
    }
}

//--------------------------------------      NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer_id: String,
    pub items: Vec<NewOrderItem>,
    pub shipping_address: ShippingAddress,
}

impl NewOrder {
    pub fn new(customer_id: String, items: Vec<NewOrderItem>, shipping_address: ShippingAddress) -> Self {
        Self { customer_id, items, shipping_address }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: i64,
}

//--------------------------------------       Product       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// The authoritative current price. Orders snapshot this value; they never reference it afterwards.
    pub price: Naira,
    pub in_stock: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Naira,
    pub in_stock: bool,
}

impl NewProduct {
    pub fn new<S: Into<String>>(name: S, price: Naira) -> Self {
        Self { name: name.into(), description: String::new(), price, in_stock: true }
    }
}
