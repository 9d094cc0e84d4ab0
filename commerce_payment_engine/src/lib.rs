//! Commerce Payment Engine
//!
//! The engine holds the core logic for the storefront's order/payment lifecycle. It is web-framework agnostic and
//! payment-provider agnostic.
//!
//! The crate is divided into three main sections:
//! 1. The backend traits ([`mod@traits`]). A storage backend implements [`traits::PaymentGatewayDatabase`] (plus its
//!    super-traits) to act as the order store, and an HTTP gateway adapter implements
//!    [`traits::PaymentGatewayClient`]. Currently SQLite is the one supported storage backend; a `postgres` feature
//!    slot exists but is not implemented.
//! 2. The public APIs ([`PaymentFlowApi`] and [`OrdersApi`]). [`PaymentFlowApi`] is the reconciler: it unifies order
//!    creation, payment initialization, synchronous verification and asynchronous webhook events into one consistent
//!    payment-status state machine. [`OrdersApi`] serves order queries and the delivery lifecycle.
//! 3. The data types shared by both ([`mod@db_types`] and [`order_objects`]).
//!
//! Payment-status writes are expressed as conditional updates (`Paid` is terminal), so concurrent webhook
//! deliveries and verify calls converge without any in-process locking.

pub mod db_types;
pub mod helpers;
mod cpe_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use cpe_api::{order_objects, orders_api::OrdersApi, payment_flow_api::PaymentFlowApi};
pub use traits::{OrderApiError, OrderManagement, PaymentGatewayClient, PaymentGatewayDatabase, PaymentGatewayError, ProductCatalog};
