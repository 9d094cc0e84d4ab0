use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{Duration, TimeZone, Utc};
use commerce_payment_engine::{
    db_types::{
        DeliveryStatus,
        NewOrder,
        NewProduct,
        Order,
        OrderId,
        OrderItem,
        PaymentStatus,
        Product,
        ProductId,
        ShippingAddress,
    },
    order_objects::{FullOrder, OrderQueryFilter},
    traits::{
        CatalogError,
        GatewayClientError,
        GatewayPaymentStatus,
        GatewayTransaction,
        InitializeTransaction,
        InitializedTransaction,
        OrderApiError,
        OrderManagement,
        PaymentGatewayClient,
        PaymentGatewayDatabase,
        PaymentGatewayError,
        ProductCatalog,
    },
};
use cpg_common::Naira;
use mockall::mock;

mock! {
    pub PaymentBackend {}
    impl OrderManagement for PaymentBackend {
        async fn fetch_order_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderApiError>;
        async fn fetch_order_items(&self, order_id: &OrderId) -> Result<Vec<OrderItem>, OrderApiError>;
        async fn fetch_order_by_payment_reference(&self, reference: &str) -> Result<Option<Order>, OrderApiError>;
        async fn fetch_orders_for_customer(&self, customer_id: &str) -> Result<Vec<Order>, OrderApiError>;
        async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderApiError>;
        async fn update_delivery_status(&self, order_id: &OrderId, status: DeliveryStatus) -> Result<Order, OrderApiError>;
    }
    impl ProductCatalog for PaymentBackend {
        async fn fetch_product_by_id(&self, product_id: &ProductId) -> Result<Option<Product>, CatalogError>;
        async fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogError>;
        async fn update_product_price(&self, product_id: &ProductId, price: Naira) -> Result<Product, CatalogError>;
    }
    impl PaymentGatewayDatabase for PaymentBackend {
        fn url(&self) -> &str;
        async fn insert_order(&self, order: NewOrder) -> Result<FullOrder, PaymentGatewayError>;
        async fn set_payment_reference(&self, order_id: &OrderId, reference: &str) -> Result<Option<Order>, PaymentGatewayError>;
        async fn confirm_order_paid(&self, order_id: &OrderId, transaction_id: &str) -> Result<Option<Order>, PaymentGatewayError>;
        async fn fail_order_payment(&self, order_id: &OrderId) -> Result<Option<Order>, PaymentGatewayError>;
        async fn cancel_order_payment(&self, order_id: &OrderId) -> Result<Option<Order>, PaymentGatewayError>;
        async fn cancel_stale_pending_orders(&self, unpaid_limit: Duration) -> Result<Vec<Order>, PaymentGatewayError>;
    }
}

/// Hand-rolled gateway double with call counters, so tests can assert that a path never produced gateway traffic.
pub struct ScriptedGateway {
    pub init_calls: AtomicUsize,
    pub verify_calls: AtomicUsize,
    verify_status: GatewayPaymentStatus,
}

impl ScriptedGateway {
    pub fn succeeding() -> Self {
        Self {
            init_calls: AtomicUsize::new(0),
            verify_calls: AtomicUsize::new(0),
            verify_status: GatewayPaymentStatus::Success,
        }
    }

    pub fn init_count(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn verify_count(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

impl PaymentGatewayClient for ScriptedGateway {
    async fn initialize_transaction(
        &self,
        request: InitializeTransaction,
    ) -> Result<InitializedTransaction, GatewayClientError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        Ok(InitializedTransaction {
            authorization_url: format!("https://checkout.paystack.com/{}", request.reference),
            reference: request.reference,
        })
    }

    async fn verify_transaction(&self, reference: &str) -> Result<GatewayTransaction, GatewayClientError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        Ok(GatewayTransaction {
            id: "2009945086".to_string(),
            reference: reference.to_string(),
            status: self.verify_status,
            raw_status: "success".to_string(),
        })
    }
}

/// A pending ₦100.00 order for `cust-1`, frozen in time so JSON assertions stay stable.
pub fn sample_order(id: i64) -> Order {
    let ts = Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap();
    Order {
        id: OrderId(id),
        customer_id: "cust-1".to_string(),
        total_amount: Naira::from(10_000),
        payment_status: PaymentStatus::Pending,
        payment_reference: None,
        transaction_id: None,
        paid_at: None,
        delivery_status: DeliveryStatus::Pending,
        shipping_address: ShippingAddress::default(),
        created_at: ts,
        updated_at: ts,
    }
}

pub fn sample_items(order_id: i64) -> Vec<OrderItem> {
    vec![OrderItem { id: 1, order_id: OrderId(order_id), product_id: ProductId(1), quantity: 2, unit_price: Naira::from(5_000) }]
}

pub fn paid_order(id: i64) -> Order {
    let mut order = sample_order(id);
    order.payment_status = PaymentStatus::Paid;
    order.payment_reference = Some(format!("order-{id}-1709213400000-9f2c"));
    order.transaction_id = Some("2009945086".to_string());
    order.paid_at = Some(Utc.with_ymd_and_hms(2024, 2, 29, 13, 45, 0).unwrap());
    order
}
