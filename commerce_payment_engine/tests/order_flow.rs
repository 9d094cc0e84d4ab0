mod support;

use commerce_payment_engine::{
    db_types::{DeliveryStatus, NewOrder, NewOrderItem, NewProduct, PaymentStatus, ProductId, ShippingAddress},
    traits::{OrderApiError, PaymentGatewayError, ProductCatalog},
    OrdersApi,
    PaymentFlowApi,
    SqliteDatabase,
};
use cpg_common::Naira;
use support::prepare_env::prepare_test_env;

fn lagos_address() -> ShippingAddress {
    ShippingAddress {
        address: "14 Broad Street".to_string(),
        city: "Lagos".to_string(),
        state: "Lagos".to_string(),
        postal_code: "101233".to_string(),
        country: "Nigeria".to_string(),
    }
}

async fn new_db(url: &str) -> SqliteDatabase {
    prepare_test_env(url).await;
    SqliteDatabase::new_with_url(url, 5).await.expect("Error creating database")
}

#[tokio::test]
async fn order_total_is_snapshotted_at_creation() {
    let db = new_db("sqlite://../data/test_order_snapshot.db").await;
    let api = PaymentFlowApi::new(db.clone());
    let p1 = db.insert_product(NewProduct::new("Woven basket", Naira::from_naira(50))).await.unwrap();
    let p2 = db.insert_product(NewProduct::new("Clay pot", Naira::from_naira(12))).await.unwrap();

    let order = NewOrder::new(
        "cust-100".to_string(),
        vec![
            NewOrderItem { product_id: p1.id, quantity: 2 },
            NewOrderItem { product_id: p2.id, quantity: 3 },
        ],
        lagos_address(),
    );
    let order = api.create_order(order).await.expect("Error creating order");
    assert_eq!(order.order.total_amount, Naira::from_naira(136));
    assert_eq!(order.order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.order.delivery_status, DeliveryStatus::Pending);
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.items[0].unit_price, Naira::from_naira(50));
    assert_eq!(order.items[0].subtotal(), Naira::from_naira(100));
    assert_eq!(order.order.shipping_address, lagos_address());
    assert!(order.order.payment_reference.is_none());
    assert!(order.order.paid_at.is_none());
}

#[tokio::test]
async fn catalog_price_changes_do_not_touch_existing_orders() {
    let db = new_db("sqlite://../data/test_order_price_change.db").await;
    let api = PaymentFlowApi::new(db.clone());
    let orders_api = OrdersApi::new(db.clone());
    let product = db.insert_product(NewProduct::new("Raffia mat", Naira::from_naira(50))).await.unwrap();

    let order = NewOrder::new(
        "cust-101".to_string(),
        vec![NewOrderItem { product_id: product.id, quantity: 2 }],
        lagos_address(),
    );
    let order = api.create_order(order).await.unwrap();
    assert_eq!(order.order.total_amount, Naira::from_naira(100));

    db.update_product_price(&product.id, Naira::from_naira(80)).await.unwrap();

    let reloaded = orders_api.order_by_id(&order.id()).await.unwrap().expect("order vanished");
    assert_eq!(reloaded.order.total_amount, Naira::from_naira(100));
    assert_eq!(reloaded.items[0].unit_price, Naira::from_naira(50));
}

#[tokio::test]
async fn empty_orders_are_rejected_before_any_write() {
    let db = new_db("sqlite://../data/test_order_empty.db").await;
    let api = PaymentFlowApi::new(db);
    let order = NewOrder::new("cust-102".to_string(), vec![], lagos_address());
    let err = api.create_order(order).await.expect_err("Empty order must be rejected");
    assert!(matches!(err, PaymentGatewayError::EmptyOrder));
}

#[tokio::test]
async fn non_positive_quantities_reject_the_whole_order() {
    let db = new_db("sqlite://../data/test_order_bad_qty.db").await;
    let api = PaymentFlowApi::new(db.clone());
    let product = db.insert_product(NewProduct::new("Gourd", Naira::from_naira(5))).await.unwrap();
    let order = NewOrder::new(
        "cust-103".to_string(),
        vec![
            NewOrderItem { product_id: product.id, quantity: 1 },
            NewOrderItem { product_id: product.id, quantity: 0 },
        ],
        lagos_address(),
    );
    let err = api.create_order(order).await.expect_err("Zero quantity must be rejected");
    assert!(matches!(err, PaymentGatewayError::InvalidQuantity(0)));
    // All-or-nothing: the valid line item must not have been persisted either.
    let orders_api = OrdersApi::new(db);
    let mine = orders_api.orders_for_customer("cust-103").await.unwrap();
    assert_eq!(mine.total_orders, 0);
}

#[tokio::test]
async fn missing_product_aborts_the_whole_order() {
    let db = new_db("sqlite://../data/test_order_missing_product.db").await;
    let api = PaymentFlowApi::new(db.clone());
    let product = db.insert_product(NewProduct::new("Calabash", Naira::from_naira(15))).await.unwrap();
    let order = NewOrder::new(
        "cust-104".to_string(),
        vec![
            NewOrderItem { product_id: product.id, quantity: 1 },
            NewOrderItem { product_id: ProductId(9_999), quantity: 1 },
        ],
        lagos_address(),
    );
    let err = api.create_order(order).await.expect_err("Unknown product must abort the order");
    assert!(matches!(err, PaymentGatewayError::ProductNotFound(ProductId(9_999))));
    let orders_api = OrdersApi::new(db);
    let mine = orders_api.orders_for_customer("cust-104").await.unwrap();
    assert_eq!(mine.total_orders, 0);
}

#[tokio::test]
async fn delivery_lifecycle_is_independent_of_payment() {
    let db = new_db("sqlite://../data/test_order_delivery.db").await;
    let api = PaymentFlowApi::new(db.clone());
    let orders_api = OrdersApi::new(db.clone());
    let product = db.insert_product(NewProduct::new("Dye kit", Naira::from_naira(25))).await.unwrap();
    let order = NewOrder::new(
        "cust-105".to_string(),
        vec![NewOrderItem { product_id: product.id, quantity: 1 }],
        lagos_address(),
    );
    let order = api.create_order(order).await.unwrap();
    let id = order.id();

    let order = orders_api.set_delivery_status(&id, DeliveryStatus::Shipped).await.unwrap();
    assert_eq!(order.delivery_status, DeliveryStatus::Shipped);
    // Shipping never touched the payment side.
    assert_eq!(order.payment_status, PaymentStatus::Pending);

    let err = orders_api.set_delivery_status(&id, DeliveryStatus::Shipped).await.expect_err("no-op must be rejected");
    assert!(matches!(err, OrderApiError::DeliveryChangeNoOp));

    let order = orders_api.set_delivery_status(&id, DeliveryStatus::Delivered).await.unwrap();
    assert_eq!(order.delivery_status, DeliveryStatus::Delivered);

    let err = orders_api
        .set_delivery_status(&id, DeliveryStatus::Cancelled)
        .await
        .expect_err("delivered orders cannot be cancelled");
    assert!(matches!(
        err,
        OrderApiError::DeliveryChangeForbidden { from: DeliveryStatus::Delivered, to: DeliveryStatus::Cancelled }
    ));
}
