mod support;

use chrono::Duration;
use commerce_payment_engine::{
    db_types::{NewOrder, NewOrderItem, NewProduct, OrderId, PaymentStatus, ShippingAddress},
    order_objects::{PaymentOutcome, WebhookDisposition},
    traits::{GatewayEvent, GatewayEventType, OrderManagement, PaymentGatewayError, ProductCatalog},
    PaymentFlowApi,
    SqliteDatabase,
};
use cpg_common::Naira;
use support::{
    mock_gateway::{MockGateway, UnreachableGateway},
    prepare_env::prepare_test_env,
};

async fn new_db(url: &str) -> SqliteDatabase {
    prepare_test_env(url).await;
    SqliteDatabase::new_with_url(url, 5).await.expect("Error creating database")
}

/// Seeds a product and creates a single pending order of 2 × ₦50.00 for it.
async fn pending_order(db: &SqliteDatabase, customer_id: &str) -> OrderId {
    let api = PaymentFlowApi::new(db.clone());
    let product = db.insert_product(NewProduct::new("Woven basket", Naira::from_naira(50))).await.unwrap();
    let order = NewOrder::new(
        customer_id.to_string(),
        vec![NewOrderItem { product_id: product.id, quantity: 2 }],
        ShippingAddress::default(),
    );
    let order = api.create_order(order).await.expect("Error creating order");
    assert_eq!(order.order.total_amount, Naira::from_naira(100));
    order.id()
}

fn success_event(reference: &str) -> GatewayEvent {
    GatewayEvent {
        event_type: GatewayEventType::PaymentSuccess,
        reference: reference.to_string(),
        transaction_id: "302961".to_string(),
    }
}

fn failure_event(reference: &str) -> GatewayEvent {
    GatewayEvent {
        event_type: GatewayEventType::PaymentFailed,
        reference: reference.to_string(),
        transaction_id: "302962".to_string(),
    }
}

#[tokio::test]
async fn initialization_assigns_a_reference_and_reinitialization_overwrites_it() {
    let db = new_db("sqlite://../data/test_recon_init.db").await;
    let api = PaymentFlowApi::new(db.clone());
    let gateway = MockGateway::succeeding();
    let id = pending_order(&db, "cust-200").await;

    let (order, auth) = api.initialize_payment(&gateway, &id, "ada@example.com").await.unwrap();
    let first_ref = order.payment_reference.clone().expect("reference must be set");
    assert!(auth.authorization_url.contains(&first_ref));
    assert_eq!(order.payment_status, PaymentStatus::Pending);

    // An abandoned checkout can be re-initialized; the reference is simply replaced.
    let (order, _) = api.initialize_payment(&gateway, &id, "ada@example.com").await.unwrap();
    let second_ref = order.payment_reference.clone().unwrap();
    assert_ne!(first_ref, second_ref);
    assert_eq!(gateway.init_count(), 2);
}

#[tokio::test]
async fn initializing_a_paid_order_never_reaches_the_gateway() {
    let db = new_db("sqlite://../data/test_recon_init_paid.db").await;
    let api = PaymentFlowApi::new(db.clone());
    let gateway = MockGateway::succeeding();
    let id = pending_order(&db, "cust-201").await;

    let (order, _) = api.initialize_payment(&gateway, &id, "ada@example.com").await.unwrap();
    let reference = order.payment_reference.unwrap();
    api.process_gateway_event(success_event(&reference)).await.unwrap();

    let err = api.initialize_payment(&gateway, &id, "ada@example.com").await.expect_err("paid order must conflict");
    assert!(matches!(err, PaymentGatewayError::OrderAlreadyPaid(oid) if oid == id));
    // One call from the first initialization, none from the rejected one.
    assert_eq!(gateway.init_count(), 1);
}

#[tokio::test]
async fn gateway_failure_during_initialization_leaves_the_order_unmodified() {
    let db = new_db("sqlite://../data/test_recon_init_unreachable.db").await;
    let api = PaymentFlowApi::new(db.clone());
    let id = pending_order(&db, "cust-202").await;

    let err = api.initialize_payment(&UnreachableGateway, &id, "ada@example.com").await.expect_err("must fail");
    assert!(matches!(err, PaymentGatewayError::GatewayError(_)));

    let order = api.db().fetch_order_by_id(&id).await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert!(order.payment_reference.is_none());
}

#[tokio::test]
async fn verification_confirms_a_successful_payment_exactly_once() {
    let db = new_db("sqlite://../data/test_recon_verify.db").await;
    let api = PaymentFlowApi::new(db.clone());
    let gateway = MockGateway::succeeding();
    let id = pending_order(&db, "cust-203").await;

    let (order, _) = api.initialize_payment(&gateway, &id, "ada@example.com").await.unwrap();
    let reference = order.payment_reference.unwrap();

    let verified = api.verify_payment(&gateway, &reference).await.unwrap();
    assert_eq!(verified.outcome, PaymentOutcome::Confirmed);
    assert_eq!(verified.gateway_status.as_deref(), Some("success"));
    assert_eq!(verified.order.payment_status, PaymentStatus::Paid);
    assert_eq!(verified.order.transaction_id.as_deref(), Some("300450"));
    let paid_at = verified.order.paid_at.expect("paid_at must be set");

    // A second verification short-circuits locally: no gateway call, no mutation.
    let again = api.verify_payment(&gateway, &reference).await.unwrap();
    assert_eq!(again.outcome, PaymentOutcome::AlreadyPaid);
    assert!(again.gateway_status.is_none());
    assert_eq!(again.order.paid_at, Some(paid_at));
    assert_eq!(gateway.verify_count(), 1);
}

#[tokio::test]
async fn verification_marks_unsuccessful_payments_as_failed() {
    let db = new_db("sqlite://../data/test_recon_verify_failed.db").await;
    let api = PaymentFlowApi::new(db.clone());
    let init_gateway = MockGateway::succeeding();
    let verify_gateway = MockGateway::failing();
    let id = pending_order(&db, "cust-204").await;

    let (order, _) = api.initialize_payment(&init_gateway, &id, "ada@example.com").await.unwrap();
    let reference = order.payment_reference.unwrap();

    let verified = api.verify_payment(&verify_gateway, &reference).await.unwrap();
    assert_eq!(verified.outcome, PaymentOutcome::Failed);
    assert_eq!(verified.gateway_status.as_deref(), Some("abandoned"));
    assert_eq!(verified.order.payment_status, PaymentStatus::Failed);
    assert!(verified.order.transaction_id.is_none());
    assert!(verified.order.paid_at.is_none());
}

#[tokio::test]
async fn verifying_an_unknown_reference_is_not_found() {
    let db = new_db("sqlite://../data/test_recon_verify_unknown.db").await;
    let api = PaymentFlowApi::new(db);
    let gateway = MockGateway::succeeding();
    let err = api.verify_payment(&gateway, "order-0-nope").await.expect_err("must be NotFound");
    assert!(matches!(err, PaymentGatewayError::OrderNotFoundForReference(_)));
    assert_eq!(gateway.verify_count(), 0);
}

#[tokio::test]
async fn duplicate_success_events_are_idempotent() {
    let db = new_db("sqlite://../data/test_recon_duplicate.db").await;
    let api = PaymentFlowApi::new(db.clone());
    let gateway = MockGateway::succeeding();
    let id = pending_order(&db, "cust-205").await;

    let (order, _) = api.initialize_payment(&gateway, &id, "ada@example.com").await.unwrap();
    let reference = order.payment_reference.unwrap();

    let first = api.process_gateway_event(success_event(&reference)).await.unwrap();
    let order = match first {
        WebhookDisposition::Confirmed(order) => order,
        other => panic!("Expected Confirmed, got {other:?}"),
    };
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    let paid_at = order.paid_at.unwrap();
    let transaction_id = order.transaction_id.clone().unwrap();

    // Redelivery of the identical event leaves every payment field untouched.
    for _ in 0..3 {
        let redelivery = api.process_gateway_event(success_event(&reference)).await.unwrap();
        assert!(matches!(redelivery, WebhookDisposition::AlreadyPaid(oid) if oid == id));
    }
    let reloaded = api.db().fetch_order_by_id(&id).await.unwrap().unwrap();
    assert_eq!(reloaded.paid_at, Some(paid_at));
    assert_eq!(reloaded.transaction_id, Some(transaction_id));
}

#[tokio::test]
async fn failure_events_never_downgrade_a_paid_order() {
    let db = new_db("sqlite://../data/test_recon_stale_failure.db").await;
    let api = PaymentFlowApi::new(db.clone());
    let gateway = MockGateway::succeeding();
    let id = pending_order(&db, "cust-206").await;

    let (order, _) = api.initialize_payment(&gateway, &id, "ada@example.com").await.unwrap();
    let reference = order.payment_reference.unwrap();
    api.process_gateway_event(success_event(&reference)).await.unwrap();

    let stale = api.process_gateway_event(failure_event(&reference)).await.unwrap();
    assert!(matches!(stale, WebhookDisposition::AlreadyPaid(_)));
    let reloaded = api.db().fetch_order_by_id(&id).await.unwrap().unwrap();
    assert_eq!(reloaded.payment_status, PaymentStatus::Paid);
}

#[tokio::test]
async fn a_failed_order_can_still_be_paid_later() {
    let db = new_db("sqlite://../data/test_recon_failed_then_paid.db").await;
    let api = PaymentFlowApi::new(db.clone());
    let gateway = MockGateway::succeeding();
    let id = pending_order(&db, "cust-207").await;

    let (order, _) = api.initialize_payment(&gateway, &id, "ada@example.com").await.unwrap();
    let reference = order.payment_reference.unwrap();

    let failed = api.process_gateway_event(failure_event(&reference)).await.unwrap();
    assert!(matches!(failed, WebhookDisposition::Failed(_)));

    let recovered = api.process_gateway_event(success_event(&reference)).await.unwrap();
    let order = match recovered {
        WebhookDisposition::Confirmed(order) => order,
        other => panic!("Expected Confirmed, got {other:?}"),
    };
    assert_eq!(order.payment_status, PaymentStatus::Paid);
}

#[tokio::test]
async fn unknown_event_types_and_unmatched_references_are_absorbed() {
    let db = new_db("sqlite://../data/test_recon_unmatched.db").await;
    let api = PaymentFlowApi::new(db.clone());
    let gateway = MockGateway::succeeding();
    let id = pending_order(&db, "cust-208").await;

    let (order, _) = api.initialize_payment(&gateway, &id, "ada@example.com").await.unwrap();
    let reference = order.payment_reference.unwrap();

    let event = GatewayEvent {
        event_type: GatewayEventType::Other("transfer.success".to_string()),
        reference: reference.clone(),
        transaction_id: "1".to_string(),
    };
    let disposition = api.process_gateway_event(event).await.unwrap();
    assert!(matches!(disposition, WebhookDisposition::Ignored(_)));

    let disposition = api.process_gateway_event(success_event("order-77-never-issued")).await.unwrap();
    assert!(matches!(disposition, WebhookDisposition::Unmatched(_)));

    // Neither of those touched the real order.
    let reloaded = api.db().fetch_order_by_id(&id).await.unwrap().unwrap();
    assert_eq!(reloaded.payment_status, PaymentStatus::Pending);
}

#[tokio::test]
async fn cancelling_orders_respects_the_paid_terminal_state() {
    let db = new_db("sqlite://../data/test_recon_cancel.db").await;
    let api = PaymentFlowApi::new(db.clone());
    let gateway = MockGateway::succeeding();

    let cancellable = pending_order(&db, "cust-209").await;
    let order = api.cancel_order(&cancellable).await.unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Cancelled);
    // Cancelling twice is a no-op, not an error.
    let order = api.cancel_order(&cancellable).await.unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Cancelled);

    let paid = pending_order(&db, "cust-210").await;
    let (order, _) = api.initialize_payment(&gateway, &paid, "ada@example.com").await.unwrap();
    api.process_gateway_event(success_event(&order.payment_reference.unwrap())).await.unwrap();
    let err = api.cancel_order(&paid).await.expect_err("paid orders cannot be cancelled");
    assert!(matches!(err, PaymentGatewayError::OrderAlreadyPaid(_)));
}

#[tokio::test]
async fn stale_pending_orders_are_swept_into_cancelled() {
    let db = new_db("sqlite://../data/test_recon_expiry.db").await;
    let api = PaymentFlowApi::new(db.clone());
    let id = pending_order(&db, "cust-211").await;

    // Nothing is older than 48 hours yet.
    let swept = api.cancel_stale_orders(Duration::hours(48)).await.unwrap();
    assert!(swept.is_empty());

    // With a zero-width window every pending order qualifies.
    let swept = api.cancel_stale_orders(Duration::seconds(-1)).await.unwrap();
    assert_eq!(swept.len(), 1);
    assert_eq!(swept[0].id, id);
    assert_eq!(swept[0].payment_status, PaymentStatus::Cancelled);

    // A late success event still wins over the sweep.
    let gateway = MockGateway::succeeding();
    let (order, _) = match api.initialize_payment(&gateway, &id, "ada@example.com").await {
        Ok(r) => r,
        Err(e) => panic!("Cancelled orders can be re-initialized: {e}"),
    };
    let confirmed = api.process_gateway_event(success_event(&order.payment_reference.unwrap())).await.unwrap();
    assert!(matches!(confirmed, WebhookDisposition::Confirmed(_)));
}
