use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, App};
use commerce_payment_engine::PaymentFlowApi;
use serde_json::json;

use super::mocks::{paid_order, sample_order, MockPaymentBackend, ScriptedGateway};
use crate::routes::{InitializePaymentRoute, VerifyPaymentRoute};

async fn call(
    backend: MockPaymentBackend,
    gateway: web::Data<ScriptedGateway>,
    req: TestRequest,
) -> (StatusCode, String) {
    let app = App::new()
        .app_data(web::Data::new(PaymentFlowApi::new(backend)))
        .app_data(gateway)
        .service(InitializePaymentRoute::<MockPaymentBackend, ScriptedGateway>::new())
        .service(VerifyPaymentRoute::<MockPaymentBackend, ScriptedGateway>::new());
    let service = test::init_service(app).await;
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}

fn init_request(order_id: i64) -> TestRequest {
    TestRequest::post()
        .uri("/payments/initialize")
        .insert_header(("x-customer-id", "cust-1"))
        .insert_header(("x-customer-email", "ada@example.com"))
        .set_json(json!({ "order_id": order_id }))
}

#[actix_web::test]
async fn initializing_a_pending_order_returns_an_authorization_url() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockPaymentBackend::new();
    backend.expect_fetch_order_by_id().returning(|_| Ok(Some(sample_order(1))));
    backend.expect_set_payment_reference().returning(|_, reference| {
        let mut order = sample_order(1);
        order.payment_reference = Some(reference.to_string());
        Ok(Some(order))
    });
    let gateway = web::Data::new(ScriptedGateway::succeeding());
    let gw = gateway.clone();

    let (status, body) = call(backend, gateway, init_request(1)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("https://checkout.paystack.com/order-1-"));
    assert!(body.contains(r#""message":"Payment initialized""#));
    assert_eq!(gw.init_count(), 1);
}

#[actix_web::test]
async fn initializing_a_paid_order_conflicts_without_gateway_traffic() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockPaymentBackend::new();
    backend.expect_fetch_order_by_id().returning(|_| Ok(Some(paid_order(1))));
    let gateway = web::Data::new(ScriptedGateway::succeeding());
    let gw = gateway.clone();

    let (status, body) = call(backend, gateway, init_request(1)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("already been paid"));
    assert_eq!(gw.init_count(), 0);
}

#[actix_web::test]
async fn initializing_a_missing_order_is_404() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockPaymentBackend::new();
    backend.expect_fetch_order_by_id().returning(|_| Ok(None));
    let gateway = web::Data::new(ScriptedGateway::succeeding());

    let (status, _) = call(backend, gateway, init_request(99)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn initializing_someone_elses_order_is_forbidden() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockPaymentBackend::new();
    backend.expect_fetch_order_by_id().returning(|_| {
        let mut order = sample_order(1);
        order.customer_id = "cust-2".to_string();
        Ok(Some(order))
    });
    let gateway = web::Data::new(ScriptedGateway::succeeding());
    let gw = gateway.clone();

    let (status, _) = call(backend, gateway, init_request(1)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(gw.init_count(), 0);
}

#[actix_web::test]
async fn verifying_an_already_paid_order_short_circuits_locally() {
    let _ = env_logger::try_init().ok();
    let order = paid_order(7);
    let reference = order.payment_reference.clone().unwrap();
    let mut backend = MockPaymentBackend::new();
    backend.expect_fetch_order_by_payment_reference().returning(move |_| Ok(Some(paid_order(7))));
    let gateway = web::Data::new(ScriptedGateway::succeeding());
    let gw = gateway.clone();

    let req = TestRequest::get()
        .uri(&format!("/payments/verify/{reference}"))
        .insert_header(("x-customer-id", "cust-1"));
    let (status, body) = call(backend, gateway, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""message":"Payment already verified""#));
    assert!(body.contains(r#""gateway_status":null"#));
    // The gateway is never consulted for a finalized order.
    assert_eq!(gw.verify_count(), 0);
}

#[actix_web::test]
async fn verifying_a_pending_order_confirms_it() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockPaymentBackend::new();
    backend.expect_fetch_order_by_payment_reference().returning(|_| {
        let mut order = sample_order(7);
        order.payment_reference = Some("order-7-1709213400000-9f2c".to_string());
        Ok(Some(order))
    });
    backend.expect_confirm_order_paid().returning(|_, _| Ok(Some(paid_order(7))));
    let gateway = web::Data::new(ScriptedGateway::succeeding());
    let gw = gateway.clone();

    let req = TestRequest::get()
        .uri("/payments/verify/order-7-1709213400000-9f2c")
        .insert_header(("x-customer-id", "cust-1"));
    let (status, body) = call(backend, gateway, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""message":"Payment successful""#));
    assert!(body.contains(r#""gateway_status":"success""#));
    assert!(body.contains(r#""payment_status":"paid""#));
    assert_eq!(gw.verify_count(), 1);
}

#[actix_web::test]
async fn verifying_an_unknown_reference_is_404() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockPaymentBackend::new();
    backend.expect_fetch_order_by_payment_reference().returning(|_| Ok(None));
    let gateway = web::Data::new(ScriptedGateway::succeeding());
    let gw = gateway.clone();

    let req = TestRequest::get().uri("/payments/verify/order-0-nope").insert_header(("x-customer-id", "cust-1"));
    let (status, _) = call(backend, gateway, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(gw.verify_count(), 0);
}
