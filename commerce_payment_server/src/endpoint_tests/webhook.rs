use actix_web::{
    body::MessageBody,
    error::ResponseError,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    App,
};
use commerce_payment_engine::PaymentFlowApi;
use cpg_common::Secret;
use paystack_tools::PAYSTACK_SIGNATURE_HEADER;

use super::mocks::{paid_order, sample_order, MockPaymentBackend};
use crate::{helpers::calculate_hmac, middleware::HmacMiddlewareFactory, paystack_routes::PaystackWebhookRoute};

const SECRET: &str = "sk_test_webhook_secret";
const REFERENCE: &str = "order-7-1709213400000-9f2c";

fn success_body() -> String {
    format!(r#"{{"event":"charge.success","data":{{"id":302961,"reference":"{REFERENCE}","status":"success"}}}}"#)
}

/// Drives a delivery through the real HMAC middleware into the webhook handler.
async fn deliver(backend: MockPaymentBackend, body: &str, signature: Option<String>) -> (StatusCode, String) {
    let app = App::new().app_data(web::Data::new(PaymentFlowApi::new(backend))).service(
        web::scope("/paystack")
            .wrap(HmacMiddlewareFactory::new(PAYSTACK_SIGNATURE_HEADER, Secret::new(SECRET.to_string()), true))
            .service(PaystackWebhookRoute::<MockPaymentBackend>::new()),
    );
    let service = test::init_service(app).await;
    let mut req = TestRequest::post().uri("/paystack/webhook").set_payload(body.to_string());
    if let Some(signature) = signature {
        req = req.insert_header((PAYSTACK_SIGNATURE_HEADER, signature));
    }
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let (_, res) = res.into_parts();
            let status = res.status();
            let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
            (status, body)
        },
        Err(e) => {
            let res = e.as_response_error().error_response();
            let status = res.status();
            let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
            (status, body)
        },
    }
}

fn signed(body: &str) -> Option<String> {
    Some(calculate_hmac(SECRET, body.as_bytes()))
}

#[actix_web::test]
async fn a_signed_success_event_marks_the_order_as_paid() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockPaymentBackend::new();
    backend.expect_fetch_order_by_payment_reference().returning(|_| {
        let mut order = sample_order(7);
        order.payment_reference = Some(REFERENCE.to_string());
        Ok(Some(order))
    });
    backend.expect_confirm_order_paid().returning(|_, _| Ok(Some(paid_order(7))));

    let body = success_body();
    let (status, response) = deliver(backend, &body, signed(&body)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(response.contains(r#""success":true"#));
    assert!(response.contains("Order marked as paid"));
}

#[actix_web::test]
async fn a_bad_signature_is_rejected_before_any_lookup() {
    let _ = env_logger::try_init().ok();
    // No expectations at all: any backend call would fail the test.
    let backend = MockPaymentBackend::new();
    let body = success_body();
    let (status, _) = deliver(backend, &body, Some("deadbeef".repeat(16))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn a_missing_signature_is_rejected_before_any_lookup() {
    let _ = env_logger::try_init().ok();
    let backend = MockPaymentBackend::new();
    let body = success_body();
    let (status, _) = deliver(backend, &body, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn duplicate_success_deliveries_are_acknowledged_without_mutation() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockPaymentBackend::new();
    backend.expect_fetch_order_by_payment_reference().returning(|_| Ok(Some(paid_order(7))));
    // The conditional update reports "no row changed" for an already-paid order.
    backend.expect_confirm_order_paid().returning(|_, _| Ok(None));

    let body = success_body();
    let (status, response) = deliver(backend, &body, signed(&body)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(response.contains("Order already paid"));
}

#[actix_web::test]
async fn an_unmatched_reference_is_acknowledged_with_200() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockPaymentBackend::new();
    backend.expect_fetch_order_by_payment_reference().returning(|_| Ok(None));

    let body = success_body();
    let (status, response) = deliver(backend, &body, signed(&body)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(response.contains("No order to update"));
}

#[actix_web::test]
async fn unknown_event_types_are_acknowledged_and_ignored() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockPaymentBackend::new();
    backend.expect_fetch_order_by_payment_reference().returning(|_| {
        let mut order = sample_order(7);
        order.payment_reference = Some(REFERENCE.to_string());
        Ok(Some(order))
    });

    let body =
        format!(r#"{{"event":"subscription.create","data":{{"id":1,"reference":"{REFERENCE}"}}}}"#);
    let (status, response) = deliver(backend, &body, signed(&body)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(response.contains("Event ignored"));
}

#[actix_web::test]
async fn malformed_payloads_are_absorbed_into_an_acknowledgment() {
    let _ = env_logger::try_init().ok();
    let backend = MockPaymentBackend::new();
    let body = r#"{"event": 42}"#;
    let (status, response) = deliver(backend, body, signed(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(response.contains(r#""success":false"#));
}

#[actix_web::test]
async fn a_signed_failure_event_marks_the_order_as_failed() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockPaymentBackend::new();
    backend.expect_fetch_order_by_payment_reference().returning(|_| {
        let mut order = sample_order(7);
        order.payment_reference = Some(REFERENCE.to_string());
        Ok(Some(order))
    });
    backend.expect_fail_order_payment().returning(|_| {
        let mut order = sample_order(7);
        order.payment_status = commerce_payment_engine::db_types::PaymentStatus::Failed;
        Ok(Some(order))
    });

    let body =
        format!(r#"{{"event":"charge.failed","data":{{"id":302962,"reference":"{REFERENCE}","status":"failed"}}}}"#);
    let (status, response) = deliver(backend, &body, signed(&body)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(response.contains("Order marked as failed"));
}
