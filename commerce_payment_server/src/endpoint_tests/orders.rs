use actix_web::{http::StatusCode, web, web::ServiceConfig};
use commerce_payment_engine::{order_objects::FullOrder, OrdersApi, PaymentFlowApi};
use serde_json::json;

use super::{
    helpers::{admin_headers, customer_headers, get_request, post_request},
    mocks::{sample_items, sample_order, MockPaymentBackend},
};
use crate::routes::{CreateOrderRoute, MyOrdersRoute, OrderByIdRoute, SearchOrdersRoute};

fn order_body() -> serde_json::Value {
    json!({
        "products": [{ "product": 1, "quantity": 2 }],
        "shipping_address": {
            "address": "14 Broad Street",
            "city": "Lagos",
            "state": "Lagos",
            "postal_code": "101233",
            "country": "Nigeria"
        }
    })
}

#[actix_web::test]
async fn create_order_returns_201_with_the_snapshotted_order() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut backend = MockPaymentBackend::new();
        backend.expect_insert_order().returning(|order| {
            let mut full = FullOrder { order: sample_order(1), items: sample_items(1) };
            full.order.customer_id = order.customer_id;
            Ok(full)
        });
        cfg.service(CreateOrderRoute::<MockPaymentBackend>::new())
            .app_data(web::Data::new(PaymentFlowApi::new(backend)));
    }
    let (status, body) = post_request(&customer_headers(), "/orders", order_body(), configure).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.contains(r#""total_amount":10000"#));
    assert!(body.contains(r#""payment_status":"pending""#));
    assert!(body.contains(r#""items""#));
}

#[actix_web::test]
async fn create_order_with_no_items_is_rejected_before_any_write() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        // No insert_order expectation: reaching the backend would fail the test.
        let backend = MockPaymentBackend::new();
        cfg.service(CreateOrderRoute::<MockPaymentBackend>::new())
            .app_data(web::Data::new(PaymentFlowApi::new(backend)));
    }
    let body = json!({ "products": [], "shipping_address": order_body()["shipping_address"] });
    let (status, _) = post_request(&customer_headers(), "/orders", body, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn create_order_without_identity_is_unauthorized() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let backend = MockPaymentBackend::new();
        cfg.service(CreateOrderRoute::<MockPaymentBackend>::new())
            .app_data(web::Data::new(PaymentFlowApi::new(backend)));
    }
    let (status, _) = post_request(&[], "/orders", order_body(), configure).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn my_orders_lists_only_the_callers_orders() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut backend = MockPaymentBackend::new();
        backend.expect_fetch_orders_for_customer().returning(|_| Ok(vec![sample_order(1), sample_order(2)]));
        cfg.service(MyOrdersRoute::<MockPaymentBackend>::new()).app_data(web::Data::new(OrdersApi::new(backend)));
    }
    let (status, body) = get_request(&customer_headers(), "/orders", configure).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""customer_id":"cust-1""#));
    assert!(body.contains(r#""total_orders":2"#));
    assert!(body.contains(r#""created_at":"2024-02-29T13:30:00Z""#));
}

#[actix_web::test]
async fn order_by_id_returns_the_full_order_to_its_owner() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut backend = MockPaymentBackend::new();
        backend.expect_fetch_order_by_id().returning(|_| Ok(Some(sample_order(1))));
        backend.expect_fetch_order_items().returning(|_| Ok(sample_items(1)));
        cfg.service(OrderByIdRoute::<MockPaymentBackend>::new()).app_data(web::Data::new(OrdersApi::new(backend)));
    }
    let (status, body) = get_request(&customer_headers(), "/orders/1", configure).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""unit_price":5000"#));
}

#[actix_web::test]
async fn order_by_id_hides_other_customers_orders() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut backend = MockPaymentBackend::new();
        backend.expect_fetch_order_by_id().returning(|_| {
            let mut order = sample_order(1);
            order.customer_id = "cust-2".to_string();
            Ok(Some(order))
        });
        backend.expect_fetch_order_items().returning(|_| Ok(sample_items(1)));
        cfg.service(OrderByIdRoute::<MockPaymentBackend>::new()).app_data(web::Data::new(OrdersApi::new(backend)));
    }
    let (status, _) = get_request(&customer_headers(), "/orders/1", configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admins can read anyone's order.
    let (status, _) = get_request(&admin_headers(), "/orders/1", configure_admin).await;
    assert_eq!(status, StatusCode::OK);
}

fn configure_admin(cfg: &mut ServiceConfig) {
    let mut backend = MockPaymentBackend::new();
    backend.expect_fetch_order_by_id().returning(|_| {
        let mut order = sample_order(1);
        order.customer_id = "cust-2".to_string();
        Ok(Some(order))
    });
    backend.expect_fetch_order_items().returning(|_| Ok(sample_items(1)));
    cfg.service(OrderByIdRoute::<MockPaymentBackend>::new()).app_data(web::Data::new(OrdersApi::new(backend)));
}

#[actix_web::test]
async fn order_by_id_is_404_when_absent() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut backend = MockPaymentBackend::new();
        backend.expect_fetch_order_by_id().returning(|_| Ok(None));
        cfg.service(OrderByIdRoute::<MockPaymentBackend>::new()).app_data(web::Data::new(OrdersApi::new(backend)));
    }
    let (status, _) = get_request(&customer_headers(), "/orders/99", configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn order_search_is_admin_only() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut backend = MockPaymentBackend::new();
        backend.expect_search_orders().returning(|_| Ok(vec![sample_order(1)]));
        cfg.service(SearchOrdersRoute::<MockPaymentBackend>::new())
            .app_data(web::Data::new(OrdersApi::new(backend)));
    }
    let (status, _) = get_request(&customer_headers(), "/orders/search?payment_status=pending", configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = get_request(&admin_headers(), "/orders/search?payment_status=pending", configure).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""payment_status":"pending""#));
}
