use actix_web::{
    body::MessageBody,
    error::ResponseError,
    http::StatusCode,
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
};
use log::debug;

/// Identity headers for a plain storefront customer.
pub fn customer_headers() -> Vec<(&'static str, &'static str)> {
    vec![("x-customer-id", "cust-1"), ("x-customer-email", "ada@example.com")]
}

/// Identity headers for a back-office admin.
pub fn admin_headers() -> Vec<(&'static str, &'static str)> {
    vec![("x-customer-id", "ops-1"), ("x-customer-email", "ops@example.com"), ("x-customer-roles", "user,admin")]
}

pub async fn get_request(
    identity: &[(&str, &str)],
    path: &str,
    configure: fn(&mut ServiceConfig),
) -> (StatusCode, String) {
    let mut req = TestRequest::get().uri(path);
    for (name, value) in identity {
        req = req.insert_header((*name, *value));
    }
    send(req, configure).await
}

pub async fn post_request(
    identity: &[(&str, &str)],
    path: &str,
    body: serde_json::Value,
    configure: fn(&mut ServiceConfig),
) -> (StatusCode, String) {
    let mut req = TestRequest::post().uri(path).set_json(body);
    for (name, value) in identity {
        req = req.insert_header((*name, *value));
    }
    send(req, configure).await
}

async fn send(req: TestRequest, configure: fn(&mut ServiceConfig)) -> (StatusCode, String) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let (_, res) = res.into_parts();
            let status = res.status();
            let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
            (status, body)
        },
        // Middleware rejections surface as service-level errors in the test harness. Render them the same way the
        // server would.
        Err(e) => {
            let res = e.as_response_error().error_response();
            let status = res.status();
            let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
            (status, body)
        },
    }
}
