use std::time::Duration;

use actix_web::{
    dev::{Server, Service},
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpServer,
};
use commerce_payment_engine::{OrdersApi, PaymentFlowApi, SqliteDatabase};
use futures::{future::ok, FutureExt};
use log::{info, warn};
use paystack_tools::PAYSTACK_SIGNATURE_HEADER;

use crate::{
    config::ServerConfig,
    errors::{AuthError, ServerError, ServerError::AuthenticationError},
    expiry_worker::start_expiry_worker,
    helpers::get_remote_ip,
    integrations::paystack::PaystackGateway,
    middleware::HmacMiddlewareFactory,
    paystack_routes::PaystackWebhookRoute,
    routes::{
        health,
        CancelOrderRoute,
        CreateOrderRoute,
        InitializePaymentRoute,
        MyOrdersRoute,
        OrderByIdRoute,
        SearchOrdersRoute,
        UpdateDeliveryStatusRoute,
        VerifyPaymentRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = PaystackGateway::new(config.paystack_config.api_config.clone())
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    start_expiry_worker(db.clone(), config.unpaid_order_timeout);
    let srv = create_server_instance(config, db, gateway)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: PaystackGateway,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let flow_api = PaymentFlowApi::new(db.clone());
        let orders_api = OrdersApi::new(db.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("cpg::access_log"))
            .app_data(web::Data::new(flow_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(gateway.clone()));
        // Routes for authenticated storefront customers. `/orders/search` is registered before `/orders/{id}`
        // so the literal segment wins.
        let api_scope = web::scope("/api")
            .service(SearchOrdersRoute::<SqliteDatabase>::new())
            .service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(UpdateDeliveryStatusRoute::<SqliteDatabase>::new())
            .service(CancelOrderRoute::<SqliteDatabase>::new())
            .service(InitializePaymentRoute::<SqliteDatabase, PaystackGateway>::new())
            .service(VerifyPaymentRoute::<SqliteDatabase, PaystackGateway>::new());
        let use_x_forwarded_for = config.use_x_forwarded_for;
        let use_forwarded = config.use_forwarded;
        let paystack_whitelist = config.paystack_config.whitelist.clone();
        let webhook_secret = config.paystack_config.api_config.secret_key.clone();
        let signature_checks = config.paystack_config.signature_checks;
        let webhook_scope = web::scope("/paystack")
            .wrap(HmacMiddlewareFactory::new(PAYSTACK_SIGNATURE_HEADER, webhook_secret, signature_checks))
            .wrap_fn(move |req, srv| {
                // Collect the peer IP from the x-forwarded-for or forwarded headers _if_ the corresponding flag has
                // been set in the configuration. Otherwise, use the peer address from the connection info.
                let peer_ip = get_remote_ip(req.request(), use_x_forwarded_for, use_forwarded);
                let whitelisted = match (peer_ip, &paystack_whitelist) {
                    (Some(ip), Some(whitelist)) => {
                        info!("Paystack webhook from {ip}");
                        whitelist.contains(&ip)
                    },
                    (_, None) => true,
                    (None, Some(_)) => {
                        warn!("No IP address found in webhook remote peer request, denying access.");
                        false
                    },
                };
                if whitelisted {
                    srv.call(req).boxed_local()
                } else {
                    ok(req.error_response(AuthenticationError(AuthError::ForbiddenPeer))).boxed_local()
                }
            })
            .service(PaystackWebhookRoute::<SqliteDatabase>::new());
        app.service(health).service(api_scope).service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
