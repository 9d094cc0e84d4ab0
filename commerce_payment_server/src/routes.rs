//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause
//! the current worker to stop processing new requests. For this reason, any long, non-cpu-bound operation (e.g. I/O,
//! database and gateway calls) is expressed as an async function, so worker threads keep serving other requests at
//! every await point.

use actix_web::{get, web, HttpResponse, Responder};
use commerce_payment_engine::{
    db_types::{NewOrder, NewOrderItem, OrderId},
    order_objects::{OrderQueryFilter, PaymentOutcome},
    traits::{OrderManagement, PaymentGatewayClient, PaymentGatewayDatabase},
    OrdersApi,
    PaymentFlowApi,
};
use log::*;

use crate::{
    auth::{CustomerIdentity, Role},
    data_objects::{
        CreateOrderRequest,
        DeliveryUpdateRequest,
        InitializePaymentRequest,
        InitializePaymentResponse,
        VerifyPaymentResponse,
    },
    errors::{AuthError, ServerError},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal requires [$($roles:ty),*]) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name)
                        .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:ty),*])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds)++ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------

route!(create_order => Post "/orders" impl PaymentGatewayDatabase);
/// Route handler for creating a new order.
///
/// Line-item prices are snapshotted from the catalog inside a single transaction and the whole order is rejected if
/// any referenced product is missing or any quantity is not a positive integer. The new order starts out `pending`;
/// no gateway call is made until the customer explicitly initializes payment.
pub async fn create_order<B: PaymentGatewayDatabase>(
    identity: CustomerIdentity,
    body: web::Json<CreateOrderRequest>,
    api: web::Data<PaymentFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    debug!("💻️ POST create order for customer {} with {} items", identity.customer_id, request.products.len());
    let items = request
        .products
        .iter()
        .map(|item| NewOrderItem { product_id: item.product, quantity: item.quantity })
        .collect::<Vec<_>>();
    let order = NewOrder::new(identity.customer_id, items, request.shipping_address);
    let order = api.create_order(order).await?;
    Ok(HttpResponse::Created().json(order))
}

route!(my_orders => Get "/orders" impl OrderManagement);
/// Route handler for the orders endpoint
///
/// Returns the orders belonging to the authenticated customer. Admins wanting to look at other customers' orders
/// use the `/orders/search` endpoint instead.
pub async fn my_orders<B: OrderManagement>(
    identity: CustomerIdentity,
    api: web::Data<OrdersApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_orders for {}", identity.customer_id);
    let orders = api.orders_for_customer(&identity.customer_id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(search_orders => Get "/orders/search" impl OrderManagement where requires [Role::Admin]);
/// Route handler for the order search endpoint. Admin only.
pub async fn search_orders<B: OrderManagement>(
    query: web::Query<OrderQueryFilter>,
    api: web::Data<OrdersApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let query = query.into_inner();
    debug!("💻️ GET order search: {query:?}");
    let orders = api.search_orders(query).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{id}" impl OrderManagement);
/// Route handler for fetching a single order, with its line items.
///
/// Customers can only read their own orders; admins can read anyone's.
pub async fn order_by_id<B: OrderManagement>(
    identity: CustomerIdentity,
    path: web::Path<i64>,
    api: web::Data<OrdersApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ GET order {order_id} for {}", identity.customer_id);
    let order = api
        .order_by_id(&order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id} not found")))?;
    if !identity.may_act_for(&order.order.customer_id) {
        return Err(AuthError::InsufficientPermissions(format!("Order {order_id} belongs to another customer")).into());
    }
    Ok(HttpResponse::Ok().json(order))
}

route!(update_delivery_status => Post "/orders/{id}/delivery" impl OrderManagement where requires [Role::Admin]);
/// Route handler for moving an order through the delivery lifecycle. Admin only.
///
/// Delivery changes never touch the payment state machine.
pub async fn update_delivery_status<B: OrderManagement>(
    path: web::Path<i64>,
    body: web::Json<DeliveryUpdateRequest>,
    api: web::Data<OrdersApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    let new_status = body.into_inner().status;
    debug!("💻️ POST delivery status {new_status:?} for order {order_id}");
    let order = api.set_delivery_status(&order_id, new_status).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(cancel_order => Post "/orders/{id}/cancel" impl PaymentGatewayDatabase);
/// Route handler for cancelling the payment side of an order.
///
/// Permitted for the order's owner and for admins, from `pending` and `failed` only. A paid order cannot be
/// cancelled here; refunds are an out-of-band concern.
pub async fn cancel_order<B: PaymentGatewayDatabase>(
    identity: CustomerIdentity,
    path: web::Path<i64>,
    api: web::Data<PaymentFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ POST cancel order {order_id} for {}", identity.customer_id);
    let order = api
        .db()
        .fetch_order_by_id(&order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id} not found")))?;
    if !identity.may_act_for(&order.customer_id) {
        return Err(AuthError::InsufficientPermissions(format!("Order {order_id} belongs to another customer")).into());
    }
    let order = api.cancel_order(&order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Payments  ----------------------------------------------------

route!(initialize_payment => Post "/payments/initialize" impl PaymentGatewayDatabase, PaymentGatewayClient);
/// Route handler for payment initialization.
///
/// Opens a checkout session with the gateway and stores the resulting payment reference on the order. The caller
/// is redirected to the returned authorization URL to complete payment. Re-initializing a still-pending order
/// overwrites its reference; an already-paid order is rejected before any gateway traffic.
pub async fn initialize_payment<B, G>(
    identity: CustomerIdentity,
    body: web::Json<InitializePaymentRequest>,
    api: web::Data<PaymentFlowApi<B>>,
    gateway: web::Data<G>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    G: PaymentGatewayClient + 'static,
{
    let order_id = OrderId::from(body.into_inner().order_id);
    debug!("💻️ POST initialize payment for order {order_id} by {}", identity.customer_id);
    let email = identity
        .email
        .clone()
        .ok_or_else(|| ServerError::InvalidRequestBody("No email address was forwarded for this customer".into()))?;
    let order = api
        .db()
        .fetch_order_by_id(&order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id} not found")))?;
    if !identity.may_act_for(&order.customer_id) {
        return Err(AuthError::InsufficientPermissions(format!("Order {order_id} belongs to another customer")).into());
    }
    let (order, authorization) = api.initialize_payment(gateway.get_ref(), &order_id, &email).await?;
    Ok(HttpResponse::Ok().json(InitializePaymentResponse {
        message: "Payment initialized".to_string(),
        authorization_url: authorization.authorization_url,
        order,
    }))
}

route!(verify_payment => Get "/payments/verify/{reference}" impl PaymentGatewayDatabase, PaymentGatewayClient);
/// Route handler for the synchronous payment verification endpoint.
///
/// An order that is already `paid` is returned unchanged, without a gateway round-trip. Otherwise the gateway is
/// asked for the authoritative transaction state and the order is finalized (or marked failed) accordingly. The
/// response carries the gateway's raw status so clients can tell "already paid" from "just confirmed".
pub async fn verify_payment<B, G>(
    identity: CustomerIdentity,
    path: web::Path<String>,
    api: web::Data<PaymentFlowApi<B>>,
    gateway: web::Data<G>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    G: PaymentGatewayClient + 'static,
{
    let reference = path.into_inner();
    debug!("💻️ GET verify payment {reference} by {}", identity.customer_id);
    // No ownership gate here: a payment reference is an unguessable correlation token, and the customer completing
    // checkout may legitimately poll it from a device the storefront session never saw.
    let verified = api.verify_payment(gateway.get_ref(), &reference).await?;
    let message = match verified.outcome {
        PaymentOutcome::AlreadyPaid => "Payment already verified",
        PaymentOutcome::Confirmed => "Payment successful",
        PaymentOutcome::Failed => "Payment failed",
    };
    Ok(HttpResponse::Ok().json(VerifyPaymentResponse {
        message: message.to_string(),
        gateway_status: verified.gateway_status,
        order: verified.order,
    }))
}
