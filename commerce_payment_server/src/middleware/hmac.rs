//! HMAC middleware for Actix Web.
//!
//! This module provides a middleware for Actix Web that checks the HMAC signature of incoming requests.
//!
//! Paystack signs every webhook delivery with the account's secret key over the raw request body and puts the hex
//! HMAC-SHA512 in the `x-paystack-signature` header.
//!
//! Wrap the webhook scope with this middleware and handlers will only ever see payloads whose signature checked
//! out; a missing or mismatched signature is rejected with a 401 before any order is looked up or touched. The
//! middleware buffers the exact wire bytes for the check and re-injects them, so the signature covers what was
//! actually sent, not a re-serialized rendering of it.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorBadRequest, ErrorUnauthorized},
    web,
    Error,
};
use cpg_common::Secret;
use futures::future::LocalBoxFuture;
use log::{trace, warn};

use crate::helpers::calculate_hmac;

pub struct HmacMiddlewareFactory {
    signature_header: String,
    key: Secret<String>,
    // If false, then the middleware will not check the HMAC signature and always allow the call
    enabled: bool,
}

impl HmacMiddlewareFactory {
    pub fn new(signature_header: &str, key: Secret<String>, enabled: bool) -> Self {
        HmacMiddlewareFactory { signature_header: signature_header.into(), key, enabled }
    }
}

impl<S, B> Transform<S, ServiceRequest> for HmacMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = HmacMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(HmacMiddlewareService {
            signature_header: self.signature_header.clone(),
            key: self.key.clone(),
            enabled: self.enabled,
            service: Rc::new(service),
        }))
    }
}

pub struct HmacMiddlewareService<S> {
    signature_header: String,
    key: Secret<String>,
    enabled: bool,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for HmacMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let secret = self.key.reveal().clone();
        let signature_header = self.signature_header.clone();
        let enabled = self.enabled;
        Box::pin(async move {
            trace!("🔐️ Checking webhook signature for request");
            if !enabled {
                trace!("🔐️ Signature checks are disabled. Allowing request.");
                return service.call(req).await;
            }
            let data = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to extract request data: {:?}", e);
                ErrorBadRequest("Failed to extract request data.")
            })?;
            let expected = calculate_hmac(&secret, data.as_ref());
            let signature = req.headers().get(&signature_header).ok_or_else(|| {
                warn!("🔐️ No webhook signature found in request. Denying access.");
                ErrorUnauthorized("Invalid webhook signature.")
            })?;
            let validated = signature == expected.as_str();
            if validated {
                trace!("🔐️ Webhook signature check ✅️");
                req.set_payload(bytes_to_payload(data));
                service.call(req).await
            } else {
                warn!("🔐️ Invalid webhook signature found in request. Denying access.");
                Err(ErrorUnauthorized("Invalid webhook signature."))
            }
        })
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
