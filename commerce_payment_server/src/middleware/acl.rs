//! Access control list middleware for the Commerce Payment Server.
//! This middleware can be placed on any route or service.
//!
//! It parses the forwarded identity headers and checks the caller's roles against the required roles for the route.
//! Requests without a forwarded identity are rejected with 401; authenticated callers lacking a required role get a
//! 403 Forbidden response.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorForbidden, ErrorUnauthorized},
    Error,
};
use futures::{
    future::{ok, Ready},
    Future,
};

use crate::auth::{identity_from_headers, Role};

pub struct AclMiddlewareFactory {
    required_roles: Vec<Role>,
}

impl AclMiddlewareFactory {
    pub fn new(required_roles: &[Role]) -> Self {
        AclMiddlewareFactory { required_roles: required_roles.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = AclMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AclMiddlewareService { required_roles: self.required_roles.clone(), service: Rc::new(service) })
    }
}

pub struct AclMiddlewareService<S> {
    required_roles: Vec<Role>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let required_roles = self.required_roles.clone();
        Box::pin(async move {
            let identity = identity_from_headers(req.headers()).map_err(|e| {
                log::warn!("No usable identity on role-gated route: {e}");
                ErrorUnauthorized(e.to_string())
            })?;
            if required_roles.iter().all(|role| identity.roles.contains(role)) {
                service.call(req).await
            } else {
                Err(ErrorForbidden("Insufficient permissions"))
            }
        })
    }
}
