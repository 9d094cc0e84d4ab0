//! Customer identity handling.
//!
//! Credential storage and login live in an upstream auth layer. By the time a request reaches this server, that
//! layer has authenticated the caller and forwarded their identity in trusted headers:
//!
//! * `x-customer-id` - the stable customer identifier (required),
//! * `x-customer-email` - the customer's contact address, needed for payment initialization,
//! * `x-customer-roles` - comma-separated roles; absent means a plain `user`.
//!
//! Handlers receive the identity through the [`CustomerIdentity`] extractor; role-gated routes are additionally
//! wrapped in the ACL middleware.

use std::{future::ready, str::FromStr};

use actix_web::{dev::Payload, http::header::HeaderMap, FromRequest, HttpRequest};
use serde::{Deserialize, Serialize};

use crate::errors::{AuthError, ServerError};

pub const CUSTOMER_ID_HEADER: &str = "x-customer-id";
pub const CUSTOMER_EMAIL_HEADER: &str = "x-customer-email";
pub const CUSTOMER_ROLES_HEADER: &str = "x-customer-roles";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(AuthError::InvalidIdentity(format!("Unknown role: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerIdentity {
    pub customer_id: String,
    pub email: Option<String>,
    pub roles: Vec<Role>,
}

impl CustomerIdentity {
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }

    /// True when the identity may read or act on the given customer's resources.
    pub fn may_act_for(&self, customer_id: &str) -> bool {
        self.customer_id == customer_id || self.is_admin()
    }
}

pub fn identity_from_headers(headers: &HeaderMap) -> Result<CustomerIdentity, AuthError> {
    let customer_id = headers
        .get(CUSTOMER_ID_HEADER)
        .ok_or(AuthError::MissingIdentity)?
        .to_str()
        .map_err(|e| AuthError::InvalidIdentity(e.to_string()))?
        .trim()
        .to_string();
    if customer_id.is_empty() {
        return Err(AuthError::MissingIdentity);
    }
    let email = match headers.get(CUSTOMER_EMAIL_HEADER) {
        Some(v) => Some(v.to_str().map_err(|e| AuthError::InvalidIdentity(e.to_string()))?.trim().to_string()),
        None => None,
    };
    let roles = match headers.get(CUSTOMER_ROLES_HEADER) {
        Some(v) => v
            .to_str()
            .map_err(|e| AuthError::InvalidIdentity(e.to_string()))?
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(Role::from_str)
            .collect::<Result<Vec<Role>, AuthError>>()?,
        None => vec![Role::User],
    };
    Ok(CustomerIdentity { customer_id, email, roles })
}

impl FromRequest for CustomerIdentity {
    type Error = ServerError;
    type Future = std::future::Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(identity_from_headers(req.headers()).map_err(ServerError::AuthenticationError))
    }
}

#[cfg(test)]
mod test {
    use actix_web::http::header::{HeaderMap, HeaderName, HeaderValue};

    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(HeaderName::from_lowercase(name.as_bytes()).unwrap(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn identity_requires_a_customer_id() {
        let err = identity_from_headers(&HeaderMap::new()).unwrap_err();
        assert!(matches!(err, AuthError::MissingIdentity));
    }

    #[test]
    fn default_role_is_user() {
        let identity =
            identity_from_headers(&headers(&[("x-customer-id", "cust-1"), ("x-customer-email", "ada@example.com")]))
                .unwrap();
        assert_eq!(identity.customer_id, "cust-1");
        assert_eq!(identity.email.as_deref(), Some("ada@example.com"));
        assert_eq!(identity.roles, vec![Role::User]);
        assert!(!identity.is_admin());
        assert!(identity.may_act_for("cust-1"));
        assert!(!identity.may_act_for("cust-2"));
    }

    #[test]
    fn admins_may_act_for_anyone() {
        let identity =
            identity_from_headers(&headers(&[("x-customer-id", "ops-1"), ("x-customer-roles", "user, admin")]))
                .unwrap();
        assert!(identity.is_admin());
        assert!(identity.may_act_for("cust-2"));
    }

    #[test]
    fn unknown_roles_are_rejected() {
        let err = identity_from_headers(&headers(&[("x-customer-id", "cust-1"), ("x-customer-roles", "superuser")]))
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidIdentity(_)));
    }
}
