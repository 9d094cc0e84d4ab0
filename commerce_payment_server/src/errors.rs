use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use commerce_payment_engine::traits::{CatalogError, OrderApiError, PaymentGatewayError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Invalid order. {0}")]
    InvalidOrder(String),
    #[error("Payment conflict. {0}")]
    PaymentConflict(String),
    #[error("The payment gateway did not cooperate. {0}")]
    UpstreamError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidOrder(_) => StatusCode::BAD_REQUEST,
            // Re-initializing a paid order is reported as a plain client error, matching the storefront contract.
            Self::PaymentConflict(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingIdentity => StatusCode::UNAUTHORIZED,
                AuthError::InvalidIdentity(_) => StatusCode::UNAUTHORIZED,
                AuthError::InvalidSignature => StatusCode::UNAUTHORIZED,
                AuthError::ForbiddenPeer => StatusCode::FORBIDDEN,
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            },
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::UpstreamError(_) => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No authenticated identity was forwarded with the request.")]
    MissingIdentity,
    #[error("The forwarded identity headers are malformed. {0}")]
    InvalidIdentity(String),
    #[error("The webhook signature is missing or invalid.")]
    InvalidSignature,
    #[error("Requests from this peer address are not accepted.")]
    ForbiddenPeer,
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
}

impl From<PaymentGatewayError> for ServerError {
    fn from(e: PaymentGatewayError) -> Self {
        match e {
            PaymentGatewayError::EmptyOrder | PaymentGatewayError::InvalidQuantity(_) => {
                Self::InvalidOrder(e.to_string())
            },
            PaymentGatewayError::ProductNotFound(_) |
            PaymentGatewayError::OrderNotFound(_) |
            PaymentGatewayError::OrderNotFoundForReference(_) => Self::NoRecordFound(e.to_string()),
            PaymentGatewayError::OrderAlreadyPaid(_) => Self::PaymentConflict(e.to_string()),
            PaymentGatewayError::GatewayError(e) => Self::UpstreamError(e.to_string()),
            PaymentGatewayError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            PaymentGatewayError::OrderError(e) => Self::from(e),
            PaymentGatewayError::CatalogError(e) => Self::from(e),
        }
    }
}

impl From<OrderApiError> for ServerError {
    fn from(e: OrderApiError) -> Self {
        match e {
            OrderApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            OrderApiError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderApiError::DeliveryChangeNoOp | OrderApiError::DeliveryChangeForbidden { .. } => {
                Self::InvalidOrder(e.to_string())
            },
        }
    }
}

impl From<CatalogError> for ServerError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            CatalogError::ProductNotFound(_) => Self::NoRecordFound(e.to_string()),
        }
    }
}
