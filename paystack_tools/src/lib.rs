mod api;
mod config;
mod error;

mod data_objects;

pub use api::PaystackApi;
pub use config::PaystackConfig;
pub use data_objects::{
    NewTransactionRequest,
    TransactionAuthorization,
    TransactionData,
    WebhookEvent,
    WebhookEventData,
    PAYSTACK_SIGNATURE_HEADER,
    TRANSACTION_FAILED_EVENT,
    TRANSACTION_SUCCESS_EVENT,
};
pub use error::PaystackApiError;
