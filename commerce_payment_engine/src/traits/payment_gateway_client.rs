use thiserror::Error;

use crate::traits::data_objects::{GatewayTransaction, InitializeTransaction, InitializedTransaction};

/// Outbound interface to the payment provider.
///
/// The engine performs no retries through this trait; a failed call surfaces to the caller with the order left
/// untouched, and retry is the client's (or the gateway's own webhook redelivery's) responsibility.
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayClient {
    /// Opens a checkout session for the given amount/reference and returns the authorization target the customer
    /// must be redirected to.
    async fn initialize_transaction(
        &self,
        request: InitializeTransaction,
    ) -> Result<InitializedTransaction, GatewayClientError>;

    /// Fetches the authoritative state of the transaction with the given reference.
    async fn verify_transaction(&self, reference: &str) -> Result<GatewayTransaction, GatewayClientError>;
}

#[derive(Debug, Clone, Error)]
pub enum GatewayClientError {
    #[error("The payment gateway could not be reached. {0}")]
    Unreachable(String),
    #[error("The payment gateway rejected the request. {0}")]
    Rejected(String),
    #[error("The payment gateway returned an unusable response. {0}")]
    InvalidResponse(String),
}
