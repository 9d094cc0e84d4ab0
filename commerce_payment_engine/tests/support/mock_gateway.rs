use std::sync::atomic::{AtomicUsize, Ordering};

use commerce_payment_engine::traits::{
    GatewayClientError,
    GatewayPaymentStatus,
    GatewayTransaction,
    InitializeTransaction,
    InitializedTransaction,
    PaymentGatewayClient,
};

/// Scripted in-memory stand-in for the payment provider. Counts calls so tests can assert that a code path never
/// reached the gateway.
pub struct MockGateway {
    pub init_calls: AtomicUsize,
    pub verify_calls: AtomicUsize,
    verify_status: GatewayPaymentStatus,
    raw_status: String,
}

impl MockGateway {
    pub fn succeeding() -> Self {
        Self {
            init_calls: AtomicUsize::new(0),
            verify_calls: AtomicUsize::new(0),
            verify_status: GatewayPaymentStatus::Success,
            raw_status: "success".to_string(),
        }
    }

    pub fn failing() -> Self {
        Self {
            init_calls: AtomicUsize::new(0),
            verify_calls: AtomicUsize::new(0),
            verify_status: GatewayPaymentStatus::Failed,
            raw_status: "abandoned".to_string(),
        }
    }

    pub fn init_count(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn verify_count(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

impl PaymentGatewayClient for MockGateway {
    async fn initialize_transaction(
        &self,
        request: InitializeTransaction,
    ) -> Result<InitializedTransaction, GatewayClientError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        Ok(InitializedTransaction {
            authorization_url: format!("https://checkout.example.com/{}", request.reference),
            reference: request.reference,
        })
    }

    async fn verify_transaction(&self, reference: &str) -> Result<GatewayTransaction, GatewayClientError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        Ok(GatewayTransaction {
            id: "300450".to_string(),
            reference: reference.to_string(),
            status: self.verify_status,
            raw_status: self.raw_status.clone(),
        })
    }
}

/// A gateway that refuses every call, for exercising the fail-closed paths.
pub struct UnreachableGateway;

impl PaymentGatewayClient for UnreachableGateway {
    async fn initialize_transaction(
        &self,
        _request: InitializeTransaction,
    ) -> Result<InitializedTransaction, GatewayClientError> {
        Err(GatewayClientError::Unreachable("connection refused".to_string()))
    }

    async fn verify_transaction(&self, _reference: &str) -> Result<GatewayTransaction, GatewayClientError> {
        Err(GatewayClientError::Unreachable("connection refused".to_string()))
    }
}
