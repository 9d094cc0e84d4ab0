//! Adapts the Paystack REST client to the engine's gateway traits.
//!
//! The engine talks to an abstract [`PaymentGatewayClient`]; this module is the only place that knows the concrete
//! provider is Paystack. Amounts are already integer kobo throughout the system, so the "convert to minor units"
//! step at the gateway boundary is just `value()`.

use commerce_payment_engine::traits::{
    GatewayClientError,
    GatewayEvent,
    GatewayEventType,
    GatewayPaymentStatus,
    GatewayTransaction,
    InitializeTransaction,
    InitializedTransaction,
    PaymentGatewayClient,
};
use cpg_common::NGN_CURRENCY_CODE;
use paystack_tools::{
    NewTransactionRequest,
    PaystackApi,
    PaystackApiError,
    PaystackConfig,
    WebhookEvent,
    TRANSACTION_FAILED_EVENT,
    TRANSACTION_SUCCESS_EVENT,
};

#[derive(Clone)]
pub struct PaystackGateway {
    api: PaystackApi,
}

impl PaystackGateway {
    pub fn new(config: PaystackConfig) -> Result<Self, PaystackApiError> {
        let api = PaystackApi::new(config)?;
        Ok(Self { api })
    }
}

impl PaymentGatewayClient for PaystackGateway {
    async fn initialize_transaction(
        &self,
        request: InitializeTransaction,
    ) -> Result<InitializedTransaction, GatewayClientError> {
        let body = NewTransactionRequest {
            email: request.email,
            amount: request.amount.value(),
            currency: NGN_CURRENCY_CODE.to_string(),
            reference: request.reference,
            metadata: serde_json::json!({ "order_id": request.order_id }),
        };
        let auth = self.api.initialize_transaction(body).await.map_err(into_client_error)?;
        Ok(InitializedTransaction { authorization_url: auth.authorization_url, reference: auth.reference })
    }

    async fn verify_transaction(&self, reference: &str) -> Result<GatewayTransaction, GatewayClientError> {
        let data = self.api.verify_transaction(reference).await.map_err(into_client_error)?;
        let status =
            if data.is_successful() { GatewayPaymentStatus::Success } else { GatewayPaymentStatus::Failed };
        Ok(GatewayTransaction { id: data.id.to_string(), reference: data.reference, status, raw_status: data.status })
    }
}

fn into_client_error(e: PaystackApiError) -> GatewayClientError {
    match e {
        PaystackApiError::RestResponseError(e) => GatewayClientError::Unreachable(e),
        PaystackApiError::QueryError { status, message } => {
            GatewayClientError::Rejected(format!("HTTP {status}: {message}"))
        },
        PaystackApiError::RequestDeclined(e) => GatewayClientError::Rejected(e),
        PaystackApiError::Initialization(e) | PaystackApiError::JsonError(e) | PaystackApiError::EmptyResponse(e) => {
            GatewayClientError::InvalidResponse(e)
        },
    }
}

/// Renders a raw Paystack webhook body as a provider-neutral engine event. Unknown event names pass through as
/// [`GatewayEventType::Other`] so the reconciler can acknowledge and ignore them.
pub fn gateway_event_from_webhook(event: WebhookEvent) -> GatewayEvent {
    let event_type = match event.event.as_str() {
        TRANSACTION_SUCCESS_EVENT => GatewayEventType::PaymentSuccess,
        TRANSACTION_FAILED_EVENT => GatewayEventType::PaymentFailed,
        other => GatewayEventType::Other(other.to_string()),
    };
    GatewayEvent { event_type, reference: event.data.reference, transaction_id: event.data.id.to_string() }
}

#[cfg(test)]
mod test {
    use paystack_tools::WebhookEventData;

    use super::*;

    #[test]
    fn known_events_map_to_payment_outcomes() {
        let event = WebhookEvent {
            event: "charge.success".to_string(),
            data: WebhookEventData { id: 302961, reference: "ref-1".to_string(), status: None, amount: None },
        };
        let event = gateway_event_from_webhook(event);
        assert_eq!(event.event_type, GatewayEventType::PaymentSuccess);
        assert_eq!(event.transaction_id, "302961");
    }

    #[test]
    fn unknown_events_pass_through_as_other() {
        let event = WebhookEvent {
            event: "subscription.create".to_string(),
            data: WebhookEventData { id: 1, reference: "ref-2".to_string(), status: None, amount: None },
        };
        let event = gateway_event_from_webhook(event);
        assert_eq!(event.event_type, GatewayEventType::Other("subscription.create".to_string()));
    }
}
