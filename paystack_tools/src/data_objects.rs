use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Header carrying the hex HMAC-SHA512 signature of webhook deliveries.
pub const PAYSTACK_SIGNATURE_HEADER: &str = "x-paystack-signature";

pub const TRANSACTION_SUCCESS_EVENT: &str = "charge.success";
pub const TRANSACTION_FAILED_EVENT: &str = "charge.failed";

/// Every Paystack REST response wraps its payload in the same envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub status: bool,
    pub message: String,
    pub data: Option<T>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTransactionRequest {
    pub email: String,
    /// Amount in the minor currency unit (kobo for NGN).
    pub amount: i64,
    pub currency: String,
    pub reference: String,
    pub metadata: Value,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransactionAuthorization {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionData {
    pub id: i64,
    /// `success`, `failed`, `abandoned`, `ongoing`, ...
    pub status: String,
    pub reference: String,
    pub amount: i64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub paid_at: Option<String>,
    #[serde(default)]
    pub gateway_response: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
}

impl TransactionData {
    pub fn is_successful(&self) -> bool {
        self.status == "success"
    }
}

/// Body of an inbound webhook delivery. Paystack adds event types over time, so `event` stays a plain string and
/// unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    pub id: i64,
    pub reference: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn deserialize_initialize_response() {
        let json = r#"{
            "status": true,
            "message": "Authorization URL created",
            "data": {
                "authorization_url": "https://checkout.paystack.com/0peioxfhpn",
                "access_code": "0peioxfhpn",
                "reference": "order-7-1717244400123-9f2c"
            }
        }"#;
        let response: ApiResponse<TransactionAuthorization> = serde_json::from_str(json).unwrap();
        assert!(response.status);
        let auth = response.data.unwrap();
        assert_eq!(auth.authorization_url, "https://checkout.paystack.com/0peioxfhpn");
        assert_eq!(auth.reference, "order-7-1717244400123-9f2c");
    }

    #[test]
    fn deserialize_verify_response() {
        let json = r#"{
            "status": true,
            "message": "Verification successful",
            "data": {
                "id": 2009945086,
                "status": "success",
                "reference": "rd0bz6z2wu",
                "amount": 20000,
                "currency": "NGN",
                "paid_at": "2022-08-09T14:21:32.000Z",
                "gateway_response": "Successful",
                "channel": "card",
                "fees": 100
            }
        }"#;
        let response: ApiResponse<TransactionData> = serde_json::from_str(json).unwrap();
        let data = response.data.unwrap();
        assert!(data.is_successful());
        assert_eq!(data.id, 2009945086);
        assert_eq!(data.amount, 20000);
    }

    #[test]
    fn deserialize_webhook_event() {
        let json = r#"{
            "event": "charge.success",
            "data": {
                "id": 302961,
                "domain": "live",
                "status": "success",
                "reference": "qTPrJoy9Bx",
                "amount": 10000,
                "paid_at": "2016-09-30T21:10:19.000Z"
            }
        }"#;
        let event: WebhookEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.event, TRANSACTION_SUCCESS_EVENT);
        assert_eq!(event.data.reference, "qTPrJoy9Bx");
        assert_eq!(event.data.status.as_deref(), Some("success"));
    }

    #[test]
    fn declined_envelope_has_no_data() {
        let json = r#"{"status": false, "message": "Invalid key"}"#;
        let response: ApiResponse<TransactionAuthorization> = serde_json::from_str(json).unwrap();
        assert!(!response.status);
        assert!(response.data.is_none());
    }
}
