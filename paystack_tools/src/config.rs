use cpg_common::Secret;
use log::*;

const DEFAULT_PAYSTACK_API_URL: &str = "https://api.paystack.co";

#[derive(Debug, Clone)]
pub struct PaystackConfig {
    /// Base url for the Paystack REST API. Only ever changed to point at a sandbox or a local stub.
    pub api_url: String,
    /// The account's secret key (`sk_live_...` / `sk_test_...`). Paystack also signs webhook deliveries with this key.
    pub secret_key: Secret<String>,
}

impl Default for PaystackConfig {
    fn default() -> Self {
        Self { api_url: DEFAULT_PAYSTACK_API_URL.to_string(), secret_key: Secret::default() }
    }
}

impl PaystackConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("CPG_PAYSTACK_API_URL").unwrap_or_else(|_| {
            info!("CPG_PAYSTACK_API_URL not set, using {DEFAULT_PAYSTACK_API_URL}");
            DEFAULT_PAYSTACK_API_URL.to_string()
        });
        let secret_key = Secret::new(std::env::var("CPG_PAYSTACK_SECRET_KEY").unwrap_or_else(|_| {
            warn!("CPG_PAYSTACK_SECRET_KEY not set. Gateway calls and webhook signature checks will be rejected.");
            String::default()
        }));
        Self { api_url, secret_key }
    }
}
