use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::PaystackConfig,
    data_objects::{ApiResponse, NewTransactionRequest, TransactionAuthorization, TransactionData},
    PaystackApiError,
};

/// Thin client over the Paystack REST API.
///
/// The secret key is attached as a default `Authorization` header at construction, so individual calls only deal
/// with paths and payloads.
#[derive(Clone)]
pub struct PaystackApi {
    config: PaystackConfig,
    client: Arc<Client>,
}

impl PaystackApi {
    pub fn new(config: PaystackConfig) -> Result<Self, PaystackApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let bearer = format!("Bearer {}", config.secret_key.reveal());
        let val = HeaderValue::from_str(&bearer).map_err(|e| PaystackApiError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| PaystackApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, PaystackApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| PaystackApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| PaystackApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| PaystackApiError::RestResponseError(e.to_string()))?;
            Err(PaystackApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }

    /// Creates a new transaction on Paystack and returns the checkout handle the customer must be redirected to.
    pub async fn initialize_transaction(
        &self,
        request: NewTransactionRequest,
    ) -> Result<TransactionAuthorization, PaystackApiError> {
        debug!("Initializing transaction {} for {}", request.reference, request.email);
        let response = self
            .rest_query::<ApiResponse<TransactionAuthorization>, _>(
                Method::POST,
                "/transaction/initialize",
                Some(request),
            )
            .await?;
        let auth = unwrap_envelope(response)?;
        info!("Transaction {} initialized", auth.reference);
        Ok(auth)
    }

    /// Fetches the authoritative state of a transaction by reference.
    pub async fn verify_transaction(&self, reference: &str) -> Result<TransactionData, PaystackApiError> {
        let path = format!("/transaction/verify/{reference}");
        debug!("Verifying transaction {reference}");
        let response = self.rest_query::<ApiResponse<TransactionData>, ()>(Method::GET, &path, None).await?;
        let data = unwrap_envelope(response)?;
        info!("Transaction {reference} verified. Gateway status: {}", data.status);
        Ok(data)
    }
}

fn unwrap_envelope<T>(response: ApiResponse<T>) -> Result<T, PaystackApiError> {
    if !response.status {
        return Err(PaystackApiError::RequestDeclined(response.message));
    }
    response.data.ok_or(PaystackApiError::EmptyResponse(response.message))
}
