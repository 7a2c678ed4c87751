use crate::config::VtpassConfig;
use crate::retry::{retry_with_backoff, DEFAULT_INITIAL_DELAY};
use crate::vending::types::{VendRequest, VendorError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::debug;

/// Seam between the dispatch engine / plan cache and the bill vendor.
#[async_trait]
pub trait VendorApi: Send + Sync {
    /// POST a purchase to the vendor. Returns the raw response body; the
    /// adapters own interpretation of vendor response codes.
    async fn pay(&self, request: &VendRequest) -> Result<JsonValue, VendorError>;

    /// Fetch the product catalog for a vendor service id.
    async fn service_variations(&self, service_id: &str) -> Result<JsonValue, VendorError>;

    /// Whether this client points at the vendor's sandbox deployment.
    fn is_sandbox(&self) -> bool;
}

pub struct VtpassClient {
    config: VtpassConfig,
    client: Client,
}

impl VtpassClient {
    pub fn new(config: VtpassConfig) -> Result<Self, VendorError> {
        let client = Client::builder().build().map_err(|e| VendorError::Network {
            message: format!("failed to initialize HTTP client: {}", e),
        })?;
        Ok(Self { config, client })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn read_json(response: reqwest::Response) -> Result<JsonValue, VendorError> {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(VendorError::Http {
                status: status.as_u16(),
                body: text,
            });
        }
        serde_json::from_str(&text).map_err(|e| VendorError::InvalidResponse {
            message: e.to_string(),
        })
    }

    async fn pay_once(&self, request: &VendRequest) -> Result<JsonValue, VendorError> {
        debug!(
            service_id = %request.service_id,
            request_id = %request.request_id,
            "posting vendor purchase"
        );

        let response = self
            .client
            .post(self.endpoint("/pay"))
            .header("api-key", &self.config.api_key)
            .header("secret-key", &self.config.secret_key)
            .timeout(Duration::from_secs(self.config.pay_timeout_secs))
            .json(request)
            .send()
            .await
            .map_err(|e| VendorError::Network {
                message: e.to_string(),
            })?;

        Self::read_json(response).await
    }

    async fn variations_once(&self, service_id: &str) -> Result<JsonValue, VendorError> {
        let response = self
            .client
            .get(self.endpoint("/service-variations"))
            .query(&[("serviceID", service_id)])
            .header("api-key", &self.config.api_key)
            .header("public-key", &self.config.public_key)
            .timeout(Duration::from_secs(self.config.catalog_timeout_secs))
            .send()
            .await
            .map_err(|e| VendorError::Network {
                message: e.to_string(),
            })?;

        Self::read_json(response).await
    }
}

#[async_trait]
impl VendorApi for VtpassClient {
    async fn pay(&self, request: &VendRequest) -> Result<JsonValue, VendorError> {
        retry_with_backoff(
            || self.pay_once(request),
            self.config.max_retries,
            DEFAULT_INITIAL_DELAY,
        )
        .await
    }

    async fn service_variations(&self, service_id: &str) -> Result<JsonValue, VendorError> {
        retry_with_backoff(
            || self.variations_once(service_id),
            self.config.max_retries,
            DEFAULT_INITIAL_DELAY,
        )
        .await
    }

    fn is_sandbox(&self) -> bool {
        self.config.is_sandbox()
    }
}
