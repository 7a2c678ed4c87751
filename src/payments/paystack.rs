use crate::config::PaystackConfig;
use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::gateway::PaymentGateway;
use crate::payments::signature::verify_hmac_sha512_hex;
use crate::payments::types::{ChargeEvent, CheckoutRequest, CheckoutSession, GatewayCharge};
use crate::retry::{retry_with_backoff, DEFAULT_INITIAL_DELAY};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::info;

pub struct PaystackClient {
    config: PaystackConfig,
    client: Client,
}

impl PaystackClient {
    pub fn new(config: PaystackConfig) -> PaymentResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PaymentError::NetworkError {
                message: format!("failed to initialize HTTP client: {}", e),
            })?;
        Ok(Self { config, client })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// One request attempt. Retry policy lives in the callers, which wrap
    /// this uniformly with the backoff helper.
    async fn request_json<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        url: &str,
        body: Option<&JsonValue>,
    ) -> PaymentResult<T> {
        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(&self.config.secret_key);
        if let Some(payload) = body {
            request = request.json(payload);
        }

        let response = request.send().await.map_err(|e| PaymentError::NetworkError {
            message: format!("gateway request failed: {}", e),
        })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(PaymentError::GatewayError {
                message: format!("HTTP {}: {}", status, text),
                http_status: Some(status.as_u16()),
                retryable: status.is_server_error(),
            });
        }

        serde_json::from_str::<T>(&text).map_err(|e| PaymentError::GatewayError {
            message: format!("invalid gateway JSON response: {}", e),
            http_status: None,
            retryable: false,
        })
    }
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    async fn initialize_checkout(
        &self,
        request: CheckoutRequest,
    ) -> PaymentResult<CheckoutSession> {
        let url = self.endpoint("/transaction/initialize");
        let payload = serde_json::json!({
            "email": request.email,
            // Paystack expects the minor unit (kobo)
            "amount": request.amount * 100,
            "reference": request.reference,
            "metadata": {
                "category": request.category,
                "provider": request.provider,
                "phone": request.phone,
                "userId": request.user_id,
            },
            "channels": ["card", "bank_transfer", "ussd"],
            "callback_url": self.config.callback_url,
        });

        let raw: PaystackEnvelope<PaystackInitializeData> = retry_with_backoff(
            || self.request_json(reqwest::Method::POST, &url, Some(&payload)),
            self.config.max_retries,
            DEFAULT_INITIAL_DELAY,
        )
        .await?;

        if !raw.status {
            return Err(PaymentError::GatewayError {
                message: format!("gateway initialization failed: {}", raw.message),
                http_status: None,
                retryable: false,
            });
        }
        let data = raw.data.ok_or_else(|| PaymentError::GatewayError {
            message: "gateway initialization response carried no data".to_string(),
            http_status: None,
            retryable: false,
        })?;

        info!(reference = %data.reference, "paystack checkout session created");

        Ok(CheckoutSession {
            checkout_url: data.authorization_url,
            access_code: data.access_code,
            reference: data.reference,
        })
    }

    async fn verify_charge(&self, reference: &str) -> PaymentResult<GatewayCharge> {
        let url = self.endpoint(&format!("/transaction/verify/{}", reference));

        let raw: PaystackEnvelope<PaystackVerifyData> = retry_with_backoff(
            || self.request_json(reqwest::Method::GET, &url, None),
            self.config.max_retries,
            DEFAULT_INITIAL_DELAY,
        )
        .await?;

        if !raw.status {
            return Err(PaymentError::GatewayError {
                message: format!("gateway verification failed: {}", raw.message),
                http_status: None,
                retryable: false,
            });
        }
        let data = raw.data.ok_or_else(|| PaymentError::GatewayError {
            message: "gateway verification response carried no data".to_string(),
            http_status: None,
            retryable: false,
        })?;

        Ok(GatewayCharge {
            amount: data.amount,
            currency: data.currency,
            status: data.status,
            channel: data.channel,
            paid_at: data.paid_at,
            gateway_response: data.gateway_response,
        })
    }

    fn verify_webhook(&self, payload: &[u8], signature: &str) -> bool {
        verify_hmac_sha512_hex(payload, &self.config.secret_key, signature)
    }

    fn parse_charge_event(&self, payload: &[u8]) -> PaymentResult<ChargeEvent> {
        let parsed: JsonValue = serde_json::from_slice(payload).map_err(|e| {
            PaymentError::WebhookVerificationError {
                message: format!("invalid webhook JSON payload: {}", e),
            }
        })?;

        let event_type = parsed
            .get("event")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();
        let data = parsed.get("data");
        let reference = data
            .and_then(|v| v.get("reference"))
            .and_then(|v| v.as_str())
            .map(|v| v.to_string());
        let status = data
            .and_then(|v| v.get("status"))
            .and_then(|v| v.as_str())
            .map(|v| v.to_string());
        let amount = data.and_then(|v| v.get("amount")).and_then(|v| v.as_i64());

        Ok(ChargeEvent {
            event_type,
            reference,
            status,
            amount,
            payload: parsed,
        })
    }
}

#[derive(Debug, Deserialize)]
struct PaystackEnvelope<T> {
    status: bool,
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct PaystackInitializeData {
    authorization_url: String,
    access_code: String,
    reference: String,
}

#[derive(Debug, Deserialize)]
struct PaystackVerifyData {
    amount: i64,
    currency: String,
    status: String,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    paid_at: Option<String>,
    #[serde(default)]
    gateway_response: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PaystackClient {
        PaystackClient::new(PaystackConfig {
            secret_key: "sk_test".to_string(),
            base_url: "https://api.paystack.co".to_string(),
            callback_url: "https://standard.paystack.co/close".to_string(),
            timeout_secs: 5,
            max_retries: 1,
        })
        .expect("client init should succeed")
    }

    #[test]
    fn webhook_signature_validation_rejects_garbage() {
        let client = client();
        let payload = br#"{"event":"charge.success"}"#;
        assert!(!client.verify_webhook(payload, "invalid_signature"));
    }

    #[test]
    fn webhook_signature_validation_accepts_correct_hmac() {
        let client = client();
        let payload = br#"{"event":"charge.success"}"#;
        let signature = crate::payments::signature::hmac_sha512_hex(payload, "sk_test");
        assert!(client.verify_webhook(payload, &signature));
    }

    #[test]
    fn charge_event_parsing_extracts_reference_and_amount() {
        let client = client();
        let payload = serde_json::json!({
            "event": "charge.success",
            "data": {
                "reference": "SWFT-1700000000000-42",
                "status": "success",
                "amount": 100000
            }
        });
        let event = client
            .parse_charge_event(payload.to_string().as_bytes())
            .expect("parse should succeed");

        assert!(event.is_charge_success());
        assert_eq!(event.reference.as_deref(), Some("SWFT-1700000000000-42"));
        assert_eq!(event.amount, Some(100_000));
    }

    #[test]
    fn envelope_tolerates_missing_data() {
        let raw = r#"{"status": false, "message": "Invalid key"}"#;
        let parsed: PaystackEnvelope<PaystackInitializeData> =
            serde_json::from_str(raw).expect("envelope should parse");
        assert!(!parsed.status);
        assert!(parsed.data.is_none());
    }
}
