//! Payment gateway client and webhook signature verification.
//!
//! Wire shapes follow the Cashfree PG API: order creation returns a
//! `payment_session_id` the browser uses to open the hosted checkout, and
//! outcome webhooks are signed with HMAC-SHA256 over the raw request body,
//! base64-encoded into the `x-webhook-signature` header.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::config::GatewayConfig;

const GATEWAY_API_VERSION: &str = "2023-08-01";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum PaymentsError {
    #[error("Gateway request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Gateway rejected order creation: {0}")]
    Rejected(String),
}

#[derive(Clone)]
pub struct PaymentsClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
}

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    order_id: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    order_amount: Decimal,
    order_currency: &'a str,
    customer_details: CustomerDetails<'a>,
}

#[derive(Debug, Serialize)]
struct CustomerDetails<'a> {
    customer_id: &'a str,
    customer_email: &'a str,
}

/// The gateway's view of a created order.
#[derive(Debug, Deserialize)]
pub struct GatewayOrder {
    pub order_id: String,
    pub payment_session_id: String,
}

impl PaymentsClient {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        }
    }

    /// Create a gateway order for the given receipt id and amount. The
    /// gateway echoes the receipt id back as `order_id`; webhooks later match
    /// on it.
    pub async fn create_order(
        &self,
        receipt_id: &str,
        amount: Decimal,
        currency: &str,
        customer_id: &str,
        customer_email: &str,
    ) -> Result<GatewayOrder, PaymentsError> {
        let body = CreateOrderBody {
            order_id: receipt_id,
            order_amount: amount,
            order_currency: currency,
            customer_details: CustomerDetails { customer_id, customer_email },
        };

        let response = self
            .http
            .post(format!("{}/orders", self.base_url))
            .header("x-api-version", GATEWAY_API_VERSION)
            .header("x-client-id", &self.client_id)
            .header("x-client-secret", &self.client_secret)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(PaymentsError::Rejected(format!("{status}: {detail}")));
        }

        Ok(response.json::<GatewayOrder>().await?)
    }
}

/// Verify a webhook signature: HMAC-SHA256 over the raw body with the shared
/// secret, base64-encoded. Comparison happens on the decoded tag in constant
/// time; a missing or undecodable header fails closed.
pub fn verify_webhook_signature(body: &[u8], signature: Option<&str>, secret: &str) -> bool {
    let Some(signature) = signature else {
        return false;
    };
    let Ok(expected) = BASE64.decode(signature) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";

    fn sign(body: &[u8], secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        BASE64.encode(mac.finalize().into_bytes())
    }

    #[test]
    fn accepts_valid_signature() {
        let body = br#"{"type":"PAYMENT_SUCCESS_WEBHOOK"}"#;
        let signature = sign(body, SECRET);
        assert!(verify_webhook_signature(body, Some(&signature), SECRET));
    }

    #[test]
    fn rejects_tampered_body() {
        let signature = sign(b"original", SECRET);
        assert!(!verify_webhook_signature(b"tampered", Some(&signature), SECRET));
    }

    #[test]
    fn rejects_wrong_secret() {
        let body = b"payload";
        let signature = sign(body, "other_secret");
        assert!(!verify_webhook_signature(body, Some(&signature), SECRET));
    }

    #[test]
    fn rejects_missing_or_malformed_header() {
        assert!(!verify_webhook_signature(b"payload", None, SECRET));
        assert!(!verify_webhook_signature(b"payload", Some("not base64!!"), SECRET));
    }
}
