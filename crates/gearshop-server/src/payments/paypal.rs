// SPDX-License-Identifier: Apache-2.0

use super::{PaymentError, PaypalGateway};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

#[derive(Debug, Clone)]
pub struct PaypalConfig {
    pub client_id: String,
    pub client_secret: String,
    pub base_url: String,
    pub http_timeout: Duration,
}

impl PaypalConfig {
    pub fn validate(&self) -> Result<(), PaymentError> {
        for (name, value) in [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("base_url", &self.base_url),
        ] {
            if value.trim().is_empty() {
                return Err(PaymentError::Config(format!("paypal {name} is missing")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    status: String,
}

/// Server-side capture verification. The client may claim whatever it
/// likes; the order service only believes what this gateway reports.
pub struct HttpPaypalGateway {
    cfg: PaypalConfig,
}

impl HttpPaypalGateway {
    pub fn new(cfg: PaypalConfig) -> Result<Self, PaymentError> {
        cfg.validate()?;
        Ok(Self {
            cfg: PaypalConfig {
                base_url: cfg.base_url.trim_end_matches('/').to_string(),
                ..cfg
            },
        })
    }

    fn client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(self.cfg.http_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    }

    #[instrument(name = "paypal_access_token", skip(self))]
    async fn access_token(&self) -> Result<String, PaymentError> {
        let url = format!("{}/v1/oauth2/token", self.cfg.base_url);
        let resp = self
            .client()
            .post(&url)
            .basic_auth(&self.cfg.client_id, Some(&self.cfg.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| PaymentError::Unavailable(format!("token request failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(PaymentError::Unavailable(format!(
                "token request failed status={}",
                resp.status()
            )));
        }
        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| PaymentError::Unavailable(format!("token parse failed: {e}")))?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl PaypalGateway for HttpPaypalGateway {
    #[instrument(name = "paypal_capture_status", skip(self))]
    async fn capture_status(&self, paypal_order_id: &str) -> Result<String, PaymentError> {
        let token = self.access_token().await?;
        let url = format!("{}/v2/checkout/orders/{paypal_order_id}", self.cfg.base_url);
        let resp = self
            .client()
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| PaymentError::Unavailable(format!("order lookup failed: {e}")))?;
        if resp.status().as_u16() == 404 {
            return Err(PaymentError::Rejected(format!(
                "paypal order {paypal_order_id} not found"
            )));
        }
        if !resp.status().is_success() {
            return Err(PaymentError::Unavailable(format!(
                "order lookup failed status={}",
                resp.status()
            )));
        }
        let parsed: OrderResponse = resp
            .json()
            .await
            .map_err(|e| PaymentError::Unavailable(format!("order parse failed: {e}")))?;
        Ok(parsed.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_validation_names_the_missing_field() {
        let cfg = PaypalConfig {
            client_id: String::new(),
            client_secret: "s".to_string(),
            base_url: "https://api-m.sandbox.example".to_string(),
            http_timeout: Duration::from_secs(15),
        };
        let err = cfg.validate().expect_err("missing id");
        assert!(matches!(err, PaymentError::Config(ref m) if m.contains("client_id")));
    }
}
