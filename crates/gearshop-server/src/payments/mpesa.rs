// SPDX-License-Identifier: Apache-2.0

use super::{MpesaGateway, PaymentError, ResultCode, StkPushAccepted};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::instrument;

#[derive(Debug, Clone)]
pub struct MpesaConfig {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub shortcode: String,
    pub passkey: String,
    pub base_url: String,
    pub callback_url: String,
    pub http_timeout: Duration,
}

impl MpesaConfig {
    pub fn validate(&self) -> Result<(), PaymentError> {
        for (name, value) in [
            ("consumer_key", &self.consumer_key),
            ("consumer_secret", &self.consumer_secret),
            ("shortcode", &self.shortcode),
            ("passkey", &self.passkey),
            ("base_url", &self.base_url),
            ("callback_url", &self.callback_url),
        ] {
            if value.trim().is_empty() {
                return Err(PaymentError::Config(format!("mpesa {name} is missing")));
            }
        }
        Ok(())
    }
}

/// Gateway timestamp, `YYYYMMDDHHMMSS`.
fn gateway_timestamp() -> String {
    Utc::now().format("%Y%m%d%H%M%S").to_string()
}

/// STK password: base64 over shortcode + passkey + timestamp.
fn stk_password(shortcode: &str, passkey: &str, timestamp: &str) -> String {
    BASE64.encode(format!("{shortcode}{passkey}{timestamp}"))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct StkPushResponse {
    #[serde(rename = "ResponseCode")]
    response_code: Option<ResultCode>,
    #[serde(rename = "CheckoutRequestID")]
    checkout_request_id: Option<String>,
    #[serde(rename = "ResponseDescription")]
    response_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StkQueryResponse {
    #[serde(rename = "ResultCode")]
    result_code: Option<ResultCode>,
}

pub struct HttpMpesaGateway {
    cfg: MpesaConfig,
}

impl HttpMpesaGateway {
    pub fn new(cfg: MpesaConfig) -> Result<Self, PaymentError> {
        cfg.validate()?;
        Ok(Self {
            cfg: MpesaConfig {
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

    /// Client-credentials exchange. Tokens are short-lived and fetched per
    /// call; push volume is low enough that caching by expiry is not worth
    /// the state.
    #[instrument(name = "mpesa_access_token", skip(self))]
    async fn access_token(&self) -> Result<String, PaymentError> {
        let auth = BASE64.encode(format!(
            "{}:{}",
            self.cfg.consumer_key, self.cfg.consumer_secret
        ));
        let url = format!(
            "{}/oauth/v1/generate?grant_type=client_credentials",
            self.cfg.base_url
        );
        let resp = self
            .client()
            .get(&url)
            .header("Authorization", format!("Basic {auth}"))
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
impl MpesaGateway for HttpMpesaGateway {
    #[instrument(name = "mpesa_request_push", skip(self))]
    async fn request_push(
        &self,
        account_reference: &str,
        phone: &str,
        amount: u64,
    ) -> Result<StkPushAccepted, PaymentError> {
        let token = self.access_token().await?;
        let timestamp = gateway_timestamp();
        let password = stk_password(&self.cfg.shortcode, &self.cfg.passkey, &timestamp);
        let body = json!({
            "BusinessShortCode": self.cfg.shortcode,
            "Password": password,
            "Timestamp": timestamp,
            "TransactionType": "CustomerPayBillOnline",
            "Amount": amount,
            "PartyA": phone,
            "PartyB": self.cfg.shortcode,
            "PhoneNumber": phone,
            "CallBackURL": self.cfg.callback_url,
            "AccountReference": account_reference,
            "TransactionDesc": "Gearshop order payment"
        });
        let url = format!("{}/mpesa/stkpush/v1/processrequest", self.cfg.base_url);
        let resp = self
            .client()
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(|e| PaymentError::Unavailable(format!("stk push failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(PaymentError::Rejected(format!(
                "stk push failed status={}",
                resp.status()
            )));
        }
        let parsed: StkPushResponse = resp
            .json()
            .await
            .map_err(|e| PaymentError::Unavailable(format!("stk push parse failed: {e}")))?;
        let accepted = parsed
            .response_code
            .as_ref()
            .is_some_and(ResultCode::is_success);
        if !accepted {
            return Err(PaymentError::Rejected(
                parsed
                    .response_description
                    .unwrap_or_else(|| "stk push rejected".to_string()),
            ));
        }
        let checkout_request_id = parsed.checkout_request_id.ok_or_else(|| {
            PaymentError::Unavailable("stk push accepted without CheckoutRequestID".to_string())
        })?;
        Ok(StkPushAccepted {
            checkout_request_id,
        })
    }

    #[instrument(name = "mpesa_query_status", skip(self))]
    async fn query_status(&self, checkout_request_id: &str) -> Result<Option<i64>, PaymentError> {
        let token = self.access_token().await?;
        let timestamp = gateway_timestamp();
        let password = stk_password(&self.cfg.shortcode, &self.cfg.passkey, &timestamp);
        let body = json!({
            "BusinessShortCode": self.cfg.shortcode,
            "Password": password,
            "Timestamp": timestamp,
            "CheckoutRequestID": checkout_request_id
        });
        let url = format!("{}/mpesa/stkpushquery/v1/query", self.cfg.base_url);
        let resp = self
            .client()
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(|e| PaymentError::Unavailable(format!("stk query failed: {e}")))?;
        // The gateway answers the query endpoint with an error status while
        // the prompt is still open on the customer's phone.
        if !resp.status().is_success() {
            return Ok(None);
        }
        let parsed: StkQueryResponse = resp
            .json()
            .await
            .map_err(|e| PaymentError::Unavailable(format!("stk query parse failed: {e}")))?;
        Ok(parsed.result_code.and_then(|c| c.as_i64()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stk_password_is_base64_of_shortcode_passkey_timestamp() {
        let pwd = stk_password("174379", "passkey", "20260101120000");
        let decoded = BASE64.decode(pwd).expect("base64");
        assert_eq!(
            String::from_utf8(decoded).expect("utf8"),
            "174379passkey20260101120000"
        );
    }

    #[test]
    fn gateway_timestamp_is_fourteen_digits() {
        let ts = gateway_timestamp();
        assert_eq!(ts.len(), 14);
        assert!(ts.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn config_validation_names_the_missing_field() {
        let cfg = MpesaConfig {
            consumer_key: "k".to_string(),
            consumer_secret: String::new(),
            shortcode: "174379".to_string(),
            passkey: "p".to_string(),
            base_url: "https://sandbox.example".to_string(),
            callback_url: "https://shop.example/mpesa-callback".to_string(),
            http_timeout: Duration::from_secs(15),
        };
        let err = cfg.validate().expect_err("missing secret");
        assert!(matches!(err, PaymentError::Config(ref m) if m.contains("consumer_secret")));
    }
}
