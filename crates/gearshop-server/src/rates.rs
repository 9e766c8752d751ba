// SPDX-License-Identifier: Apache-2.0

use crate::payments::PaymentError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::instrument;

/// USD-based exchange rate source.
#[async_trait]
pub trait RateSource: Send + Sync + 'static {
    /// Conversion rates out of USD, keyed by currency code. `None` when no
    /// provider key is configured, in which case every rate defaults to 1.
    async fn usd_rates(&self) -> Result<Option<HashMap<String, f64>>, PaymentError>;
}

#[derive(Debug, Deserialize)]
struct RatesResponse {
    conversion_rates: HashMap<String, f64>,
}

pub struct HttpRateSource {
    api_key: Option<String>,
    base_url: String,
    http_timeout: Duration,
}

impl HttpRateSource {
    #[must_use]
    pub fn new(api_key: Option<String>, base_url: String, http_timeout: Duration) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
            http_timeout,
        }
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    #[instrument(name = "exchange_rates_fetch", skip(self))]
    async fn usd_rates(&self) -> Result<Option<HashMap<String, f64>>, PaymentError> {
        let Some(key) = self.api_key.as_deref() else {
            return Ok(None);
        };
        let url = format!("{}/v6/{key}/latest/USD", self.base_url);
        let client = reqwest::Client::builder()
            .timeout(self.http_timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        let resp = client
            .get(&url)
            .send()
            .await
            .map_err(|e| PaymentError::Unavailable(format!("rates request failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(PaymentError::Unavailable(format!(
                "rates request failed status={}",
                resp.status()
            )));
        }
        let parsed: RatesResponse = resp
            .json()
            .await
            .map_err(|e| PaymentError::Unavailable(format!("rates parse failed: {e}")))?;
        Ok(Some(parsed.conversion_rates))
    }
}

/// Fixed-table source for tests.
pub struct FakeRateSource {
    pub rates: Option<HashMap<String, f64>>,
}

#[async_trait]
impl RateSource for FakeRateSource {
    async fn usd_rates(&self) -> Result<Option<HashMap<String, f64>>, PaymentError> {
        Ok(self.rates.clone())
    }
}
