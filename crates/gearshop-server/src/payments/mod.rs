// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use serde::Deserialize;

pub mod fake;
pub mod mpesa;
pub mod paypal;

pub use fake::{FakeMpesaGateway, FakePaypalGateway};
pub use mpesa::{HttpMpesaGateway, MpesaConfig};
pub use paypal::{HttpPaypalGateway, PaypalConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PaymentError {
    /// Required credential missing or malformed; detected before any call.
    Config(String),
    /// The gateway answered and said no.
    Rejected(String),
    /// The gateway could not be reached or answered with a transport-level
    /// failure.
    Unavailable(String),
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "gateway config error: {msg}"),
            Self::Rejected(msg) => write!(f, "gateway rejected request: {msg}"),
            Self::Unavailable(msg) => write!(f, "gateway unavailable: {msg}"),
        }
    }
}

impl std::error::Error for PaymentError {}

/// Gateway result code as it appears on the wire. The gateway is
/// inconsistent about emitting `0` vs `"0"`, so both forms deserialize;
/// the canonical comparison is always numeric.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ResultCode {
    Int(i64),
    Text(String),
}

impl ResultCode {
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Text(s) => s.trim().parse::<i64>().ok(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.as_i64() == Some(0)
    }
}

/// Outcome of an accepted STK push request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StkPushAccepted {
    pub checkout_request_id: String,
}

#[async_trait]
pub trait MpesaGateway: Send + Sync + 'static {
    /// Ask the gateway to prompt `phone` for `amount` whole currency units.
    async fn request_push(
        &self,
        account_reference: &str,
        phone: &str,
        amount: u64,
    ) -> Result<StkPushAccepted, PaymentError>;

    /// Poll the final result code for a previously accepted push.
    /// `Ok(None)` means the gateway still reports the transaction in flight.
    async fn query_status(&self, checkout_request_id: &str) -> Result<Option<i64>, PaymentError>;
}

#[async_trait]
pub trait PaypalGateway: Send + Sync + 'static {
    /// Current status of a PayPal order as reported by the gateway,
    /// e.g. `COMPLETED` or `CREATED`.
    async fn capture_status(&self, paypal_order_id: &str) -> Result<String, PaymentError>;
}

/// Stand-in installed when M-Pesa credentials are absent. Checkout with
/// that method fails fast with a configuration error; the rest of the shop
/// keeps working.
pub struct UnconfiguredMpesaGateway;

#[async_trait]
impl MpesaGateway for UnconfiguredMpesaGateway {
    async fn request_push(
        &self,
        _account_reference: &str,
        _phone: &str,
        _amount: u64,
    ) -> Result<StkPushAccepted, PaymentError> {
        Err(PaymentError::Config(
            "mpesa gateway is not configured".to_string(),
        ))
    }

    async fn query_status(&self, _checkout_request_id: &str) -> Result<Option<i64>, PaymentError> {
        Err(PaymentError::Config(
            "mpesa gateway is not configured".to_string(),
        ))
    }
}

/// PayPal counterpart of [`UnconfiguredMpesaGateway`].
pub struct UnconfiguredPaypalGateway;

#[async_trait]
impl PaypalGateway for UnconfiguredPaypalGateway {
    async fn capture_status(&self, _paypal_order_id: &str) -> Result<String, PaymentError> {
        Err(PaymentError::Config(
            "paypal gateway is not configured".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_code_accepts_numeric_and_string_forms() {
        let numeric: ResultCode = serde_json::from_str("0").expect("numeric");
        assert!(numeric.is_success());
        let text: ResultCode = serde_json::from_str("\"0\"").expect("text");
        assert!(text.is_success());
        let failed: ResultCode = serde_json::from_str("\"1032\"").expect("failed text");
        assert_eq!(failed.as_i64(), Some(1032));
        assert!(!failed.is_success());
        let junk: ResultCode = serde_json::from_str("\"abc\"").expect("junk text");
        assert_eq!(junk.as_i64(), None);
        assert!(!junk.is_success());
    }
}
