// SPDX-License-Identifier: Apache-2.0

use super::{MpesaGateway, PaymentError, PaypalGateway, StkPushAccepted};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Scriptable M-Pesa gateway for tests.
pub struct FakeMpesaGateway {
    /// Next outcome for `request_push`; `Ok` payload is the checkout
    /// request id handed back.
    pub push_outcome: Mutex<Result<String, PaymentError>>,
    /// Scripted `query_status` answers per checkout request id.
    pub status_by_request: Mutex<HashMap<String, Option<i64>>>,
    pub push_calls: AtomicU64,
    pub query_calls: AtomicU64,
    pub last_amount: AtomicU64,
}

impl Default for FakeMpesaGateway {
    fn default() -> Self {
        Self {
            push_outcome: Mutex::new(Ok("ws_CO_fake".to_string())),
            status_by_request: Mutex::new(HashMap::new()),
            push_calls: AtomicU64::new(0),
            query_calls: AtomicU64::new(0),
            last_amount: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl MpesaGateway for FakeMpesaGateway {
    async fn request_push(
        &self,
        _account_reference: &str,
        _phone: &str,
        amount: u64,
    ) -> Result<StkPushAccepted, PaymentError> {
        self.push_calls.fetch_add(1, Ordering::Relaxed);
        self.last_amount.store(amount, Ordering::Relaxed);
        self.push_outcome
            .lock()
            .await
            .clone()
            .map(|checkout_request_id| StkPushAccepted {
                checkout_request_id,
            })
    }

    async fn query_status(&self, checkout_request_id: &str) -> Result<Option<i64>, PaymentError> {
        self.query_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .status_by_request
            .lock()
            .await
            .get(checkout_request_id)
            .copied()
            .flatten())
    }
}

/// Scriptable PayPal gateway for tests.
pub struct FakePaypalGateway {
    pub status_by_order: Mutex<HashMap<String, Result<String, PaymentError>>>,
    pub status_calls: AtomicU64,
}

impl Default for FakePaypalGateway {
    fn default() -> Self {
        Self {
            status_by_order: Mutex::new(HashMap::new()),
            status_calls: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl PaypalGateway for FakePaypalGateway {
    async fn capture_status(&self, paypal_order_id: &str) -> Result<String, PaymentError> {
        self.status_calls.fetch_add(1, Ordering::Relaxed);
        self.status_by_order
            .lock()
            .await
            .get(paypal_order_id)
            .cloned()
            .unwrap_or_else(|| {
                Err(PaymentError::Rejected(format!(
                    "paypal order {paypal_order_id} not found"
                )))
            })
    }
}
