// SPDX-License-Identifier: Apache-2.0

use crate::{OrderStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gearshop_model::{Order, OrderId, OrderStatus, PaymentMethod, Rating};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Mutex;

/// In-memory [`OrderStore`] for tests.
///
/// `fail_storage` flips every call into a `StoreError`, which is how tests
/// drive the 503 paths. The call counters let tests assert that invalid
/// input never reaches storage.
pub struct FakeStore {
    pub orders: Mutex<HashMap<OrderId, Order>>,
    pub ratings: Mutex<Vec<Rating>>,
    pub fail_storage: AtomicBool,
    pub read_calls: AtomicU64,
    pub write_calls: AtomicU64,
}

impl Default for FakeStore {
    fn default() -> Self {
        Self {
            orders: Mutex::new(HashMap::new()),
            ratings: Mutex::new(Vec::new()),
            fail_storage: AtomicBool::new(false),
            read_calls: AtomicU64::new(0),
            write_calls: AtomicU64::new(0),
        }
    }
}

impl FakeStore {
    fn check_available(&self) -> Result<(), StoreError> {
        if self.fail_storage.load(Ordering::Relaxed) {
            return Err(StoreError("storage unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for FakeStore {
    async fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
        self.write_calls.fetch_add(1, Ordering::Relaxed);
        self.check_available()?;
        self.orders
            .lock()
            .await
            .insert(order.order_id, order.clone());
        Ok(())
    }

    async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>, StoreError> {
        self.read_calls.fetch_add(1, Ordering::Relaxed);
        self.check_available()?;
        Ok(self.orders.lock().await.get(&order_id).cloned())
    }

    async fn transition_by_mpesa_request(
        &self,
        mpesa_request_id: &str,
        status: OrderStatus,
    ) -> Result<Option<OrderId>, StoreError> {
        self.write_calls.fetch_add(1, Ordering::Relaxed);
        self.check_available()?;
        let mut orders = self.orders.lock().await;
        let found = orders
            .values_mut()
            .find(|o| o.mpesa_request_id.as_deref() == Some(mpesa_request_id));
        match found {
            Some(order) => {
                order.transition(status);
                Ok(Some(order.order_id))
            }
            None => Ok(None),
        }
    }

    async fn list_pending_mpesa(&self, cutoff: DateTime<Utc>) -> Result<Vec<Order>, StoreError> {
        self.read_calls.fetch_add(1, Ordering::Relaxed);
        self.check_available()?;
        let orders = self.orders.lock().await;
        let mut out: Vec<Order> = orders
            .values()
            .filter(|o| {
                o.payment_method == PaymentMethod::Mpesa
                    && o.status == OrderStatus::Pending
                    && o.mpesa_request_id.is_some()
                    && o.created_at < cutoff
            })
            .cloned()
            .collect();
        out.sort_by_key(|o| o.created_at);
        Ok(out)
    }

    async fn insert_rating(&self, rating: &Rating) -> Result<(), StoreError> {
        self.write_calls.fetch_add(1, Ordering::Relaxed);
        self.check_available()?;
        self.ratings.lock().await.push(rating.clone());
        Ok(())
    }

    async fn ratings_for(&self, product_id: &str) -> Result<Vec<Rating>, StoreError> {
        self.read_calls.fetch_add(1, Ordering::Relaxed);
        self.check_available()?;
        Ok(self
            .ratings
            .lock()
            .await
            .iter()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}
