#![forbid(unsafe_code)]
//! Persistence for the gearshop storefront.
//!
//! The server talks to storage exclusively through [`OrderStore`], so tests
//! can swap in [`FakeStore`] and the production binary uses [`SqliteStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gearshop_model::{Order, OrderId, OrderStatus, Rating};

mod catalog;
mod fake;
mod sqlite;

pub use catalog::load_catalog;
pub use fake::FakeStore;
pub use sqlite::SqliteStore;

pub const CRATE_NAME: &str = "gearshop-store";

#[derive(Debug)]
pub struct StoreError(pub String);

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::error::Error for StoreError {}

/// Storage seam for orders and ratings.
///
/// Every method is one read or one write; there are no multi-document
/// transactions. Status transitions are absolute, so re-applying one is a
/// no-op in effect.
#[async_trait]
pub trait OrderStore: Send + Sync + 'static {
    async fn insert_order(&self, order: &Order) -> Result<(), StoreError>;

    async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>, StoreError>;

    /// Apply a status transition to the order holding this gateway request
    /// id, stamping `updated_at`. Returns the affected order id, or `None`
    /// when no order matches (the webhook no-op path).
    async fn transition_by_mpesa_request(
        &self,
        mpesa_request_id: &str,
        status: OrderStatus,
    ) -> Result<Option<OrderId>, StoreError>;

    /// M-Pesa orders still `Pending` that were created before `cutoff`.
    /// Feed for the reconciliation job.
    async fn list_pending_mpesa(&self, cutoff: DateTime<Utc>) -> Result<Vec<Order>, StoreError>;

    async fn insert_rating(&self, rating: &Rating) -> Result<(), StoreError>;

    async fn ratings_for(&self, product_id: &str) -> Result<Vec<Rating>, StoreError>;

    /// Cheap reachability probe for readiness.
    async fn ping(&self) -> Result<(), StoreError>;
}
