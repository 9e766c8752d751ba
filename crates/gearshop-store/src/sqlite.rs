// SPDX-License-Identifier: Apache-2.0

use crate::{OrderStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gearshop_model::{Order, OrderId, OrderStatus, PaymentMethod, Rating};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};

/// SQLite-backed [`OrderStore`].
///
/// Connections are opened per operation inside `spawn_blocking`; with one
/// storage touch per request there is nothing to pool.
pub struct SqliteStore {
    path: PathBuf,
}

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS orders (
    order_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    phone TEXT NOT NULL,
    address TEXT NOT NULL,
    payment_method TEXT NOT NULL,
    cart_json TEXT NOT NULL,
    total REAL NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT,
    mpesa_request_id TEXT
);
CREATE INDEX IF NOT EXISTS idx_orders_mpesa_request_id ON orders(mpesa_request_id);
CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status);
CREATE TABLE IF NOT EXISTS ratings (
    id INTEGER PRIMARY KEY,
    product_id TEXT NOT NULL,
    rating INTEGER NOT NULL,
    comment TEXT NOT NULL,
    timestamp TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_ratings_product_id ON ratings(product_id);
";

impl SqliteStore {
    /// Open (or create) the database at `path` and apply the schema.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError(format!("create store dir failed: {e}")))?;
        }
        let conn =
            Connection::open(path).map_err(|e| StoreError(format!("open store failed: {e}")))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| StoreError(format!("schema init failed: {e}")))?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    async fn with_conn<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&path)
                .map_err(|e| StoreError(format!("open store failed: {e}")))?;
            op(&conn)
        })
        .await
        .map_err(|e| StoreError(format!("store task failed: {e}")))?
    }
}

fn row_to_order(row: &Row<'_>) -> Result<Order, StoreError> {
    let order_id: String = row
        .get(0)
        .map_err(|e| StoreError(format!("read order_id failed: {e}")))?;
    let name: String = row.get(1).map_err(|e| StoreError(e.to_string()))?;
    let phone: String = row.get(2).map_err(|e| StoreError(e.to_string()))?;
    let address: String = row.get(3).map_err(|e| StoreError(e.to_string()))?;
    let payment_method: String = row.get(4).map_err(|e| StoreError(e.to_string()))?;
    let cart_json: String = row.get(5).map_err(|e| StoreError(e.to_string()))?;
    let total: f64 = row.get(6).map_err(|e| StoreError(e.to_string()))?;
    let status: String = row.get(7).map_err(|e| StoreError(e.to_string()))?;
    let created_at: String = row.get(8).map_err(|e| StoreError(e.to_string()))?;
    let updated_at: Option<String> = row.get(9).map_err(|e| StoreError(e.to_string()))?;
    let mpesa_request_id: Option<String> = row.get(10).map_err(|e| StoreError(e.to_string()))?;

    Ok(Order {
        order_id: OrderId::parse(&order_id)
            .map_err(|e| StoreError(format!("stored order id invalid: {e}")))?,
        name,
        phone,
        address,
        payment_method: PaymentMethod::parse(&payment_method)
            .map_err(|e| StoreError(format!("stored payment method invalid: {e}")))?,
        cart: serde_json::from_str(&cart_json)
            .map_err(|e| StoreError(format!("stored cart invalid: {e}")))?,
        total,
        status: parse_status(&status)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: updated_at.as_deref().map(parse_timestamp).transpose()?,
        mpesa_request_id,
    })
}

fn parse_status(raw: &str) -> Result<OrderStatus, StoreError> {
    match raw {
        "Pending" => Ok(OrderStatus::Pending),
        "Confirmed" => Ok(OrderStatus::Confirmed),
        "Failed" => Ok(OrderStatus::Failed),
        other => Err(StoreError(format!("stored status invalid: {other}"))),
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError(format!("stored timestamp invalid: {e}")))
}

#[async_trait]
impl OrderStore for SqliteStore {
    async fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
        let order = order.clone();
        self.with_conn(move |conn| {
            let cart_json = serde_json::to_string(&order.cart)
                .map_err(|e| StoreError(format!("cart serialize failed: {e}")))?;
            conn.execute(
                "INSERT INTO orders (order_id, name, phone, address, payment_method, cart_json, total, status, created_at, updated_at, mpesa_request_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    order.order_id.to_string(),
                    order.name,
                    order.phone,
                    order.address,
                    order.payment_method.as_str(),
                    cart_json,
                    order.total,
                    order.status.as_str(),
                    order.created_at.to_rfc3339(),
                    order.updated_at.map(|t| t.to_rfc3339()),
                    order.mpesa_request_id,
                ],
            )
            .map_err(|e| StoreError(format!("order insert failed: {e}")))?;
            Ok(())
        })
        .await
    }

    async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>, StoreError> {
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT order_id, name, phone, address, payment_method, cart_json, total, status, created_at, updated_at, mpesa_request_id
                 FROM orders WHERE order_id = ?1",
                params![order_id.to_string()],
                |row| Ok(row_to_order(row)),
            )
            .optional()
            .map_err(|e| StoreError(format!("order lookup failed: {e}")))?
            .transpose()
        })
        .await
    }

    async fn transition_by_mpesa_request(
        &self,
        mpesa_request_id: &str,
        status: OrderStatus,
    ) -> Result<Option<OrderId>, StoreError> {
        let request_id = mpesa_request_id.to_string();
        self.with_conn(move |conn| {
            let existing: Option<String> = conn
                .query_row(
                    "SELECT order_id FROM orders WHERE mpesa_request_id = ?1",
                    params![request_id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| StoreError(format!("order lookup failed: {e}")))?;
            let Some(order_id) = existing else {
                return Ok(None);
            };
            conn.execute(
                "UPDATE orders SET status = ?1, updated_at = ?2 WHERE order_id = ?3",
                params![status.as_str(), Utc::now().to_rfc3339(), order_id],
            )
            .map_err(|e| StoreError(format!("order update failed: {e}")))?;
            OrderId::parse(&order_id)
                .map(Some)
                .map_err(|e| StoreError(format!("stored order id invalid: {e}")))
        })
        .await
    }

    async fn list_pending_mpesa(&self, cutoff: DateTime<Utc>) -> Result<Vec<Order>, StoreError> {
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT order_id, name, phone, address, payment_method, cart_json, total, status, created_at, updated_at, mpesa_request_id
                     FROM orders
                     WHERE payment_method = 'mpesa' AND status = 'Pending'
                       AND mpesa_request_id IS NOT NULL AND created_at < ?1
                     ORDER BY created_at",
                )
                .map_err(|e| StoreError(format!("pending query failed: {e}")))?;
            let rows = stmt
                .query_map(params![cutoff.to_rfc3339()], |row| Ok(row_to_order(row)))
                .map_err(|e| StoreError(format!("pending query failed: {e}")))?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row.map_err(|e| StoreError(format!("pending row failed: {e}")))??);
            }
            Ok(out)
        })
        .await
    }

    async fn insert_rating(&self, rating: &Rating) -> Result<(), StoreError> {
        let rating = rating.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO ratings (product_id, rating, comment, timestamp) VALUES (?1, ?2, ?3, ?4)",
                params![
                    rating.product_id,
                    i64::from(rating.rating),
                    rating.comment,
                    rating.timestamp.to_rfc3339(),
                ],
            )
            .map_err(|e| StoreError(format!("rating insert failed: {e}")))?;
            Ok(())
        })
        .await
    }

    async fn ratings_for(&self, product_id: &str) -> Result<Vec<Rating>, StoreError> {
        let product_id = product_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT product_id, rating, comment, timestamp FROM ratings
                     WHERE product_id = ?1 ORDER BY timestamp",
                )
                .map_err(|e| StoreError(format!("ratings query failed: {e}")))?;
            let rows = stmt
                .query_map(params![product_id], |row| {
                    let product_id: String = row.get(0)?;
                    let rating: i64 = row.get(1)?;
                    let comment: String = row.get(2)?;
                    let timestamp: String = row.get(3)?;
                    Ok((product_id, rating, comment, timestamp))
                })
                .map_err(|e| StoreError(format!("ratings query failed: {e}")))?;
            let mut out = Vec::new();
            for row in rows {
                let (product_id, rating, comment, timestamp) =
                    row.map_err(|e| StoreError(format!("rating row failed: {e}")))?;
                out.push(Rating {
                    product_id,
                    rating: u8::try_from(rating)
                        .map_err(|_| StoreError("stored rating out of range".to_string()))?,
                    comment,
                    timestamp: parse_timestamp(&timestamp)?,
                });
            }
            Ok(out)
        })
        .await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |_| Ok(()))
                .map_err(|e| StoreError(format!("store ping failed: {e}")))
        })
        .await
    }
}
