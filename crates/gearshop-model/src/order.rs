// SPDX-License-Identifier: Apache-2.0

use crate::cart::{cart_total, Cart};
use crate::product::ParseError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a caller-supplied id. Lookups must go through this before any
    /// storage access.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|_| ParseError::InvalidFormat("order id must be a UUID"))
    }

    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cod,
    Paypal,
    Mpesa,
}

impl PaymentMethod {
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        match raw {
            "cod" => Ok(Self::Cod),
            "paypal" => Ok(Self::Paypal),
            "mpesa" => Ok(Self::Mpesa),
            _ => Err(ParseError::InvalidFormat(
                "payment method must be one of 'cod', 'paypal', 'mpesa'",
            )),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cod => "cod",
            Self::Paypal => "paypal",
            Self::Mpesa => "mpesa",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Failed,
}

impl OrderStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Failed => "Failed",
        }
    }
}

/// A persisted order. Created once at submission; the only later mutation is
/// a single status transition, which stamps `updated_at`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Order {
    pub order_id: OrderId,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub payment_method: PaymentMethod,
    pub cart: Cart,
    pub total: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub mpesa_request_id: Option<String>,
}

impl Order {
    /// Build a fresh order from an already-validated intent. The cart total
    /// is derived here so the persisted value always matches the snapshot.
    #[must_use]
    pub fn new(
        name: String,
        phone: String,
        address: String,
        payment_method: PaymentMethod,
        cart: Cart,
        status: OrderStatus,
    ) -> Self {
        let total = cart_total(&cart);
        Self {
            order_id: OrderId::generate(),
            name,
            phone,
            address,
            payment_method,
            cart,
            total,
            status,
            created_at: Utc::now(),
            updated_at: None,
            mpesa_request_id: None,
        }
    }

    #[must_use]
    pub fn with_mpesa_request_id(mut self, request_id: String) -> Self {
        self.mpesa_request_id = Some(request_id);
        self
    }

    /// Apply an absolute status transition. Re-applying the same transition
    /// is harmless, which is what makes duplicate webhook delivery safe.
    pub fn transition(&mut self, status: OrderStatus) {
        self.status = status;
        self.updated_at = Some(Utc::now());
    }
}
