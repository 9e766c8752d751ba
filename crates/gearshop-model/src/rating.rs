// SPDX-License-Identifier: Apache-2.0

use crate::product::ParseError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Append-only product rating.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Rating {
    pub product_id: String,
    pub rating: u8,
    pub comment: String,
    pub timestamp: DateTime<Utc>,
}

impl Rating {
    pub fn new(product_id: String, rating: u8, comment: String) -> Result<Self, ParseError> {
        if product_id.is_empty() {
            return Err(ParseError::Empty("product_id"));
        }
        if !(1..=5).contains(&rating) {
            return Err(ParseError::InvalidFormat("rating must be between 1 and 5"));
        }
        Ok(Self {
            product_id,
            rating,
            comment,
            timestamp: Utc::now(),
        })
    }
}
