// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

pub const ID_MAX_LEN: usize = 128;
pub const TITLE_MAX_LEN: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    Empty(&'static str),
    Trimmed(&'static str),
    TooLong(&'static str, usize),
    InvalidFormat(&'static str),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty(name) => write!(f, "{name} must not be empty"),
            Self::Trimmed(name) => {
                write!(f, "{name} must not contain leading/trailing whitespace")
            }
            Self::TooLong(name, max) => write!(f, "{name} exceeds max length {max}"),
            Self::InvalidFormat(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        if input.is_empty() {
            return Err(ParseError::Empty("product_id"));
        }
        if input.trim() != input {
            return Err(ParseError::Trimmed("product_id"));
        }
        if input.len() > ID_MAX_LEN {
            return Err(ParseError::TooLong("product_id", ID_MAX_LEN));
        }
        Ok(Self(input.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: f64,
    pub images: Vec<String>,
    pub sku: String,
    pub category: String,
}

impl Product {
    pub fn validate(&self) -> Result<(), ParseError> {
        if self.title.is_empty() {
            return Err(ParseError::Empty("title"));
        }
        if self.title.len() > TITLE_MAX_LEN {
            return Err(ParseError::TooLong("title", TITLE_MAX_LEN));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(ParseError::InvalidFormat(
                "product price must be a non-negative number",
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// In-memory product catalog, loaded once at startup and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Catalog {
    pub products: Vec<Product>,
}

impl Catalog {
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id.as_str() == id)
    }

    /// Distinct categories, sorted.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .products
            .iter()
            .map(|p| p.category.as_str())
            .filter(|c| !c.is_empty())
            .collect();
        set.into_iter().map(ToString::to_string).collect()
    }
}
