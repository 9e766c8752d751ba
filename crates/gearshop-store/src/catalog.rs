// SPDX-License-Identifier: Apache-2.0

use crate::StoreError;
use gearshop_model::{Catalog, Product, ProductId};
use serde::Deserialize;
use std::path::Path;
use tracing::warn;
use uuid::Uuid;

/// Raw `products.json` entry. The file is hand-maintained, so every field
/// is optional and prices may arrive as strings.
#[derive(Debug, Deserialize)]
struct RawProduct {
    id: Option<String>,
    title: Option<String>,
    price: Option<RawPrice>,
    #[serde(default)]
    images: Vec<String>,
    sku: Option<String>,
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Number(f64),
    Text(String),
}

impl RawPrice {
    fn to_f64(&self) -> f64 {
        match self {
            Self::Number(v) if v.is_finite() && *v >= 0.0 => *v,
            Self::Number(_) => 0.0,
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0).unwrap_or(0.0),
        }
    }
}

/// Load the product catalog once at startup. Entries that cannot be
/// normalized are skipped with a warning rather than failing the boot.
pub fn load_catalog(path: &Path) -> Result<Catalog, StoreError> {
    let bytes =
        std::fs::read(path).map_err(|e| StoreError(format!("catalog read failed: {e}")))?;
    let raw: Vec<RawProduct> = serde_json::from_slice(&bytes)
        .map_err(|e| StoreError(format!("catalog parse failed: {e}")))?;

    let mut products = Vec::with_capacity(raw.len());
    for entry in raw {
        let id_raw = entry
            .id
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let id = match ProductId::parse(id_raw.trim()) {
            Ok(v) => v,
            Err(e) => {
                warn!("skipping catalog entry with bad id {id_raw:?}: {e}");
                continue;
            }
        };
        let product = Product {
            id,
            title: entry
                .title
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| "Unnamed Product".to_string()),
            price: entry.price.map(|p| p.to_f64()).unwrap_or(0.0),
            images: entry.images,
            sku: entry.sku.unwrap_or_default(),
            category: entry
                .category
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| "Uncategorized".to_string()),
        };
        if let Err(e) = product.validate() {
            warn!("skipping catalog entry {}: {e}", product.id.as_str());
            continue;
        }
        products.push(product);
    }
    Ok(Catalog::new(products))
}
