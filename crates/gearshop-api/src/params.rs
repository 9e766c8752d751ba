// SPDX-License-Identifier: Apache-2.0

use crate::{ApiError, ApiErrorCode};
use gearshop_model::{validate_cart, Cart, CartError, OrderId, PaymentMethod};
use serde::Deserialize;
use serde_json::json;

/// Body of `POST /create-order`. Field names match the client wire format.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(rename = "paymentMethod", default)]
    pub payment_method: String,
    #[serde(default)]
    pub cart: Cart,
    #[serde(rename = "paypalOrderId", default)]
    pub paypal_order_id: Option<String>,
}

/// A create-order request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderIntent {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub payment_method: PaymentMethod,
    pub cart: Cart,
    pub paypal_order_id: Option<String>,
}

pub fn validate_create_order(req: CreateOrderRequest) -> Result<OrderIntent, ApiError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation_failed("name", "must not be empty"));
    }
    let phone = req.phone.trim();
    if phone.is_empty() {
        return Err(ApiError::validation_failed("phone", "must not be empty"));
    }
    let address = req.address.trim();
    if address.is_empty() {
        return Err(ApiError::validation_failed("address", "must not be empty"));
    }
    let payment_method = PaymentMethod::parse(&req.payment_method).map_err(|e| {
        ApiError::new(
            ApiErrorCode::ValidationFailed,
            "invalid payment method",
            json!({"paymentMethod": req.payment_method, "message": e.to_string()}),
        )
    })?;
    validate_cart(&req.cart).map_err(|e| match e {
        CartError::Empty => ApiError::validation_failed("cart", "must not be empty"),
        CartError::ZeroQuantity(id) => ApiError::new(
            ApiErrorCode::ValidationFailed,
            "invalid cart line",
            json!({"productId": id, "reason": "quantity must be >= 1"}),
        ),
        CartError::NegativePrice(id) => ApiError::new(
            ApiErrorCode::ValidationFailed,
            "invalid cart line",
            json!({"productId": id, "reason": "price must be >= 0"}),
        ),
        other => ApiError::validation_failed("cart", &other.to_string()),
    })?;
    let paypal_order_id = req
        .paypal_order_id
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    if payment_method == PaymentMethod::Paypal && paypal_order_id.is_none() {
        return Err(ApiError::validation_failed(
            "paypalOrderId",
            "required for paypal orders",
        ));
    }
    Ok(OrderIntent {
        name: name.to_string(),
        phone: phone.to_string(),
        address: address.to_string(),
        payment_method,
        cart: req.cart,
        paypal_order_id,
    })
}

/// Body of `POST /submit-rating`.
#[derive(Debug, Clone, Deserialize)]
pub struct RatingRequest {
    #[serde(rename = "productId", default)]
    pub product_id: String,
    pub rating: Option<u8>,
    #[serde(default)]
    pub comment: String,
}

pub fn validate_rating(req: &RatingRequest) -> Result<(String, u8), ApiError> {
    if req.product_id.trim().is_empty() {
        return Err(ApiError::validation_failed("productId", "must not be empty"));
    }
    let rating = req
        .rating
        .ok_or_else(|| ApiError::validation_failed("rating", "must be present"))?;
    if !(1..=5).contains(&rating) {
        return Err(ApiError::validation_failed(
            "rating",
            "must be between 1 and 5",
        ));
    }
    Ok((req.product_id.trim().to_string(), rating))
}

/// Validate a track-order path id before any storage access.
pub fn parse_order_id(raw: &str) -> Result<OrderId, ApiError> {
    OrderId::parse(raw).map_err(|_| ApiError::invalid_order_id(raw))
}
