// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorCode {
    InvalidRequestBody,
    ValidationFailed,
    InvalidOrderId,
    ProductNotFound,
    OrderNotFound,
    PaymentRejected,
    GatewayConfigMissing,
    GatewayUnavailable,
    StorageUnavailable,
    Internal,
}

impl ApiErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequestBody => "invalid_request_body",
            Self::ValidationFailed => "validation_failed",
            Self::InvalidOrderId => "invalid_order_id",
            Self::ProductNotFound => "product_not_found",
            Self::OrderNotFound => "order_not_found",
            Self::PaymentRejected => "payment_rejected",
            Self::GatewayConfigMissing => "gateway_config_missing",
            Self::GatewayUnavailable => "gateway_unavailable",
            Self::StorageUnavailable => "storage_unavailable",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    pub details: Value,
}

impl ApiError {
    #[must_use]
    pub fn new(code: ApiErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
        }
    }

    #[must_use]
    pub fn validation_failed(field: &str, reason: &str) -> Self {
        Self::new(
            ApiErrorCode::ValidationFailed,
            "validation failed",
            json!({"field_errors":[{"field": field, "reason": reason}]}),
        )
    }

    #[must_use]
    pub fn invalid_order_id(value: &str) -> Self {
        Self::new(
            ApiErrorCode::InvalidOrderId,
            "order id must be a UUID",
            json!({"order_id": value}),
        )
    }

    #[must_use]
    pub fn storage_unavailable(message: &str) -> Self {
        Self::new(
            ApiErrorCode::StorageUnavailable,
            "storage unavailable",
            json!({"message": message, "retryable": true}),
        )
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
