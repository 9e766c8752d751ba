// SPDX-License-Identifier: Apache-2.0

use crate::{ApiError, ApiErrorCode};

/// HTTP status for an error body. The request boundary translates every
/// error into exactly one status plus the JSON error shape; nothing is
/// retried server-side.
#[must_use]
pub fn map_error(error: &ApiError) -> u16 {
    match error.code {
        ApiErrorCode::InvalidRequestBody
        | ApiErrorCode::ValidationFailed
        | ApiErrorCode::InvalidOrderId
        | ApiErrorCode::PaymentRejected
        | ApiErrorCode::GatewayConfigMissing => 400,
        ApiErrorCode::ProductNotFound | ApiErrorCode::OrderNotFound => 404,
        ApiErrorCode::GatewayUnavailable => 502,
        ApiErrorCode::StorageUnavailable => 503,
        ApiErrorCode::Internal => 500,
    }
}
