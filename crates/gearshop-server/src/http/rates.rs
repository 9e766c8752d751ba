// SPDX-License-Identifier: Apache-2.0

use super::handlers::{api_error_response, propagated_request_id, with_request_id};
use crate::AppState;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use gearshop_api::{ApiError, ApiErrorCode};
use serde_json::json;
use std::collections::HashMap;
use std::time::Instant;

/// Exchange-rate proxy. USD, or an unconfigured provider, pins the rate to
/// 1 so the storefront keeps rendering prices.
pub(crate) async fn exchange_rate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    axum::extract::Query(params): axum::extract::Query<HashMap<String, String>>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let currency = params
        .get("currency")
        .map_or("USD", String::as_str)
        .to_ascii_uppercase();

    if currency == "USD" {
        let resp = Json(json!({"rate": 1.0})).into_response();
        state
            .metrics
            .observe_request("/api/exchange-rate", StatusCode::OK, started.elapsed())
            .await;
        return with_request_id(resp, &request_id);
    }

    match state.rates.usd_rates().await {
        Ok(None) => {
            let resp = Json(json!({"rate": 1.0})).into_response();
            state
                .metrics
                .observe_request("/api/exchange-rate", StatusCode::OK, started.elapsed())
                .await;
            with_request_id(resp, &request_id)
        }
        Ok(Some(rates)) => {
            let rate = rates.get(&currency).copied().unwrap_or(1.0);
            let resp = Json(json!({"rate": rate})).into_response();
            state
                .metrics
                .observe_request("/api/exchange-rate", StatusCode::OK, started.elapsed())
                .await;
            with_request_id(resp, &request_id)
        }
        Err(e) => {
            let resp = api_error_response(ApiError::new(
                ApiErrorCode::GatewayUnavailable,
                "exchange-rate provider unavailable",
                json!({"message": e.to_string()}),
            ));
            state
                .metrics
                .observe_request(
                    "/api/exchange-rate",
                    StatusCode::BAD_GATEWAY,
                    started.elapsed(),
                )
                .await;
            with_request_id(resp, &request_id)
        }
    }
}
