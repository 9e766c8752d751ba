// SPDX-License-Identifier: Apache-2.0

use super::handlers::{api_error_response, propagated_request_id, with_request_id};
use crate::orders::{apply_mpesa_result, create_order};
use crate::payments::ResultCode;
use crate::AppState;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use gearshop_api::{
    map_error, parse_order_id, validate_create_order, ApiError, ApiErrorCode, CreateOrderRequest,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::{info, warn};

async fn observe(state: &AppState, route: &str, status: StatusCode, started: Instant) {
    state
        .metrics
        .observe_request(route, status, started.elapsed())
        .await;
}

pub(crate) async fn create_order_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    info!(request_id = %request_id, route = "/create-order", "request start");

    let request: CreateOrderRequest = match serde_json::from_value(body) {
        Ok(v) => v,
        Err(e) => {
            let err = ApiError::new(
                ApiErrorCode::InvalidRequestBody,
                "malformed create-order body",
                json!({"message": e.to_string()}),
            );
            let status = map_error(&err);
            let resp = api_error_response(err);
            observe(
                &state,
                "/create-order",
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_REQUEST),
                started,
            )
            .await;
            return with_request_id(resp, &request_id);
        }
    };

    let intent = match validate_create_order(request) {
        Ok(v) => v,
        Err(err) => {
            let resp = api_error_response(err);
            observe(&state, "/create-order", StatusCode::BAD_REQUEST, started).await;
            return with_request_id(resp, &request_id);
        }
    };

    match create_order(&state, intent).await {
        Ok(created) => {
            let resp = Json(json!({
                "success": true,
                "orderId": created.order_id,
                "message": created.message,
            }))
            .into_response();
            observe(&state, "/create-order", StatusCode::OK, started).await;
            with_request_id(resp, &request_id)
        }
        Err(err) => {
            let status =
                StatusCode::from_u16(map_error(&err)).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let resp = api_error_response(err);
            observe(&state, "/create-order", status, started).await;
            with_request_id(resp, &request_id)
        }
    }
}

pub(crate) async fn track_order_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    axum::extract::Path(id): axum::extract::Path<String>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);

    // Shape check first; storage is never touched for a malformed id.
    let order_id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(err) => {
            let resp = api_error_response(err);
            observe(&state, "/track-order/:id", StatusCode::BAD_REQUEST, started).await;
            return with_request_id(resp, &request_id);
        }
    };

    match state.store.find_order(order_id).await {
        Ok(Some(order)) => {
            let resp = Json(json!({"success": true, "order": order})).into_response();
            observe(&state, "/track-order/:id", StatusCode::OK, started).await;
            with_request_id(resp, &request_id)
        }
        Ok(None) => {
            let err = ApiError::new(
                ApiErrorCode::OrderNotFound,
                "order not found",
                json!({"orderId": id}),
            );
            let resp = api_error_response(err);
            observe(&state, "/track-order/:id", StatusCode::NOT_FOUND, started).await;
            with_request_id(resp, &request_id)
        }
        Err(e) => {
            let resp = api_error_response(ApiError::storage_unavailable(&e.to_string()));
            observe(
                &state,
                "/track-order/:id",
                StatusCode::SERVICE_UNAVAILABLE,
                started,
            )
            .await;
            with_request_id(resp, &request_id)
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallbackEnvelope {
    #[serde(rename = "Body")]
    body: Option<CallbackBody>,
}

#[derive(Debug, Deserialize)]
struct CallbackBody {
    #[serde(rename = "stkCallback")]
    stk_callback: Option<StkCallback>,
}

#[derive(Debug, Deserialize)]
struct StkCallback {
    #[serde(rename = "CheckoutRequestID")]
    checkout_request_id: Option<String>,
    #[serde(rename = "ResultCode")]
    result_code: Option<ResultCode>,
}

/// Gateway webhook. Whatever happens inside, the gateway gets a success
/// acknowledgment; a failure status would make it retry indefinitely.
pub(crate) async fn mpesa_callback_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);

    let callback = serde_json::from_value::<CallbackEnvelope>(body)
        .ok()
        .and_then(|env| env.body)
        .and_then(|b| b.stk_callback);
    match callback {
        Some(StkCallback {
            checkout_request_id: Some(checkout_request_id),
            result_code: Some(result_code),
        }) => {
            let code = result_code.as_i64();
            match code {
                Some(code) => {
                    if let Err(e) = apply_mpesa_result(&state, &checkout_request_id, code).await {
                        warn!("mpesa callback processing failed: {e}");
                    }
                }
                None => warn!("mpesa callback carried an unparseable result code"),
            }
        }
        _ => warn!("mpesa callback missing stkCallback fields; acknowledged anyway"),
    }

    let resp = Json(json!({"success": true})).into_response();
    observe(&state, "/mpesa-callback", StatusCode::OK, started).await;
    with_request_id(resp, &request_id)
}
