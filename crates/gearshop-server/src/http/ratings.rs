// SPDX-License-Identifier: Apache-2.0

use super::handlers::{api_error_response, propagated_request_id, with_request_id};
use crate::AppState;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use gearshop_api::{validate_rating, ApiError, ApiErrorCode, RatingRequest};
use gearshop_model::Rating;
use serde_json::{json, Value};
use std::time::Instant;

pub(crate) async fn submit_rating_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);

    let request: RatingRequest = match serde_json::from_value(body) {
        Ok(v) => v,
        Err(e) => {
            let resp = api_error_response(ApiError::new(
                ApiErrorCode::InvalidRequestBody,
                "malformed rating body",
                json!({"message": e.to_string()}),
            ));
            state
                .metrics
                .observe_request("/submit-rating", StatusCode::BAD_REQUEST, started.elapsed())
                .await;
            return with_request_id(resp, &request_id);
        }
    };

    let (product_id, score) = match validate_rating(&request) {
        Ok(v) => v,
        Err(err) => {
            let resp = api_error_response(err);
            state
                .metrics
                .observe_request("/submit-rating", StatusCode::BAD_REQUEST, started.elapsed())
                .await;
            return with_request_id(resp, &request_id);
        }
    };

    let rating = match Rating::new(product_id, score, request.comment.clone()) {
        Ok(v) => v,
        Err(e) => {
            let resp = api_error_response(ApiError::validation_failed("rating", &e.to_string()));
            state
                .metrics
                .observe_request("/submit-rating", StatusCode::BAD_REQUEST, started.elapsed())
                .await;
            return with_request_id(resp, &request_id);
        }
    };

    match state.store.insert_rating(&rating).await {
        Ok(()) => {
            let resp = Json(json!({"success": true})).into_response();
            state
                .metrics
                .observe_request("/submit-rating", StatusCode::OK, started.elapsed())
                .await;
            with_request_id(resp, &request_id)
        }
        Err(e) => {
            let resp = api_error_response(ApiError::storage_unavailable(&e.to_string()));
            state
                .metrics
                .observe_request(
                    "/submit-rating",
                    StatusCode::SERVICE_UNAVAILABLE,
                    started.elapsed(),
                )
                .await;
            with_request_id(resp, &request_id)
        }
    }
}
