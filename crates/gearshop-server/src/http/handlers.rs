// SPDX-License-Identifier: Apache-2.0

use crate::AppState;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use gearshop_api::{map_error, ApiError};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::sync::atomic::Ordering;
use std::time::Instant;
use tracing::warn;

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

pub(crate) fn api_error_response(err: ApiError) -> Response {
    let status =
        StatusCode::from_u16(map_error(&err)).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({"error": err}))).into_response()
}

pub(crate) fn make_request_id(state: &AppState) -> String {
    let id = state.request_id_seed.fetch_add(1, Ordering::Relaxed);
    format!("req-{id:016x}")
}

pub(crate) fn propagated_request_id(headers: &HeaderMap, state: &AppState) -> String {
    if let Some(raw) = headers.get("x-request-id").and_then(|v| v.to_str().ok()) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    make_request_id(state)
}

pub(crate) fn with_request_id(mut response: Response, request_id: &str) -> Response {
    if let Ok(v) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert("x-request-id", v);
    }
    response
}

pub(crate) fn if_none_match(headers: &HeaderMap) -> Option<String> {
    headers
        .get("if-none-match")
        .and_then(|v| v.to_str().ok())
        .map(std::string::ToString::to_string)
}

pub(crate) fn put_cache_headers(headers: &mut HeaderMap, ttl_secs: u64, etag: &str) {
    if let Ok(value) = HeaderValue::from_str(&format!("public, max-age={ttl_secs}")) {
        headers.insert("cache-control", value);
    }
    if let Ok(value) = HeaderValue::from_str(etag) {
        headers.insert("etag", value);
    }
}

pub(crate) fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn html_response(status: StatusCode, html: String) -> Response {
    let mut resp = Response::new(Body::from(html));
    *resp.status_mut() = status;
    resp.headers_mut().insert(
        "content-type",
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    resp
}

pub(crate) async fn landing_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);

    let mut list = String::new();
    for product in &state.catalog.products {
        list.push_str(&format!(
            "<li><a href=\"/product/{id}\">{title}</a> - {price:.2} <em>{category}</em></li>",
            id = product.id.as_str(),
            title = escape_html(&product.title),
            price = product.price,
            category = escape_html(&product.category),
        ));
    }
    if list.is_empty() {
        list.push_str("<li>No products available yet.</li>");
    }
    let mut categories = String::new();
    for category in state.catalog.categories() {
        categories.push_str(&format!("<li>{}</li>", escape_html(&category)));
    }
    let html = format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>Gearshop</title></head><body>\
<h1>Gearshop</h1>\
<h2>Categories</h2><ul>{categories}</ul>\
<h2>Products</h2><ul>{list}</ul>\
</body></html>"
    );

    let etag = format!("\"{}\"", sha256_hex(html.as_bytes()));
    if if_none_match(&headers).as_deref() == Some(etag.as_str()) {
        let mut resp = StatusCode::NOT_MODIFIED.into_response();
        put_cache_headers(resp.headers_mut(), state.api.catalog_page_ttl_secs, &etag);
        state
            .metrics
            .observe_request("/", StatusCode::NOT_MODIFIED, started.elapsed())
            .await;
        return with_request_id(resp, &request_id);
    }
    let mut resp = html_response(StatusCode::OK, html);
    put_cache_headers(resp.headers_mut(), state.api.catalog_page_ttl_secs, &etag);
    state
        .metrics
        .observe_request("/", StatusCode::OK, started.elapsed())
        .await;
    with_request_id(resp, &request_id)
}

pub(crate) async fn product_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    axum::extract::Path(id): axum::extract::Path<String>,
) -> impl IntoResponse {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);

    let Some(product) = state.catalog.find(&id) else {
        let resp = html_response(
            StatusCode::NOT_FOUND,
            "<!doctype html><html><body><h1>Product not found.</h1></body></html>".to_string(),
        );
        state
            .metrics
            .observe_request("/product/:id", StatusCode::NOT_FOUND, started.elapsed())
            .await;
        return with_request_id(resp, &request_id);
    };

    // Ratings are decoration here; a storage hiccup renders the page bare
    // rather than failing it.
    let ratings = match state.store.ratings_for(product.id.as_str()).await {
        Ok(v) => v,
        Err(e) => {
            warn!("ratings lookup failed for {}: {e}", product.id.as_str());
            Vec::new()
        }
    };
    let mut rating_list = String::new();
    for rating in &ratings {
        rating_list.push_str(&format!(
            "<li>{}/5 {}</li>",
            rating.rating,
            escape_html(&rating.comment)
        ));
    }
    if rating_list.is_empty() {
        rating_list.push_str("<li>No ratings yet.</li>");
    }
    let images = product
        .images
        .iter()
        .map(|url| format!("<img src=\"{}\" alt=\"\">", escape_html(url)))
        .collect::<String>();
    let html = format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{title}</title></head><body>\
<h1>{title}</h1>\
<p>{price:.2} - {category}</p>\
{images}\
<h2>Ratings</h2><ul>{rating_list}</ul>\
</body></html>",
        title = escape_html(&product.title),
        price = product.price,
        category = escape_html(&product.category),
    );
    let resp = html_response(StatusCode::OK, html);
    state
        .metrics
        .observe_request("/product/:id", StatusCode::OK, started.elapsed())
        .await;
    with_request_id(resp, &request_id)
}

pub(crate) async fn healthz_handler(State(state): State<AppState>) -> impl IntoResponse {
    let request_id = make_request_id(&state);
    let started = Instant::now();
    let resp = (StatusCode::OK, "ok").into_response();
    state
        .metrics
        .observe_request("/healthz", StatusCode::OK, started.elapsed())
        .await;
    with_request_id(resp, &request_id)
}

pub(crate) async fn readyz_handler(State(state): State<AppState>) -> impl IntoResponse {
    let request_id = make_request_id(&state);
    let started = Instant::now();
    if state.ready.load(Ordering::Relaxed) {
        let resp = (StatusCode::OK, "ready").into_response();
        state
            .metrics
            .observe_request("/readyz", StatusCode::OK, started.elapsed())
            .await;
        with_request_id(resp, &request_id)
    } else {
        let resp = (StatusCode::SERVICE_UNAVAILABLE, "not-ready").into_response();
        state
            .metrics
            .observe_request("/readyz", StatusCode::SERVICE_UNAVAILABLE, started.elapsed())
            .await;
        with_request_id(resp, &request_id)
    }
}

pub(crate) async fn version_handler(State(state): State<AppState>) -> impl IntoResponse {
    let request_id = make_request_id(&state);
    let started = Instant::now();
    let payload = json!({
        "crate": crate::CRATE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "config_schema_version": crate::config::CONFIG_SCHEMA_VERSION,
    });
    let mut response = Json(payload).into_response();
    if let Ok(value) = HeaderValue::from_str("public, max-age=30") {
        response.headers_mut().insert("cache-control", value);
    }
    state
        .metrics
        .observe_request("/version", StatusCode::OK, started.elapsed())
        .await;
    with_request_id(response, &request_id)
}

pub(crate) async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    crate::telemetry::metrics_endpoint::metrics_handler(State(state)).await
}
