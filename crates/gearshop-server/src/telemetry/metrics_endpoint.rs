// SPDX-License-Identifier: Apache-2.0

use crate::http::handlers::{make_request_id, with_request_id};
use crate::AppState;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::time::Instant;

const METRIC_SUBSYSTEM: &str = "gearshop";
const METRIC_VERSION: &str = env!("CARGO_PKG_VERSION");

fn percentile_ns(values: &[u64], pct: f64) -> u64 {
    if values.is_empty() {
        return 0;
    }
    let mut v = values.to_vec();
    v.sort_unstable();
    let idx = ((v.len() as f64 - 1.0) * pct).round() as usize;
    v[idx]
}

pub(crate) async fn metrics_handler(State(state): State<AppState>) -> Response {
    let request_id = make_request_id(&state);
    let started = Instant::now();

    let (counts, latencies) = state.metrics.snapshot().await;
    let mut body = String::new();
    for ((route, status), count) in counts {
        body.push_str(&format!(
            "gearshop_requests_total{{subsystem=\"{METRIC_SUBSYSTEM}\",version=\"{METRIC_VERSION}\",route=\"{route}\",status=\"{status}\"}} {count}\n"
        ));
    }
    for (route, samples) in latencies {
        let p50 = percentile_ns(&samples, 0.50) / 1_000_000;
        let p95 = percentile_ns(&samples, 0.95) / 1_000_000;
        body.push_str(&format!(
            "gearshop_request_latency_p50_ms{{subsystem=\"{METRIC_SUBSYSTEM}\",version=\"{METRIC_VERSION}\",route=\"{route}\"}} {p50}\n"
        ));
        body.push_str(&format!(
            "gearshop_request_latency_p95_ms{{subsystem=\"{METRIC_SUBSYSTEM}\",version=\"{METRIC_VERSION}\",route=\"{route}\"}} {p95}\n"
        ));
    }

    let mut resp = (StatusCode::OK, body).into_response();
    resp.headers_mut().insert(
        "content-type",
        HeaderValue::from_static("text/plain; version=0.0.4"),
    );
    state
        .metrics
        .observe_request("/metrics", StatusCode::OK, started.elapsed())
        .await;
    with_request_id(resp, &request_id)
}
