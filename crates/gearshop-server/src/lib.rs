#![forbid(unsafe_code)]
//! Gearshop HTTP server.
//!
//! The binary wires an [`AppState`] from environment config and hands it to
//! [`build_router`]; integration tests do the same with fakes.

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use gearshop_model::Catalog;
use gearshop_store::OrderStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

mod config;
mod http;
pub mod orders;
pub mod payments;
pub mod rates;
pub mod reconcile;
mod telemetry;

pub use config::{validate_startup_config_contract, ServerConfig, CONFIG_SCHEMA_VERSION};
pub use payments::{
    FakeMpesaGateway, FakePaypalGateway, HttpMpesaGateway, HttpPaypalGateway, MpesaConfig,
    MpesaGateway, PaymentError, PaypalConfig, PaypalGateway, UnconfiguredMpesaGateway,
    UnconfiguredPaypalGateway,
};
pub use rates::{FakeRateSource, HttpRateSource, RateSource};

pub const CRATE_NAME: &str = "gearshop-server";

#[derive(Default)]
pub(crate) struct RequestMetrics {
    counts: Mutex<HashMap<(String, u16), u64>>,
    latency_ns: Mutex<HashMap<String, Vec<u64>>>,
}

impl RequestMetrics {
    pub(crate) async fn observe_request(&self, route: &str, status: StatusCode, latency: Duration) {
        let mut counts = self.counts.lock().await;
        *counts
            .entry((route.to_string(), status.as_u16()))
            .or_insert(0) += 1;
        drop(counts);
        let mut latency_map = self.latency_ns.lock().await;
        latency_map
            .entry(route.to_string())
            .or_default()
            .push(latency.as_nanos() as u64);
    }

    pub(crate) async fn snapshot(&self) -> (Vec<((String, u16), u64)>, Vec<(String, Vec<u64>)>) {
        let counts = self.counts.lock().await;
        let mut count_rows: Vec<((String, u16), u64)> =
            counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
        count_rows.sort();
        drop(counts);
        let latency = self.latency_ns.lock().await;
        let mut latency_rows: Vec<(String, Vec<u64>)> = latency
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        latency_rows.sort_by(|a, b| a.0.cmp(&b.0));
        (count_rows, latency_rows)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub store: Arc<dyn OrderStore>,
    pub mpesa: Arc<dyn MpesaGateway>,
    pub paypal: Arc<dyn PaypalGateway>,
    pub rates: Arc<dyn RateSource>,
    pub api: ServerConfig,
    pub ready: Arc<AtomicBool>,
    pub(crate) metrics: Arc<RequestMetrics>,
    pub(crate) request_id_seed: Arc<AtomicU64>,
}

impl AppState {
    #[must_use]
    pub fn new(
        catalog: Arc<Catalog>,
        store: Arc<dyn OrderStore>,
        mpesa: Arc<dyn MpesaGateway>,
        paypal: Arc<dyn PaypalGateway>,
        rates: Arc<dyn RateSource>,
        api: ServerConfig,
    ) -> Self {
        Self {
            catalog,
            store,
            mpesa,
            paypal,
            rates,
            api,
            ready: Arc::new(AtomicBool::new(true)),
            metrics: Arc::new(RequestMetrics::default()),
            request_id_seed: Arc::new(AtomicU64::new(1)),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(http::handlers::landing_handler))
        .route("/product/:id", get(http::handlers::product_handler))
        .route("/submit-rating", post(http::ratings::submit_rating_handler))
        .route("/create-order", post(http::orders::create_order_handler))
        .route("/track-order/:id", get(http::orders::track_order_handler))
        .route(
            "/mpesa-callback",
            post(http::orders::mpesa_callback_handler),
        )
        .route("/api/exchange-rate", get(http::rates::exchange_rate_handler))
        .route("/healthz", get(http::handlers::healthz_handler))
        .route("/readyz", get(http::handlers::readyz_handler))
        .route("/metrics", get(http::handlers::metrics_handler))
        .route("/version", get(http::handlers::version_handler))
        .layer(DefaultBodyLimit::max(state.api.max_body_bytes))
        .with_state(state)
}
