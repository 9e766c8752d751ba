#![forbid(unsafe_code)]

use gearshop_server::{
    build_router, reconcile, validate_startup_config_contract, AppState, HttpMpesaGateway,
    HttpPaypalGateway, HttpRateSource, MpesaConfig, PaypalConfig, ServerConfig,
    UnconfiguredMpesaGateway, UnconfiguredPaypalGateway,
};
use gearshop_store::{load_catalog, OrderStore, SqliteStore};
use std::env;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_duration_ms(name: &str, default_ms: u64) -> Duration {
    Duration::from_millis(env_u64(name, default_ms))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if env_bool("GEARSHOP_LOG_JSON", true) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("register SIGTERM");
        let mut sigint = signal(SignalKind::interrupt()).expect("register SIGINT");
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_tracing();

    let bind_addr = env::var("GEARSHOP_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let db_path = PathBuf::from(
        env::var("GEARSHOP_DB_PATH").unwrap_or_else(|_| "artifacts/gearshop.sqlite".to_string()),
    );
    let products_path = PathBuf::from(
        env::var("GEARSHOP_PRODUCTS_PATH").unwrap_or_else(|_| "data/products.json".to_string()),
    );

    let api_cfg = ServerConfig {
        max_body_bytes: env_usize("GEARSHOP_MAX_BODY_BYTES", 16 * 1024),
        http_timeout: env_duration_ms("GEARSHOP_HTTP_TIMEOUT_MS", 15_000),
        reconcile_enabled: env_bool("GEARSHOP_RECONCILE_ENABLED", true),
        reconcile_interval: env_duration_ms("GEARSHOP_RECONCILE_INTERVAL_MS", 60_000),
        reconcile_pending_age: env_duration_ms("GEARSHOP_RECONCILE_PENDING_AGE_MS", 120_000),
        readiness_probe_interval: env_duration_ms("GEARSHOP_READINESS_PROBE_MS", 15_000),
        catalog_page_ttl_secs: env_u64("GEARSHOP_CATALOG_PAGE_TTL_SECS", 30),
    };
    validate_startup_config_contract(&api_cfg)?;

    let catalog = match load_catalog(&products_path) {
        Ok(catalog) => {
            info!("catalog loaded: {} products", catalog.products.len());
            catalog
        }
        Err(e) => {
            warn!("catalog load failed ({e}); starting with an empty catalog");
            gearshop_model::Catalog::default()
        }
    };

    let store = Arc::new(
        SqliteStore::open(&db_path).map_err(|e| format!("store open failed: {e}"))?,
    );

    let mpesa_cfg = MpesaConfig {
        consumer_key: env::var("GEARSHOP_MPESA_CONSUMER_KEY").unwrap_or_default(),
        consumer_secret: env::var("GEARSHOP_MPESA_CONSUMER_SECRET").unwrap_or_default(),
        shortcode: env::var("GEARSHOP_MPESA_SHORTCODE").unwrap_or_default(),
        passkey: env::var("GEARSHOP_MPESA_PASSKEY").unwrap_or_default(),
        base_url: env::var("GEARSHOP_MPESA_BASE_URL")
            .unwrap_or_else(|_| "https://sandbox.safaricom.co.ke".to_string()),
        callback_url: env::var("GEARSHOP_MPESA_CALLBACK_URL").unwrap_or_default(),
        http_timeout: api_cfg.http_timeout,
    };
    let mpesa: Arc<dyn gearshop_server::MpesaGateway> = match HttpMpesaGateway::new(mpesa_cfg) {
        Ok(gw) => Arc::new(gw),
        Err(e) => {
            warn!("mpesa gateway disabled: {e}");
            Arc::new(UnconfiguredMpesaGateway)
        }
    };

    let paypal_cfg = PaypalConfig {
        client_id: env::var("GEARSHOP_PAYPAL_CLIENT_ID").unwrap_or_default(),
        client_secret: env::var("GEARSHOP_PAYPAL_CLIENT_SECRET").unwrap_or_default(),
        base_url: env::var("GEARSHOP_PAYPAL_BASE_URL")
            .unwrap_or_else(|_| "https://api-m.sandbox.paypal.com".to_string()),
        http_timeout: api_cfg.http_timeout,
    };
    let paypal: Arc<dyn gearshop_server::PaypalGateway> = match HttpPaypalGateway::new(paypal_cfg)
    {
        Ok(gw) => Arc::new(gw),
        Err(e) => {
            warn!("paypal gateway disabled: {e}");
            Arc::new(UnconfiguredPaypalGateway)
        }
    };

    let rates = Arc::new(HttpRateSource::new(
        env::var("GEARSHOP_EXCHANGE_RATE_API_KEY").ok(),
        env::var("GEARSHOP_EXCHANGE_RATE_BASE_URL")
            .unwrap_or_else(|_| "https://v6.exchangerate-api.com".to_string()),
        api_cfg.http_timeout,
    ));

    let readiness_probe_interval = api_cfg.readiness_probe_interval;
    let state = AppState::new(
        Arc::new(catalog),
        store.clone(),
        mpesa,
        paypal,
        rates,
        api_cfg,
    );
    let app = build_router(state.clone());

    // Ready only once storage answers; re-probed in the background so a
    // recovered database flips the server back to ready.
    match store.ping().await {
        Ok(()) => state.ready.store(true, Ordering::Relaxed),
        Err(e) => {
            error!("initial store ping failed: {e}");
            state.ready.store(false, Ordering::Relaxed);
        }
    }
    let store_bg = store.clone();
    let ready_bg = state.ready.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(readiness_probe_interval);
        loop {
            interval.tick().await;
            match store_bg.ping().await {
                Ok(()) => ready_bg.store(true, Ordering::Relaxed),
                Err(e) => {
                    error!("store ping failed: {e}");
                    ready_bg.store(false, Ordering::Relaxed);
                }
            }
        }
    });

    reconcile::spawn_reconciliation(state.clone());

    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| format!("bind {bind_addr} failed: {e}"))?;
    info!("gearshop-server listening on {bind_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .map_err(|e| format!("server failed: {e}"))
}
