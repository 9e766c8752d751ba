use serde::Serialize;
use std::time::Duration;

pub const CONFIG_SCHEMA_VERSION: &str = "1";

#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    pub max_body_bytes: usize,
    /// Outbound gateway/provider call timeout. Every external HTTP call in
    /// the process uses this bound.
    #[serde(skip)]
    pub http_timeout: Duration,
    pub reconcile_enabled: bool,
    #[serde(skip)]
    pub reconcile_interval: Duration,
    /// How long an M-Pesa order may stay `Pending` before the
    /// reconciliation job starts polling the gateway for it.
    #[serde(skip)]
    pub reconcile_pending_age: Duration,
    #[serde(skip)]
    pub readiness_probe_interval: Duration,
    pub catalog_page_ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 16 * 1024,
            http_timeout: Duration::from_secs(15),
            reconcile_enabled: true,
            reconcile_interval: Duration::from_secs(60),
            reconcile_pending_age: Duration::from_secs(120),
            readiness_probe_interval: Duration::from_secs(15),
            catalog_page_ttl_secs: 30,
        }
    }
}

pub fn validate_startup_config_contract(cfg: &ServerConfig) -> Result<(), String> {
    if cfg.max_body_bytes == 0 {
        return Err("max_body_bytes must be > 0".to_string());
    }
    if cfg.http_timeout.is_zero() {
        return Err("http_timeout must be > 0".to_string());
    }
    if cfg.reconcile_enabled
        && (cfg.reconcile_interval.is_zero() || cfg.reconcile_pending_age.is_zero())
    {
        return Err(
            "reconcile_enabled=true requires non-zero interval and pending age".to_string(),
        );
    }
    Ok(())
}
