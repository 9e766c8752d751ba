// SPDX-License-Identifier: Apache-2.0

//! Pending-order reconciliation.
//!
//! Webhooks get lost. Without this job an M-Pesa order whose callback never
//! arrived would sit in `Pending` forever, so the server periodically polls
//! the gateway's status-query endpoint for stale pending orders and applies
//! the same transition the callback would have.

use crate::orders::apply_mpesa_result;
use crate::AppState;
use chrono::{Duration as ChronoDuration, Utc};
use gearshop_store::StoreError;
use tracing::{error, info, warn};

pub fn spawn_reconciliation(state: AppState) {
    if !state.api.reconcile_enabled {
        return;
    }
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(state.api.reconcile_interval);
        loop {
            interval.tick().await;
            match reconcile_once(&state).await {
                Ok(0) => {}
                Ok(n) => info!("reconciliation transitioned {n} pending orders"),
                Err(e) => error!("reconciliation pass failed: {e}"),
            }
        }
    });
}

/// One reconciliation pass. Returns how many orders were transitioned.
///
/// A failed status query leaves the order untouched; only a definitive
/// gateway answer moves it out of `Pending`.
pub async fn reconcile_once(state: &AppState) -> Result<u32, StoreError> {
    let age = ChronoDuration::from_std(state.api.reconcile_pending_age)
        .unwrap_or_else(|_| ChronoDuration::seconds(120));
    let cutoff = Utc::now() - age;
    let pending = state.store.list_pending_mpesa(cutoff).await?;
    let mut transitioned = 0_u32;
    for order in pending {
        let Some(request_id) = order.mpesa_request_id.as_deref() else {
            continue;
        };
        match state.mpesa.query_status(request_id).await {
            Ok(Some(code)) => {
                if apply_mpesa_result(state, request_id, code).await?.is_some() {
                    transitioned += 1;
                }
            }
            Ok(None) => {
                // Still in flight at the gateway; check again next pass.
            }
            Err(e) => {
                warn!(order_id = %order.order_id, "status query failed: {e}");
            }
        }
    }
    Ok(transitioned)
}
