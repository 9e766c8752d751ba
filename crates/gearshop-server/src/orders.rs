// SPDX-License-Identifier: Apache-2.0

//! The order-creation and payment-confirmation workflow.
//!
//! Handlers stay thin; the branching on payment method, the gateway calls,
//! and the persistence live here so the workflow can be exercised against
//! fake stores and gateways.

use crate::payments::PaymentError;
use crate::AppState;
use gearshop_api::{ApiError, ApiErrorCode, OrderIntent};
use gearshop_model::{cart_total, Order, OrderId, OrderStatus, PaymentMethod};
use serde_json::json;
use tracing::info;

/// PayPal order status that counts as captured funds.
const PAYPAL_CAPTURED: &str = "COMPLETED";

pub struct CreatedOrder {
    pub order_id: OrderId,
    pub message: &'static str,
}

fn payment_error_to_api(err: PaymentError) -> ApiError {
    match err {
        PaymentError::Config(msg) => ApiError::new(
            ApiErrorCode::GatewayConfigMissing,
            "payment gateway is not configured",
            json!({"message": msg}),
        ),
        PaymentError::Rejected(msg) => ApiError::new(
            ApiErrorCode::PaymentRejected,
            "payment was not accepted",
            json!({"message": msg}),
        ),
        PaymentError::Unavailable(msg) => ApiError::new(
            ApiErrorCode::GatewayUnavailable,
            "payment gateway unavailable",
            json!({"message": msg, "retryable": true}),
        ),
    }
}

/// Create an order from a validated intent.
///
/// Nothing is persisted unless the payment branch succeeds, and nothing is
/// retried here; failures surface to the caller once.
pub async fn create_order(state: &AppState, intent: OrderIntent) -> Result<CreatedOrder, ApiError> {
    match intent.payment_method {
        PaymentMethod::Mpesa => create_mpesa_order(state, intent).await,
        PaymentMethod::Paypal => create_paypal_order(state, intent).await,
        PaymentMethod::Cod => create_cod_order(state, intent).await,
    }
}

async fn create_mpesa_order(
    state: &AppState,
    intent: OrderIntent,
) -> Result<CreatedOrder, ApiError> {
    let order = Order::new(
        intent.name,
        intent.phone,
        intent.address,
        PaymentMethod::Mpesa,
        intent.cart,
        OrderStatus::Pending,
    );
    // The gateway only takes whole currency units.
    let amount = gateway_amount(&order.cart);
    let accepted = state
        .mpesa
        .request_push(&order.order_id.to_string(), &order.phone, amount)
        .await
        .map_err(payment_error_to_api)?;

    let order = order.with_mpesa_request_id(accepted.checkout_request_id);
    state
        .store
        .insert_order(&order)
        .await
        .map_err(|e| ApiError::storage_unavailable(&e.to_string()))?;
    info!(order_id = %order.order_id, "mpesa push initiated");
    Ok(CreatedOrder {
        order_id: order.order_id,
        message: "M-Pesa payment initiated.",
    })
}

async fn create_paypal_order(
    state: &AppState,
    intent: OrderIntent,
) -> Result<CreatedOrder, ApiError> {
    // Server-side verification: the client's claim of a completed capture
    // is never trusted on its own.
    let paypal_order_id = intent.paypal_order_id.clone().ok_or_else(|| {
        ApiError::validation_failed("paypalOrderId", "required for paypal orders")
    })?;
    let status = state
        .paypal
        .capture_status(&paypal_order_id)
        .await
        .map_err(payment_error_to_api)?;
    if status != PAYPAL_CAPTURED {
        return Err(ApiError::new(
            ApiErrorCode::PaymentRejected,
            "paypal capture not completed",
            json!({"paypalOrderId": paypal_order_id, "status": status}),
        ));
    }

    let order = Order::new(
        intent.name,
        intent.phone,
        intent.address,
        PaymentMethod::Paypal,
        intent.cart,
        OrderStatus::Confirmed,
    );
    state
        .store
        .insert_order(&order)
        .await
        .map_err(|e| ApiError::storage_unavailable(&e.to_string()))?;
    info!(order_id = %order.order_id, "paypal order verified and stored");
    Ok(CreatedOrder {
        order_id: order.order_id,
        message: "Order placed with PayPal.",
    })
}

async fn create_cod_order(state: &AppState, intent: OrderIntent) -> Result<CreatedOrder, ApiError> {
    let order = Order::new(
        intent.name,
        intent.phone,
        intent.address,
        PaymentMethod::Cod,
        intent.cart,
        OrderStatus::Pending,
    );
    state
        .store
        .insert_order(&order)
        .await
        .map_err(|e| ApiError::storage_unavailable(&e.to_string()))?;
    info!(order_id = %order.order_id, "cod order stored");
    Ok(CreatedOrder {
        order_id: order.order_id,
        message: "Order placed with Cash on Delivery.",
    })
}

/// Apply an M-Pesa result code to the order holding `checkout_request_id`.
///
/// The transition is absolute, so duplicate callback deliveries settle on
/// the same final status. Returns the affected order id when one matched.
pub async fn apply_mpesa_result(
    state: &AppState,
    checkout_request_id: &str,
    result_code: i64,
) -> Result<Option<OrderId>, gearshop_store::StoreError> {
    let status = if result_code == 0 {
        OrderStatus::Confirmed
    } else {
        OrderStatus::Failed
    };
    let matched = state
        .store
        .transition_by_mpesa_request(checkout_request_id, status)
        .await?;
    match matched {
        Some(order_id) => {
            info!(%order_id, checkout_request_id, result_code, "order status transitioned");
        }
        None => {
            info!(checkout_request_id, "callback for unknown request id ignored");
        }
    }
    Ok(matched)
}

/// The total the gateway would be asked for, from a raw cart.
#[must_use]
pub fn gateway_amount(cart: &gearshop_model::Cart) -> u64 {
    cart_total(cart).round().max(0.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use gearshop_model::{Cart, CartLine};

    #[test]
    fn gateway_amount_rounds_to_whole_units() {
        let mut cart = Cart::new();
        cart.insert(
            "p1".to_string(),
            CartLine {
                title: "x".to_string(),
                price: 10.0,
                quantity: 2,
            },
        );
        cart.insert(
            "p2".to_string(),
            CartLine {
                title: "y".to_string(),
                price: 5.5,
                quantity: 1,
            },
        );
        // 25.5 rounds half-up to 26.
        assert_eq!(gateway_amount(&cart), 26);
    }
}
