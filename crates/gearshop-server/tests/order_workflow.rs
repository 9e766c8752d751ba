mod support;

use gearshop_model::{OrderStatus, PaymentMethod};
use gearshop_server::PaymentError;
use serde_json::Value;
use std::sync::atomic::Ordering;
use support::{
    cod_order_body, harness, order_body_with_method, send_raw, serve, stk_callback_body,
};
use uuid::Uuid;

#[tokio::test]
async fn cod_order_persists_pending_with_cart_total() {
    let h = harness();
    let addr = serve(h.state.clone()).await;

    let (status, _, body) = send_raw(addr, "POST", "/create-order", Some(&cod_order_body())).await;
    assert_eq!(status, 200);
    let json: Value = serde_json::from_str(&body).expect("order json");
    assert_eq!(json["success"], true);
    let order_id = json["orderId"].as_str().expect("orderId");
    Uuid::parse_str(order_id).expect("orderId is a uuid");

    let orders = h.store.orders.lock().await;
    assert_eq!(orders.len(), 1);
    let stored = orders.values().next().expect("stored order");
    assert_eq!(stored.status, OrderStatus::Pending);
    assert_eq!(stored.payment_method, PaymentMethod::Cod);
    assert!((stored.total - 25.5).abs() < 1e-9);
    assert!(stored.mpesa_request_id.is_none());
}

#[tokio::test]
async fn empty_cart_fails_validation_for_every_method() {
    let h = harness();
    let addr = serve(h.state.clone()).await;

    for method in ["cod", "paypal", "mpesa"] {
        let body = order_body_with_method(
            method,
            serde_json::json!({"cart": {}, "paypalOrderId": "PAY-1"}),
        );
        let (status, _, body) = send_raw(addr, "POST", "/create-order", Some(&body)).await;
        assert_eq!(status, 400, "method {method}");
        let json: Value = serde_json::from_str(&body).expect("error json");
        assert_eq!(json["error"]["code"], "validation_failed");
    }
    assert!(h.store.orders.lock().await.is_empty());
}

#[tokio::test]
async fn missing_contact_fields_are_rejected() {
    let h = harness();
    let addr = serve(h.state.clone()).await;

    let mut body: Value = serde_json::from_str(&cod_order_body()).expect("body");
    body["phone"] = serde_json::json!("  ");
    let (status, _, _) = send_raw(addr, "POST", "/create-order", Some(&body.to_string())).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn storage_outage_surfaces_as_503() {
    let h = harness();
    h.store.fail_storage.store(true, Ordering::Relaxed);
    let addr = serve(h.state.clone()).await;

    let (status, _, body) = send_raw(addr, "POST", "/create-order", Some(&cod_order_body())).await;
    assert_eq!(status, 503);
    let json: Value = serde_json::from_str(&body).expect("error json");
    assert_eq!(json["error"]["code"], "storage_unavailable");
}

#[tokio::test]
async fn mpesa_order_stores_checkout_request_id_and_rounded_amount() {
    let h = harness();
    *h.mpesa.push_outcome.lock().await = Ok("ws_CO_42".to_string());
    let addr = serve(h.state.clone()).await;

    let body = order_body_with_method("mpesa", serde_json::json!({}));
    let (status, _, body) = send_raw(addr, "POST", "/create-order", Some(&body)).await;
    assert_eq!(status, 200);
    let json: Value = serde_json::from_str(&body).expect("order json");
    assert_eq!(json["success"], true);

    // 25.5 worth of cart rounds to 26 whole units at the gateway.
    assert_eq!(h.mpesa.last_amount.load(Ordering::Relaxed), 26);

    let orders = h.store.orders.lock().await;
    let stored = orders.values().next().expect("stored order");
    assert_eq!(stored.status, OrderStatus::Pending);
    assert_eq!(stored.mpesa_request_id.as_deref(), Some("ws_CO_42"));
}

#[tokio::test]
async fn mpesa_rejection_persists_nothing() {
    let h = harness();
    *h.mpesa.push_outcome.lock().await =
        Err(PaymentError::Rejected("insufficient funds".to_string()));
    let addr = serve(h.state.clone()).await;

    let body = order_body_with_method("mpesa", serde_json::json!({}));
    let (status, _, body) = send_raw(addr, "POST", "/create-order", Some(&body)).await;
    assert_eq!(status, 400);
    let json: Value = serde_json::from_str(&body).expect("error json");
    assert_eq!(json["error"]["code"], "payment_rejected");
    assert!(h.store.orders.lock().await.is_empty());
}

#[tokio::test]
async fn mpesa_gateway_outage_maps_to_502() {
    let h = harness();
    *h.mpesa.push_outcome.lock().await =
        Err(PaymentError::Unavailable("connect timeout".to_string()));
    let addr = serve(h.state.clone()).await;

    let body = order_body_with_method("mpesa", serde_json::json!({}));
    let (status, _, body) = send_raw(addr, "POST", "/create-order", Some(&body)).await;
    assert_eq!(status, 502);
    let json: Value = serde_json::from_str(&body).expect("error json");
    assert_eq!(json["error"]["code"], "gateway_unavailable");
    assert!(h.store.orders.lock().await.is_empty());
}

#[tokio::test]
async fn mpesa_missing_config_fails_before_any_call() {
    let h = harness();
    *h.mpesa.push_outcome.lock().await =
        Err(PaymentError::Config("mpesa consumer_key is missing".to_string()));
    let addr = serve(h.state.clone()).await;

    let body = order_body_with_method("mpesa", serde_json::json!({}));
    let (status, _, body) = send_raw(addr, "POST", "/create-order", Some(&body)).await;
    assert_eq!(status, 400);
    let json: Value = serde_json::from_str(&body).expect("error json");
    assert_eq!(json["error"]["code"], "gateway_config_missing");
}

#[tokio::test]
async fn paypal_order_requires_server_side_capture_verification() {
    let h = harness();
    h.paypal
        .status_by_order
        .lock()
        .await
        .insert("PAY-OK".to_string(), Ok("COMPLETED".to_string()));
    h.paypal
        .status_by_order
        .lock()
        .await
        .insert("PAY-OPEN".to_string(), Ok("CREATED".to_string()));
    let addr = serve(h.state.clone()).await;

    // Verified capture persists a confirmed order.
    let body = order_body_with_method("paypal", serde_json::json!({"paypalOrderId": "PAY-OK"}));
    let (status, _, _) = send_raw(addr, "POST", "/create-order", Some(&body)).await;
    assert_eq!(status, 200);
    {
        let orders = h.store.orders.lock().await;
        assert_eq!(orders.len(), 1);
        assert_eq!(
            orders.values().next().expect("order").status,
            OrderStatus::Confirmed
        );
    }

    // An uncaptured order is rejected and nothing else is persisted.
    let body = order_body_with_method("paypal", serde_json::json!({"paypalOrderId": "PAY-OPEN"}));
    let (status, _, body) = send_raw(addr, "POST", "/create-order", Some(&body)).await;
    assert_eq!(status, 400);
    let json: Value = serde_json::from_str(&body).expect("error json");
    assert_eq!(json["error"]["code"], "payment_rejected");
    assert_eq!(h.store.orders.lock().await.len(), 1);

    // The client's word alone is not enough.
    let body = order_body_with_method("paypal", serde_json::json!({}));
    let (status, _, _) = send_raw(addr, "POST", "/create-order", Some(&body)).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn track_order_validates_id_shape_before_storage() {
    let h = harness();
    let addr = serve(h.state.clone()).await;

    let (status, _, body) = send_raw(addr, "GET", "/track-order/not-a-uuid", None).await;
    assert_eq!(status, 400);
    let json: Value = serde_json::from_str(&body).expect("error json");
    assert_eq!(json["error"]["code"], "invalid_order_id");
    assert_eq!(h.store.read_calls.load(Ordering::Relaxed), 0);
}

#[tokio::test]
async fn track_order_distinguishes_unknown_from_found() {
    let h = harness();
    let addr = serve(h.state.clone()).await;

    let unknown = Uuid::new_v4();
    let (status, _, _) = send_raw(addr, "GET", &format!("/track-order/{unknown}"), None).await;
    assert_eq!(status, 404);

    let (_, _, created) =
        send_raw(addr, "POST", "/create-order", Some(&cod_order_body())).await;
    let created: Value = serde_json::from_str(&created).expect("created json");
    let order_id = created["orderId"].as_str().expect("orderId");

    let (status, _, body) =
        send_raw(addr, "GET", &format!("/track-order/{order_id}"), None).await;
    assert_eq!(status, 200);
    let json: Value = serde_json::from_str(&body).expect("order json");
    assert_eq!(json["success"], true);
    assert_eq!(json["order"]["status"], "Pending");
    assert_eq!(json["order"]["paymentMethod"], "cod");
    assert_eq!(json["order"]["cart"]["gs-001"]["quantity"], 2);
}

#[tokio::test]
async fn mpesa_callback_confirms_matching_pending_order() {
    let h = harness();
    *h.mpesa.push_outcome.lock().await = Ok("ws_CO_7".to_string());
    let addr = serve(h.state.clone()).await;

    let body = order_body_with_method("mpesa", serde_json::json!({}));
    send_raw(addr, "POST", "/create-order", Some(&body)).await;

    let callback = stk_callback_body("ws_CO_7", serde_json::json!(0));
    let (status, _, body) = send_raw(addr, "POST", "/mpesa-callback", Some(&callback)).await;
    assert_eq!(status, 200);
    let json: Value = serde_json::from_str(&body).expect("ack json");
    assert_eq!(json["success"], true);

    let orders = h.store.orders.lock().await;
    let stored = orders.values().next().expect("stored order");
    assert_eq!(stored.status, OrderStatus::Confirmed);
    assert!(stored.updated_at.is_some());
}

#[tokio::test]
async fn mpesa_callback_accepts_string_result_codes_and_marks_failures() {
    let h = harness();
    *h.mpesa.push_outcome.lock().await = Ok("ws_CO_8".to_string());
    let addr = serve(h.state.clone()).await;

    let body = order_body_with_method("mpesa", serde_json::json!({}));
    send_raw(addr, "POST", "/create-order", Some(&body)).await;

    // The gateway emits '1032' (user cancelled) as a string in some
    // revisions of its API; the transition must still apply.
    let callback = stk_callback_body("ws_CO_8", serde_json::json!("1032"));
    let (status, _, _) = send_raw(addr, "POST", "/mpesa-callback", Some(&callback)).await;
    assert_eq!(status, 200);

    let orders = h.store.orders.lock().await;
    let stored = orders.values().next().expect("stored order");
    assert_eq!(stored.status, OrderStatus::Failed);
}

#[tokio::test]
async fn duplicate_callback_delivery_is_idempotent() {
    let h = harness();
    *h.mpesa.push_outcome.lock().await = Ok("ws_CO_9".to_string());
    let addr = serve(h.state.clone()).await;

    let body = order_body_with_method("mpesa", serde_json::json!({}));
    send_raw(addr, "POST", "/create-order", Some(&body)).await;

    let callback = stk_callback_body("ws_CO_9", serde_json::json!(0));
    send_raw(addr, "POST", "/mpesa-callback", Some(&callback)).await;
    send_raw(addr, "POST", "/mpesa-callback", Some(&callback)).await;

    let orders = h.store.orders.lock().await;
    let stored = orders.values().next().expect("stored order");
    assert_eq!(stored.status, OrderStatus::Confirmed);
}

#[tokio::test]
async fn callback_for_unknown_request_id_is_acknowledged_no_op() {
    let h = harness();
    let addr = serve(h.state.clone()).await;

    let callback = stk_callback_body("ws_CO_unknown", serde_json::json!(0));
    let (status, _, body) = send_raw(addr, "POST", "/mpesa-callback", Some(&callback)).await;
    assert_eq!(status, 200);
    let json: Value = serde_json::from_str(&body).expect("ack json");
    assert_eq!(json["success"], true);
    assert!(h.store.orders.lock().await.is_empty());
}

#[tokio::test]
async fn malformed_callback_is_still_acknowledged() {
    let h = harness();
    let addr = serve(h.state.clone()).await;

    let (status, _, body) =
        send_raw(addr, "POST", "/mpesa-callback", Some(r#"{"Body":{}}"#)).await;
    assert_eq!(status, 200);
    let json: Value = serde_json::from_str(&body).expect("ack json");
    assert_eq!(json["success"], true);
}
