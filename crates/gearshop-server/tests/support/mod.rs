#![allow(dead_code)]

use gearshop_model::{Catalog, Product, ProductId};
use gearshop_server::{
    build_router, AppState, FakeMpesaGateway, FakePaypalGateway, FakeRateSource, ServerConfig,
};
use gearshop_store::FakeStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub struct TestHarness {
    pub state: AppState,
    pub store: Arc<FakeStore>,
    pub mpesa: Arc<FakeMpesaGateway>,
    pub paypal: Arc<FakePaypalGateway>,
}

pub fn fixture_catalog() -> Catalog {
    let mk = |id: &str, title: &str, price: f64, category: &str| Product {
        id: ProductId::parse(id).expect("product id"),
        title: title.to_string(),
        price,
        images: vec![format!("/img/{id}.png")],
        sku: String::new(),
        category: category.to_string(),
    };
    Catalog::new(vec![
        mk("gs-001", "Brake pad", 10.0, "Brakes"),
        mk("gs-002", "Oil filter", 5.5, "Filters"),
    ])
}

pub fn harness_with_rates(rates: Option<HashMap<String, f64>>) -> TestHarness {
    let store = Arc::new(FakeStore::default());
    let mpesa = Arc::new(FakeMpesaGateway::default());
    let paypal = Arc::new(FakePaypalGateway::default());
    let state = AppState::new(
        Arc::new(fixture_catalog()),
        store.clone(),
        mpesa.clone(),
        paypal.clone(),
        Arc::new(FakeRateSource { rates }),
        ServerConfig::default(),
    );
    TestHarness {
        state,
        store,
        mpesa,
        paypal,
    }
}

pub fn harness() -> TestHarness {
    harness_with_rates(None)
}

pub async fn serve(state: AppState) -> std::net::SocketAddr {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    addr
}

pub async fn send_raw(
    addr: std::net::SocketAddr,
    method: &str,
    path: &str,
    body: Option<&str>,
) -> (u16, String, String) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    if let Some(body) = body {
        req.push_str("Content-Type: application/json\r\n");
        req.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    req.push_str("\r\n");
    if let Some(body) = body {
        req.push_str(body);
    }
    stream
        .write_all(req.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response must have separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    (status, head.to_string(), body.to_string())
}

pub fn cod_order_body() -> String {
    serde_json::json!({
        "name": "Jane",
        "phone": "254700000000",
        "address": "Nairobi",
        "paymentMethod": "cod",
        "cart": {
            "gs-001": {"title": "Brake pad", "price": 10.0, "quantity": 2},
            "gs-002": {"title": "Oil filter", "price": 5.5, "quantity": 1}
        }
    })
    .to_string()
}

pub fn order_body_with_method(method: &str, extra: serde_json::Value) -> String {
    let mut body: serde_json::Value = serde_json::from_str(&cod_order_body()).expect("base body");
    body["paymentMethod"] = serde_json::json!(method);
    if let Some(map) = extra.as_object() {
        for (k, v) in map {
            body[k] = v.clone();
        }
    }
    body.to_string()
}

pub fn stk_callback_body(checkout_request_id: &str, result_code: serde_json::Value) -> String {
    serde_json::json!({
        "Body": {
            "stkCallback": {
                "MerchantRequestID": "mr-1",
                "CheckoutRequestID": checkout_request_id,
                "ResultCode": result_code,
                "ResultDesc": "test"
            }
        }
    })
    .to_string()
}
