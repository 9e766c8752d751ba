use gearshop_model::{Cart, CartLine, Catalog, Order, OrderStatus, PaymentMethod, Product};

#[test]
fn payment_method_serializes_lowercase() {
    assert_eq!(
        serde_json::to_string(&PaymentMethod::Mpesa).expect("json"),
        "\"mpesa\""
    );
    let parsed: PaymentMethod = serde_json::from_str("\"paypal\"").expect("parse");
    assert_eq!(parsed, PaymentMethod::Paypal);
}

#[test]
fn order_status_uses_capitalized_wire_names() {
    assert_eq!(
        serde_json::to_string(&OrderStatus::Pending).expect("json"),
        "\"Pending\""
    );
    assert_eq!(
        serde_json::to_string(&OrderStatus::Confirmed).expect("json"),
        "\"Confirmed\""
    );
}

#[test]
fn cart_line_tolerates_extra_client_fields() {
    // Clients ship whatever their local cart holds; unknown keys must not
    // fail deserialization.
    let line: CartLine = serde_json::from_str(
        r#"{"title":"Brake pad","price":10.0,"quantity":2,"image":"x.png"}"#,
    )
    .expect("tolerant parse");
    assert_eq!(line.quantity, 2);
}

#[test]
fn order_document_round_trips() {
    let mut cart = Cart::new();
    cart.insert(
        "p1".to_string(),
        CartLine {
            title: "Brake pad".to_string(),
            price: 10.0,
            quantity: 2,
        },
    );
    let order = Order::new(
        "Jane".to_string(),
        "254700000000".to_string(),
        "Nairobi".to_string(),
        PaymentMethod::Cod,
        cart,
        OrderStatus::Pending,
    );
    let raw = serde_json::to_string(&order).expect("serialize");
    let back: Order = serde_json::from_str(&raw).expect("deserialize");
    assert_eq!(back, order);

    // Wire names follow the persisted document layout.
    let v: serde_json::Value = serde_json::from_str(&raw).expect("value");
    assert!(v.get("orderId").is_some());
    assert!(v.get("paymentMethod").is_some());
    assert!(v.get("createdAt").is_some());
}

#[test]
fn order_document_rejects_unknown_fields() {
    let raw = r#"{
        "orderId":"7f2c1c2e-58a1-4f2a-9c3f-6a1f0a6b2d11",
        "name":"Jane","phone":"1","address":"a",
        "paymentMethod":"cod","cart":{},"total":0.0,
        "status":"Pending","createdAt":"2026-01-01T00:00:00Z",
        "updatedAt":null,"mpesaRequestId":null,
        "stray":"field"
    }"#;
    assert!(serde_json::from_str::<Order>(raw).is_err());
}

#[test]
fn catalog_categories_are_sorted_and_distinct() {
    let mk = |id: &str, cat: &str| -> Product {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "title": "x",
            "price": 1.0,
            "images": [],
            "sku": "",
            "category": cat
        }))
        .expect("product")
    };
    let catalog = Catalog::new(vec![
        mk("a", "Suspension"),
        mk("b", "Brakes"),
        mk("c", "Brakes"),
        mk("d", ""),
    ]);
    assert_eq!(catalog.categories(), vec!["Brakes", "Suspension"]);
    assert!(catalog.find("b").is_some());
    assert!(catalog.find("zz").is_none());
}
