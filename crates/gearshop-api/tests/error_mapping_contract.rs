use gearshop_api::{map_error, ApiError, ApiErrorCode};
use serde_json::json;

fn err(code: ApiErrorCode) -> ApiError {
    ApiError::new(code, "x", json!({}))
}

#[test]
fn every_code_maps_to_its_documented_status() {
    let expected = [
        (ApiErrorCode::InvalidRequestBody, 400),
        (ApiErrorCode::ValidationFailed, 400),
        (ApiErrorCode::InvalidOrderId, 400),
        (ApiErrorCode::PaymentRejected, 400),
        (ApiErrorCode::GatewayConfigMissing, 400),
        (ApiErrorCode::ProductNotFound, 404),
        (ApiErrorCode::OrderNotFound, 404),
        (ApiErrorCode::GatewayUnavailable, 502),
        (ApiErrorCode::StorageUnavailable, 503),
        (ApiErrorCode::Internal, 500),
    ];
    for (code, status) in expected {
        assert_eq!(map_error(&err(code)), status, "code {code}");
    }
}

#[test]
fn error_codes_serialize_snake_case() {
    assert_eq!(
        serde_json::to_string(&ApiErrorCode::StorageUnavailable).expect("json"),
        "\"storage_unavailable\""
    );
    let round: ApiErrorCode =
        serde_json::from_str("\"payment_rejected\"").expect("parse");
    assert_eq!(round, ApiErrorCode::PaymentRejected);
}

#[test]
fn error_body_shape_is_stable() {
    let e = ApiError::validation_failed("cart", "must not be empty");
    let v = serde_json::to_value(&e).expect("json");
    assert_eq!(v["code"], "validation_failed");
    assert!(v["details"]["field_errors"].is_array());
}
