//! In-process router tests.
//!
//! The router is driven with `tower::ServiceExt::oneshot`; the address
//! provider is an `httpmock` server.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use httpmock::prelude::*;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;
use url::Url;

use order_intake_api::config::{ApiConfig, CorsConfig, EasyPostConfig, FormWidgetConfig};
use order_intake_api::state::AppState;
use order_intake_core::coupon::CouponTable;

const SHOP: &str = "https://shop.test";
const SHOP_WWW: &str = "https://www.shop.test";

const COUPONS: &str = r#"[
  {
    "code": "WELCOME10",
    "id": "coupon_welcome10",
    "promotionCodeId": "promo_welcome10",
    "discount": { "type": "percent_off", "percent": "10" }
  },
  {
    "code": "RETIRED",
    "id": "coupon_retired",
    "promotionCodeId": "promo_retired",
    "discount": { "type": "percent_off", "percent": "20" },
    "active": false
  }
]"#;

fn app_for(server: &MockServer) -> Router {
    let config = ApiConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        easypost: EasyPostConfig {
            api_key: SecretString::from("EZTK9f3aB7qLm2Xc8RvN4wYp6sD1hJ0k"),
            base_url: Url::parse(&server.url("/v2")).unwrap(),
            timeout: Duration::from_secs(5),
        },
        cors: CorsConfig::new(&[SHOP, SHOP_WWW], Some(SHOP)).unwrap(),
        coupon_table_path: None,
        form_widget: FormWidgetConfig::default(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    };
    let coupons = CouponTable::from_json_str(COUPONS).unwrap();
    order_intake_api::app(AppState::new(config, coupons).unwrap())
}

fn post_json(uri: &str, body: &Value, origin: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(origin) = origin {
        builder = builder.header(header::ORIGIN, origin);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn allow_origin(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .and_then(|v| v.to_str().ok())
}

fn provider_address(street1: &str, city: &str, state: &str, zip: &str, delivered: bool) -> Value {
    let errors = if delivered {
        json!([])
    } else {
        json!([{
            "code": "E.ADDRESS.NOT_FOUND",
            "field": "address",
            "message": "Address not found",
            "suggestion": null
        }])
    };
    json!({
        "id": "adr_test",
        "mode": "test",
        "street1": street1,
        "city": city,
        "state": state,
        "zip": zip,
        "country": "US",
        "verifications": {
            "delivery": {"success": delivered, "errors": errors, "details": {}}
        }
    })
}

// =============================================================================
// Address validation
// =============================================================================

#[tokio::test]
async fn test_missing_zip_is_rejected_before_provider_call() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/v2/addresses");
            then.status(200);
        })
        .await;

    let response = app_for(&server)
        .oneshot(post_json(
            "/api/address/validate",
            &json!({"street1": "1 Main St", "city": "Austin", "state": "TX", "zip": "  "}),
            Some(SHOP),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(allow_origin(&response), Some(SHOP));
    let body = json_body(response).await;
    assert_eq!(body["missingFields"], json!(["zip"]));
    mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn test_identical_deliverable_address_has_no_suggestions() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v2/addresses");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(provider_address("1 MAIN ST", "AUSTIN", "TX", "78701", true));
        })
        .await;

    let response = app_for(&server)
        .oneshot(post_json(
            "/api/address/validate",
            &json!({
                "street1": "1 MAIN ST",
                "street2": "Unit 2",
                "city": "AUSTIN",
                "state": "TX",
                "zip": "78701"
            }),
            Some(SHOP),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["deliverable"], json!(true));
    assert_eq!(body["suggestions"], json!([]));
    assert_eq!(body["zipMismatch"], json!(false));
    assert_eq!(body["verifiedAddress"]["street2"], json!("Unit 2"));
    assert_eq!(body["verificationDetails"]["deliverySuccess"], json!(true));
    assert_eq!(body["verificationDetails"]["zip4Success"], Value::Null);
}

#[tokio::test]
async fn test_standardized_address_is_suggested() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v2/addresses");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(provider_address("1 MAIN ST", "AUSTIN", "TX", "78701-1234", true));
        })
        .await;

    let response = app_for(&server)
        .oneshot(post_json(
            "/api/address/validate",
            &json!({"street1": "1 main street", "city": "Austin", "state": "TX", "zip": "78701"}),
            Some(SHOP),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let suggestions = body["suggestions"].as_array().unwrap();
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0]["zip"], json!("78701-1234"));
}

#[tokio::test]
async fn test_undeliverable_in_uncovered_state_has_no_zip_mismatch() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v2/addresses");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(provider_address("9 NOWHERE RD", "BOISE", "ID", "10001", false));
        })
        .await;

    let response = app_for(&server)
        .oneshot(post_json(
            "/api/address/validate",
            &json!({"street1": "9 Nowhere Rd", "city": "Boise", "state": "ID", "zip": "10001"}),
            Some(SHOP),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["deliverable"], json!(false));
    assert_eq!(body["zipMismatch"], json!(false));
    assert_eq!(body["suggestions"], json!([]));
    assert_eq!(body["errors"][0]["code"], json!("E.ADDRESS.NOT_FOUND"));
}

#[tokio::test]
async fn test_undeliverable_with_wrong_state_zip_flags_mismatch() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v2/addresses");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(provider_address("1 MAIN ST", "AUSTIN", "TX", "10001", false));
        })
        .await;

    let response = app_for(&server)
        .oneshot(post_json(
            "/api/address/validate",
            &json!({"street1": "1 Main St", "city": "Austin", "state": "TX", "zip": "10001"}),
            Some(SHOP),
        ))
        .await
        .unwrap();

    let body = json_body(response).await;
    assert_eq!(body["zipMismatch"], json!(true));
}

#[tokio::test]
async fn test_provider_rate_limit_maps_to_429() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v2/addresses");
            then.status(429)
                .header("content-type", "application/json")
                .json_body(json!({"error": {"code": "RATE_LIMITED", "message": "slow down"}}));
        })
        .await;

    let response = app_for(&server)
        .oneshot(post_json(
            "/api/address/validate",
            &json!({"street1": "1 Main St", "city": "Austin", "state": "TX", "zip": "78701"}),
            Some(SHOP_WWW),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(allow_origin(&response), Some(SHOP_WWW));
}

#[tokio::test]
async fn test_provider_invalid_parameter_maps_to_400() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v2/addresses");
            then.status(422)
                .header("content-type", "application/json")
                .json_body(json!({"error": {"code": "PARAMETER.INVALID", "message": "Invalid zip"}}));
        })
        .await;

    let response = app_for(&server)
        .oneshot(post_json(
            "/api/address/validate",
            &json!({"street1": "1 Main St", "city": "Austin", "state": "TX", "zip": "7870"}),
            Some(SHOP),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(allow_origin(&response), Some(SHOP));
    let body = json_body(response).await;
    assert_eq!(body["details"], "Invalid zip");
}

#[tokio::test]
async fn test_provider_failure_maps_to_500_with_details() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v2/addresses");
            then.status(503).body("upstream down");
        })
        .await;

    let response = app_for(&server)
        .oneshot(post_json(
            "/api/address/validate",
            &json!({"street1": "1 Main St", "city": "Austin", "state": "TX", "zip": "78701"}),
            Some(SHOP),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(allow_origin(&response), Some(SHOP));
    let body = json_body(response).await;
    assert_eq!(body["error"], json!("Address verification failed"));
    assert!(body["details"].is_string());
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let server = MockServer::start_async().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/address/validate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app_for(&server).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());
}

// =============================================================================
// Coupons
// =============================================================================

#[tokio::test]
async fn test_known_coupon_is_valid() {
    let server = MockServer::start_async().await;
    let response = app_for(&server)
        .oneshot(post_json(
            "/api/coupons/validate",
            &json!({"couponCode": " welcome10 "}),
            Some(SHOP),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["valid"], json!(true));
    assert_eq!(body["promotionCodeId"], json!("promo_welcome10"));
    assert_eq!(body["coupon"]["code"], json!("WELCOME10"));
}

#[tokio::test]
async fn test_unknown_coupon_is_invalid_not_an_error() {
    let server = MockServer::start_async().await;
    let response = app_for(&server)
        .oneshot(post_json(
            "/api/coupons/validate",
            &json!({"couponCode": "NOPE"}),
            Some(SHOP),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["valid"], json!(false));
    assert_eq!(body["error"], json!("Invalid coupon code"));
}

#[tokio::test]
async fn test_inactive_coupon_reports_reason() {
    let server = MockServer::start_async().await;
    let response = app_for(&server)
        .oneshot(post_json(
            "/api/coupons/validate",
            &json!({"couponCode": "RETIRED"}),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["valid"], json!(false));
    assert_eq!(body["error"], json!("This coupon is no longer active"));
}

#[tokio::test]
async fn test_empty_coupon_code_is_bad_request() {
    let server = MockServer::start_async().await;
    for payload in [json!({"couponCode": ""}), json!({})] {
        let response = app_for(&server)
            .oneshot(post_json("/api/coupons/validate", &payload, Some(SHOP)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(allow_origin(&response), Some(SHOP));
        let body = json_body(response).await;
        assert_eq!(body["valid"], json!(false));
        assert_eq!(body["error"], json!("Coupon code is required"));
    }
}

// =============================================================================
// CORS
// =============================================================================

#[tokio::test]
async fn test_unknown_origin_gets_default_origin() {
    let server = MockServer::start_async().await;
    let response = app_for(&server)
        .oneshot(post_json(
            "/api/coupons/validate",
            &json!({"couponCode": "WELCOME10"}),
            Some("https://evil.test"),
        ))
        .await
        .unwrap();

    assert_eq!(allow_origin(&response), Some(SHOP));
}

#[tokio::test]
async fn test_preflight_is_answered() {
    let server = MockServer::start_async().await;
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/address/validate")
        .header(header::ORIGIN, SHOP_WWW)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app_for(&server).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(allow_origin(&response), Some(SHOP_WWW));
    assert!(
        response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS)
    );
}

// =============================================================================
// Shipping, embed, health
// =============================================================================

#[tokio::test]
async fn test_shipping_service_lookup() {
    let server = MockServer::start_async().await;
    let response = app_for(&server)
        .oneshot(get(
            "/api/shipping/service?category=domestic&speed=fastest&fulfillmentType=manual",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(
        body,
        json!({"carrier": "FedEx", "service": "PRIORITY_OVERNIGHT", "automatable": true})
    );
}

#[tokio::test]
async fn test_shipping_manual_international_is_not_automatable() {
    let server = MockServer::start_async().await;
    let response = app_for(&server)
        .oneshot(get(
            "/api/shipping/service?category=international&speed=fast&fulfillmentType=manual",
        ))
        .await
        .unwrap();

    let body = json_body(response).await;
    assert_eq!(
        body,
        json!({"carrier": null, "service": null, "automatable": false})
    );
}

#[tokio::test]
async fn test_shipping_requires_category() {
    let server = MockServer::start_async().await;
    let response = app_for(&server)
        .oneshot(get("/api/shipping/service?speed=fast"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_embed_snippet_has_one_script() {
    let server = MockServer::start_async().await;
    let response = app_for(&server)
        .oneshot(get("/embed/forms/241234567890"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert_eq!(html.matches("<script").count(), 1);
    assert_eq!(html.matches("<style>").count(), 1);
    assert!(html.contains("https://form.jotform.com/jsform/241234567890"));
    assert!(html.starts_with("<div id=\"order-form\">"));
}

#[tokio::test]
async fn test_embed_rejects_bad_form_id() {
    let server = MockServer::start_async().await;
    let response = app_for(&server)
        .oneshot(get("/embed/forms/abc%22onload"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_and_request_id() {
    let server = MockServer::start_async().await;
    let response = app_for(&server)
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "req-123"
    );
    assert_eq!(
        response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
        "nosniff"
    );
}
