//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use api::demo::{DEMO_USER, DemoShop};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use order_flow::FlowConfig;
use store::InMemorySessionStore;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> (axum::Router, DemoShop) {
    let sessions = Arc::new(InMemorySessionStore::default());
    let (state, shop) = api::create_default_state(sessions, FlowConfig::default());
    (api::create_app(state, get_metrics_handle()), shop)
}

async fn send_json(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn chat(app: &axum::Router, session_id: &str, message: &str) -> serde_json::Value {
    let (status, json) = send_json(
        app,
        "POST",
        "/chat",
        Some(serde_json::json!({
            "message": message,
            "session_id": session_id,
            "user_id": DEMO_USER,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    json
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup();

    let (status, json) = send_json(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_chat_starts_session_when_id_missing() {
    let (app, _) = setup();

    let (status, json) = send_json(
        &app,
        "POST",
        "/chat",
        Some(serde_json::json!({ "message": "xin chào" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["order_flow"], false);
    assert_eq!(json["strategy"], "deterministic");
    let session_id = json["session_id"].as_str().unwrap();
    assert!(!session_id.is_empty());
}

#[tokio::test]
async fn test_empty_message_is_rejected() {
    let (app, _) = setup();

    let (status, json) = send_json(
        &app,
        "POST",
        "/chat",
        Some(serde_json::json!({ "message": "   ", "session_id": "s-1" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn test_full_conversation_over_http() {
    let (app, shop) = setup();

    let json = chat(&app, "web-1", "đặt hàng").await;
    assert_eq!(json["state"], "CART_VALIDATED");
    assert_eq!(json["next_step"], "confirm_cart");

    let json = chat(&app, "web-1", "có").await;
    assert_eq!(json["state"], "ADDRESS_SELECTION");
    assert_eq!(json["address_options"].as_array().unwrap().len(), 2);

    let json = chat(&app, "web-1", "2").await;
    assert_eq!(json["state"], "PAYMENT_SELECTION");
    assert_eq!(json["needs_payment_selection"], true);

    let json = chat(&app, "web-1", "chuyển khoản").await;
    assert_eq!(json["state"], "SUMMARY_SHOWN");
    assert!(json["summary"]["total"].is_number());

    let json = chat(&app, "web-1", "xác nhận đặt hàng").await;
    assert_eq!(json["state"], "ORDER_CREATED");
    assert_eq!(json["completed"], true);
    assert_eq!(json["order"]["payment_method"], "ONLINE");
    assert_eq!(shop.orders.order_count(), 1);
}

#[tokio::test]
async fn test_get_session() {
    let (app, _) = setup();
    chat(&app, "web-2", "đặt hàng").await;

    let (status, json) = send_json(&app, "GET", "/sessions/web-2", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["state"], "CART_VALIDATED");
    assert_eq!(json["user_id"], DEMO_USER);
    assert_eq!(json["cycle"], 1);
    assert_eq!(json["turns"], 2);
}

#[tokio::test]
async fn test_get_unknown_session_is_404() {
    let (app, _) = setup();

    let (status, _) = send_json(&app, "GET", "/sessions/nope", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_shipping_requires_bound_address() {
    let (app, _) = setup();
    chat(&app, "web-3", "đặt hàng").await;

    let (status, _) = send_json(&app, "POST", "/sessions/web-3/shipping", None).await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_shipping_returns_stored_quote() {
    let (app, shop) = setup();
    chat(&app, "web-4", "đặt hàng").await;
    chat(&app, "web-4", "có").await;
    chat(&app, "web-4", "1").await;

    let (status, json) = send_json(&app, "POST", "/sessions/web-4/shipping", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["fallback"], false);
    assert_eq!(json["estimated_days"], 2);
    assert_eq!(shop.shipping.call_count(), 1);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _) = setup();
    chat(&app, "web-5", "đặt hàng").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("chat_order_turns_total"));
}
