//! Integration tests for the control-panel web API.
//!
//! These tests verify the HTTP API endpoints work correctly.

#![cfg(feature = "web")]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use rs_bascule::hal::MockBridgeIo;
use rs_bascule::services::{
    build_router, ApiResponse, CommandResponse, SharedBridge, StateResponse, WebServerConfig,
};
use rs_bascule::{BridgeConfig, BridgeMachine, BridgeState, TickInputs};

fn create_test_app() -> (axum::Router, Arc<SharedBridge<MockBridgeIo>>) {
    let machine = BridgeMachine::new(MockBridgeIo::new(), 0);
    let state = Arc::new(SharedBridge::new(machine, BridgeConfig::default()));
    let config = WebServerConfig::default();
    let router = build_router(Arc::clone(&state), &config);
    (router, state)
}

async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_get_state() {
    let (app, _state) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/state")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json: ApiResponse<StateResponse> = read_json(response).await;
    assert!(json.success);

    let data = json.data.unwrap();
    assert_eq!(data.state, BridgeState::Down);
    assert!(!data.decelerating);
    assert!(data.fault.is_none());
    assert!(!data.estop_latched);
    assert!(!data.requests.raise);
}

#[tokio::test]
async fn test_request_raise_sets_flag_and_drives_machine() {
    let (app, state) = create_test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/request/raise")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: ApiResponse<CommandResponse> = read_json(response).await;
    assert!(json.data.unwrap().accepted);
    assert!(state.requests().raise);

    // The tick driver picks the flag up on its next cycle
    state.tick(TickInputs::default()).unwrap();
    assert_eq!(state.status().state, BridgeState::PrepRaise);
}

#[tokio::test]
async fn test_request_clear() {
    let (app, state) = create_test_app();

    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/request/abort")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(state.requests().abort);

    app.oneshot(
        Request::builder()
            .method("POST")
            .uri("/api/request/clear")
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();
    assert!(!state.requests().abort);
}

#[tokio::test]
async fn test_estop_latch_round_trip() {
    let (app, state) = create_test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/estop/on")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(state.estop_latched());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/estop/off")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!state.estop_latched());
}

#[tokio::test]
async fn test_set_config_param() {
    let (app, state) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/config")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"name": "open_max_ms", "value": "9000"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: ApiResponse<CommandResponse> = read_json(response).await;
    assert!(json.data.unwrap().accepted);
    assert_eq!(state.config().timing.open_max_ms, 9000);
}

#[tokio::test]
async fn test_set_config_rejects_out_of_range() {
    let (app, state) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/config")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"name": "open_max_ms", "value": "1"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: ApiResponse<CommandResponse> = read_json(response).await;
    let data = json.data.unwrap();
    assert!(!data.accepted);
    // Configuration untouched
    assert_eq!(state.config().timing.open_max_ms, 7000);
}

#[tokio::test]
async fn test_set_config_invalid_body() {
    let (app, _state) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/config")
                .header("Content-Type", "application/json")
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: ApiResponse<CommandResponse> = read_json(response).await;
    assert!(!json.success);
    assert!(json.error.is_some());
}

#[tokio::test]
async fn test_fault_visible_in_state() {
    let (app, state) = create_test_app();

    // Force an e-stop fault: request raise, tick into PrepRaise, latch e-stop
    state.apply_command(rs_bascule::PanelCommand::Raise);
    state.tick(TickInputs::default()).unwrap();
    state.set_estop(true);
    state.tick(TickInputs::default()).unwrap();
    assert_eq!(state.status().state, BridgeState::EmergencyLower);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/state")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json: ApiResponse<StateResponse> = read_json(response).await;
    let data = json.data.unwrap();
    assert_eq!(data.state, BridgeState::EmergencyLower);
    assert_eq!(data.fault.unwrap().code, "ESTOP");
    assert!(data.estop_latched);
}

#[tokio::test]
async fn test_index_serves_html() {
    let (app, _state) = create_test_app();

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(body.to_vec()).unwrap();

    assert!(html.contains("rs-bascule"));
    assert!(html.contains("/api/state"));
}

#[tokio::test]
async fn test_not_found() {
    let (app, _state) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/nonexistent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
