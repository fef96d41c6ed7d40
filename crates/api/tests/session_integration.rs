//! Integration tests for the escalation session endpoints.

mod common;

use std::time::Duration;

use axum::http::{Method, StatusCode};
use common::{empty_request, parse_response_body, TestApp};
use domain::services::SinkCall;

#[tokio::test]
async fn test_manual_session_lifecycle() {
    let app = TestApp::new().await;

    let response = app.post("/api/v1/session").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = parse_response_body(response).await;
    assert_eq!(body["trigger"]["kind"], "manual");
    assert_eq!(body["phase"], "awaiting_response");

    // Only one session at a time
    let response = app.post("/api/v1/session").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app.post("/api/v1/session/safe").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["phase"], "resolved");
    assert_eq!(body["outcome"], "safe");

    let state = app.state().await;
    assert!(state["session"].is_null());
    assert_eq!(state["lastOutcome"], "safe");
    assert_eq!(app.sink.alarms_started(), 0);
    assert_eq!(app.sink.emergency_calls(), 0);

    app.shutdown().await;
}

#[tokio::test]
async fn test_actions_without_session_conflict() {
    let app = TestApp::new().await;

    for uri in [
        "/api/v1/session/safe",
        "/api/v1/session/help",
        "/api/v1/session/stop-alarm",
        "/api/v1/session/sos",
    ] {
        let response = app.post(uri).await;
        assert_eq!(response.status(), StatusCode::CONFLICT, "{uri}");
        let body = parse_response_body(response).await;
        assert_eq!(body["error"], "conflict");
    }

    let response = app
        .request(empty_request(Method::DELETE, "/api/v1/session"))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    app.shutdown().await;
}

#[tokio::test]
async fn test_stop_alarm_requires_active_alarm() {
    let app = TestApp::new().await;
    app.post("/api/v1/session").await;

    let response = app.post("/api/v1/session/stop-alarm").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // State unchanged by the rejected action
    let state = app.state().await;
    assert_eq!(state["session"]["phase"], "awaiting_response");

    app.shutdown().await;
}

#[tokio::test]
async fn test_help_then_stop_alarm() {
    let app = TestApp::new().await;
    app.send_location(0.0, 0.0).await;

    let body = parse_response_body(app.post("/api/v1/session/help").await).await;
    assert_eq!(body["phase"], "alarm_active");
    assert_eq!(body["autoSosRemainingSecs"], 20);
    assert!(body.get("responseRemainingSecs").is_none());
    assert!(app.sink.alarm_active());

    // Help cannot be requested twice, safe is no longer an option
    assert_eq!(
        app.post("/api/v1/session/help").await.status(),
        StatusCode::CONFLICT
    );
    assert_eq!(
        app.post("/api/v1/session/safe").await.status(),
        StatusCode::CONFLICT
    );

    let body = parse_response_body(app.post("/api/v1/session/stop-alarm").await).await;
    assert_eq!(body["outcome"], "manually_stopped");
    assert!(!app.sink.alarm_active());
    assert_eq!(app.sink.emergency_calls(), 0);

    // Stopping again is harmless for the sink and rejected for the session
    assert_eq!(
        app.post("/api/v1/session/stop-alarm").await.status(),
        StatusCode::CONFLICT
    );

    app.shutdown().await;
}

#[tokio::test]
async fn test_explicit_sos_places_one_call() {
    let app = TestApp::new().await;
    app.post("/api/v1/session").await;
    app.post("/api/v1/session/help").await;

    let body = parse_response_body(app.post("/api/v1/session/sos").await).await;
    assert_eq!(body["outcome"], "escalated_to_sos");
    assert_eq!(app.sink.emergency_calls(), 1);
    assert!(!app.sink.alarm_active());

    assert_eq!(
        app.post("/api/v1/session/sos").await.status(),
        StatusCode::CONFLICT
    );
    assert_eq!(app.sink.emergency_calls(), 1);

    app.shutdown().await;
}

#[tokio::test]
async fn test_dismiss_tears_down() {
    let app = TestApp::new().await;
    app.post("/api/v1/session").await;
    app.post("/api/v1/session/help").await;

    let response = app
        .request(empty_request(Method::DELETE, "/api/v1/session"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!app.sink.alarm_active());

    assert_eq!(app.engine.with(|e, _| e.pending_timers()).await, 0);
    assert!(app.state().await["session"].is_null());
    assert_eq!(app.sink.emergency_calls(), 0);

    app.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_unanswered_entry_escalates_on_schedule() {
    let mut app = TestApp::new().await;
    app.start_driver();

    app.send_location(0.0, 0.5).await;

    tokio::time::sleep(Duration::from_secs(29)).await;
    let state = app.state().await;
    assert_eq!(state["session"]["phase"], "awaiting_response");
    assert_eq!(state["session"]["responseRemainingSecs"], 1);

    tokio::time::sleep(Duration::from_secs(2)).await;
    let state = app.state().await;
    assert_eq!(state["session"]["phase"], "alarm_active");
    assert!(app.sink.alarm_active());
    assert_eq!(app.sink.emergency_calls(), 0);

    tokio::time::sleep(Duration::from_secs(20)).await;
    let state = app.state().await;
    assert!(state["session"].is_null());
    assert_eq!(state["lastOutcome"], "escalated_to_sos");
    assert_eq!(app.sink.emergency_calls(), 1);
    assert!(!app.sink.alarm_active());

    let calls = app.sink.calls();
    let call_at = calls
        .iter()
        .position(|c| matches!(c, SinkCall::EmergencyCall { .. }))
        .unwrap();
    assert_eq!(calls[call_at + 1], SinkCall::StopAlarm);

    app.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_safe_reentry_is_suppressed() {
    let app = TestApp::new().await;

    app.send_location(0.0, 0.0).await;
    app.post("/api/v1/session/safe").await;
    app.send_location(0.0, 3.0).await;

    tokio::time::sleep(Duration::from_secs(60)).await;
    let body = parse_response_body(app.send_location(0.0, 0.0).await).await;
    assert_eq!(body["transition"], "entered");
    assert!(body.get("session").is_none());

    app.send_location(0.0, 3.0).await;
    tokio::time::sleep(Duration::from_secs(61)).await;
    let body = parse_response_body(app.send_location(0.0, 0.0).await).await;
    assert_eq!(body["session"]["phase"], "awaiting_response");

    app.shutdown().await;
}
