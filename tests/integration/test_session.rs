//! End-to-end tests for lesson generation and analysis start.
//!
//! Each test drives a real `Session` over `HttpGateway` against an
//! in-process axum server that stands in for the lesson service.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use babble_gateway::{HttpGateway, RequestErrorKind};
use babble_session::{
    Config, Dispatch, Notice, Session, StaticAuthClient, ValidationError,
    ANALYSIS_NOT_STARTED_NOTICE, ANALYSIS_STARTED_NOTICE,
};
use common::{spawn_service, unreachable_url, MockService};
use serde_json::json;
use tokio::sync::Notify;

const R_AND_W_LESSON: &str = "Practice R and W sounds in minimal pairs: red/wed, rip/whip, ring/wing.";

fn session_for(base_url: &str) -> Session {
    Session::new(
        Arc::new(HttpGateway::new(base_url)),
        &StaticAuthClient::anonymous(),
    )
}

#[tokio::test]
async fn test_lesson_for_described_issue() {
    let mock = Arc::new(MockService::new());
    mock.push_lesson(StatusCode::OK, json!({"lesson": R_AND_W_LESSON}));
    let url = spawn_service(Arc::clone(&mock)).await;
    let mut session = session_for(&url);

    let dispatch = session
        .request_lesson("I have trouble pronouncing R and W")
        .unwrap();
    assert!(matches!(dispatch, Dispatch::Started(_)));
    assert!(session.state().lesson_in_flight());
    assert_eq!(session.view().lesson_button.label, "Generating Lesson...");

    session.settle_all().await;

    let state = session.state();
    assert_eq!(state.lesson_text(), Some(R_AND_W_LESSON));
    assert!(state.last_error().is_none());
    assert!(!state.lesson_in_flight());
    assert!(session.view().can_export);

    let payloads = mock.lesson_payloads();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0]["user_id"], "test_user");
    assert_eq!(payloads[0]["speech_issue"], "I have trouble pronouncing R and W");
}

#[tokio::test]
async fn test_signed_in_user_id_is_sent() {
    let mock = Arc::new(MockService::new());
    mock.push_lesson(StatusCode::OK, json!({"lesson": "Slow down"}));
    let url = spawn_service(Arc::clone(&mock)).await;
    let mut session = Session::new(
        Arc::new(HttpGateway::new(url)),
        &StaticAuthClient::signed_in("uid-123"),
    );

    session.request_lesson("I talk too fast").unwrap();
    session.settle_all().await;

    assert_eq!(mock.lesson_payloads()[0]["user_id"], "uid-123");
}

#[tokio::test]
async fn test_empty_issue_never_reaches_service() {
    let mock = Arc::new(MockService::new());
    let url = spawn_service(Arc::clone(&mock)).await;
    let mut session = session_for(&url);
    let before = session.state().clone();

    let result = session.request_lesson("   ");

    assert_eq!(result, Err(ValidationError::EmptyIssue));
    assert_eq!(session.state(), &before);
    assert!(!session.has_pending());
    assert_eq!(
        session.take_notices(),
        vec![Notice::warning("Please enter a speech issue.")]
    );
    assert_eq!(mock.lesson_calls(), 0);
}

#[tokio::test]
async fn test_second_request_while_generating_is_ignored() {
    let mock = Arc::new(MockService::new());
    mock.push_lesson(StatusCode::OK, json!({"lesson": "first"}));
    mock.push_lesson(StatusCode::OK, json!({"lesson": "second"}));
    let url = spawn_service(Arc::clone(&mock)).await;
    let mut session = session_for(&url);

    let first = session.request_lesson("stutter on B").unwrap();
    let second = session.request_lesson("stutter on B").unwrap();
    assert!(matches!(first, Dispatch::Started(_)));
    assert_eq!(second, Dispatch::Busy);

    session.settle_all().await;

    assert_eq!(mock.lesson_calls(), 1);
    assert_eq!(session.state().lesson_text(), Some("first"));
}

#[tokio::test]
async fn test_server_error_then_retry() {
    let mock = Arc::new(MockService::new());
    mock.push_lesson(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"error": "model unavailable"}),
    );
    mock.push_lesson(StatusCode::OK, json!({"lesson": "Breathe before each phrase"}));
    let url = spawn_service(Arc::clone(&mock)).await;
    let mut session = session_for(&url);

    session.request_lesson("stammer").unwrap();
    session.settle_all().await;

    let error = session.state().last_error().unwrap().clone();
    assert_eq!(error.kind, RequestErrorKind::Server);
    assert_eq!(error.message, "Failed to generate lesson. Please try again.");
    assert!(error.detail.contains("model unavailable"));
    assert!(session.state().lesson_text().is_none());
    assert!(!session.state().lesson_in_flight());

    let retry = session.request_lesson("stammer").unwrap();
    assert!(matches!(retry, Dispatch::Started(_)));
    session.settle_all().await;

    assert_eq!(
        session.state().lesson_text(),
        Some("Breathe before each phrase")
    );
    assert!(session.state().last_error().is_none());
    assert_eq!(mock.lesson_calls(), 2);
}

#[tokio::test]
async fn test_failure_clears_previous_lesson() {
    let mock = Arc::new(MockService::new());
    mock.push_lesson(StatusCode::OK, json!({"lesson": "old lesson"}));
    mock.push_lesson(StatusCode::BAD_REQUEST, json!({"error": "Speech issue is required."}));
    let url = spawn_service(Arc::clone(&mock)).await;
    let mut session = session_for(&url);

    session.request_lesson("lisp").unwrap();
    session.settle_all().await;
    assert_eq!(session.lesson_for_export(), "old lesson");

    session.request_lesson("lisp again").unwrap();
    assert!(session.state().lesson_text().is_none());
    session.settle_all().await;

    assert!(session.state().lesson_text().is_none());
    assert_eq!(session.lesson_for_export(), "");
    assert!(session.state().last_error().is_some());
}

#[tokio::test]
async fn test_network_failure_allows_retry() {
    let mut session = session_for(&unreachable_url());

    session.request_lesson("mumbling").unwrap();
    session.settle_all().await;

    let state = session.state();
    assert_eq!(
        state.last_error().map(|e| e.kind),
        Some(RequestErrorKind::Network)
    );
    assert!(!state.lesson_in_flight());
    assert!(!session.has_pending());

    let retry = session.request_lesson("mumbling").unwrap();
    assert!(matches!(retry, Dispatch::Started(_)));
    session.settle_all().await;
}

#[tokio::test]
async fn test_malformed_response_is_decode_error() {
    let mock = Arc::new(MockService::new());
    mock.push_lesson(StatusCode::OK, json!({"unexpected": true}));
    let url = spawn_service(Arc::clone(&mock)).await;
    let mut session = session_for(&url);

    session.request_lesson("nasal voice").unwrap();
    session.settle_all().await;

    assert_eq!(
        session.state().last_error().map(|e| e.kind),
        Some(RequestErrorKind::Decode)
    );
}

#[tokio::test]
async fn test_analysis_started() {
    let mock = Arc::new(MockService::new());
    mock.push_analysis(StatusCode::OK, json!({"status": "started"}));
    let url = spawn_service(Arc::clone(&mock)).await;
    let mut session = session_for(&url);

    assert!(matches!(session.start_analysis(), Dispatch::Started(_)));
    assert_eq!(session.view().analysis_button.label, "Starting Analysis...");
    session.settle_all().await;

    assert_eq!(
        session.take_notices(),
        vec![Notice::info(ANALYSIS_STARTED_NOTICE)]
    );
    assert!(!session.state().analysis_in_flight());
    assert!(session.state().last_error().is_none());
}

#[tokio::test]
async fn test_analysis_queued_is_soft_failure() {
    let mock = Arc::new(MockService::new());
    mock.push_analysis(StatusCode::OK, json!({"status": "queued"}));
    let url = spawn_service(Arc::clone(&mock)).await;
    let mut session = session_for(&url);

    session.start_analysis();
    session.settle_all().await;

    assert_eq!(
        session.take_notices(),
        vec![Notice::warning(ANALYSIS_NOT_STARTED_NOTICE)]
    );
    assert!(session.state().last_error().is_none());
    assert!(!session.state().analysis_in_flight());
}

#[tokio::test]
async fn test_analysis_server_error_is_recorded() {
    let mock = Arc::new(MockService::new());
    mock.push_analysis(StatusCode::SERVICE_UNAVAILABLE, json!({"error": "busy"}));
    let url = spawn_service(Arc::clone(&mock)).await;
    let mut session = session_for(&url);

    session.start_analysis();
    assert_eq!(session.start_analysis(), Dispatch::Busy);
    session.settle_all().await;

    let error = session.state().last_error().unwrap();
    assert_eq!(error.kind, RequestErrorKind::Server);
    assert_eq!(
        error.message,
        "Failed to start AI Speech Analysis. Please try again."
    );
    assert_eq!(mock.analysis_calls(), 1);
}

#[tokio::test]
async fn test_operations_settle_independently() {
    let gate = Arc::new(Notify::new());
    let mock = Arc::new(MockService::with_lesson_gate(Arc::clone(&gate)));
    mock.push_lesson(StatusCode::OK, json!({"lesson": "Hum, then speak"}));
    mock.push_analysis(StatusCode::OK, json!({"status": "started"}));
    let url = spawn_service(Arc::clone(&mock)).await;
    let mut session = session_for(&url);

    session.request_lesson("monotone voice").unwrap();
    session.start_analysis();
    assert!(session.state().lesson_in_flight());
    assert!(session.state().analysis_in_flight());

    // The lesson is held by the gate, so the analysis settles first.
    assert!(session.settle_next().await);
    assert!(!session.state().analysis_in_flight());
    assert!(session.state().lesson_in_flight());
    assert!(session.view().lesson_button.label == "Generating Lesson...");

    gate.notify_one();
    session.settle_all().await;

    assert_eq!(session.state().lesson_text(), Some("Hum, then speak"));
    assert!(!session.has_pending());
}

#[test]
fn test_fixture_config_loads() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/babble.json");

    let config = Config::load_from_file(&path).unwrap();

    assert_eq!(config.service_url, "http://127.0.0.1:5000");
    assert_eq!(config.user_id.as_deref(), Some("fixture-user"));
    assert_eq!(config.output_dir, "lessons");
}
