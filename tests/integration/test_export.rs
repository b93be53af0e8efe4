//! End-to-end tests for turning a generated lesson into a document.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use babble_export::{ExportError, LessonExporter};
use babble_gateway::{HttpGateway, RequestError};
use babble_session::{Session, StaticAuthClient};
use common::{spawn_service, MockService};
use serde_json::json;

#[tokio::test]
async fn test_generated_lesson_exports_to_pdf() {
    let lesson = "Warm-Up: lip trills for one minute.\n\n\
                  Drill: read each word pair aloud, red/wed, rip/whip, ring/wing.";
    let mock = Arc::new(MockService::new());
    mock.push_lesson(StatusCode::OK, json!({"lesson": lesson}));
    let url = spawn_service(Arc::clone(&mock)).await;
    let mut session = Session::new(
        Arc::new(HttpGateway::new(url)),
        &StaticAuthClient::anonymous(),
    );

    session.request_lesson("R and W").unwrap();
    session.settle_all().await;
    let before = session.state().clone();

    let dir = tempfile::tempdir().unwrap();
    let document = LessonExporter::new()
        .export(session.lesson_for_export())
        .unwrap();
    let path = document.save(dir.path()).unwrap();

    assert_eq!(path, dir.path().join("Speech_Lesson.pdf"));
    let bytes = std::fs::read(&path).unwrap();
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.starts_with("%PDF-1.4"));
    assert!(text.contains("(Generated Lesson Plan) Tj"));
    assert!(text.contains("(Warm-Up: lip trills for one minute.) Tj"));
    assert!(text.trim_end().ends_with("%%EOF"));

    assert_eq!(session.state(), &before);
}

#[tokio::test]
async fn test_export_without_lesson_is_rejected() {
    let mock = Arc::new(MockService::new());
    let url = spawn_service(Arc::clone(&mock)).await;
    let session = Session::new(
        Arc::new(HttpGateway::new(url)),
        &StaticAuthClient::anonymous(),
    );
    let before = session.state().clone();

    let result = LessonExporter::new().export(session.lesson_for_export());

    assert!(matches!(result, Err(ExportError::NoContent)));
    assert_eq!(
        result.unwrap_err().to_string(),
        "No lesson to download."
    );
    assert_eq!(session.state(), &before);
}

#[tokio::test]
async fn test_download_server_rendered_lesson() {
    let mock = Arc::new(MockService::new());
    mock.store_pdf("test_user", b"%PDF-1.4 server copy");
    let url = spawn_service(Arc::clone(&mock)).await;
    let gateway = HttpGateway::new(url);

    let bytes = gateway.download_lesson("test_user").await.unwrap();
    assert_eq!(bytes, b"%PDF-1.4 server copy");

    let missing = gateway.download_lesson("someone_else").await.unwrap_err();
    assert!(matches!(
        missing,
        RequestError::Server { status: 404, ref message, .. } if message == "Lesson not found."
    ));
}
