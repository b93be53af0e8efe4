//! In-process stand-in for the lesson service.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::Notify;

/// A canned reply: status code and JSON body.
pub type Reply = (StatusCode, Value);

/// Scripted behaviour and recorded traffic of the mock service.
#[derive(Default)]
pub struct MockService {
    lesson_replies: Mutex<VecDeque<Reply>>,
    analysis_replies: Mutex<VecDeque<Reply>>,
    lesson_payloads: Mutex<Vec<Value>>,
    lesson_calls: AtomicUsize,
    analysis_calls: AtomicUsize,
    lesson_gate: Option<Arc<Notify>>,
    pdfs: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Holds every lesson response until `gate` is notified.
    pub fn with_lesson_gate(gate: Arc<Notify>) -> Self {
        Self {
            lesson_gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn push_lesson(&self, status: StatusCode, body: Value) -> &Self {
        self.lesson_replies
            .lock()
            .unwrap()
            .push_back((status, body));
        self
    }

    pub fn push_analysis(&self, status: StatusCode, body: Value) -> &Self {
        self.analysis_replies
            .lock()
            .unwrap()
            .push_back((status, body));
        self
    }

    pub fn store_pdf(&self, user_id: &str, bytes: &[u8]) {
        self.pdfs
            .lock()
            .unwrap()
            .push((user_id.to_string(), bytes.to_vec()));
    }

    pub fn lesson_calls(&self) -> usize {
        self.lesson_calls.load(Ordering::SeqCst)
    }

    pub fn analysis_calls(&self) -> usize {
        self.analysis_calls.load(Ordering::SeqCst)
    }

    pub fn lesson_payloads(&self) -> Vec<Value> {
        self.lesson_payloads.lock().unwrap().clone()
    }
}

async fn generate_lesson(
    State(mock): State<Arc<MockService>>,
    Json(payload): Json<Value>,
) -> Response {
    mock.lesson_calls.fetch_add(1, Ordering::SeqCst);
    mock.lesson_payloads.lock().unwrap().push(payload);
    if let Some(gate) = &mock.lesson_gate {
        gate.notified().await;
    }

    let reply = mock.lesson_replies.lock().unwrap().pop_front();
    let (status, body) = reply.unwrap_or_else(|| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": "no scripted reply"}),
        )
    });
    (status, Json(body)).into_response()
}

async fn start_analysis(State(mock): State<Arc<MockService>>) -> Response {
    mock.analysis_calls.fetch_add(1, Ordering::SeqCst);

    let reply = mock.analysis_replies.lock().unwrap().pop_front();
    let (status, body) = reply.unwrap_or_else(|| (StatusCode::OK, json!({"status": "started"})));
    (status, Json(body)).into_response()
}

async fn download_lesson(
    State(mock): State<Arc<MockService>>,
    Path(user_id): Path<String>,
) -> Response {
    let pdfs = mock.pdfs.lock().unwrap();
    match pdfs.iter().find(|(id, _)| *id == user_id) {
        Some((_, bytes)) => (
            StatusCode::OK,
            [("content-type", "application/pdf")],
            bytes.clone(),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Lesson not found."})),
        )
            .into_response(),
    }
}

/// Serves `mock` on an ephemeral port and returns its base URL.
pub async fn spawn_service(mock: Arc<MockService>) -> String {
    let router = Router::new()
        .route("/generate_lesson", post(generate_lesson))
        .route("/start-analysis", post(start_analysis))
        .route("/download_lesson/:user_id", get(download_lesson))
        .with_state(mock);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    format!("http://{addr}")
}

/// A base URL nothing is listening on.
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let addr: SocketAddr = listener.local_addr().expect("Failed to get local addr");
    drop(listener);
    format!("http://{addr}")
}
