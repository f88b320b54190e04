// Fake image generation service for integration tests.
//
// Serves `POST /user/login` and `POST /ai/generate-image` on an ephemeral
// local port. Behavior is scripted through `FakeService`; every request is
// recorded for later inspection.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use nai::{ClientConfig, Credentials, Host, NaiClient};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub const API_CONTENT_TYPE: &str = "application/x-zip-compressed";

/// Shared, scriptable state of the fake service.
pub struct FakeService {
    logins: AtomicUsize,
    generations: AtomicUsize,
    login_status: AtomicU16,
    login_delay_ms: AtomicU64,
    generate_delay_ms: AtomicU64,
    content_type: Mutex<String>,
    next_failure: Mutex<Option<(u16, String)>>,
    last_request: Mutex<Option<Value>>,
    last_headers: Mutex<Option<HeaderMap>>,
}

impl Default for FakeService {
    fn default() -> Self {
        Self {
            logins: AtomicUsize::new(0),
            generations: AtomicUsize::new(0),
            login_status: AtomicU16::new(201),
            login_delay_ms: AtomicU64::new(0),
            generate_delay_ms: AtomicU64::new(0),
            content_type: Mutex::new(API_CONTENT_TYPE.to_string()),
            next_failure: Mutex::new(None),
            last_request: Mutex::new(None),
            last_headers: Mutex::new(None),
        }
    }
}

impl FakeService {
    pub fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    pub fn generations(&self) -> usize {
        self.generations.load(Ordering::SeqCst)
    }

    /// Status every login answers with; 201 succeeds.
    pub fn set_login_status(&self, status: u16) {
        self.login_status.store(status, Ordering::SeqCst);
    }

    pub fn set_login_delay(&self, delay: Duration) {
        self.login_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set_generate_delay(&self, delay: Duration) {
        self.generate_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set_content_type(&self, content_type: &str) {
        *self.content_type.lock() = content_type.to_string();
    }

    /// Fails the next generation with `status` and an error body carrying `message`.
    pub fn fail_next_generate(&self, status: u16, message: &str) {
        *self.next_failure.lock() = Some((status, message.to_string()));
    }

    pub fn last_request(&self) -> Option<Value> {
        self.last_request.lock().clone()
    }

    pub fn last_header(&self, name: header::HeaderName) -> Option<String> {
        self.last_headers
            .lock()
            .as_ref()
            .and_then(|headers| headers.get(name))
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    }
}

pub struct TestServer {
    addr: SocketAddr,
    service: Arc<FakeService>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        init_tracing();
        let service = Arc::new(FakeService::default());
        let app = Router::new()
            .route("/user/login", post(login))
            .route("/ai/generate-image", post(generate))
            .with_state(Arc::clone(&service));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, service, handle }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn service(&self) -> &FakeService {
        &self.service
    }

    /// Config routing both hosts to this server.
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new()
            .base_url(Host::Api, self.url())
            .base_url(Host::Web, self.url())
    }

    pub fn client(&self) -> NaiClient {
        NaiClient::with_config(Credentials::new("tester@example.com", "correct horse"), self.config())
    }

    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Routes client logs through the test harness so they show up for failing tests.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

async fn login(State(service): State<Arc<FakeService>>, Json(body): Json<Value>) -> Response {
    let delay = service.login_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    let key_len = body["key"].as_str().map(str::len).unwrap_or(0);
    if key_len != 64 {
        return error_response(400, "key must be 64 characters");
    }

    let status = service.login_status.load(Ordering::SeqCst);
    if status != 201 {
        return error_response(status, "Access Key is incorrect.");
    }

    let n = service.logins.fetch_add(1, Ordering::SeqCst) + 1;
    (StatusCode::CREATED, Json(json!({ "accessToken": format!("token-{n}") }))).into_response()
}

async fn generate(State(service): State<Arc<FakeService>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    service.generations.fetch_add(1, Ordering::SeqCst);
    *service.last_request.lock() = Some(body.clone());
    *service.last_headers.lock() = Some(headers.clone());

    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("Bearer token-"));
    if !authorized {
        return error_response(401, "Unauthorized");
    }

    if let Some((status, message)) = service.next_failure.lock().take() {
        return error_response(status, &message);
    }

    let delay = service.generate_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    let samples = body["parameters"]["n_samples"].as_u64().unwrap_or(1) as usize;
    let files: Vec<(String, Vec<u8>)> = (0..samples)
        .map(|i| (format!("image_{i}.png"), format!("png-bytes-{i}").into_bytes()))
        .collect();
    let content_type = service.content_type.lock().clone();

    (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], build_zip(&files)).into_response()
}

fn error_response(status: u16, message: &str) -> Response {
    let status = StatusCode::from_u16(status).unwrap();
    (status, Json(json!({ "statusCode": status.as_u16(), "message": message }))).into_response()
}

pub fn build_zip(files: &[(String, Vec<u8>)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in files {
        writer.start_file(name.as_str(), SimpleFileOptions::default()).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
