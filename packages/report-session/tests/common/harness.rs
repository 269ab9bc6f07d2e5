//! Test harness running a stub extraction endpoint.
//!
//! Each test gets its own axum server on an ephemeral port. The stub records
//! every multipart upload and answers with whatever reply the test scripted.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use report_session::{ClientConfig, ExtractionClient, SessionController};
use test_context::AsyncTestContext;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Artifact served by the stub at `/files/out.pdf`.
pub const STUB_ARTIFACT: &[u8] = b"%PDF-1.7 extracted summary";

/// Scripted reply of the stub endpoint.
#[derive(Debug, Clone)]
pub struct StubReply {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl StubReply {
    pub fn ok(body: &str) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: r#"{"detail": "boom"}"#.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// One upload as the stub saw it.
#[derive(Debug, Clone, Default)]
pub struct ReceivedUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub content: Vec<u8>,
    pub model: Option<String>,
}

#[derive(Default)]
struct StubState {
    reply: Mutex<Option<StubReply>>,
    uploads: Mutex<Vec<ReceivedUpload>>,
}

pub struct TestHarness {
    pub base_url: Url,
    state: Arc<StubState>,
    shutdown: CancellationToken,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to start stub endpoint")
    }

    async fn teardown(self) {
        self.shutdown.cancel();
    }
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        // Run tests with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let state = Arc::new(StubState::default());
        let app = Router::new()
            .route("/api/extract", post(extract))
            .route("/files/out.pdf", get(artifact))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("Failed to bind stub endpoint")?;
        let addr: SocketAddr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let stop = shutdown.clone();

        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async move { stop.cancelled().await })
                .await;
        });

        Ok(Self {
            base_url: Url::parse(&format!("http://{}", addr))?,
            state,
            shutdown,
        })
    }

    /// Script the reply for subsequent uploads.
    pub fn reply_with(&self, reply: StubReply) {
        *self.state.reply.lock().unwrap() = Some(reply);
    }

    pub fn uploads(&self) -> Vec<ReceivedUpload> {
        self.state.uploads.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.state.uploads.lock().unwrap().len()
    }

    /// Wait until the stub has received `n` uploads.
    pub async fn wait_for_hits(&self, n: usize) {
        for _ in 0..400 {
            if self.hits() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("stub never received {} uploads", n);
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::default().with_base_url(self.base_url.clone())
    }

    pub fn client(&self) -> ExtractionClient {
        ExtractionClient::new(&self.config()).expect("Failed to build client")
    }

    pub fn controller(&self) -> SessionController {
        SessionController::new(Arc::new(self.client()))
    }
}

async fn extract(State(state): State<Arc<StubState>>, mut multipart: Multipart) -> impl IntoResponse {
    let mut upload = ReceivedUpload::default();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "report" => {
                upload.file_name = field.file_name().map(str::to_string);
                upload.content_type = field.content_type().map(str::to_string);
                upload.content = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
            }
            "model" => upload.model = field.text().await.ok(),
            _ => {}
        }
    }
    state.uploads.lock().unwrap().push(upload);

    let reply = state
        .reply
        .lock()
        .unwrap()
        .clone()
        .unwrap_or_else(|| StubReply::ok(r#"{"pdfUrl": "/files/out.pdf"}"#));
    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }

    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, "application/json")], reply.body)
}

async fn artifact() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/pdf")], STUB_ARTIFACT)
}
