//! Integration tests for the session controller against a stub extraction endpoint.
//!
//! Covers the full upload path: multipart encoding, status handling, body
//! parsing and the resulting session phase.

mod common;

use std::time::Duration;

use crate::common::{annual_report, StubReply, TestHarness, STUB_ARTIFACT};
use report_session::{
    BaseExtractionService, ClientConfig, Document, ExtractionClient, ModelId, Phase,
    ResultLocator, SessionController, SessionError,
};
use std::sync::Arc;
use test_context::test_context;
use tokio_test::assert_ok;
use url::Url;

// =============================================================================
// Happy path
// =============================================================================

/// A 200 with a pdfUrl lands the session in Success with that locator
#[test_context(TestHarness)]
#[tokio::test]
async fn successful_extraction_exposes_locator(ctx: &TestHarness) {
    ctx.reply_with(StubReply::ok(r#"{ "pdfUrl": "/files/out.pdf" }"#));
    let controller = ctx.controller();

    assert_ok!(controller.select_file(annual_report()));
    assert_ok!(controller.select_model("gemini-2.0-flash"));
    let locator = controller.submit().await.unwrap();

    assert_eq!(locator, Some(ResultLocator::new("/files/out.pdf")));
    let session = controller.session();
    assert_eq!(session.phase(), Phase::Success);
    assert_eq!(session.result_location().unwrap().as_str(), "/files/out.pdf");
    assert!(session.error_message().is_none());
    assert_eq!(controller.view().download().unwrap().href, "/files/out.pdf");
}

/// The upload carries the file under `report` and the model under `model`
#[test_context(TestHarness)]
#[tokio::test]
async fn upload_is_multipart_with_report_and_model(ctx: &TestHarness) {
    let controller = ctx.controller();
    controller.select_file(annual_report()).unwrap();
    controller.select_model("gemini-2.0-pro").unwrap();
    controller.submit().await.unwrap();

    let uploads = ctx.uploads();
    assert_eq!(uploads.len(), 1);
    let upload = &uploads[0];
    assert_eq!(upload.file_name.as_deref(), Some("AnnualReport.pdf"));
    assert_eq!(upload.content_type.as_deref(), Some("application/pdf"));
    assert_eq!(upload.content, b"%PDF-1.7 annual report");
    assert_eq!(upload.model.as_deref(), Some("gemini-2.0-pro"));
}

/// The produced artifact can be downloaded through the resolved locator
#[test_context(TestHarness)]
#[tokio::test]
async fn artifact_can_be_fetched(ctx: &TestHarness) {
    let client = ctx.client();
    let bytes = client
        .fetch_artifact(&ResultLocator::new("/files/out.pdf"))
        .await
        .unwrap();
    assert_eq!(bytes.as_ref(), STUB_ARTIFACT);

    let missing = client
        .fetch_artifact(&ResultLocator::new("/files/missing.pdf"))
        .await
        .unwrap_err();
    assert_eq!(missing, SessionError::Server { status: 404 });
}

// =============================================================================
// Failures
// =============================================================================

/// A 500 lands the session in Error with the status in the message
#[test_context(TestHarness)]
#[tokio::test]
async fn server_error_includes_status(ctx: &TestHarness) {
    ctx.reply_with(StubReply::status(500));
    let controller = ctx.controller();

    controller.select_file(annual_report()).unwrap();
    let err = controller.submit().await.unwrap_err();

    assert_eq!(err, SessionError::Server { status: 500 });
    let session = controller.session();
    assert_eq!(session.phase(), Phase::Error);
    assert!(session.error_message().unwrap().contains("500"));
    assert!(session.result_location().is_none());
}

/// A success body without pdfUrl is a parse error, never a silent success
#[test_context(TestHarness)]
#[tokio::test]
async fn success_without_locator_is_parse_error(ctx: &TestHarness) {
    ctx.reply_with(StubReply::ok(r#"{ "status": "done" }"#));
    let controller = ctx.controller();

    controller.select_file(annual_report()).unwrap();
    let err = controller.submit().await.unwrap_err();

    assert!(matches!(err, SessionError::Parse(_)), "got {:?}", err);
    assert_eq!(controller.session().phase(), Phase::Error);
    assert!(controller.view().download().is_none());
}

/// No listener on the port means no response: a network error
#[tokio::test]
async fn unreachable_endpoint_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ClientConfig::default()
        .with_base_url(Url::parse(&format!("http://{}", addr)).unwrap());
    let controller = SessionController::new(Arc::new(ExtractionClient::new(&config).unwrap()));

    controller.select_file(annual_report()).unwrap();
    let err = controller.submit().await.unwrap_err();

    assert!(matches!(err, SessionError::Network(_)), "got {:?}", err);
    assert_eq!(controller.session().phase(), Phase::Error);
    assert!(controller.view().error().unwrap().starts_with("Network error"));
}

/// A response slower than the configured timeout counts as no response
#[test_context(TestHarness)]
#[tokio::test]
async fn timeout_is_network_error(ctx: &TestHarness) {
    ctx.reply_with(StubReply::ok(r#"{"pdfUrl": "/files/out.pdf"}"#).delayed(Duration::from_secs(5)));
    let config = ctx.config().with_timeout(Some(Duration::from_millis(200)));
    let client = ExtractionClient::new(&config).unwrap();

    let controller = SessionController::new(Arc::new(client));
    controller.select_file(annual_report()).unwrap();
    let err = controller.submit().await.unwrap_err();

    assert!(matches!(err, SessionError::Network(_)), "got {:?}", err);
}

// =============================================================================
// Single in-flight attempt
// =============================================================================

/// Two submits before the first response make exactly one request
#[test_context(TestHarness)]
#[tokio::test]
async fn second_submit_while_in_flight_is_dropped(ctx: &TestHarness) {
    ctx.reply_with(
        StubReply::ok(r#"{"pdfUrl": "/files/out.pdf"}"#).delayed(Duration::from_secs(1)),
    );
    let controller = ctx.controller();
    controller.select_file(annual_report()).unwrap();

    let first = controller.submit();
    let second = async {
        ctx.wait_for_hits(1).await;
        controller.submit().await
    };
    let (first, second) = tokio::join!(first, second);

    assert_eq!(second, Ok(None));
    assert!(first.unwrap().is_some());
    assert_eq!(ctx.hits(), 1);
}

/// Submitting with nothing selected never touches the network
#[test_context(TestHarness)]
#[tokio::test]
async fn submit_without_file_sends_nothing(ctx: &TestHarness) {
    let controller = ctx.controller();
    let before = controller.session();

    assert_eq!(controller.submit().await, Ok(None));

    assert_eq!(ctx.hits(), 0);
    assert_eq!(controller.session(), before);
}

/// Cancelling aborts the request and leaves the file ready for another try
#[test_context(TestHarness)]
#[tokio::test]
async fn cancel_aborts_in_flight_request(ctx: &TestHarness) {
    ctx.reply_with(StubReply::ok(r#"{"pdfUrl": "/files/out.pdf"}"#).delayed(Duration::from_secs(5)));
    let controller = ctx.controller();
    controller.select_file(annual_report()).unwrap();

    let submit = controller.submit();
    let cancel = async {
        ctx.wait_for_hits(1).await;
        controller.cancel()
    };
    let (result, cancelled) = tokio::join!(submit, cancel);

    assert!(cancelled);
    assert_eq!(result, Ok(None));
    assert_eq!(controller.session().phase(), Phase::FileSelected);
}

// =============================================================================
// Selection after an outcome
// =============================================================================

/// A new valid file after an error clears the message and any stale locator
#[test_context(TestHarness)]
#[tokio::test]
async fn new_file_after_error_resets_outcome(ctx: &TestHarness) {
    let controller = ctx.controller();
    controller.select_file(annual_report()).unwrap();
    controller.submit().await.unwrap();
    assert_eq!(controller.session().phase(), Phase::Success);

    ctx.reply_with(StubReply::status(503));
    controller.submit().await.unwrap_err();
    assert_eq!(controller.session().phase(), Phase::Error);

    controller
        .select_file(Document::new("Q3.pdf", "application/pdf", b"%PDF".to_vec()))
        .unwrap();
    let session = controller.session();
    assert_eq!(session.phase(), Phase::FileSelected);
    assert!(session.error_message().is_none());
    assert!(session.result_location().is_none());
}

/// Non-PDF candidates are rejected and wipe a prior success
#[test_context(TestHarness)]
#[tokio::test]
async fn non_pdf_after_success_is_rejected(ctx: &TestHarness) {
    let controller = ctx.controller();
    controller.select_file(annual_report()).unwrap();
    controller.submit().await.unwrap();

    let err = controller
        .select_file(Document::new("notes.txt", "text/plain", b"hi".to_vec()))
        .unwrap_err();

    assert_eq!(err, SessionError::invalid_file_type());
    let session = controller.session();
    assert_eq!(session.phase(), Phase::Error);
    assert!(session.result_location().is_none());
    assert_eq!(controller.view().error(), Some("invalid file type"));
    assert_eq!(ctx.hits(), 1);
}

/// The client can be used directly through the service trait
#[test_context(TestHarness)]
#[tokio::test]
async fn client_implements_service_trait(ctx: &TestHarness) {
    let service: Arc<dyn BaseExtractionService> = Arc::new(ctx.client());
    let controller = SessionController::with_default_model(service, ModelId::GeminiPro);
    controller.select_file(annual_report()).unwrap();
    controller.submit().await.unwrap();

    assert_eq!(ctx.uploads()[0].model.as_deref(), Some("gemini-2.0-pro"));
}
