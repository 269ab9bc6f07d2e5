//! HTTP client for the extraction endpoint.
//!
//! One request per attempt: a multipart POST with the report bytes under
//! `report` and the model identifier under `model`. A 2xx answer must carry a
//! JSON body with a non-empty `pdfUrl`.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::config::{ClientConfig, ConfigError};
use crate::error::{Result, SessionError};
use crate::machine::UploadRequest;
use crate::outcome::ResultLocator;

pub const REPORT_FIELD: &str = "report";
pub const MODEL_FIELD: &str = "model";

/// The remote service that turns an uploaded report into an artifact.
#[async_trait]
pub trait BaseExtractionService: Send + Sync {
    /// Upload one report and return the locator of the produced artifact.
    async fn extract(&self, request: &UploadRequest) -> Result<ResultLocator>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtractResponse {
    pdf_url: String,
}

/// reqwest-backed extraction client.
#[derive(Clone, Debug)]
pub struct ExtractionClient {
    http_client: Client,
    base_url: Url,
    endpoint: Url,
}

impl ExtractionClient {
    pub fn new(config: &ClientConfig) -> std::result::Result<Self, ConfigError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http_client: builder.build()?,
            base_url: config.base_url.clone(),
            endpoint: config.endpoint()?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Download a produced artifact.
    pub async fn fetch_artifact(&self, locator: &ResultLocator) -> Result<Bytes> {
        let url = locator
            .resolve(&self.base_url)
            .map_err(|e| SessionError::Parse(format!("invalid result locator: {}", e)))?;

        let response = self.http_client.get(url).send().await.map_err(|e| {
            warn!(error = %e, "artifact download failed");
            SessionError::Network(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "artifact download returned error status");
            return Err(SessionError::Server {
                status: status.as_u16(),
            });
        }

        response
            .bytes()
            .await
            .map_err(|e| SessionError::Network(e.to_string()))
    }
}

#[async_trait]
impl BaseExtractionService for ExtractionClient {
    async fn extract(&self, request: &UploadRequest) -> Result<ResultLocator> {
        let document = &request.document;
        let report = Part::stream_with_length(
            Body::from(document.content().clone()),
            document.len() as u64,
        )
        .file_name(document.name().to_string())
        .mime_str(document.media_type())
        .map_err(|_| SessionError::invalid_file_type())?;

        let form = Form::new()
            .part(REPORT_FIELD, report)
            .text(MODEL_FIELD, request.model.as_str());

        debug!(
            attempt = request.attempt.get(),
            endpoint = %self.endpoint,
            file = document.name(),
            bytes = document.len(),
            model = %request.model,
            "Uploading report for extraction"
        );

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, timeout = e.is_timeout(), "extraction request failed");
                SessionError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "extraction endpoint error");
            return Err(SessionError::Server {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| {
            warn!(error = %e, "failed to read extraction response body");
            SessionError::Network(e.to_string())
        })?;

        parse_locator(&body)
    }
}

/// Pull the result locator out of a success body.
pub fn parse_locator(body: &[u8]) -> Result<ResultLocator> {
    let parsed: ExtractResponse = serde_json::from_slice(body)
        .map_err(|e| SessionError::Parse(format!("invalid extraction response: {}", e)))?;

    if parsed.pdf_url.trim().is_empty() {
        return Err(SessionError::Parse("pdfUrl is empty".to_string()));
    }

    Ok(ResultLocator::new(parsed.pdf_url))
}
