//! Mock extraction service for tests.
//!
//! Records every upload it receives and answers from a queue of scripted
//! responses. A gated mock holds each response until [`MockExtractionService::release`]
//! is called, which keeps an attempt in flight for as long as a test needs.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::client::BaseExtractionService;
use crate::error::{Result, SessionError};
use crate::machine::{AttemptId, UploadRequest};
use crate::model::ModelId;
use crate::outcome::ResultLocator;

/// Arguments captured from an extract call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractCall {
    pub attempt: AttemptId,
    pub file_name: String,
    pub model: ModelId,
}

#[derive(Default)]
pub struct MockExtractionService {
    responses: Mutex<VecDeque<Result<ResultLocator>>>,
    calls: Mutex<Vec<ExtractCall>>,
    gate: Option<Arc<Notify>>,
}

impl MockExtractionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every response until `release()` is called.
    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Notify::new())),
            ..Default::default()
        }
    }

    pub fn with_locator(self, locator: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(ResultLocator::new(locator)));
        self
    }

    pub fn with_error(self, err: SessionError) -> Self {
        self.responses.lock().unwrap().push_back(Err(err));
        self
    }

    /// Let one held response through.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> Vec<ExtractCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl BaseExtractionService for MockExtractionService {
    async fn extract(&self, request: &UploadRequest) -> Result<ResultLocator> {
        self.calls.lock().unwrap().push(ExtractCall {
            attempt: request.attempt,
            file_name: request.document.name().to_string(),
            model: request.model,
        });

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(ResultLocator::new("/files/mock.pdf")))
    }
}
