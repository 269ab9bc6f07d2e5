//! Result locators and the discriminated outcome of one extraction attempt.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::SessionError;

/// URL or path identifying an artifact produced by the endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultLocator(String);

impl ResultLocator {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve against the endpoint's base URL. Absolute locators pass through.
    pub fn resolve(&self, base: &Url) -> Result<Url, url::ParseError> {
        base.join(&self.0)
    }
}

impl fmt::Display for ResultLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How an in-flight attempt ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtractionOutcome {
    Success { locator: ResultLocator },
    Failure(SessionError),
    /// The attempt was aborted before a response was applied.
    Cancelled,
}

impl From<Result<ResultLocator, SessionError>> for ExtractionOutcome {
    fn from(result: Result<ResultLocator, SessionError>) -> Self {
        match result {
            Ok(locator) => ExtractionOutcome::Success { locator },
            Err(err) => ExtractionOutcome::Failure(err),
        }
    }
}
