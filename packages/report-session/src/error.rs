//! Error types for the report session.
//!
//! Every failure an attempt can end with maps to exactly one variant. The
//! `Display` text of each variant is what the result surface shows verbatim.

use thiserror::Error;

/// Message used when a candidate artifact is not a PDF.
pub const INVALID_FILE_TYPE: &str = "invalid file type";

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Session errors.
///
/// None of these are retried automatically. The user re-triggers a submit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Bad input (wrong media type, missing selection)
    #[error("{0}")]
    Validation(String),

    /// Model identifier outside the supported set
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// No response was obtained from the endpoint
    #[error("Network error: {0}")]
    Network(String),

    /// Endpoint answered with a non-2xx status
    #[error("Server error {status}")]
    Server { status: u16 },

    /// 2xx response whose body has no usable result locator
    #[error("Parse error: {0}")]
    Parse(String),
}

impl SessionError {
    pub fn invalid_file_type() -> Self {
        Self::Validation(INVALID_FILE_TYPE.to_string())
    }

    /// Short, stable name of the variant for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::UnknownModel(_) => "unknown_model",
            Self::Network(_) => "network",
            Self::Server { .. } => "server",
            Self::Parse(_) => "parse",
        }
    }
}
