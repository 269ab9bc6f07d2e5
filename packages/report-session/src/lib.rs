//! # Report Session
//!
//! Client-side session controller for the annual report extractor: pick a
//! PDF, pick a model, upload it to the extraction endpoint and present either
//! a download link or an error.
//!
//! ## Architecture
//!
//! ```text
//! Upload surface (picker / drag & drop)
//!     │
//!     ▼ select_file() / select_model()
//! SessionController ──► transition(&Session, event) ──► Option<SessionCommand>
//!     │                                                        │
//!     │                       Upload(request) ◄────────────────┘
//!     ▼
//! BaseExtractionService::extract()  (multipart POST, single suspension point)
//!     │
//!     ▼ ExtractionFinished { attempt, outcome }
//! SessionView ──► result surface (download link | error message)
//! ```
//!
//! ## Key Invariants
//!
//! 1. **One attempt in flight** - a second submit while submitting is dropped
//! 2. **Result xor error** - a locator and an error message are never both shown
//! 3. **Selection resets** - a new valid file clears any previous result or error
//! 4. **No automatic retries** - every failure ends the attempt
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use report_session::{ClientConfig, Document, ExtractionClient, SessionController};
//!
//! let config = ClientConfig::from_env()?;
//! let client = ExtractionClient::new(&config)?;
//! let controller = SessionController::with_default_model(Arc::new(client), config.default_model);
//!
//! controller.select_file(Document::from_path("AnnualReport.pdf").await?)?;
//! controller.select_model("gemini-2.0-pro")?;
//!
//! match controller.submit().await {
//!     Ok(Some(locator)) => println!("download: {}", locator),
//!     Ok(None) => println!("nothing submitted"),
//!     Err(err) => eprintln!("{}", err),
//! }
//! ```

pub mod client;
pub mod config;
pub mod controller;
pub mod document;
pub mod error;
pub mod machine;
pub mod model;
pub mod outcome;
pub mod testing;
pub mod view;

pub use client::{parse_locator, BaseExtractionService, ExtractionClient};
pub use config::{ClientConfig, ConfigError};
pub use controller::SessionController;
pub use document::{Document, PDF_MEDIA_TYPE};
pub use error::{Result, SessionError};
pub use machine::{
    transition, AttemptId, Phase, Session, SessionCommand, SessionEvent, Transition, UploadRequest,
};
pub use model::ModelId;
pub use outcome::{ExtractionOutcome, ResultLocator};
pub use view::{DownloadLink, ResultView, SessionView};
