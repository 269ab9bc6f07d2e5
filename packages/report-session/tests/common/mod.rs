// Common test utilities

pub mod harness;

pub use harness::*;

use report_session::{Document, PDF_MEDIA_TYPE};

pub fn annual_report() -> Document {
    Document::new("AnnualReport.pdf", PDF_MEDIA_TYPE, b"%PDF-1.7 annual report".to_vec())
}
