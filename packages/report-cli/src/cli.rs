use std::path::PathBuf;

use clap::Parser;
use url::Url;

/// Turn an SEC 10-K PDF into a styled summary.
#[derive(Debug, Parser)]
#[command(name = "report-extract", version, about)]
pub struct Cli {
    /// PDF to upload. Prompted for (drag & drop works) when omitted.
    pub file: Option<PathBuf>,

    /// Model identifier, e.g. gemini-2.0-flash or gemini-2.0-pro
    #[arg(short, long)]
    pub model: Option<String>,

    /// Base URL of the extraction service
    #[arg(long, env = "EXTRACT_BASE_URL")]
    pub base_url: Option<Url>,

    /// Give up on the request after this many seconds
    #[arg(long, env = "EXTRACT_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Save the extracted PDF into this directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Never prompt; fail when the file is missing
    #[arg(long)]
    pub no_input: bool,
}

impl Cli {
    pub fn interactive(&self) -> bool {
        !self.no_input && console::user_attended()
    }
}
