//! Read-only projection of a session for presentation layers.

use serde::Serialize;
use url::Url;

use crate::machine::{Phase, Session};
use crate::model::ModelId;

pub const DOWNLOAD_LABEL: &str = "Download Extracted PDF";
pub const SUBMIT_LABEL: &str = "Extract & Download";
pub const BUSY_LABEL: &str = "Processing…";

/// Snapshot of everything an upload page needs to render.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub phase: Phase,
    pub file_name: Option<String>,
    pub model: ModelId,
    pub model_label: &'static str,
    pub can_submit: bool,
    pub action_label: &'static str,
    pub result: Option<ResultView>,
}

/// What the result surface shows. Never both at once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultView {
    Download(DownloadLink),
    Error { message: String },
}

/// Actionable reference to a produced artifact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DownloadLink {
    pub href: String,
    pub label: &'static str,
}

impl DownloadLink {
    /// Opened context gets no handle back to the page that opened it.
    pub const REL: &'static str = "noopener noreferrer";
    pub const TARGET: &'static str = "_blank";

    pub fn resolve(&self, base: &Url) -> Result<Url, url::ParseError> {
        base.join(&self.href)
    }

    /// Anchor element for HTML result surfaces.
    pub fn to_html(&self) -> String {
        format!(
            r#"<a href="{}" target="{}" rel="{}" download>{}</a>"#,
            escape_html(&self.href),
            Self::TARGET,
            Self::REL,
            escape_html(self.label)
        )
    }
}

impl SessionView {
    pub fn project(session: &Session) -> Self {
        let result = match session.phase() {
            Phase::Success => session.result_location().map(|locator| {
                ResultView::Download(DownloadLink {
                    href: locator.as_str().to_string(),
                    label: DOWNLOAD_LABEL,
                })
            }),
            Phase::Error => session.error_message().map(|message| ResultView::Error {
                message: message.to_string(),
            }),
            _ => None,
        };

        Self {
            phase: session.phase(),
            file_name: session.selected_file().map(|f| f.name().to_string()),
            model: session.selected_model(),
            model_label: session.selected_model().label(),
            can_submit: session.can_submit(),
            action_label: if session.is_submitting() {
                BUSY_LABEL
            } else {
                SUBMIT_LABEL
            },
            result,
        }
    }

    pub fn download(&self) -> Option<&DownloadLink> {
        match &self.result {
            Some(ResultView::Download(link)) => Some(link),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.result {
            Some(ResultView::Error { message }) => Some(message),
            _ => None,
        }
    }
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self::project(session)
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
