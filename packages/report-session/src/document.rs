//! Candidate artifacts handed to the session by an upload surface.

use std::fmt;
use std::path::Path;

use bytes::Bytes;

/// The only media type the extraction endpoint accepts.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// A named binary artifact with a declared media type.
///
/// Content is reference-counted, so cloning a document into an upload
/// request does not copy the bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    name: String,
    media_type: String,
    content: Bytes,
}

impl Document {
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            content: content.into(),
        }
    }

    /// Read a file from disk, deriving the media type from its extension.
    ///
    /// Picker selections and dropped paths both come through here.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let media_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(Self::new(name, media_type, content))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// True when the declared media type is `application/pdf`.
    ///
    /// Parameters after `;` are ignored and the comparison is case-insensitive.
    pub fn is_pdf(&self) -> bool {
        self.media_type
            .split(';')
            .next()
            .map(|essence| essence.trim().eq_ignore_ascii_case(PDF_MEDIA_TYPE))
            .unwrap_or(false)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("len", &self.content.len())
            .finish()
    }
}
