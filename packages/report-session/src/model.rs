//! Supported processing models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Backend processing variant used for an extraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ModelId {
    #[default]
    #[serde(rename = "gemini-2.0-flash")]
    GeminiFlash,
    #[serde(rename = "gemini-2.0-pro")]
    GeminiPro,
}

impl ModelId {
    /// Identifier sent to the extraction endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::GeminiFlash => "gemini-2.0-flash",
            ModelId::GeminiPro => "gemini-2.0-pro",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ModelId::GeminiFlash => "Gemini 2.0 Flash",
            ModelId::GeminiPro => "Gemini 2.0 Pro",
        }
    }

    pub fn variants() -> &'static [ModelId] {
        &[ModelId::GeminiFlash, ModelId::GeminiPro]
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelId {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelId::variants()
            .iter()
            .copied()
            .find(|model| model.as_str() == s)
            .ok_or_else(|| SessionError::UnknownModel(s.to_string()))
    }
}
