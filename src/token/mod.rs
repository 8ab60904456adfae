//! Token types shared by the backends, the cache and the renderer.

pub mod rules;

pub use rules::*;

use serde::{Deserialize, Serialize};

/// One display token: a surface form and, when it needs one, its kana reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Surface form as it appears in the source text
    #[serde(rename = "s", alias = "surface")]
    pub surface: String,
    /// Hiragana reading, absent when the surface needs no annotation
    #[serde(rename = "r", alias = "reading", default, skip_serializing_if = "Option::is_none")]
    pub reading: Option<String>,
}

impl Token {
    pub fn plain(surface: impl Into<String>) -> Self {
        Self {
            surface: surface.into(),
            reading: None,
        }
    }

    pub fn annotated(surface: impl Into<String>, reading: impl Into<String>) -> Self {
        Self {
            surface: surface.into(),
            reading: Some(reading.into()),
        }
    }

    /// True if the renderer should emit ruby text for this token
    pub fn has_reading(&self) -> bool {
        self.reading.as_deref().is_some_and(|r| !r.is_empty())
    }
}

/// Ordered tokens for one source text. Immutable once produced.
pub type TokenSequence = Vec<Token>;
