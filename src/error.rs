//! Structured error types for the folia engine.
//!
//! The layout and interaction core itself has no fatal errors: malformed
//! persisted records are normalized or dropped, patches to missing ids are
//! no-ops, and out-of-range geometry is clamped. Errors only exist at the two
//! real boundaries — parsing a whole persisted document and decoding image
//! bytes.

use thiserror::Error;

/// The unified error type returned by folia's public API functions.
#[derive(Debug, Error)]
pub enum FoliaError {
    /// JSON input failed to parse as a notebook state document.
    #[error("Failed to parse notebook state: {source}{}", hint_suffix(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },

    /// An image reference could not be decoded.
    #[error("Image error: {0}")]
    Image(String),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {hint}")
    }
}

impl From<serde_json::Error> for FoliaError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the notebook state schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input — is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        FoliaError::Parse { source: e, hint }
    }
}
