//! Error types for the redaction engine.

use std::result::Result as StdResult;

use thiserror::Error;

/// Custom result type for redaction operations
pub type Result<T> = StdResult<T, RedactionError>;

/// Core error type for redaction operations
///
/// Every variant here is recoverable at a smaller scope than the document:
/// a malformed content stream skips one page's text rewrite, an invalid
/// pattern skips one search term, an invalid color falls back to black, and
/// invalid geometry skips one rectangle. Callers that want degradation
/// details should read the summary returned by the engine rather than
/// matching on errors.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RedactionError {
    #[error("malformed content stream at byte {offset}: {reason}")]
    MalformedContentStream { offset: usize, reason: String },

    #[error("invalid search pattern '{term}': {reason}")]
    InvalidPattern { term: String, reason: String },

    #[error("invalid color specification '{0}'")]
    InvalidColor(String),

    #[error("invalid redaction geometry: {0}")]
    InvalidGeometry(String),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
}

impl RedactionError {
    /// Helper for building a parse error at a known byte offset.
    pub fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        RedactionError::MalformedContentStream {
            offset,
            reason: reason.into(),
        }
    }
}
