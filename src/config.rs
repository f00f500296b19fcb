//! Request and settings types consumed by the redaction engine.

use serde::{Deserialize, Serialize};

/// Settings for automatic text redaction across a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionSettings {
    /// Search terms, already split by the caller. Blank entries are discarded.
    pub terms: Vec<String>,

    /// Treat terms as regular expressions instead of literal text.
    pub use_regex: bool,

    /// Match only boundary-delimited occurrences of each term.
    pub whole_word_search: bool,

    /// Fill color for painted boxes as a hex string ("#RRGGBB" or "RRGGBB").
    /// Black when absent or malformed.
    pub redact_color: Option<String>,

    /// Extra padding applied around found-text boxes, in page units.
    pub custom_padding: f64,

    /// Ask the caller to rasterize pages after redaction. Rasterization
    /// itself happens outside this crate; the flag is echoed in the summary.
    pub convert_to_image: bool,
}

impl Default for RedactionSettings {
    fn default() -> Self {
        Self {
            terms: Vec::new(),
            use_regex: false,
            whole_word_search: false,
            redact_color: None,
            custom_padding: 0.0,
            convert_to_image: false,
        }
    }
}

impl RedactionSettings {
    pub fn with_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            terms: terms.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// One manual redaction rectangle, in top-left-origin page coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionArea {
    /// 1-based page number.
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Hex fill color; black when absent or malformed.
    pub color: Option<String>,
}

impl RedactionArea {
    /// An area is paintable when it has positive extent. Page range checks
    /// happen against the document at paint time.
    pub fn has_positive_extent(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Geometry validation; an invalid area is skipped, never fatal.
    pub fn validate(&self) -> crate::error::Result<()> {
        if !self.has_positive_extent() {
            return Err(crate::error::RedactionError::InvalidGeometry(format!(
                "non-positive extent {}x{} on page {}",
                self.width, self.height, self.page
            )));
        }
        Ok(())
    }
}

/// Manual redaction request: explicit areas plus whole-page fills.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AreaRedactionRequest {
    pub areas: Vec<RedactionArea>,

    /// Whole-page specification such as "1,3-5". Empty means no page fills.
    pub page_numbers: String,

    /// Fill color for whole-page redaction; black when absent or malformed.
    pub page_redaction_color: Option<String>,

    /// Same meaning as [`RedactionSettings::convert_to_image`].
    pub convert_to_image: bool,
}
