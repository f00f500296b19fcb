//! Content-stream text redaction for PDF documents.
//!
//! Given a page's content stream and a set of search terms, this crate
//! permanently removes the matched characters from the text the page draws
//! while leaving every other glyph, kerning gap, and drawing instruction
//! visually unchanged. Matched characters are replaced by same-length
//! placeholders and the width difference is cancelled with explicit kerning
//! numbers, so nothing after the redaction drifts. A secondary painter
//! draws opaque rectangles for manual area, whole-page, and found-text
//! redaction.
//!
//! Per page the pipeline is: tokenize the content stream, reconstruct the
//! logical text from the text-showing operators, search it, map match
//! offsets back onto operator operands, rewrite those operands in place,
//! and serialize the tokens back as the page's new content.

// Request types and errors
pub mod config;
pub mod error;

// Content stream tokenization and serialization
pub mod content;

// Font metrics backing kerning compensation
pub mod fonts;

// Text reconstruction: graphics state fold and segment extraction
pub mod extract;
pub mod graphics;

// Search and rewrite pipeline
pub mod matcher;
pub mod planner;
pub mod rewriter;

// Rectangle painting for manual and visual redaction
pub mod boxes;

// Document-level orchestration
pub mod engine;

// Re-exports for crate consumers
pub use boxes::{FoundText, Rgb};
pub use config::{AreaRedactionRequest, RedactionArea, RedactionSettings};
pub use engine::{
    redact_manual, redacted_file_name, ManualRedactionSummary, PageOutcome, RedactionEngine,
    RedactionSummary,
};
pub use error::{RedactionError, Result};
