//! Typed model of a page content stream.
//!
//! A page's drawing instructions are parsed into an ordered token vector,
//! rewritten in place by index, and serialized back to bytes. Parsing and
//! serialization are inverses for rendering purposes: operand values and
//! operator order always round-trip, numeric formatting may differ.

pub mod parser;
pub mod serializer;
pub mod token;

pub use parser::parse_content;
pub use serializer::serialize_content;
pub use token::{PdfString, StringForm, Token};
