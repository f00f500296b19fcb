//! Text segment extraction.
//!
//! A single linear pass over a page's tokens reconstructs the logical text
//! stream: every text-showing operator contributes one segment, and
//! concatenating segment texts in draw order yields the page's flattened
//! text with no separators. Offsets into that flattened text are what the
//! match finder and planner work with.

use std::sync::Arc;

use crate::content::token::{
    is_single_string_show, is_text_showing_operator, Token, OP_ARRAY_SHOW, OP_SET_FONT,
};
use crate::fonts::{FontMetrics, FontTable};
use crate::graphics::GraphicsState;

/// How a segment's operator takes its text operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowKind {
    /// `Tj`, `'`, `"`: one string operand.
    SingleString,
    /// `TJ`: an array mixing strings and kerning numbers.
    ArrayShow,
}

/// One text-showing operator's contribution to the page text.
#[derive(Debug, Clone)]
pub struct TextSegment {
    /// Index of the operand token (the string or array) in the page vector.
    pub token_index: usize,
    pub kind: ShowKind,
    /// Operator name as written, kept for rewrite-time verification.
    pub operator: String,
    /// Text content; for array-show operators the concatenation of the
    /// string elements only.
    pub text: String,
    /// Char offset of this segment's first character in the flattened text.
    pub start: usize,
    /// Char offset one past this segment's last character.
    pub end: usize,
    pub font: Option<Arc<FontMetrics>>,
    pub font_size: f64,
}

impl TextSegment {
    pub fn char_len(&self) -> usize {
        self.end - self.start
    }
}

/// Immutable snapshot handed to the match finder and planner.
#[derive(Debug, Clone, Default)]
pub struct ExtractedText {
    pub segments: Vec<TextSegment>,
    pub flattened: String,
}

impl ExtractedText {
    /// The flattened length always equals the sum of segment lengths; this
    /// is checked before match ranges are trusted.
    pub fn length_invariant_holds(&self) -> bool {
        let sum: usize = self.segments.iter().map(TextSegment::char_len).sum();
        self.flattened.chars().count() == sum
    }
}

/// Walk the tokens once, folding the graphics state through the pass, and
/// collect segments plus the flattened text.
pub fn extract_segments(tokens: &[Token], fonts: &FontTable) -> ExtractedText {
    let mut segments = Vec::new();
    let mut flattened = String::new();
    let mut cursor = 0usize;
    let mut gs = GraphicsState::default();

    for (i, token) in tokens.iter().enumerate() {
        let Token::Operator(op) = token else {
            continue;
        };

        if op == OP_SET_FONT && i >= 2 {
            gs = apply_font_selection(gs, tokens, i, fonts);
            continue;
        }

        if is_text_showing_operator(op) && i > 0 {
            let Some((kind, text)) = shown_text(&tokens[i - 1], op) else {
                continue;
            };
            if text.is_empty() {
                continue;
            }
            let char_len = text.chars().count();
            flattened.push_str(&text);
            segments.push(TextSegment {
                token_index: i - 1,
                kind,
                operator: op.clone(),
                text,
                start: cursor,
                end: cursor + char_len,
                font: gs.font.clone(),
                font_size: gs.font_size,
            });
            cursor += char_len;
        }
    }

    ExtractedText {
        segments,
        flattened,
    }
}

fn apply_font_selection(
    gs: GraphicsState,
    tokens: &[Token],
    op_index: usize,
    fonts: &FontTable,
) -> GraphicsState {
    let name = match &tokens[op_index - 2] {
        Token::Name(name) => Some(name.as_str()),
        _ => None,
    };
    let size = match &tokens[op_index - 1] {
        Token::Integer(value) => Some(*value as f64),
        Token::Real(value) => Some(*value),
        _ => None,
    };
    match size {
        Some(size) => {
            let metrics = name.and_then(|n| fonts.get(n));
            gs.select_font(metrics, size)
        }
        // Malformed selection; keep the previous state.
        None => gs,
    }
}

/// Text drawn by one operator, or `None` when the operand does not have the
/// shape the operator requires.
fn shown_text(operand: &Token, op: &str) -> Option<(ShowKind, String)> {
    if is_single_string_show(op) {
        match operand {
            Token::Str(s) => Some((ShowKind::SingleString, s.decoded())),
            _ => None,
        }
    } else if op == OP_ARRAY_SHOW {
        match operand {
            Token::Array(items) => {
                let mut text = String::new();
                for item in items {
                    // Kerning numbers are invisible to the text content but
                    // stay in the token for rewriting.
                    if let Token::Str(s) = item {
                        text.push_str(&s.decoded());
                    }
                }
                Some((ShowKind::ArrayShow, text))
            }
            _ => None,
        }
    } else {
        None
    }
}
