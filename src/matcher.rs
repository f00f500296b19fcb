//! Search-term compilation and the unified match pass.
//!
//! Every term becomes one case-insensitive pattern; literal terms are
//! escaped before compilation and whole-word mode wraps the pattern in
//! boundary assertions. All patterns run over the full flattened page text
//! and their spans are collected into one sorted list. Overlapping matches
//! from different terms are kept as-is; the planner's per-segment grouping
//! absorbs overlapping coverage.

use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

/// Matching flags, mirroring the caller-facing settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOptions {
    pub use_regex: bool,
    pub whole_word: bool,
}

/// One matched occurrence, as char offsets into the flattened text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchRange {
    pub start: usize,
    pub end: usize,
}

impl MatchRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Compile one pattern per usable term. A term that fails to compile is
/// skipped with a warning so the remaining terms still apply.
pub fn build_patterns(terms: &[String], options: SearchOptions) -> Vec<Regex> {
    let mut patterns = Vec::with_capacity(terms.len());
    for term in terms {
        let term = term.trim();
        if term.is_empty() {
            continue;
        }
        let body = if options.use_regex {
            term.to_string()
        } else {
            regex::escape(term)
        };
        let pattern = if options.whole_word {
            format!(r"\b(?:{body})\b")
        } else {
            body
        };
        match RegexBuilder::new(&pattern).case_insensitive(true).build() {
            Ok(regex) => patterns.push(regex),
            Err(err) => {
                let error = crate::error::RedactionError::InvalidPattern {
                    term: term.to_string(),
                    reason: err.to_string(),
                };
                warn!("{error}; term skipped, remaining terms still apply");
            }
        }
    }
    patterns
}

/// Run every pattern over the flattened text and return all spans, sorted
/// by start offset, as char ranges.
pub fn find_matches(flattened: &str, patterns: &[Regex]) -> Vec<MatchRange> {
    if flattened.is_empty() || patterns.is_empty() {
        return Vec::new();
    }

    let mut byte_spans = Vec::new();
    for pattern in patterns {
        for found in pattern.find_iter(flattened) {
            if found.start() < found.end() {
                byte_spans.push((found.start(), found.end()));
            }
        }
    }
    if byte_spans.is_empty() {
        return Vec::new();
    }

    // Regex reports byte offsets; segments speak char offsets.
    let char_at_byte = char_index_table(flattened);
    let mut matches: Vec<MatchRange> = byte_spans
        .into_iter()
        .map(|(start, end)| MatchRange {
            start: char_at_byte[start],
            end: char_at_byte[end],
        })
        .collect();
    matches.sort_by_key(|m| (m.start, m.end));
    debug!("found {} matches in {} chars", matches.len(), char_at_byte[flattened.len()]);
    matches
}

/// Char index for every byte boundary of `text`. Entries between
/// boundaries are never queried.
fn char_index_table(text: &str) -> Vec<usize> {
    let mut table = vec![0usize; text.len() + 1];
    let mut count = 0;
    for (byte_index, _) in text.char_indices() {
        table[byte_index] = count;
        count += 1;
    }
    table[text.len()] = count;
    table
}
