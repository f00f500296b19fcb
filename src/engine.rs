//! Document-level orchestration.
//!
//! Drives the per-page pipeline: parse tokens, extract segments, find
//! matches, plan, rewrite, serialize, and install the new content stream.
//! Pages are independent values, so the pure transformation runs in
//! parallel; only the snapshot phase and the final installation touch the
//! document. A page that fails to parse keeps its original content, and
//! every degradation lands in the returned summary so partial success is
//! never silent.

use lopdf::{Document, ObjectId};
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::boxes::{self, FoundText};
use crate::config::{AreaRedactionRequest, RedactionSettings};
use crate::content::{parse_content, serialize_content};
use crate::error::Result;
use crate::extract::extract_segments;
use crate::fonts::{build_font_table, FontTable};
use crate::matcher::{build_patterns, find_matches, SearchOptions};
use crate::planner::plan_redactions;
use crate::rewriter::apply_redactions;

/// Processing record for one page.
#[derive(Debug, Clone, Serialize)]
pub struct PageOutcome {
    /// 1-based page number.
    pub page: u32,
    /// Matches found in this page's flattened text.
    pub matches: usize,
    /// Tokens actually rewritten.
    pub segments_rewritten: usize,
    /// Populated when the text rewrite was skipped; box painting for the
    /// page is unaffected.
    pub skipped: Option<String>,
    /// Matches still present after the rewrite, per the verification pass.
    pub residual_matches: usize,
}

impl PageOutcome {
    fn clean(page: u32) -> Self {
        Self {
            page,
            matches: 0,
            segments_rewritten: 0,
            skipped: None,
            residual_matches: 0,
        }
    }

    fn skipped(page: u32, reason: String) -> Self {
        Self {
            skipped: Some(reason),
            ..Self::clean(page)
        }
    }
}

/// Document-level result of a text redaction run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RedactionSummary {
    pub pages: Vec<PageOutcome>,
    pub total_matches: usize,
    pub total_rewrites: usize,
    /// Human-readable degradation notes; non-empty means partial success.
    pub warnings: Vec<String>,
    /// Echo of the request flag; rasterization is the caller's step.
    pub convert_to_image: bool,
}

impl RedactionSummary {
    /// True when every page completed and verification found no residual
    /// occurrences of any term.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
            && self
                .pages
                .iter()
                .all(|p| p.skipped.is_none() && p.residual_matches == 0)
    }
}

/// Result of a manual (area / whole-page) redaction run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ManualRedactionSummary {
    pub pages_painted: usize,
    pub areas_painted: usize,
    pub convert_to_image: bool,
}

struct PageSnapshot {
    number: u32,
    id: ObjectId,
    content: Vec<u8>,
    fonts: FontTable,
}

struct PageResult {
    number: u32,
    id: ObjectId,
    new_content: Option<Vec<u8>>,
    outcome: PageOutcome,
}

/// Text-redaction engine configured by [`RedactionSettings`].
pub struct RedactionEngine {
    settings: RedactionSettings,
}

impl RedactionEngine {
    pub fn new(settings: RedactionSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RedactionSettings {
        &self.settings
    }

    /// Remove every occurrence of the configured terms from the text the
    /// document draws. The document is modified in place; the summary
    /// reports what happened on every page.
    pub fn redact_text(&self, doc: &mut Document) -> Result<RedactionSummary> {
        let mut summary = RedactionSummary {
            convert_to_image: self.settings.convert_to_image,
            ..RedactionSummary::default()
        };

        let terms = normalized_terms(&self.settings.terms);
        if terms.is_empty() {
            info!("no search terms; document left untouched");
            return Ok(summary);
        }
        let patterns = build_patterns(
            &terms,
            SearchOptions {
                use_regex: self.settings.use_regex,
                whole_word: self.settings.whole_word_search,
            },
        );
        if patterns.is_empty() {
            summary
                .warnings
                .push("no search term compiled to a usable pattern".to_string());
            return Ok(summary);
        }

        // Snapshot phase: collect each page's content and font table while
        // the document is still borrowed immutably.
        let mut snapshots = Vec::new();
        let mut failed_pages = Vec::new();
        for (number, id) in doc.get_pages() {
            match doc.get_page_content(id) {
                Ok(content) => snapshots.push(PageSnapshot {
                    number,
                    id,
                    content,
                    fonts: build_font_table(doc, id),
                }),
                Err(err) => {
                    warn!("page {}: content unavailable: {}", number, err);
                    failed_pages
                        .push(PageOutcome::skipped(number, format!("content unavailable: {err}")));
                }
            }
        }

        // Pure transformation, page-parallel.
        let mut results: Vec<PageResult> = snapshots
            .par_iter()
            .map(|snapshot| process_page(snapshot, &patterns))
            .collect();

        // Installation is single-threaded document mutation.
        for result in &mut results {
            if let Some(bytes) = result.new_content.take() {
                if let Err(err) = doc.change_page_content(result.id, bytes) {
                    warn!("page {}: failed to install new content: {}", result.number, err);
                    result.outcome.skipped = Some(format!("content update failed: {err}"));
                    result.outcome.segments_rewritten = 0;
                }
            }
        }

        // Verification sweep over rewritten pages: the flattened text of
        // the new stream must no longer match any term.
        for result in &mut results {
            if result.outcome.segments_rewritten == 0 || result.outcome.skipped.is_some() {
                continue;
            }
            let residual = residual_matches(doc, result.id, &patterns);
            result.outcome.residual_matches = residual;
            if residual > 0 {
                warn!(
                    "page {}: {} residual matches after rewrite",
                    result.number, residual
                );
                summary.warnings.push(format!(
                    "page {}: {} residual matches after rewrite",
                    result.number, residual
                ));
            }
        }

        let mut outcomes: Vec<PageOutcome> = results.into_iter().map(|r| r.outcome).collect();
        outcomes.extend(failed_pages);
        outcomes.sort_by_key(|outcome| outcome.page);

        for outcome in &outcomes {
            summary.total_matches += outcome.matches;
            summary.total_rewrites += outcome.segments_rewritten;
            if let Some(reason) = &outcome.skipped {
                summary
                    .warnings
                    .push(format!("page {}: {}", outcome.page, reason));
            }
        }
        summary.pages = outcomes;

        info!(
            "redaction finished: {} matches, {} rewrites, {} warnings",
            summary.total_matches,
            summary.total_rewrites,
            summary.warnings.len()
        );
        Ok(summary)
    }

    /// Paint the visual confirmation boxes over found-text geometry,
    /// using the configured color and padding.
    pub fn paint_found_text(&self, doc: &mut Document, blocks: &[FoundText]) -> usize {
        let color = boxes::color_or_default(self.settings.redact_color.as_deref());
        boxes::paint_found_text(doc, blocks, self.settings.custom_padding, color)
    }
}

/// Manual redaction: whole-page fills first, then explicit areas on top.
pub fn redact_manual(doc: &mut Document, request: &AreaRedactionRequest) -> ManualRedactionSummary {
    let pages_painted = boxes::paint_pages(
        doc,
        &request.page_numbers,
        request.page_redaction_color.as_deref(),
    );
    let areas_painted = boxes::paint_areas(doc, &request.areas);
    ManualRedactionSummary {
        pages_painted,
        areas_painted,
        convert_to_image: request.convert_to_image,
    }
}

/// Download name for a redacted document: `<stem>_redacted.pdf`.
pub fn redacted_file_name(original: &str) -> String {
    let stem = if original.len() >= 4 && original[original.len() - 4..].eq_ignore_ascii_case(".pdf")
    {
        &original[..original.len() - 4]
    } else {
        original
    };
    format!("{stem}_redacted.pdf")
}

fn process_page(snapshot: &PageSnapshot, patterns: &[Regex]) -> PageResult {
    let mut outcome = PageOutcome::clean(snapshot.number);

    let mut tokens = match parse_content(&snapshot.content) {
        Ok(tokens) => tokens,
        Err(err) => {
            warn!(
                "page {}: text rewrite skipped, stream did not parse: {}",
                snapshot.number, err
            );
            return PageResult {
                number: snapshot.number,
                id: snapshot.id,
                new_content: None,
                outcome: PageOutcome::skipped(snapshot.number, err.to_string()),
            };
        }
    };

    let extracted = extract_segments(&tokens, &snapshot.fonts);
    let flattened_len = extracted.flattened.chars().count();
    if !extracted.length_invariant_holds() {
        // Defensive: offsets could not be trusted past this point.
        return PageResult {
            number: snapshot.number,
            id: snapshot.id,
            new_content: None,
            outcome: PageOutcome::skipped(
                snapshot.number,
                "flattened text length mismatch".to_string(),
            ),
        };
    }

    let mut matches = find_matches(&extracted.flattened, patterns);
    let before = matches.len();
    matches.retain(|m| !m.is_empty() && m.end <= flattened_len);
    if matches.len() != before {
        warn!(
            "page {}: discarded {} match ranges outside the flattened text",
            snapshot.number,
            before - matches.len()
        );
    }
    outcome.matches = matches.len();
    if matches.is_empty() {
        debug!("page {}: no matches", snapshot.number);
        return PageResult {
            number: snapshot.number,
            id: snapshot.id,
            new_content: None,
            outcome,
        };
    }

    let tasks = plan_redactions(&extracted.segments, &matches);
    outcome.segments_rewritten = apply_redactions(&mut tokens, &extracted.segments, &tasks);
    let new_content = (outcome.segments_rewritten > 0).then(|| serialize_content(&tokens));

    PageResult {
        number: snapshot.number,
        id: snapshot.id,
        new_content,
        outcome,
    }
}

/// Matches still present in a page's freshly installed content stream.
fn residual_matches(doc: &Document, page_id: ObjectId, patterns: &[Regex]) -> usize {
    let Ok(content) = doc.get_page_content(page_id) else {
        return 0;
    };
    match parse_content(&content) {
        Ok(tokens) => {
            // Text content does not depend on font metrics.
            let extracted = extract_segments(&tokens, &FontTable::default());
            find_matches(&extracted.flattened, patterns).len()
        }
        Err(err) => {
            warn!("verification reparse failed: {}", err);
            0
        }
    }
}

fn normalized_terms(terms: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    terms
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.to_string()))
        .map(str::to_string)
        .collect()
}
