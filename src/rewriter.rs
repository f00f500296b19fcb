//! Token rewriting.
//!
//! Applies modification tasks to the page's token vector in strictly
//! descending token-index order, so no rewrite can invalidate the indices
//! later tasks rely on. Entries are replaced by index only; the vector is
//! never restructured around them. A single-string operator that needs
//! width compensation is upgraded to the array-show form, because the
//! single-string form has no way to carry an explicit spacing number.

use tracing::{debug, warn};

use crate::content::token::{encode_text, PdfString, Token, OP_ARRAY_SHOW};
use crate::extract::{ShowKind, TextSegment};
use crate::fonts::FONT_UNITS_PER_EM;
use crate::planner::{ModificationTask, MAX_KERNING, PRECISION_THRESHOLD};

/// Apply all tasks and return the number of tokens rewritten.
pub fn apply_redactions(
    tokens: &mut [Token],
    segments: &[TextSegment],
    tasks: &[ModificationTask],
) -> usize {
    let mut order: Vec<&ModificationTask> = tasks.iter().collect();
    order.sort_by(|a, b| {
        segments[b.segment_index]
            .token_index
            .cmp(&segments[a.segment_index].token_index)
    });

    let mut modified = 0;
    for task in order {
        let segment = &segments[task.segment_index];
        if segment.token_index >= tokens.len() {
            warn!(
                "token index {} out of bounds ({} tokens); skipping task",
                segment.token_index,
                tokens.len()
            );
            continue;
        }
        match segment.kind {
            ShowKind::SingleString => {
                if rewrite_single_string(tokens, segment, task) {
                    modified += 1;
                }
            }
            ShowKind::ArrayShow => {
                if rewrite_array_show(tokens, segment, task) {
                    modified += 1;
                }
            }
        }
    }
    debug!("rewrote {} of {} planned tokens", modified, tasks.len());
    modified
}

fn rewrite_single_string(
    tokens: &mut [Token],
    segment: &TextSegment,
    task: &ModificationTask,
) -> bool {
    let Some(replacement) = task.replacement.as_deref() else {
        warn!("single-string task without replacement text; skipping");
        return false;
    };
    let form = match &tokens[segment.token_index] {
        Token::Str(s) => s.form,
        other => {
            warn!(
                "expected string operand for '{}' at token {}, found {:?}; skipping",
                segment.operator, segment.token_index, other
            );
            return false;
        }
    };
    let new_string = PdfString {
        bytes: encode_text(replacement),
        form,
    };

    let kerning = compensation(task.width_adjustment, segment.font_size);
    match kerning {
        Some(kerning) => {
            tokens[segment.token_index] =
                Token::Array(vec![Token::Str(new_string), Token::Real(kerning)]);
            upgrade_operator(tokens, segment);
        }
        None => {
            tokens[segment.token_index] = Token::Str(new_string);
        }
    }
    true
}

/// Rewrite the operator following an upgraded operand to the array-show
/// form, after verifying it still is the operator the segment saw.
fn upgrade_operator(tokens: &mut [Token], segment: &TextSegment) {
    let operator_index = segment.token_index + 1;
    let still_matches = matches!(
        tokens.get(operator_index),
        Some(Token::Operator(op)) if *op == segment.operator
    );
    if still_matches {
        tokens[operator_index] = Token::Operator(OP_ARRAY_SHOW.to_string());
    } else {
        warn!(
            "operator after token {} is no longer '{}'; leaving it as-is",
            segment.token_index, segment.operator
        );
    }
}

fn rewrite_array_show(tokens: &mut [Token], segment: &TextSegment, task: &ModificationTask) -> bool {
    let items = match &tokens[segment.token_index] {
        Token::Array(items) => items.clone(),
        other => {
            warn!(
                "expected array operand for TJ at token {}, found {:?}; skipping",
                segment.token_index, other
            );
            return false;
        }
    };
    let new_items = rewrite_array_elements(&items, segment, &task.ranges);
    tokens[segment.token_index] = Token::Array(new_items);
    true
}

/// Rewrite each string element of an array-show operand as its own mini
/// text run. A modified element that loses width gets a compensating
/// kerning number immediately after it, merged into an existing spacing
/// number when one already follows.
fn rewrite_array_elements(
    items: &[Token],
    segment: &TextSegment,
    ranges: &[(usize, usize)],
) -> Vec<Token> {
    let mut out = Vec::with_capacity(items.len() + 2);
    let mut cursor = 0usize;
    let mut index = 0usize;

    while index < items.len() {
        let item = &items[index];
        let Token::Str(s) = item else {
            out.push(item.clone());
            index += 1;
            continue;
        };

        let text = s.decoded();
        let char_len = text.chars().count();
        let local: Vec<(usize, usize)> = ranges
            .iter()
            .filter_map(|&(start, end)| {
                let clipped_start = start.max(cursor);
                let clipped_end = end.min(cursor + char_len);
                (clipped_start < clipped_end)
                    .then(|| (clipped_start - cursor, clipped_end - cursor))
            })
            .collect();
        cursor += char_len;

        if local.is_empty() {
            out.push(item.clone());
            index += 1;
            continue;
        }

        let new_text = crate::planner::substitute(&text, &local);
        out.push(Token::Str(PdfString {
            bytes: encode_text(&new_text),
            form: s.form,
        }));

        if let Some(kerning) = element_compensation(segment, &text, &new_text) {
            match items.get(index + 1) {
                Some(Token::Integer(existing)) => {
                    out.push(Token::Real(*existing as f64 + kerning));
                    index += 1;
                }
                Some(Token::Real(existing)) => {
                    out.push(Token::Real(existing + kerning));
                    index += 1;
                }
                _ => out.push(Token::Real(kerning)),
            }
        }
        index += 1;
    }
    out
}

/// Kerning for one rewritten array element, in thousandths of an em.
fn element_compensation(segment: &TextSegment, original: &str, replacement: &str) -> Option<f64> {
    let font = segment.font.as_ref()?;
    let original_width = font.text_width(original, segment.font_size)?;
    let replacement_width = font.text_width(replacement, segment.font_size)?;
    compensation(original_width - replacement_width, segment.font_size)
}

/// Convert a text-space width delta into the spacing number that cancels
/// it, or `None` when no number should be written.
fn compensation(width_adjustment: f64, font_size: f64) -> Option<f64> {
    if width_adjustment.abs() < PRECISION_THRESHOLD || font_size <= 0.0 {
        return None;
    }
    let kerning = -width_adjustment / font_size * FONT_UNITS_PER_EM;
    if kerning.abs() > MAX_KERNING {
        warn!("dropping implausible kerning value {:.1}", kerning);
        return None;
    }
    Some(kerning)
}
