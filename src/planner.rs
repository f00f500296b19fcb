//! Redaction planning.
//!
//! Maps match ranges onto the segments they overlap and decides, per
//! affected segment, what the rewriter must do: the replacement text for
//! single-string operators, and the width delta that kerning compensation
//! has to cancel. One segment may absorb several matches, and one match may
//! span any number of segments; each overlapped segment is clipped and
//! planned independently, carrying its own compensation.

use tracing::debug;

use crate::extract::{ShowKind, TextSegment};
use crate::matcher::MatchRange;

/// Character substituted for every matched character. Substitution is
/// strictly length-preserving; visual correction is kerning's job.
pub const PLACEHOLDER: char = ' ';

/// Width deltas below this many text-space units are treated as zero.
pub const PRECISION_THRESHOLD: f64 = 1e-3;

/// Kerning values beyond this magnitude (thousandths of an em) are judged
/// unreliable and dropped rather than injected.
pub const MAX_KERNING: f64 = 10_000.0;

/// Rewrite instructions for one affected segment.
#[derive(Debug, Clone)]
pub struct ModificationTask {
    pub segment_index: usize,
    /// Matched sub-ranges, as char offsets local to the segment, sorted.
    pub ranges: Vec<(usize, usize)>,
    /// Full replacement text for single-string segments; array-show
    /// segments are rewritten element by element instead.
    pub replacement: Option<String>,
    /// Text-space width lost by the substitution; zero when unknown or
    /// negligible.
    pub width_adjustment: f64,
}

/// Derive one task per segment that any match overlaps.
pub fn plan_redactions(segments: &[TextSegment], matches: &[MatchRange]) -> Vec<ModificationTask> {
    let mut tasks = Vec::new();
    for (segment_index, segment) in segments.iter().enumerate() {
        let mut ranges: Vec<(usize, usize)> = matches
            .iter()
            .filter_map(|m| clip_to_segment(segment, m))
            .collect();
        if ranges.is_empty() {
            continue;
        }
        ranges.sort_unstable();

        let task = match segment.kind {
            ShowKind::SingleString => {
                let replacement = substitute(&segment.text, &ranges);
                let width_adjustment = single_string_adjustment(segment, &ranges);
                ModificationTask {
                    segment_index,
                    ranges,
                    replacement: Some(replacement),
                    width_adjustment,
                }
            }
            ShowKind::ArrayShow => ModificationTask {
                segment_index,
                ranges,
                replacement: None,
                width_adjustment: 0.0,
            },
        };
        tasks.push(task);
    }
    debug!(
        "planned {} modification tasks for {} matches",
        tasks.len(),
        matches.len()
    );
    tasks
}

/// Overlap of a match with a segment, as a segment-local char range.
pub fn clip_to_segment(segment: &TextSegment, m: &MatchRange) -> Option<(usize, usize)> {
    let start = m.start.max(segment.start);
    let end = m.end.min(segment.end);
    if start < end {
        Some((start - segment.start, end - segment.start))
    } else {
        None
    }
}

/// Replace every char inside the given local ranges with the placeholder.
/// Idempotent over overlapping ranges and always length-preserving.
pub fn substitute(text: &str, ranges: &[(usize, usize)]) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    for &(start, end) in ranges {
        for slot in chars.iter_mut().take(end.min(len)).skip(start) {
            *slot = PLACEHOLDER;
        }
    }
    chars.into_iter().collect()
}

/// Width lost by substituting the matched ranges of a single-string
/// segment, bounded to a sane magnitude. Zero when the font is unknown or
/// its metrics are unreliable; the text is still redacted in that case and
/// only the layout correction degrades.
fn single_string_adjustment(segment: &TextSegment, ranges: &[(usize, usize)]) -> f64 {
    // The quoted operators' operand layout cannot take the array form that
    // carries a kerning number, so they keep their shape uncompensated.
    if segment.operator != "Tj" {
        return 0.0;
    }
    let Some(font) = segment.font.as_ref() else {
        return 0.0;
    };
    if segment.font_size <= 0.0 {
        return 0.0;
    }

    let chars: Vec<char> = segment.text.chars().collect();
    let mut adjustment = 0.0;
    for &(start, end) in ranges {
        let end = end.min(chars.len());
        if start >= end {
            continue;
        }
        let original: String = chars[start..end].iter().collect();
        let placeholder: String = std::iter::repeat(PLACEHOLDER).take(end - start).collect();
        let Some(original_width) = font.text_width(&original, segment.font_size) else {
            return 0.0;
        };
        let Some(placeholder_width) = font.text_width(&placeholder, segment.font_size) else {
            return 0.0;
        };
        adjustment += original_width - placeholder_width;
    }

    if adjustment.abs() < PRECISION_THRESHOLD {
        return 0.0;
    }
    let max_reasonable = chars.len() as f64 * segment.font_size * 2.0;
    if adjustment.abs() > max_reasonable {
        debug!(
            "discarding implausible width adjustment {:.3} for segment at token {}",
            adjustment, segment.token_index
        );
        return 0.0;
    }
    adjustment
}
