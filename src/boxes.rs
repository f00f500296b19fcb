//! Rectangle painting for manual and visual redaction.
//!
//! Draws opaque filled rectangles over explicit areas, whole pages, and
//! found-text bounding boxes. Input coordinates are top-left-origin;
//! content streams are bottom-left-origin, so y is flipped against the
//! page height. All rectangles for one page are appended in a single
//! `q .. Q`-wrapped pass so the page's stream is only touched once.

use std::collections::HashMap;
use std::fmt::Write as _;

use lopdf::{Document, Object, ObjectId};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::RedactionArea;
use crate::error::{RedactionError, Result};

/// Box inflation proportional to line height, applied to found-text boxes.
pub const TEXT_PADDING_MULTIPLIER: f64 = 0.6;

/// Fill color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

pub const BLACK: Rgb = Rgb {
    r: 0.0,
    g: 0.0,
    b: 0.0,
};

/// One found-text bounding box from the caller's text finder, in
/// top-left-origin glyph geometry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FoundText {
    /// 0-based page index.
    pub page_index: usize,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

/// Parse a hex color string ("#RRGGBB" or "RRGGBB").
pub fn parse_color(hex: &str) -> Result<Rgb> {
    let trimmed = hex.trim().trim_start_matches('#');
    if trimmed.len() != 6 || !trimmed.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(RedactionError::InvalidColor(hex.to_string()));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&trimmed[range], 16).unwrap_or(0) as f64 / 255.0
    };
    Ok(Rgb {
        r: channel(0..2),
        g: channel(2..4),
        b: channel(4..6),
    })
}

/// Parse a color, falling back to black on absent or malformed input.
pub fn color_or_default(hex: Option<&str>) -> Rgb {
    match hex {
        None => BLACK,
        Some(value) if value.trim().is_empty() => BLACK,
        Some(value) => parse_color(value).unwrap_or_else(|_| {
            warn!("invalid color '{}', using black", value);
            BLACK
        }),
    }
}

/// Parse a page specification such as "1,3-5". Malformed or inverted parts
/// are skipped with a warning.
pub fn parse_page_numbers(spec: &str) -> Vec<u32> {
    let mut pages = Vec::new();
    for part in spec.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if let Some((from, to)) = part.split_once('-') {
            match (from.trim().parse::<u32>(), to.trim().parse::<u32>()) {
                (Ok(start), Ok(end)) if start > 0 && start <= end => pages.extend(start..=end),
                _ => warn!("invalid page range: '{}'", part),
            }
        } else {
            match part.parse::<u32>() {
                Ok(page) if page > 0 => pages.push(page),
                _ => warn!("invalid page number: '{}'", part),
            }
        }
    }
    pages
}

/// Paint every valid area. Returns the number of rectangles drawn.
pub fn paint_areas(doc: &mut Document, areas: &[RedactionArea]) -> usize {
    let pages = doc.get_pages();
    let mut by_page: HashMap<u32, Vec<&RedactionArea>> = HashMap::new();
    for area in areas {
        if let Err(err) = area.validate() {
            debug!("skipping area: {}", err);
            continue;
        }
        if area.page == 0 || !pages.contains_key(&area.page) {
            debug!("skipping area for out-of-range page {}", area.page);
            continue;
        }
        by_page.entry(area.page).or_default().push(area);
    }

    let mut painted = 0;
    for (page_number, page_areas) in by_page {
        let page_id = pages[&page_number];
        let (_, page_height) = page_size(doc, page_id);
        let mut ops = String::from("q\n");
        for area in &page_areas {
            let color = color_or_default(area.color.as_deref());
            let y = page_height - area.y - area.height;
            push_rect(&mut ops, color, area.x, y, area.width, area.height);
        }
        ops.push_str("Q\n");
        if append_page_ops(doc, page_id, &ops) {
            painted += page_areas.len();
        }
    }
    painted
}

/// Fill whole pages named by a page specification. Out-of-range pages are
/// skipped. Returns the number of pages painted.
pub fn paint_pages(doc: &mut Document, page_spec: &str, color: Option<&str>) -> usize {
    let fill = color_or_default(color);
    let pages = doc.get_pages();
    let mut painted = 0;
    for page_number in parse_page_numbers(page_spec) {
        let Some(&page_id) = pages.get(&page_number) else {
            debug!("skipping whole-page redaction for missing page {}", page_number);
            continue;
        };
        let (width, height) = page_size(doc, page_id);
        let mut ops = String::from("q\n");
        push_rect(&mut ops, fill, 0.0, 0.0, width, height);
        ops.push_str("Q\n");
        if append_page_ops(doc, page_id, &ops) {
            painted += 1;
        }
    }
    painted
}

/// Paint one inflated box per found-text block. Returns the number of
/// rectangles drawn.
pub fn paint_found_text(
    doc: &mut Document,
    blocks: &[FoundText],
    custom_padding: f64,
    color: Rgb,
) -> usize {
    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
    let mut by_page: HashMap<usize, Vec<&FoundText>> = HashMap::new();
    for block in blocks {
        if block.page_index < pages.len() {
            by_page.entry(block.page_index).or_default().push(block);
        } else {
            debug!("skipping found-text box on missing page {}", block.page_index);
        }
    }

    let mut painted = 0;
    for (page_index, page_blocks) in by_page {
        let page_id = pages[page_index];
        let (_, page_height) = page_size(doc, page_id);
        let mut ops = String::from("q\n");
        for block in &page_blocks {
            let line_height = block.y2 - block.y1;
            let padding = line_height * TEXT_PADDING_MULTIPLIER + custom_padding;
            push_rect(
                &mut ops,
                color,
                block.x1,
                page_height - block.y2 - padding,
                block.x2 - block.x1,
                line_height + 2.0 * padding,
            );
        }
        ops.push_str("Q\n");
        if append_page_ops(doc, page_id, &ops) {
            painted += page_blocks.len();
        }
    }
    painted
}

fn push_rect(ops: &mut String, color: Rgb, x: f64, y: f64, width: f64, height: f64) {
    let _ = writeln!(
        ops,
        "{} {} {} rg\n{} {} {} {} re\nf",
        num(color.r),
        num(color.g),
        num(color.b),
        num(x),
        num(y),
        num(width),
        num(height),
    );
}

/// Media box dimensions, following page-tree inheritance. Letter-sized
/// when the document does not say.
pub fn page_size(doc: &Document, page_id: ObjectId) -> (f64, f64) {
    let mut node = match doc.get_dictionary(page_id) {
        Ok(dict) => dict,
        Err(_) => return (612.0, 792.0),
    };
    for _ in 0..32 {
        if let Ok(media_box) = node.get(b"MediaBox") {
            let resolved = match media_box {
                Object::Reference(id) => doc.get_object(*id).unwrap_or(media_box),
                other => other,
            };
            if let Object::Array(values) = resolved {
                let nums: Vec<f64> = values.iter().filter_map(as_number).collect();
                if nums.len() == 4 {
                    return ((nums[2] - nums[0]).abs(), (nums[3] - nums[1]).abs());
                }
            }
        }
        match node.get(b"Parent") {
            Ok(Object::Reference(id)) => match doc.get_dictionary(*id) {
                Ok(parent) => node = parent,
                Err(_) => break,
            },
            _ => break,
        }
    }
    warn!("page {:?} has no media box; assuming letter size", page_id);
    (612.0, 792.0)
}

fn as_number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(f64::from(*value)),
        _ => None,
    }
}

/// Append drawing operations to a page's content. Returns false when the
/// page content could not be updated; painting other pages continues.
fn append_page_ops(doc: &mut Document, page_id: ObjectId, ops: &str) -> bool {
    let mut content = doc.get_page_content(page_id).unwrap_or_default();
    if !content.is_empty() && !content.ends_with(b"\n") {
        content.push(b'\n');
    }
    content.extend_from_slice(ops.as_bytes());
    match doc.change_page_content(page_id, content) {
        Ok(()) => true,
        Err(err) => {
            warn!("failed to update content for page {:?}: {}", page_id, err);
            false
        }
    }
}

/// Plain decimal formatting for content-stream numbers.
fn num(value: f64) -> String {
    let mut text = format!("{value:.4}");
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.pop();
    }
    text
}
