//! Font metrics backing kerning compensation.
//!
//! Width lookups feed the planner's width deltas. Metrics come from the
//! page's font resources: a `/Widths` array when the document embeds one,
//! a fixed advance for the Courier family, and a rough per-family average
//! for the remaining standard fonts. When none of these apply (notably
//! subset fonts, whose width tables routinely disagree with the embedded
//! program) the metrics report themselves unreliable and callers skip
//! compensation entirely. Redacting the text still succeeds in that case;
//! only layout correction degrades. That trade is deliberate: correctness
//! of redaction outranks layout fidelity.

use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::debug;

/// Glyph-space units per em; widths are expressed in thousandths.
pub const FONT_UNITS_PER_EM: f64 = 1000.0;

lazy_static! {
    /// Average advance widths for the standard families, in glyph units.
    /// Used only when the document embeds no width table.
    static ref STANDARD_FAMILY_WIDTHS: Vec<(&'static str, f64)> = vec![
        ("Courier", 600.0),
        ("Helvetica", 513.0),
        ("Arial", 513.0),
        ("Times", 489.0),
        ("Symbol", 587.0),
        ("ZapfDingbats", 746.0),
    ];
}

#[derive(Debug, Clone)]
enum WidthSource {
    /// Embedded `/Widths` array addressed from `/FirstChar`.
    PerGlyph { first_char: i64, widths: Vec<f64> },
    /// Every glyph advances the same amount (Courier family, or a
    /// standard-family average).
    Uniform(f64),
}

/// Width metrics for one page font resource.
#[derive(Debug, Clone)]
pub struct FontMetrics {
    /// Resource name the font is selected by (`F1`, ...).
    pub resource_name: String,
    /// Base font name from the font dictionary, when present.
    pub base_font: Option<String>,
    source: Option<WidthSource>,
    missing_width: f64,
    reliable: bool,
}

impl FontMetrics {
    /// Advance width of one character code, in glyph units.
    pub fn glyph_width(&self, code: u8) -> f64 {
        match &self.source {
            Some(WidthSource::PerGlyph { first_char, widths }) => {
                let index = code as i64 - first_char;
                if index >= 0 && (index as usize) < widths.len() {
                    let width = widths[index as usize];
                    if width > 0.0 {
                        return width;
                    }
                }
                self.missing_width
            }
            Some(WidthSource::Uniform(width)) => *width,
            None => self.missing_width,
        }
    }

    /// Width of `text` drawn at `font_size`, in text-space units, or `None`
    /// when the metrics are too unreliable to base kerning on.
    pub fn text_width(&self, text: &str, font_size: f64) -> Option<f64> {
        if !self.reliable || font_size <= 0.0 {
            return None;
        }
        let units: f64 = text
            .chars()
            .map(|c| self.glyph_width(if (c as u32) <= 0xFF { c as u8 } else { 0 }))
            .sum();
        Some(units / FONT_UNITS_PER_EM * font_size)
    }

    /// Whether width computation can be trusted for this font.
    pub fn is_reliable(&self) -> bool {
        self.reliable
    }

    /// Build metrics from a font dictionary. `doc` resolves indirect
    /// references inside the dictionary.
    pub fn from_dict(doc: &Document, resource_name: &str, dict: &Dictionary) -> Self {
        let base_font = dict
            .get(b"BaseFont")
            .ok()
            .map(|obj| resolve(doc, obj))
            .and_then(name_to_string);
        let subset = base_font.as_deref().is_some_and(is_subset_font_name);

        let missing_width = dict
            .get(b"FontDescriptor")
            .ok()
            .map(|obj| resolve(doc, obj))
            .and_then(|obj| as_dict(obj))
            .and_then(|descriptor| descriptor.get(b"MissingWidth").ok())
            .and_then(number)
            .unwrap_or(0.0);

        let widths = dict
            .get(b"Widths")
            .ok()
            .map(|obj| resolve(doc, obj))
            .and_then(|obj| match obj {
                Object::Array(items) => Some(
                    items
                        .iter()
                        .map(|item| number(resolve(doc, item)).unwrap_or(0.0))
                        .collect::<Vec<f64>>(),
                ),
                _ => None,
            });

        let first_char = dict.get(b"FirstChar").ok().and_then(number).unwrap_or(0.0) as i64;

        let (source, reliable) = match widths {
            Some(widths) if !widths.is_empty() => {
                // Subset width tables routinely disagree with the embedded
                // program; do not base kerning on them.
                (Some(WidthSource::PerGlyph { first_char, widths }), !subset)
            }
            _ => match family_width(base_font.as_deref()) {
                Some(width) => (Some(WidthSource::Uniform(width)), !subset),
                None => {
                    debug!(
                        "no usable width source for font '{}' ({:?})",
                        resource_name, base_font
                    );
                    (None, false)
                }
            },
        };

        Self {
            resource_name: resource_name.to_string(),
            base_font,
            source,
            missing_width,
            reliable,
        }
    }
}

/// Per-page map from resource font names to shared metrics.
#[derive(Debug, Clone, Default)]
pub struct FontTable {
    map: HashMap<String, Arc<FontMetrics>>,
}

impl FontTable {
    pub fn get(&self, resource_name: &str) -> Option<Arc<FontMetrics>> {
        self.map.get(resource_name).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[cfg(test)]
    pub fn insert_for_test(&mut self, name: &str, metrics: FontMetrics) {
        self.map.insert(name.to_string(), Arc::new(metrics));
    }
}

/// Collect metrics for every font in the page's resources, following the
/// page-tree inheritance chain when the page itself carries none.
pub fn build_font_table(doc: &Document, page_id: ObjectId) -> FontTable {
    let mut map = HashMap::new();
    if let Some(fonts) = page_font_dict(doc, page_id) {
        for (name, value) in fonts.iter() {
            let resource_name = String::from_utf8_lossy(name).into_owned();
            if let Some(dict) = as_dict(resolve(doc, value)) {
                let metrics = FontMetrics::from_dict(doc, &resource_name, dict);
                map.insert(resource_name, Arc::new(metrics));
            }
        }
    }
    FontTable { map }
}

fn page_font_dict<'a>(doc: &'a Document, page_id: ObjectId) -> Option<&'a Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    // Walk up the page tree; resources may be inherited from any ancestor.
    for _ in 0..32 {
        if let Ok(resources) = node.get(b"Resources") {
            if let Some(resources) = as_dict(resolve(doc, resources)) {
                if let Ok(fonts) = resources.get(b"Font") {
                    return as_dict(resolve(doc, fonts));
                }
            }
        }
        match node.get(b"Parent") {
            Ok(Object::Reference(id)) => node = doc.get_dictionary(*id).ok()?,
            _ => return None,
        }
    }
    None
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    if let Object::Reference(id) = obj {
        doc.get_object(*id).unwrap_or(obj)
    } else {
        obj
    }
}

fn as_dict(obj: &Object) -> Option<&Dictionary> {
    match obj {
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(f64::from(*value)),
        _ => None,
    }
}

fn name_to_string(obj: &Object) -> Option<String> {
    match obj {
        Object::Name(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    }
}

/// Subset fonts are tagged `ABCDEF+BaseName`.
fn is_subset_font_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() > 7
        && bytes[..6].iter().all(u8::is_ascii_uppercase)
        && bytes[6] == b'+'
}

fn family_width(base_font: Option<&str>) -> Option<f64> {
    let name = base_font?;
    let name = name.split_once('+').map_or(name, |(_, rest)| rest);
    STANDARD_FAMILY_WIDTHS
        .iter()
        .find(|(family, _)| name.starts_with(family))
        .map(|(_, width)| *width)
}
