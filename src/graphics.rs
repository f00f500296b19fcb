//! Font-selection state tracked across a page scan.

use std::sync::Arc;

use crate::fonts::FontMetrics;

/// The slice of graphics state the text pipeline cares about: the active
/// font and size, mutated only by the font-selection operator.
///
/// This is a plain value threaded through the extraction pass, never a
/// shared field, so page-level parallelism needs no locking. Nested
/// save/restore (`q`/`Q`) is intentionally not modeled: font selection
/// always precedes the text-showing operators it applies to in encountered
/// order, so "most recently seen" is sufficient for width lookups.
#[derive(Debug, Clone, Default)]
pub struct GraphicsState {
    pub font: Option<Arc<FontMetrics>>,
    pub font_size: f64,
}

impl GraphicsState {
    /// State after a font-selection operator. An unresolvable font name
    /// clears the font: affected segments still get placeholder
    /// substitution, just no width compensation.
    pub fn select_font(self, font: Option<Arc<FontMetrics>>, font_size: f64) -> Self {
        Self { font, font_size }
    }
}
