//! Text measurement for label widths.
//!
//! Label placement needs the width of each label in layout units. The width
//! source is a process-wide collaborator installed once (in the browser, from
//! glyph advances measured on a canvas) and shared read-only afterwards.

use std::collections::HashMap;
use std::sync::OnceLock;

use unicode_width::UnicodeWidthStr;

use crate::error::{LayoutError, Result};

/// Estimates the rendered width of a label made of several display strings.
pub trait TextMeasure: Send + Sync {
    fn measure(&self, texts: &[String]) -> f32;
}

/// Padding applied around measured text, in layout units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelPadding {
    /// Added once per label.
    pub base: f32,
    /// Added once per display string.
    pub per_item: f32,
}

impl Default for LabelPadding {
    fn default() -> Self {
        Self {
            base: 20.0,
            per_item: 25.0,
        }
    }
}

impl LabelPadding {
    fn apply(&self, widths: impl Iterator<Item = f32>) -> f32 {
        self.base + widths.map(|w| w + self.per_item).sum::<f32>()
    }
}

/// Per-character advance table, typically filled from a canvas `measureText`.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphTableMeasure {
    pub default_advance: f32,
    pub advances: HashMap<char, f32>,
    pub padding: LabelPadding,
}

impl GlyphTableMeasure {
    pub fn new(default_advance: f32, advances: HashMap<char, f32>) -> Self {
        Self {
            default_advance,
            advances,
            padding: LabelPadding::default(),
        }
    }

    fn text_width(&self, text: &str) -> f32 {
        text.chars()
            .map(|c| self.advances.get(&c).copied().unwrap_or(self.default_advance))
            .sum()
    }
}

impl TextMeasure for GlyphTableMeasure {
    fn measure(&self, texts: &[String]) -> f32 {
        self.padding.apply(texts.iter().map(|t| self.text_width(t)))
    }
}

/// Monospace estimate: display columns times a fixed column width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedWidthMeasure {
    pub column_width: f32,
    pub padding: LabelPadding,
}

impl FixedWidthMeasure {
    pub fn new(column_width: f32) -> Self {
        Self {
            column_width,
            padding: LabelPadding::default(),
        }
    }
}

impl TextMeasure for FixedWidthMeasure {
    fn measure(&self, texts: &[String]) -> f32 {
        self.padding
            .apply(texts.iter().map(|t| t.width() as f32 * self.column_width))
    }
}

static INSTALLED: OnceLock<Box<dyn TextMeasure>> = OnceLock::new();

/// Install the process-wide measurer.
///
/// Returns `false` (and drops `measure`) if one was already installed.
pub fn install(measure: impl TextMeasure + 'static) -> bool {
    INSTALLED.set(Box::new(measure)).is_ok()
}

/// The installed measurer.
pub fn installed() -> Result<&'static dyn TextMeasure> {
    INSTALLED
        .get()
        .map(|boxed| boxed.as_ref())
        .ok_or(LayoutError::MeasurementUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fixed_width_counts_columns() {
        let measure = FixedWidthMeasure::new(6.0);
        // base 20 + (3 * 6 + 25) + (2 * 6 + 25)
        assert_eq!(measure.measure(&texts(&["abc", "de"])), 100.0);
        assert_eq!(measure.measure(&[]), 20.0);
    }

    #[test]
    fn test_fixed_width_handles_wide_glyphs() {
        let measure = FixedWidthMeasure {
            column_width: 1.0,
            padding: LabelPadding { base: 0.0, per_item: 0.0 },
        };
        assert_eq!(measure.measure(&texts(&["μ"])), 1.0);
        assert_eq!(measure.measure(&texts(&["表"])), 2.0);
    }

    #[test]
    fn test_glyph_table_falls_back_to_default_advance() {
        let mut advances = HashMap::new();
        advances.insert('i', 2.0);
        let measure = GlyphTableMeasure {
            default_advance: 5.0,
            advances,
            padding: LabelPadding { base: 1.0, per_item: 0.5 },
        };
        // 1 + (2 + 5 + 0.5)
        assert_eq!(measure.measure(&texts(&["im"])), 8.5);
    }
}
