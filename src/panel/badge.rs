//! Visual treatment of categorical values, independent of any terminal.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

/// Semantic color slot. Renderers map tones to concrete colors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Accent,
    Success,
    Warning,
    Danger,
    Critical,
    Muted,
    #[default]
    Neutral,
}

/// Color, glyph and label for one categorical value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub tone: Tone,
    /// Single-width glyph shown before the label.
    pub glyph: &'static str,
    pub label: &'static str,
}

impl Badge {
    #[must_use]
    pub const fn new(tone: Tone, glyph: &'static str, label: &'static str) -> Self {
        Self { tone, glyph, label }
    }

    /// `"✓ Complete"`, or just the label when glyphs are off.
    #[must_use]
    pub fn text(&self, glyphs: bool) -> String {
        if glyphs && !self.glyph.is_empty() {
            format!("{} {}", self.glyph, self.label)
        } else {
            self.label.to_string()
        }
    }
}
