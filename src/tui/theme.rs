//! Theme tokens and the accessibility profile shared by every renderer.
//!
//! Panels only speak in [`Tone`]s; the palette turns a tone into a color tag
//! that the terminal layer (crossterm in the dashboard, `colored` in one-shot
//! output) maps to a concrete color.

#![allow(missing_docs)]

use std::env;

use crate::panel::badge::Tone;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContrastMode {
    Standard,
    High,
}

/// Color output mode for compatibility with `NO_COLOR` and terminal policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessibilityProfile {
    pub contrast: ContrastMode,
    pub color: ColorMode,
}

impl Default for AccessibilityProfile {
    fn default() -> Self {
        Self {
            contrast: ContrastMode::Standard,
            color: ColorMode::Enabled,
        }
    }
}

impl AccessibilityProfile {
    #[must_use]
    pub const fn from_no_color_flag(no_color: bool) -> Self {
        Self {
            contrast: ContrastMode::Standard,
            color: if no_color {
                ColorMode::Disabled
            } else {
                ColorMode::Enabled
            },
        }
    }

    /// `NO_COLOR` in the environment, or the config/CLI flag, turns color off.
    #[must_use]
    pub fn from_environment(no_color_flag: bool) -> Self {
        let no_color = no_color_flag || env::var_os("NO_COLOR").is_some();
        Self::from_no_color_flag(no_color)
    }

    #[must_use]
    pub const fn no_color(self) -> bool {
        matches!(self.color, ColorMode::Disabled)
    }
}

/// Render-facing palette entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteEntry {
    pub tone: Tone,
    pub color_tag: &'static str,
    pub bold: bool,
}

impl PaletteEntry {
    const fn new(tone: Tone, color_tag: &'static str, bold: bool) -> Self {
        Self {
            tone,
            color_tag,
            bold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemePalette {
    pub accent: PaletteEntry,
    pub success: PaletteEntry,
    pub warning: PaletteEntry,
    pub danger: PaletteEntry,
    pub critical: PaletteEntry,
    pub muted: PaletteEntry,
    pub neutral: PaletteEntry,
}

impl ThemePalette {
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            accent: PaletteEntry::new(Tone::Accent, "cyan", false),
            success: PaletteEntry::new(Tone::Success, "green", false),
            warning: PaletteEntry::new(Tone::Warning, "yellow", false),
            danger: PaletteEntry::new(Tone::Danger, "red", false),
            critical: PaletteEntry::new(Tone::Critical, "magenta", true),
            muted: PaletteEntry::new(Tone::Muted, "dark-grey", false),
            neutral: PaletteEntry::new(Tone::Neutral, "white", false),
        }
    }

    #[must_use]
    pub const fn high_contrast() -> Self {
        Self {
            accent: PaletteEntry::new(Tone::Accent, "bright-cyan", true),
            success: PaletteEntry::new(Tone::Success, "bright-green", false),
            warning: PaletteEntry::new(Tone::Warning, "bright-yellow", false),
            danger: PaletteEntry::new(Tone::Danger, "bright-red", true),
            critical: PaletteEntry::new(Tone::Critical, "bright-red", true),
            muted: PaletteEntry::new(Tone::Muted, "grey", false),
            neutral: PaletteEntry::new(Tone::Neutral, "bright-white", false),
        }
    }

    #[must_use]
    pub const fn from_contrast(mode: ContrastMode) -> Self {
        match mode {
            ContrastMode::Standard => Self::standard(),
            ContrastMode::High => Self::high_contrast(),
        }
    }

    #[must_use]
    pub const fn for_tone(self, tone: Tone) -> PaletteEntry {
        match tone {
            Tone::Accent => self.accent,
            Tone::Success => self.success,
            Tone::Warning => self.warning,
            Tone::Danger => self.danger,
            Tone::Critical => self.critical,
            Tone::Muted => self.muted,
            Tone::Neutral => self.neutral,
        }
    }
}

/// Palette plus accessibility profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub accessibility: AccessibilityProfile,
    pub palette: ThemePalette,
}

impl Theme {
    #[must_use]
    pub const fn new(accessibility: AccessibilityProfile) -> Self {
        Self {
            palette: ThemePalette::from_contrast(accessibility.contrast),
            accessibility,
        }
    }

    /// Color tag for a tone, `None` when color is off.
    #[must_use]
    pub const fn color(self, tone: Tone) -> Option<&'static str> {
        if self.accessibility.no_color() {
            None
        } else {
            Some(self.palette.for_tone(tone).color_tag)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_color_profile_disables_color_mode() {
        let profile = AccessibilityProfile::from_no_color_flag(true);
        assert!(profile.no_color());
        assert_eq!(Theme::new(profile).color(Tone::Danger), None);
        assert!(AccessibilityProfile::from_environment(true).no_color());
    }

    #[test]
    fn every_tone_has_a_palette_entry() {
        let palette = ThemePalette::standard();
        for tone in [
            Tone::Accent,
            Tone::Success,
            Tone::Warning,
            Tone::Danger,
            Tone::Critical,
            Tone::Muted,
            Tone::Neutral,
        ] {
            assert_eq!(palette.for_tone(tone).tone, tone);
        }
        assert_eq!(palette.for_tone(Tone::Critical).color_tag, "magenta");
    }

    #[test]
    fn high_contrast_brightens_accent() {
        let theme = Theme::new(AccessibilityProfile {
            contrast: ContrastMode::High,
            color: ColorMode::Enabled,
        });
        assert_eq!(theme.color(Tone::Accent), Some("bright-cyan"));
    }
}
