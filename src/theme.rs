//! Badge and row colors, optionally overridden from the `[theme]` config table

use ratatui::style::Color;

use crate::config::ThemeConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub active: Color,      // Badge of an entity that is on/open/playing
    pub inactive: Color,    // Badge of an entity that is off
    pub unavailable: Color, // Badge with no usable state
    pub missing: Color,     // Placeholder for entities absent from the snapshot
    pub text: Color,
    pub text_dim: Color,
    pub focus: Color,       // Background of the focused button
    pub border: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            active: Color::Rgb(255, 193, 7),
            inactive: Color::Rgb(147, 153, 178),
            unavailable: Color::Rgb(88, 91, 112),
            missing: Color::Rgb(252, 229, 136), // #fce588
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            focus: Color::Rgb(69, 71, 90),
            border: Color::Rgb(88, 91, 112),
        }
    }
}

impl Theme {
    pub fn from_config(config: &ThemeConfig) -> Self {
        let defaults = Self::default();
        let pick = |value: &Option<String>, fallback: Color| {
            value
                .as_deref()
                .and_then(|v| {
                    let parsed = Self::parse_hex_color(v);
                    if parsed.is_none() {
                        tracing::warn!("Ignoring invalid theme color {:?}", v);
                    }
                    parsed
                })
                .unwrap_or(fallback)
        };

        Self {
            active: pick(&config.active, defaults.active),
            inactive: pick(&config.inactive, defaults.inactive),
            unavailable: pick(&config.unavailable, defaults.unavailable),
            missing: pick(&config.missing, defaults.missing),
            text: pick(&config.text, defaults.text),
            focus: pick(&config.focus, defaults.focus),
            ..defaults
        }
    }

    /// Parse a hex color string (#RRGGBB or #RGB)
    fn parse_hex_color(s: &str) -> Option<Color> {
        let s = s.trim().trim_start_matches('#');
        if !s.is_ascii() {
            return None;
        }

        if s.len() == 6 {
            let r = u8::from_str_radix(&s[0..2], 16).ok()?;
            let g = u8::from_str_radix(&s[2..4], 16).ok()?;
            let b = u8::from_str_radix(&s[4..6], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        } else if s.len() == 3 {
            let r = u8::from_str_radix(&s[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&s[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&s[2..3], 16).ok()? * 17;
            Some(Color::Rgb(r, g, b))
        } else {
            None
        }
    }
}
