//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::Palette;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Number of distinct jewel colours a theme carries.
pub const JEWEL_COLORS: usize = 9;

/// Jewel palette and UI colours loaded from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Jewel colours for colour ids 1..=9: red, green, orange, blue, cyan, yellow,
    /// magenta, white, purple.
    pub jewels: [Color; JEWEL_COLORS],
    /// Wild block.
    pub wild: Color,
    /// Bright frame of the flash animation.
    pub flash: Color,
    /// Playfield background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, stage).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Labels and hidden values.
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

const ONEDARK_JEWELS: [Color; JEWEL_COLORS] = [
    Color::Rgb(0xE0, 0x6C, 0x75), // red
    Color::Rgb(0x98, 0xC3, 0x79), // green
    Color::Rgb(0xD1, 0x9A, 0x66), // orange
    Color::Rgb(0x61, 0xAF, 0xEF), // blue
    Color::Rgb(0x56, 0xB6, 0xC2), // cyan
    Color::Rgb(0xE5, 0xC0, 0x7B), // yellow
    Color::Rgb(0xC6, 0x78, 0xDD), // magenta
    Color::Rgb(0xDC, 0xDF, 0xE4), // white
    Color::Rgb(0x9D, 0x7C, 0xD8), // purple
];

/// btop keys used as fallbacks for the first six jewels when no `jewelN` key is set.
const BTOP_JEWEL_KEYS: [&[&str]; 6] = [
    &["cpu_end", "temp_end"],
    &["mem_box", "cpu_start"],
    &["used_end"],
    &["cpu_box"],
    &["hi_fg", "proc_misc"],
    &["title", "cpu_mid"],
];

impl Theme {
    /// Hardcoded One Dark defaults.
    pub fn onedark_default() -> Self {
        Self {
            jewels: ONEDARK_JEWELS,
            wild: Color::Rgb(0xFF, 0xFF, 0xFF),
            flash: Color::Rgb(0xFF, 0xFF, 0xFF),
            bg: Color::Rgb(0x31, 0x35, 0x3F),       // meter_bg
            div_line: Color::Rgb(0x3F, 0x44, 0x4F), // div_line
            main_fg: Color::Rgb(0xAB, 0xB2, 0xBF),  // main_fg
            title: Color::Rgb(0xE5, 0xC0, 0x7B),    // title
            inactive_fg: Color::Rgb(0x5C, 0x63, 0x70),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or the file is missing.
    /// `palette` selects colour variant: Normal (theme), HighContrast, or Colorblind.
    pub fn load(path: Option<&Path>, palette: Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) if p.exists() => {
                let s = std::fs::read_to_string(p)?;
                Self::from_map(&parse_theme_file(&s))
            }
            _ => Self::onedark_default(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// Override jewel colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: Palette) {
        match palette {
            Palette::Normal => {}
            Palette::HighContrast => {
                self.jewels = [
                    Color::Rgb(0xFF, 0x00, 0x00),
                    Color::Rgb(0x00, 0xFF, 0x00),
                    Color::Rgb(0xFF, 0x88, 0x00),
                    Color::Rgb(0x00, 0x88, 0xFF),
                    Color::Rgb(0x00, 0xFF, 0xFF),
                    Color::Rgb(0xFF, 0xFF, 0x00),
                    Color::Rgb(0xFF, 0x00, 0xFF),
                    Color::Rgb(0xFF, 0xFF, 0xFF),
                    Color::Rgb(0x88, 0x44, 0xFF),
                ];
            }
            Palette::Colorblind => {
                // Paul Tol's vibrant set plus two greys; no red/green pair alone.
                self.jewels = [
                    Color::Rgb(0xCC, 0x33, 0x11),
                    Color::Rgb(0x00, 0x99, 0x88),
                    Color::Rgb(0xEE, 0x77, 0x33),
                    Color::Rgb(0x00, 0x77, 0xBB),
                    Color::Rgb(0x33, 0xBB, 0xEE),
                    Color::Rgb(0xBB, 0xBB, 0x00),
                    Color::Rgb(0xEE, 0x33, 0x77),
                    Color::Rgb(0xDD, 0xDD, 0xDD),
                    Color::Rgb(0x77, 0x77, 0x77),
                ];
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let defaults = Self::onedark_default();
        let mut jewels = defaults.jewels;
        for (i, color) in jewels.iter_mut().enumerate() {
            let fallbacks = BTOP_JEWEL_KEYS.get(i).copied().unwrap_or(&[]);
            if let Some(c) = get(&format!("jewel{}", i + 1))
                .or_else(|| fallbacks.iter().find_map(|&k| get(k)))
            {
                *color = c;
            }
        }
        Self {
            jewels,
            wild: get("wild").unwrap_or(defaults.wild),
            flash: get("flash").or_else(|| get("selected_fg")).unwrap_or(defaults.flash),
            bg: get("meter_bg").unwrap_or(defaults.bg),
            div_line: get("div_line").unwrap_or(defaults.div_line),
            main_fg: get("main_fg").unwrap_or(defaults.main_fg),
            title: get("title").unwrap_or(defaults.title),
            inactive_fg: get("inactive_fg").unwrap_or(defaults.inactive_fg),
        }
    }

    /// Colour for jewel colour id `1..=JEWEL_COLORS`.
    #[inline]
    pub fn jewel_color(&self, color: u8) -> Color {
        let i = usize::from(color.saturating_sub(1)) % JEWEL_COLORS;
        self.jewels[i]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'').to_string();
            if !value.is_empty() {
                map.insert(key.to_string(), value);
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(invalid)
    };
    let (r, g, b) = match s.len() {
        6 => (channel(0..2)?, channel(2..4)?, channel(4..6)?),
        3 => (channel(0..1)? * 17, channel(1..2)? * 17, channel(2..3)? * 17),
        _ => return Err(invalid()),
    };
    Ok(Color::Rgb(r, g, b))
}
