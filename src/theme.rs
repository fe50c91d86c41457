//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::grid::TileKind;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Tile colours plus board chrome.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Indexed by tile kind code: red, green, blue, yellow, purple, wildcard.
    pub tiles: [Color; 6],
    /// Board background and empty cells.
    pub bg: Color,
    /// Borders and cell outlines.
    pub div_line: Color,
    /// Body text.
    pub main_fg: Color,
    /// Titles, score, selected menu entry.
    pub title: Color,
    /// Hints and unselected entries.
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

const ONEDARK_TILES: [Color; 6] = [
    Color::Rgb(0xE0, 0x6C, 0x75), // red
    Color::Rgb(0x98, 0xC3, 0x79), // green
    Color::Rgb(0x61, 0xAF, 0xEF), // blue
    Color::Rgb(0xE5, 0xC0, 0x7B), // yellow
    Color::Rgb(0xC6, 0x78, 0xDD), // magenta
    Color::Rgb(0xDC, 0xDF, 0xE4), // fg, the wildcard
];

const HIGH_CONTRAST_TILES: [Color; 6] = [
    Color::Rgb(0xFF, 0x00, 0x00),
    Color::Rgb(0x00, 0xFF, 0x00),
    Color::Rgb(0x00, 0x88, 0xFF),
    Color::Rgb(0xFF, 0xFF, 0x00),
    Color::Rgb(0xFF, 0x00, 0xFF),
    Color::Rgb(0xFF, 0xFF, 0xFF),
];

/// Tol bright scheme; never leans on red against green alone.
const COLORBLIND_TILES: [Color; 6] = [
    Color::Rgb(0xCC, 0x33, 0x11),
    Color::Rgb(0x00, 0x99, 0x88),
    Color::Rgb(0x00, 0x77, 0xBB),
    Color::Rgb(0xEE, 0x77, 0x33),
    Color::Rgb(0xEE, 0x33, 0x77),
    Color::Rgb(0xBB, 0xBB, 0xBB),
];

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

impl Theme {
    /// One Dark values from onedark.theme.
    pub const fn onedark_default() -> Self {
        Self {
            tiles: ONEDARK_TILES,
            bg: Color::Rgb(0x31, 0x35, 0x3F),
            div_line: Color::Rgb(0x3F, 0x44, 0x4F),
            main_fg: Color::Rgb(0xAB, 0xB2, 0xBF),
            title: Color::Rgb(0xE5, 0xC0, 0x7B),
            inactive_fg: Color::Rgb(0x5C, 0x63, 0x70),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or the file is missing.
    /// `palette` then swaps the tile colours for high-contrast or colorblind variants.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            Some(p) => {
                warn!(path = %p.display(), "theme file not found, using defaults");
                return Ok(Self::default_for_palette(palette));
            }
            None => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        debug!(path = %path.display(), keys = map.len(), "loaded theme");
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        Ok(theme)
    }

    fn default_for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::onedark_default();
        t.apply_palette(palette);
        t
    }

    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => self.tiles = HIGH_CONTRAST_TILES,
            crate::Palette::Colorblind => self.tiles = COLORBLIND_TILES,
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let d = Self::onedark_default();
        let [red, green, blue, yellow, purple, wild] = d.tiles;
        Self {
            tiles: [
                get("cpu_end").or_else(|| get("temp_end")).unwrap_or(red),
                get("mem_box").or_else(|| get("cpu_start")).unwrap_or(green),
                get("cpu_box").unwrap_or(blue),
                get("cpu_mid").or_else(|| get("title")).unwrap_or(yellow),
                get("net_box").unwrap_or(purple),
                get("hi_fg").or_else(|| get("main_fg")).unwrap_or(wild),
            ],
            bg: get("meter_bg").unwrap_or(d.bg),
            div_line: get("div_line").unwrap_or(d.div_line),
            main_fg: get("main_fg").unwrap_or(d.main_fg),
            title: get("title").unwrap_or(d.title),
            inactive_fg: get("inactive_fg").unwrap_or(d.inactive_fg),
        }
    }

    #[inline]
    pub fn tile_color(&self, kind: TileKind) -> Color {
        self.tiles[kind.code().rem_euclid(6) as usize]
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
        let Some((key, rest)) = stripped.split_once(']') else {
            continue;
        };
        if let Some((_, value)) = rest.split_once('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.trim().to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    if !s.is_ascii() {
        return Err(invalid());
    }
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(invalid)
    };
    match s.len() {
        6 => Ok(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        3 => Ok(Color::Rgb(
            channel(0..1)? * 17,
            channel(1..2)? * 17,
            channel(2..3)? * 17,
        )),
        _ => Err(invalid()),
    }
}
