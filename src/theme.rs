//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Piece colours by catalog index plus the few UI colours the game draws with.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Active piece colour for catalog index 0..7 (T, M, N, I, O, L, Z).
    pub pieces: [Color; 7],
    /// Walls and locked cells.
    pub wall: Color,
    /// Playfield background.
    pub bg: Color,
    /// Border lines.
    pub div_line: Color,
    /// Text (score, legend).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Game over banner.
    pub alert: Color,
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
        Self::console_default()
    }
}

/// Classic 16-colour console palette: index 0 is green, others take the console
/// colour with the same number (blue, green, cyan, red, magenta, brown).
const CONSOLE_PIECES: [&str; 7] = [
    "#00AA00", "#0000AA", "#00AA00", "#00AAAA", "#AA0000", "#AA00AA", "#AA5500",
];

/// Theme file keys tried for each piece slot, in order.
const PIECE_KEYS: [&[&str]; 7] = [
    &["piece_t", "mem_box"],
    &["piece_m", "cpu_box"],
    &["piece_n", "cpu_start"],
    &["piece_i", "hi_fg"],
    &["piece_o", "cpu_end"],
    &["piece_l", "net_box"],
    &["piece_z", "title"],
];

impl Theme {
    pub fn console_default() -> Self {
        Self {
            pieces: CONSOLE_PIECES.map(hex_or_gray),
            wall: hex_or_gray("#FFFFFF"),
            bg: Color::Reset,
            div_line: hex_or_gray("#555555"),
            main_fg: hex_or_gray("#AAAAAA"),
            title: hex_or_gray("#FFFF55"),
            alert: hex_or_gray("#FF5555"),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to console defaults if path is None or the file is missing.
    /// `palette` then overrides the piece colours.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) if p.exists() => Self::from_map(&parse_theme_file(&std::fs::read_to_string(p)?)),
            _ => Self::default(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// Override piece colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        let pieces = match palette {
            crate::Palette::Normal => return,
            crate::Palette::HighContrast => [
                "#00FF00", "#0088FF", "#FFFF00", "#00FFFF", "#FF0000", "#FF00FF", "#FF8800",
            ],
            // Okabe-Ito style: distinguishable without red/green cues.
            crate::Palette::Colorblind => [
                "#009E73", "#0072B2", "#F0E442", "#56B4E9", "#D55E00", "#CC79A7", "#E69F00",
            ],
        };
        self.pieces = pieces.map(hex_or_gray);
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let defaults = Self::console_default();
        let mut pieces = defaults.pieces;
        for (slot, keys) in pieces.iter_mut().zip(PIECE_KEYS) {
            if let Some(c) = keys.iter().find_map(|k| get(k)) {
                *slot = c;
            }
        }
        Self {
            pieces,
            wall: get("wall").or_else(|| get("main_fg")).unwrap_or(defaults.wall),
            bg: get("main_bg").unwrap_or(defaults.bg),
            div_line: get("div_line").unwrap_or(defaults.div_line),
            main_fg: get("main_fg").unwrap_or(defaults.main_fg),
            title: get("title").unwrap_or(defaults.title),
            alert: get("temp_end").unwrap_or(defaults.alert),
        }
    }

    /// Colour for a piece's catalog index.
    #[inline]
    pub fn piece_color(&self, index: usize) -> Color {
        self.pieces[index % self.pieces.len()]
    }
}

fn hex_or_gray(s: &str) -> Color {
    parse_hex(s).unwrap_or(Color::Gray)
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
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let channel = |from: usize, to: usize| {
        s.get(from..to)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(|| ThemeError::InvalidHex(s.to_string()))
    };
    let (r, g, b) = match s.len() {
        6 => (channel(0, 2)?, channel(2, 4)?, channel(4, 6)?),
        3 => (channel(0, 1)? * 17, channel(1, 2)? * 17, channel(2, 3)? * 17),
        _ => return Err(ThemeError::InvalidHex(s.to_string())),
    };
    Ok(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Palette;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#98C379").unwrap();
        assert!(matches!(c, Color::Rgb(0x98, 0xC3, 0x79)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(matches!(parse_hex("#12"), Err(ThemeError::InvalidHex(_))));
        assert!(matches!(parse_hex("#GGGGGG"), Err(ThemeError::InvalidHex(_))));
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[main_bg]="#31353F""##);
        assert_eq!(map.get("main_bg"), Some(&"#31353F".to_string()));
    }

    #[test]
    fn test_theme_keys_override_defaults() {
        let map = parse_theme_file(
            r##"
            # comment
            theme[piece_i]="#112233"
            theme[wall]='#FFF'
            "##,
        );
        let theme = Theme::from_map(&map);
        assert_eq!(theme.piece_color(3), Color::Rgb(0x11, 0x22, 0x33));
        assert_eq!(theme.wall, Color::Rgb(255, 255, 255));
        assert_eq!(theme.piece_color(0), Theme::console_default().piece_color(0));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let theme = Theme::load(Some(Path::new("/nonexistent/blocktui.theme")), Palette::Normal).unwrap();
        assert_eq!(theme.pieces, Theme::console_default().pieces);
    }

    #[test]
    fn test_palette_overrides_pieces_only() {
        let theme = Theme::load(None, Palette::HighContrast).unwrap();
        assert_eq!(theme.piece_color(0), Color::Rgb(0, 255, 0));
        assert_eq!(theme.wall, Theme::console_default().wall);
    }
}
