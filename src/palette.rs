// Copyright (c) 2026 rezky_nightky

use std::env;

use crossterm::style::Color;

use crate::cell::Cell;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    Mono,
    Color16,
    Color256,
    TrueColor,
}

impl ColorMode {
    pub fn label(self) -> &'static str {
        match self {
            ColorMode::TrueColor => "24-bit truecolor",
            ColorMode::Color256 => "8-bit (256-color)",
            ColorMode::Color16 => "16-color",
            ColorMode::Mono => "mono",
        }
    }

    pub fn from_bits(bits: u16) -> Option<Self> {
        match bits {
            0 => Some(ColorMode::Mono),
            16 => Some(ColorMode::Color16),
            8 | 256 => Some(ColorMode::Color256),
            24 | 32 => Some(ColorMode::TrueColor),
            _ => None,
        }
    }

    pub fn detect() -> Self {
        let colorterm = env::var("COLORTERM")
            .unwrap_or_default()
            .to_ascii_lowercase();
        let term = env::var("TERM").unwrap_or_default().to_ascii_lowercase();
        Self::from_env_values(&colorterm, &term)
    }

    fn from_env_values(colorterm: &str, term: &str) -> Self {
        if colorterm.contains("truecolor") || colorterm.contains("24bit") {
            return ColorMode::TrueColor;
        }
        if term == "dumb" {
            return ColorMode::Mono;
        }
        if term.contains("256color") {
            return ColorMode::Color256;
        }
        ColorMode::Color16
    }
}

/// What actually reaches the terminal for one cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Presented {
    pub ch: char,
    pub fg: Option<Color>,
    pub bg: Option<Color>,
}

impl Presented {
    pub const BLANK: Presented = Presented {
        ch: ' ',
        fg: None,
        bg: None,
    };
}

fn dist2(a: (u8, u8, u8), b: (u8, u8, u8)) -> i32 {
    let dr = a.0 as i32 - b.0 as i32;
    let dg = a.1 as i32 - b.1 as i32;
    let db = a.2 as i32 - b.2 as i32;
    dr * dr + dg * dg + db * db
}

fn rgb_to_ansi256((r, g, b): (u8, u8, u8)) -> u8 {
    const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

    let level = |v: u8| ((v as u16 * 5 + 127) / 255) as u8;
    let (r6, g6, b6) = (level(r), level(g), level(b));
    let cube = (
        CUBE_LEVELS[r6 as usize],
        CUBE_LEVELS[g6 as usize],
        CUBE_LEVELS[b6 as usize],
    );
    let cube_idx = 16 + 36 * r6 + 6 * g6 + b6;

    let avg = ((r as u16 + g as u16 + b as u16) / 3) as u8;
    let (gray_idx, gray) = match avg {
        0..=7 => (16, 0),
        239..=255 => (231, 255),
        _ => {
            let idx = 232 + (avg - 8) / 10;
            (idx, 8 + 10 * (idx - 232))
        }
    };

    if dist2((r, g, b), (gray, gray, gray)) < dist2((r, g, b), cube) {
        gray_idx
    } else {
        cube_idx
    }
}

const COLOR16: [(Color, (u8, u8, u8)); 16] = [
    (Color::Black, (0, 0, 0)),
    (Color::DarkGrey, (128, 128, 128)),
    (Color::Grey, (192, 192, 192)),
    (Color::White, (255, 255, 255)),
    (Color::DarkRed, (128, 0, 0)),
    (Color::Red, (255, 0, 0)),
    (Color::DarkGreen, (0, 128, 0)),
    (Color::Green, (0, 255, 0)),
    (Color::DarkBlue, (0, 0, 128)),
    (Color::Blue, (0, 0, 255)),
    (Color::DarkCyan, (0, 128, 128)),
    (Color::Cyan, (0, 255, 255)),
    (Color::DarkMagenta, (128, 0, 128)),
    (Color::Magenta, (255, 0, 255)),
    (Color::DarkYellow, (128, 128, 0)),
    (Color::Yellow, (255, 255, 0)),
];

fn rgb_to_color16(rgb: (u8, u8, u8)) -> Color {
    nearest_color16(rgb, None)
}

fn nearest_color16(rgb: (u8, u8, u8), except: Option<Color>) -> Color {
    COLOR16
        .iter()
        .filter(|(c, _)| Some(*c) != except)
        .min_by_key(|(_, c)| dist2(rgb, *c))
        .map(|(c, _)| *c)
        .unwrap_or(Color::White)
}

/// Scales `rgb` so its brightest channel sits at the dark half of the
/// 16-colour table, keeping the hue.
fn lift_to_dark_level((r, g, b): (u8, u8, u8)) -> (u8, u8, u8) {
    let peak = r.max(g).max(b) as u16;
    if peak == 0 {
        return (r, g, b);
    }
    let lift = |v: u8| ((v as u16 * 128 + peak / 2) / peak) as u8;
    (lift(r), lift(g), lift(b))
}

pub fn term_color(rgb: (u8, u8, u8), mode: ColorMode) -> Option<Color> {
    match mode {
        ColorMode::Mono => None,
        ColorMode::Color16 => Some(rgb_to_color16(rgb)),
        ColorMode::Color256 => Some(Color::AnsiValue(rgb_to_ansi256(rgb))),
        ColorMode::TrueColor => Some(Color::Rgb {
            r: rgb.0,
            g: rgb.1,
            b: rgb.2,
        }),
    }
}

fn luma((r, g, b): (u8, u8, u8)) -> i32 {
    (r as i32 * 299 + g as i32 * 587 + b as i32 * 114) / 1000
}

/// Quantizes a cell for `mode`. Glyphs that no longer stand out from their
/// background turn into blanks.
pub fn present(cell: &Cell, mode: ColorMode) -> Presented {
    let fg = cell.fg.to_u8();
    let bg = cell.bg.to_u8();

    let stands_out = luma(fg) - luma(bg) > 16;
    if mode == ColorMode::Mono {
        let visible = !cell.is_blank() && stands_out;
        return Presented {
            ch: if visible { cell.ch } else { ' ' },
            ..Presented::BLANK
        };
    }

    let (fg_rgb, bg) = (fg, term_color(bg, mode));
    let mut fg = term_color(fg_rgb, mode);
    // Dim glyphs collapse onto the background in the 16-colour table.
    if mode == ColorMode::Color16 && fg == bg && stands_out {
        fg = Some(nearest_color16(lift_to_dark_level(fg_rgb), bg));
    }
    if cell.is_blank() || fg == bg {
        return Presented {
            ch: ' ',
            fg: None,
            bg,
        };
    }
    Presented { ch: cell.ch, fg, bg }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rain::RainParams;
    use crate::surface::Rgb;

    #[test]
    fn colormode_bits_accept_aliases() {
        assert_eq!(ColorMode::from_bits(8), Some(ColorMode::Color256));
        assert_eq!(ColorMode::from_bits(256), Some(ColorMode::Color256));
        assert_eq!(ColorMode::from_bits(32), Some(ColorMode::TrueColor));
        assert_eq!(ColorMode::from_bits(12), None);
    }

    #[test]
    fn detection_prefers_colorterm() {
        assert_eq!(
            ColorMode::from_env_values("truecolor", "xterm"),
            ColorMode::TrueColor
        );
        assert_eq!(ColorMode::from_env_values("", "dumb"), ColorMode::Mono);
        assert_eq!(
            ColorMode::from_env_values("", "xterm-256color"),
            ColorMode::Color256
        );
        assert_eq!(ColorMode::from_env_values("", "vt100"), ColorMode::Color16);
    }

    #[test]
    fn ansi256_maps_greys_and_cube() {
        assert_eq!(rgb_to_ansi256((0, 0, 0)), 16);
        assert_eq!(rgb_to_ansi256((255, 255, 255)), 231);
        assert_eq!(rgb_to_ansi256((0x33, 0x33, 0x33)), 236);
        assert_eq!(rgb_to_ansi256((255, 0, 0)), 196);
    }

    #[test]
    fn faded_glyph_presents_as_blank() {
        let bg = Rgb::BLACK;
        let cell = Cell {
            ch: '1',
            fg: Rgb::new(1, 1, 1),
            bg,
        };
        assert_eq!(present(&cell, ColorMode::Color256).ch, ' ');
        assert_eq!(present(&cell, ColorMode::Mono).ch, ' ');

        let lit = Cell {
            fg: Rgb::new(0x33, 0x33, 0x33),
            ..cell
        };
        assert_eq!(present(&lit, ColorMode::TrueColor).ch, '1');
        assert_eq!(present(&lit, ColorMode::Mono).ch, '1');
    }

    #[test]
    fn default_ink_stays_visible_with_sixteen_colours() {
        let params = RainParams::default();
        let cell = Cell {
            ch: '1',
            fg: params.ink,
            bg: params.shade,
        };
        let p = present(&cell, ColorMode::Color16);
        assert_eq!(p.ch, '1');
        assert_eq!(p.fg, Some(Color::DarkGrey));
        assert_eq!(p.bg, Some(Color::Black));

        let faded = Cell {
            fg: Rgb::new(0x0c, 0x0c, 0x0c),
            ..cell
        };
        assert_eq!(present(&faded, ColorMode::Color16).ch, ' ');

        let green = Cell {
            fg: Rgb::new(0x00, 0x30, 0x10),
            ..cell
        };
        assert_eq!(
            present(&green, ColorMode::Color16).fg,
            Some(Color::DarkGreen)
        );
    }
}
