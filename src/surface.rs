// Copyright (c) 2026 rezky_nightky

use std::str::FromStr;

/// Linear colour with components in `0.0..=255.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32,
            g: g as f32,
            b: b as f32,
        }
    }

    /// Source-over compositing of `top` at opacity `alpha`.
    pub fn blend(self, top: Rgb, alpha: f32) -> Rgb {
        let a = alpha.clamp(0.0, 1.0);
        Rgb {
            r: self.r + (top.r - self.r) * a,
            g: self.g + (top.g - self.g) * a,
            b: self.b + (top.b - self.b) * a,
        }
    }

    pub fn to_u8(self) -> (u8, u8, u8) {
        let q = |v: f32| v.round().clamp(0.0, 255.0) as u8;
        (q(self.r), q(self.g), q(self.b))
    }
}

impl FromStr for Rgb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return Err(format!("invalid colour: {} (expected hex digits)", s));
        }
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return Err(format!("invalid colour: {} (expected RRGGBB or RGB)", s)),
        };
        let byte = |i: usize| {
            u8::from_str_radix(&expanded[i..i + 2], 16)
                .map_err(|_| format!("invalid colour: {} (expected hex digits)", s))
        };
        Ok(Rgb::new(byte(0)?, byte(2)?, byte(4)?))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub rgb: Rgb,
    pub alpha: f32,
}

/// A 2D pixel-addressable drawing target.
///
/// Coordinates are in pixels with the origin at the top-left corner.
/// Anything falling outside the surface is clipped silently.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Composites `color` over the rectangle.
    fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgba);

    /// Draws one glyph whose left edge is `x` and whose baseline is `y`.
    fn fill_text(&mut self, glyph: char, x: u32, y: u32, color: Rgb);

    fn read_pixel(&self, x: u32, y: u32) -> Option<Rgb>;
    fn write_pixel(&mut self, x: u32, y: u32, color: Rgb);
}

/// Host element that owns a [`Surface`] sized to the viewport.
pub trait Canvas {
    type Target: Surface;

    /// Resizes the backing surface to the current viewport and returns the new
    /// pixel size, or `None` while the canvas is not mounted.
    fn fit_viewport(&mut self) -> Option<(u32, u32)>;

    /// The drawing context, when one can be obtained.
    fn surface(&mut self) -> Option<&mut Self::Target>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_hex() {
        assert_eq!("#333".parse::<Rgb>().unwrap(), Rgb::new(0x33, 0x33, 0x33));
        assert_eq!("00ff41".parse::<Rgb>().unwrap(), Rgb::new(0, 0xff, 0x41));
        assert!("12345".parse::<Rgb>().is_err());
        assert!("zzzzzz".parse::<Rgb>().is_err());
    }

    #[test]
    fn blend_moves_toward_top_by_alpha() {
        let c = Rgb::new(200, 100, 0).blend(Rgb::BLACK, 0.05);
        assert!((c.r - 190.0).abs() < 1e-4);
        assert!((c.g - 95.0).abs() < 1e-4);
        assert_eq!(c.b, 0.0);
    }
}
