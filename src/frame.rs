// Copyright (c) 2026 rezky_nightky

use crate::cell::Cell;
use crate::surface::{Rgb, Rgba, Surface};

/// Terminal-backed pixel surface.
///
/// Every terminal cell covers a `cell_px` by `cell_px` square of pixels, so a
/// frame of `cols` by `rows` cells reports `cols * cell_px` by
/// `rows * cell_px` pixels.
#[derive(Clone, Debug)]
pub struct Frame {
    pub cols: u16,
    pub rows: u16,
    cell_px: u32,
    cells: Vec<Cell>,
    dirty_all: bool,
}

impl Frame {
    pub fn new(cols: u16, rows: u16, cell_px: u32, bg: Rgb) -> Self {
        let len = cols as usize * rows as usize;
        Self {
            cols,
            rows,
            cell_px: cell_px.max(1),
            cells: vec![Cell::blank_with_bg(bg); len],
            dirty_all: true,
        }
    }

    pub fn cell_px(&self) -> u32 {
        self.cell_px
    }

    /// True until the first draw after construction.
    pub fn is_dirty_all(&self) -> bool {
        self.dirty_all
    }

    pub fn clear_dirty(&mut self) {
        self.dirty_all = false;
    }

    pub fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x >= self.cols || y >= self.rows {
            return None;
        }
        Some(y as usize * self.cols as usize + x as usize)
    }

    #[allow(dead_code)]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub fn cell_at_index(&self, i: usize) -> Cell {
        self.cells[i]
    }

    fn cell_of_pixel(&self, x: u32, y: u32) -> Option<usize> {
        let col = u16::try_from(x / self.cell_px).ok()?;
        let row = u16::try_from(y / self.cell_px).ok()?;
        self.index(col, row)
    }
}

impl Surface for Frame {
    fn width(&self) -> u32 {
        self.cols as u32 * self.cell_px
    }

    fn height(&self) -> u32 {
        self.rows as u32 * self.cell_px
    }

    fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgba) {
        if w == 0 || h == 0 {
            return;
        }
        let px = self.cell_px as u64;
        let col0 = (x as u64 / px).min(self.cols as u64) as usize;
        let col1 = ((x as u64 + w as u64).div_ceil(px)).min(self.cols as u64) as usize;
        let row0 = (y as u64 / px).min(self.rows as u64) as usize;
        let row1 = ((y as u64 + h as u64).div_ceil(px)).min(self.rows as u64) as usize;

        let stride = self.cols as usize;
        for row in row0..row1 {
            for cell in &mut self.cells[row * stride + col0..row * stride + col1] {
                cell.fg = cell.fg.blend(color.rgb, color.alpha);
                cell.bg = cell.bg.blend(color.rgb, color.alpha);
            }
        }
    }

    fn fill_text(&mut self, glyph: char, x: u32, y: u32, color: Rgb) {
        // The glyph sits in the cell whose bottom edge is the baseline.
        if y == 0 {
            return;
        }
        let Some(i) = self.cell_of_pixel(x, y - 1) else {
            return;
        };
        let cell = &mut self.cells[i];
        cell.ch = glyph;
        cell.fg = color;
    }

    fn read_pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        self.cell_of_pixel(x, y).map(|i| self.cells[i].bg)
    }

    fn write_pixel(&mut self, x: u32, y: u32, color: Rgb) {
        if let Some(i) = self.cell_of_pixel(x, y) {
            let cell = &mut self.cells[i];
            cell.bg = color;
            if cell.is_blank() {
                cell.fg = color;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INK: Rgb = Rgb::new(0x33, 0x33, 0x33);

    #[test]
    fn pixel_size_scales_with_cell_px() {
        let f = Frame::new(10, 4, 14, Rgb::BLACK);
        assert_eq!(f.width(), 140);
        assert_eq!(f.height(), 56);
    }

    #[test]
    fn baseline_selects_the_cell_above_it() {
        let mut f = Frame::new(10, 4, 14, Rgb::BLACK);
        f.fill_text('1', 28, 14, INK);
        assert_eq!(f.get(2, 0).unwrap().ch, '1');

        f.fill_text('0', 0, 56, INK);
        assert_eq!(f.get(0, 3).unwrap().ch, '0');
    }

    #[test]
    fn text_outside_the_surface_is_clipped() {
        let mut f = Frame::new(2, 2, 14, Rgb::BLACK);
        f.fill_text('1', 0, 0, INK);
        f.fill_text('1', 0, 14 * 3, INK);
        f.fill_text('1', 14 * 5, 14, INK);
        assert!((0..2).all(|y| (0..2).all(|x| f.get(x, y).unwrap().is_blank())));
    }

    #[test]
    fn translucent_overlay_fades_glyphs_gradually() {
        let mut f = Frame::new(1, 1, 14, Rgb::BLACK);
        f.fill_text('0', 0, 14, INK);
        let shade = Rgba {
            rgb: Rgb::BLACK,
            alpha: 0.05,
        };

        f.fill_rect(0, 0, f.width(), f.height(), shade);
        let once = f.get(0, 0).unwrap().fg.r;
        assert!(once < INK.r && once > 0.0);

        for _ in 0..200 {
            f.fill_rect(0, 0, f.width(), f.height(), shade);
        }
        assert_eq!(f.get(0, 0).unwrap().fg.to_u8(), (0, 0, 0));
    }

    #[test]
    fn partial_rect_touches_only_overlapping_cells() {
        let mut f = Frame::new(3, 1, 10, Rgb::BLACK);
        let white = Rgba {
            rgb: Rgb::new(255, 255, 255),
            alpha: 1.0,
        };
        f.fill_rect(12, 0, 5, 10, white);
        assert_eq!(f.get(0, 0).unwrap().bg, Rgb::BLACK);
        assert_eq!(f.get(1, 0).unwrap().bg.to_u8(), (255, 255, 255));
        assert_eq!(f.get(2, 0).unwrap().bg, Rgb::BLACK);
    }

    #[test]
    fn pixels_round_trip_through_cell_background() {
        let mut f = Frame::new(2, 2, 14, Rgb::BLACK);
        let red = Rgb::new(255, 0, 0);
        f.write_pixel(20, 20, red);
        assert_eq!(f.read_pixel(15, 27), Some(red));
        assert_eq!(f.read_pixel(0, 0), Some(Rgb::BLACK));
        assert_eq!(f.read_pixel(28, 0), None);
    }
}
