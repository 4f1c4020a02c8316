// Copyright (c) 2026 rezky_nightky

use crate::surface::Rgb;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    pub ch: char,
    pub fg: Rgb,
    pub bg: Rgb,
}

impl Cell {
    pub fn blank_with_bg(bg: Rgb) -> Self {
        Self { ch: ' ', fg: bg, bg }
    }

    pub fn is_blank(&self) -> bool {
        self.ch == ' '
    }
}
