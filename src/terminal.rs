// Copyright (c) 2026 rezky_nightky

use std::io::{stdout, Result, Stdout, Write};

use crossterm::{
    cursor, event,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal, ExecutableCommand, QueueableCommand,
};

use crate::frame::Frame;
use crate::palette::{present, ColorMode, Presented};
use crate::surface::{Canvas, Rgb};

/// Viewport-sized canvas backed by a [`Frame`].
///
/// Refitting allocates a fresh frame, which clears it the same way resizing
/// a browser canvas does.
#[derive(Debug)]
pub struct Screen {
    cols: u16,
    rows: u16,
    cell_px: u32,
    bg: Rgb,
    frame: Option<Frame>,
}

impl Screen {
    pub fn new(cols: u16, rows: u16, cell_px: u32, bg: Rgb) -> Self {
        Self {
            cols,
            rows,
            cell_px,
            bg,
            frame: None,
        }
    }

    pub fn set_viewport(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
    }

    pub fn frame_mut(&mut self) -> Option<&mut Frame> {
        self.frame.as_mut()
    }
}

impl Canvas for Screen {
    type Target = Frame;

    fn fit_viewport(&mut self) -> Option<(u32, u32)> {
        if self.cols == 0 || self.rows == 0 {
            self.frame = None;
            return None;
        }
        let frame = Frame::new(self.cols, self.rows, self.cell_px, self.bg);
        let size = (
            self.cols as u32 * frame.cell_px(),
            self.rows as u32 * frame.cell_px(),
        );
        self.frame = Some(frame);
        Some(size)
    }

    fn surface(&mut self) -> Option<&mut Frame> {
        self.frame.as_mut()
    }
}

struct LastFrame {
    width: u16,
    height: u16,
    cells: Vec<Presented>,
}

impl LastFrame {
    fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Presented::BLANK; width as usize * height as usize],
        }
    }
}

pub struct Terminal {
    stdout: Stdout,
    mode: ColorMode,
    last: Option<LastFrame>,
    row: Vec<Presented>,
    run_buf: String,
}

impl Terminal {
    pub fn new(mode: ColorMode) -> Result<Self> {
        let mut out = stdout();
        terminal::enable_raw_mode()?;
        let init_res: Result<()> = (|| {
            out.execute(terminal::EnterAlternateScreen)?;
            out.execute(cursor::Hide)?;
            let _ = out.execute(terminal::DisableLineWrap);
            out.execute(SetAttribute(Attribute::Reset))?;
            out.execute(ResetColor)?;
            out.execute(terminal::Clear(terminal::ClearType::All))?;
            out.flush()?;
            Ok(())
        })();
        if let Err(e) = init_res {
            restore_terminal_best_effort();
            return Err(e);
        }
        Ok(Self {
            stdout: out,
            mode,
            last: None,
            row: Vec::new(),
            run_buf: String::with_capacity(64),
        })
    }

    pub fn size(&self) -> Result<(u16, u16)> {
        terminal::size()
    }

    pub fn poll_event(timeout: std::time::Duration) -> Result<bool> {
        event::poll(timeout)
    }

    pub fn read_event() -> Result<event::Event> {
        event::read()
    }

    /// Writes the cells whose presented form changed since the last draw.
    pub fn draw(&mut self, frame: &mut Frame) -> Result<()> {
        let resized = self
            .last
            .as_ref()
            .map(|l| l.width != frame.cols || l.height != frame.rows)
            .unwrap_or(true);
        let full = resized || frame.is_dirty_all();
        if resized {
            self.stdout
                .queue(terminal::Clear(terminal::ClearType::All))?;
            self.last = Some(LastFrame::new(frame.cols, frame.rows));
        }
        let Some(last) = self.last.as_mut() else {
            return Ok(());
        };

        let mut cur_fg: Option<Option<Color>> = None;
        let mut cur_bg: Option<Option<Color>> = None;
        let mut cur_pos: Option<(u16, u16)> = None;
        let width = frame.cols as usize;
        let mode = self.mode;

        for y in 0..frame.rows {
            let base = y as usize * width;
            self.row.clear();
            self.row
                .extend((0..width).map(|x| present(&frame.cell_at_index(base + x), mode)));

            let mut x = 0usize;
            while x < width {
                let p0 = self.row[x];
                if !full && last.cells[base + x] == p0 {
                    x += 1;
                    continue;
                }

                self.run_buf.clear();
                self.run_buf.push(p0.ch);
                last.cells[base + x] = p0;
                let mut end = x + 1;
                while end < width {
                    let p1 = self.row[end];
                    if (!full && last.cells[base + end] == p1) || p1.fg != p0.fg || p1.bg != p0.bg
                    {
                        break;
                    }
                    self.run_buf.push(p1.ch);
                    last.cells[base + end] = p1;
                    end += 1;
                }

                let x0 = x as u16;
                if cur_pos != Some((x0, y)) {
                    self.stdout.queue(cursor::MoveTo(x0, y))?;
                }
                if cur_fg != Some(p0.fg) {
                    self.stdout
                        .queue(SetForegroundColor(p0.fg.unwrap_or(Color::Reset)))?;
                    cur_fg = Some(p0.fg);
                }
                if cur_bg != Some(p0.bg) {
                    self.stdout
                        .queue(SetBackgroundColor(p0.bg.unwrap_or(Color::Reset)))?;
                    cur_bg = Some(p0.bg);
                }
                self.stdout.queue(Print(self.run_buf.as_str()))?;

                cur_pos = if end < width {
                    Some((end as u16, y))
                } else {
                    None
                };
                x = end;
            }
        }

        self.stdout.queue(SetAttribute(Attribute::Reset))?;
        self.stdout.queue(ResetColor)?;
        self.stdout.flush()?;
        frame.clear_dirty();
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        restore_terminal_best_effort();
    }
}

pub fn restore_terminal_best_effort() {
    let mut out = stdout();
    let _ = out.execute(SetAttribute(Attribute::Reset));
    let _ = out.execute(ResetColor);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::EnableLineWrap);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = out.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Surface;

    #[test]
    fn screen_fits_whole_cells() {
        let mut screen = Screen::new(80, 24, 14, Rgb::BLACK);
        assert_eq!(screen.fit_viewport(), Some((80 * 14, 24 * 14)));
        assert_eq!(screen.surface().unwrap().width(), 80 * 14);

        screen.set_viewport(40, 10);
        assert_eq!(screen.fit_viewport(), Some((40 * 14, 10 * 14)));
        assert_eq!(screen.frame_mut().unwrap().cols, 40);
    }

    #[test]
    fn zero_sized_viewport_unmounts() {
        let mut screen = Screen::new(80, 24, 14, Rgb::BLACK);
        screen.fit_viewport();
        screen.set_viewport(0, 24);
        assert_eq!(screen.fit_viewport(), None);
        assert!(screen.surface().is_none());
    }
}
