// Copyright (c) 2026 rezky_nightky

use rand::{rngs::StdRng, Rng};

use crate::scheduler::{FrameHandle, FrameScheduler};
use crate::surface::{Rgb, Rgba, Surface};

pub const DEFAULT_CELL_PX: u32 = 14;
pub const DEFAULT_FADE_ALPHA: f32 = 0.05;
pub const DEFAULT_RESET_THRESHOLD: f64 = 0.975;

#[derive(Clone, Debug, PartialEq)]
pub struct RainParams {
    /// Side of one character cell in pixels.
    pub cell_px: u32,
    /// Opacity of the per-frame shade overlay.
    pub fade_alpha: f32,
    /// A column past the bottom edge restarts when a uniform draw exceeds this.
    pub reset_threshold: f64,
    pub glyphs: Vec<char>,
    pub ink: Rgb,
    pub shade: Rgb,
}

impl Default for RainParams {
    fn default() -> Self {
        Self {
            cell_px: DEFAULT_CELL_PX,
            fade_alpha: DEFAULT_FADE_ALPHA,
            reset_threshold: DEFAULT_RESET_THRESHOLD,
            glyphs: vec!['0', '1'],
            ink: Rgb::new(0x33, 0x33, 0x33),
            shade: Rgb::BLACK,
        }
    }
}

/// One drop position per character column, in cell units.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Grid {
    drops: Vec<u32>,
}

impl Grid {
    /// Discards every column and lays out `floor(width / cell)` fresh ones.
    pub fn rebuild(&mut self, width_px: u32, cell_px: u32) {
        let cols = (width_px / cell_px.max(1)) as usize;
        self.drops = vec![1; cols];
    }

    pub fn len(&self) -> usize {
        self.drops.len()
    }

    pub fn positions(&self) -> &[u32] {
        &self.drops
    }
}

fn to_px(v: u64) -> u32 {
    u32::try_from(v).unwrap_or(u32::MAX)
}

/// The self-rescheduling paint loop.
///
/// Holds at most one [`FrameHandle`]: the one it is waiting on. Callbacks
/// carrying any other handle are ignored.
#[derive(Debug)]
pub struct Rain {
    params: RainParams,
    grid: Grid,
    handle: Option<FrameHandle>,
    rng: StdRng,
    painted: u64,
    skipped: u64,
}

impl Rain {
    pub fn new(mut params: RainParams, rng: StdRng) -> Self {
        if params.glyphs.is_empty() {
            params.glyphs = vec!['0', '1'];
        }
        params.cell_px = params.cell_px.max(1);
        Self {
            params,
            grid: Grid::default(),
            handle: None,
            rng,
            painted: 0,
            skipped: 0,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[allow(dead_code)]
    pub fn handle(&self) -> Option<FrameHandle> {
        self.handle
    }

    pub fn painted_frames(&self) -> u64 {
        self.painted
    }

    pub fn skipped_frames(&self) -> u64 {
        self.skipped
    }

    pub fn rebuild(&mut self, width_px: u32) {
        self.grid.rebuild(width_px, self.params.cell_px);
    }

    pub fn cancel<S: FrameScheduler>(&mut self, sched: &mut S) {
        if let Some(h) = self.handle.take() {
            sched.cancel_frame(h);
        }
    }

    /// Drops whatever chain is running and requests the first frame of a new one.
    pub fn restart<S: FrameScheduler>(&mut self, sched: &mut S) {
        self.cancel(sched);
        self.handle = Some(sched.request_frame());
    }

    /// Frame callback. Returns false for a stale handle.
    pub fn on_frame<T: Surface, S: FrameScheduler>(
        &mut self,
        handle: FrameHandle,
        surface: Option<&mut T>,
        sched: &mut S,
    ) -> bool {
        if self.handle != Some(handle) {
            tracing::trace!(handle = handle.id(), "ignoring stale frame callback");
            return false;
        }
        self.handle = None;

        match surface {
            Some(surface) => self.paint(surface),
            None => {
                self.skipped += 1;
                tracing::trace!("surface unavailable, frame skipped");
            }
        }

        self.handle = Some(sched.request_frame());
        true
    }

    /// Paints one frame and advances every column.
    pub fn paint<T: Surface>(&mut self, surface: &mut T) {
        let width = surface.width();
        let height = surface.height();
        surface.fill_rect(
            0,
            0,
            width,
            height,
            Rgba {
                rgb: self.params.shade,
                alpha: self.params.fade_alpha,
            },
        );

        let cell = u64::from(self.params.cell_px);
        let glyphs = &self.params.glyphs;
        for (i, pos) in self.grid.drops.iter_mut().enumerate() {
            let glyph = glyphs[self.rng.random_range(0..glyphs.len())];
            let y = u64::from(*pos) * cell;
            surface.fill_text(glyph, to_px(i as u64 * cell), to_px(y), self.params.ink);

            if y > u64::from(height) && self.rng.random::<f64>() > self.params.reset_threshold {
                *pos = 0;
            }
            *pos = pos.saturating_add(1);
        }
        self.painted += 1;
    }
}
