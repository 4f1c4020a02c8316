// Copyright (c) 2026 rezky_nightky

use std::time::{Duration, Instant};

use crate::debounce::Debouncer;
use crate::rain::Rain;
use crate::scheduler::{FrameHandle, FrameScheduler};
use crate::surface::Canvas;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingState {
    Idle,
    Running,
}

/// Keeps a [`Rain`] loop bound to a canvas across viewport changes.
///
/// Owns the grid, the outstanding frame handle and the resize debounce timer;
/// the caller drives it with `start`, `notify_resize`, `poll_resize`,
/// `on_frame` and `stop`.
#[derive(Debug)]
pub struct Backdrop {
    rain: Rain,
    debounce: Debouncer,
    state: BindingState,
    rebuilds: u64,
    viewport: Option<(u32, u32)>,
}

impl Backdrop {
    pub fn new(rain: Rain, debounce: Duration) -> Self {
        Self {
            rain,
            debounce: Debouncer::new(debounce),
            state: BindingState::Idle,
            rebuilds: 0,
            viewport: None,
        }
    }

    pub fn state(&self) -> BindingState {
        self.state
    }

    pub fn rain(&self) -> &Rain {
        &self.rain
    }

    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Pixel size seen by the last successful rebuild.
    pub fn viewport(&self) -> Option<(u32, u32)> {
        self.viewport
    }

    /// When the pending resize settles, if one is pending.
    pub fn resize_deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    pub fn start<C: Canvas, S: FrameScheduler>(&mut self, canvas: &mut C, sched: &mut S) {
        if self.state == BindingState::Running {
            return;
        }
        self.state = BindingState::Running;
        tracing::info!(debounce_ms = self.debounce.delay().as_millis() as u64, "backdrop started");
        self.rebuild(canvas, sched);
    }

    /// Resize listener. Ignored unless running.
    pub fn notify_resize(&mut self, now: Instant) {
        if self.state != BindingState::Running {
            return;
        }
        tracing::trace!("resize notification");
        self.debounce.notify(now);
    }

    /// Rebuilds once the resize burst has settled. Returns true if it did.
    pub fn poll_resize<C: Canvas, S: FrameScheduler>(
        &mut self,
        now: Instant,
        canvas: &mut C,
        sched: &mut S,
    ) -> bool {
        if self.state != BindingState::Running || !self.debounce.poll(now) {
            return false;
        }
        tracing::debug!("resize settled");
        self.rebuild(canvas, sched)
    }

    /// Full rebuild on demand, e.g. a user-triggered restart.
    pub fn restart<C: Canvas, S: FrameScheduler>(&mut self, canvas: &mut C, sched: &mut S) -> bool {
        if self.state != BindingState::Running {
            return false;
        }
        self.rebuild(canvas, sched)
    }

    pub fn on_frame<C: Canvas, S: FrameScheduler>(
        &mut self,
        handle: FrameHandle,
        canvas: &mut C,
        sched: &mut S,
    ) -> bool {
        self.rain.on_frame(handle, canvas.surface(), sched)
    }

    pub fn stop<S: FrameScheduler>(&mut self, sched: &mut S) {
        if self.state == BindingState::Idle {
            return;
        }
        self.state = BindingState::Idle;
        self.debounce.cancel();
        self.rain.cancel(sched);
        tracing::info!(
            painted = self.rain.painted_frames(),
            rebuilds = self.rebuilds,
            "backdrop stopped"
        );
    }

    fn rebuild<C: Canvas, S: FrameScheduler>(&mut self, canvas: &mut C, sched: &mut S) -> bool {
        let Some((width, height)) = canvas.fit_viewport() else {
            tracing::trace!("canvas unavailable, rebuild skipped");
            return false;
        };
        self.rain.rebuild(width);
        self.rain.restart(sched);
        self.rebuilds += 1;
        self.viewport = Some((width, height));
        tracing::debug!(
            columns = self.rain.grid().len(),
            width,
            height,
            "grid rebuilt"
        );
        true
    }
}
