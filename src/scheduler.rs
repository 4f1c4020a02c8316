// Copyright (c) 2026 rezky_nightky

use std::time::{Duration, Instant};

/// Cancellable reference to one scheduled redraw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

impl FrameHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Host primitive for "call me on the next frame".
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClockStats {
    pub requested: u64,
    pub cancelled: u64,
    pub fired: u64,
}

/// Fixed-rate frame clock.
///
/// Requests made during one tick are all delivered on the next tick, the way
/// a browser batches animation frame callbacks. Nothing is deduplicated, so a
/// caller that forgets to cancel ends up with two callbacks per tick.
#[derive(Debug)]
pub struct FrameClock {
    period: Duration,
    next_tick: Instant,
    next_id: u64,
    pending: Vec<FrameHandle>,
    stats: ClockStats,
}

impl FrameClock {
    pub fn new(fps: f64, now: Instant) -> Self {
        let period = Duration::from_secs_f64(1.0 / fps.max(0.001));
        Self {
            period,
            next_tick: now + period,
            next_id: 1,
            pending: Vec::new(),
            stats: ClockStats::default(),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }

    pub fn stats(&self) -> ClockStats {
        self.stats
    }

    /// How long until the next callback is due, `None` when nothing is pending.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        if self.pending.is_empty() {
            return None;
        }
        Some(self.next_tick.saturating_duration_since(now))
    }

    /// Moves every callback due at `now` into `out`, oldest first.
    pub fn drain_due(&mut self, now: Instant, out: &mut Vec<FrameHandle>) {
        if self.pending.is_empty() || now < self.next_tick {
            return;
        }
        self.stats.fired += self.pending.len() as u64;
        out.append(&mut self.pending);

        self.next_tick += self.period;
        if self.next_tick <= now {
            self.next_tick = now + self.period;
        }
    }
}

impl FrameScheduler for FrameClock {
    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.pending.push(handle);
        self.stats.requested += 1;
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let before = self.pending.len();
        self.pending.retain(|&h| h != handle);
        if self.pending.len() != before {
            self.stats.cancelled += 1;
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::{FrameHandle, FrameScheduler};

    /// Scheduler that only records; frames fire when the test says so.
    #[derive(Debug, Default)]
    pub struct RecordingScheduler {
        next_id: u64,
        pub outstanding: Vec<FrameHandle>,
        pub requests: u64,
        pub cancels: Vec<FrameHandle>,
        pub max_outstanding: usize,
    }

    impl RecordingScheduler {
        /// Delivers the oldest outstanding request.
        pub fn fire(&mut self) -> Option<FrameHandle> {
            if self.outstanding.is_empty() {
                return None;
            }
            Some(self.outstanding.remove(0))
        }
    }

    impl FrameScheduler for RecordingScheduler {
        fn request_frame(&mut self) -> FrameHandle {
            self.next_id += 1;
            let h = FrameHandle(self.next_id);
            self.outstanding.push(h);
            self.requests += 1;
            self.max_outstanding = self.max_outstanding.max(self.outstanding.len());
            h
        }

        fn cancel_frame(&mut self, handle: FrameHandle) {
            self.outstanding.retain(|&h| h != handle);
            self.cancels.push(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_pending_request_once_per_period() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new(10.0, t0);
        let h = clock.request_frame();

        let mut due = Vec::new();
        clock.drain_due(t0 + Duration::from_millis(50), &mut due);
        assert!(due.is_empty());

        clock.drain_due(t0 + Duration::from_millis(100), &mut due);
        assert_eq!(due, vec![h]);
        assert_eq!(clock.outstanding(), 0);

        due.clear();
        clock.drain_due(t0 + Duration::from_millis(300), &mut due);
        assert!(due.is_empty());
    }

    #[test]
    fn cancelled_request_never_fires() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new(60.0, t0);
        let h = clock.request_frame();
        clock.cancel_frame(h);
        clock.cancel_frame(h);

        let mut due = Vec::new();
        clock.drain_due(t0 + Duration::from_secs(1), &mut due);
        assert!(due.is_empty());
        assert_eq!(clock.stats().cancelled, 1);
        assert_eq!(clock.time_until_due(t0), None);
    }

    #[test]
    fn late_tick_does_not_burst_to_catch_up() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new(10.0, t0);
        let mut due = Vec::new();

        clock.request_frame();
        let late = t0 + Duration::from_secs(5);
        clock.drain_due(late, &mut due);
        assert_eq!(due.len(), 1);

        clock.request_frame();
        assert_eq!(clock.time_until_due(late), Some(clock.period()));
    }
}
