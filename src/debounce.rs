// Copyright (c) 2026 rezky_nightky

use std::time::{Duration, Instant};

/// Single re-armable timer: fires once after `delay` of quiet.
#[derive(Clone, Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Clears any armed timer and arms a new one.
    pub fn notify(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Returns true exactly once when the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(at) if now >= at => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_of_notifications_fires_once_after_the_last() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(100));

        for i in 0..20 {
            d.notify(t0 + Duration::from_millis(i * 10));
            assert!(!d.poll(t0 + Duration::from_millis(i * 10 + 5)));
        }

        let last = t0 + Duration::from_millis(190);
        assert!(!d.poll(last + Duration::from_millis(99)));
        assert!(d.poll(last + Duration::from_millis(100)));
        assert!(!d.poll(last + Duration::from_secs(10)));
    }

    #[test]
    fn cancel_disarms_the_timer() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(100));
        d.notify(t0);
        d.cancel();
        assert!(d.deadline().is_none());
        assert!(!d.poll(t0 + Duration::from_secs(1)));
    }
}
