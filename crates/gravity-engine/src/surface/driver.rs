use std::time::Instant;

use crate::time::{FrameInterval, TimingSource, TimingSourceKind};

/// Animation start/stop state on top of a timing source.
///
/// Owns the single subscription to the source: starting twice subscribes once,
/// stopping twice unsubscribes once.
pub struct AnimationDriver {
    timing: Box<dyn TimingSource>,
    running: bool,
    frame_interval: FrameInterval,
}

impl AnimationDriver {
    pub fn new(timing: Box<dyn TimingSource>, frame_interval: FrameInterval) -> Self {
        Self {
            timing,
            running: false,
            frame_interval,
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[inline]
    pub fn frame_interval(&self) -> FrameInterval {
        self.frame_interval
    }

    #[inline]
    pub fn timing_kind(&self) -> TimingSourceKind {
        self.timing.kind()
    }

    /// Subscribes to the timing source. No-op when already running.
    pub fn start(&mut self, now: Instant) {
        if self.running {
            return;
        }
        self.timing.add(self.frame_interval, now);
        self.running = true;
        log::debug!(
            "animation started ({:?}, every {} tick(s))",
            self.timing.kind(),
            self.frame_interval.get()
        );
    }

    /// Unsubscribes. No-op when already stopped.
    ///
    /// Once this returns, `tick` reports no further due frames until `start`.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.timing.invalidate();
        self.running = false;
        log::debug!("animation stopped");
    }

    /// Sets the number of display ticks per draw.
    ///
    /// Rejects 0 and keeps the previous value. A running driver is restarted
    /// with the new interval; a stopped one stays stopped.
    pub fn set_frame_interval(&mut self, ticks: u32, now: Instant) -> bool {
        let Some(interval) = FrameInterval::new(ticks) else {
            log::warn!("ignoring frame interval {ticks}; it must be at least 1");
            return false;
        };

        self.frame_interval = interval;
        if self.running {
            self.stop();
            self.start(now);
        }
        true
    }

    /// Reports one display tick. Returns `true` when a draw is due.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.running && self.timing.tick(now)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        if self.running {
            self.timing.next_deadline()
        } else {
            None
        }
    }
}
