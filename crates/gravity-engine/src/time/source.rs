use std::time::{Duration, Instant};

use super::{DisplayLink, FrameInterval, IntervalTimer};

/// Source of draw ticks for a render surface.
///
/// The runtime reports every display tick through `tick`; the source answers
/// whether a draw is due. `add` and `invalidate` subscribe and unsubscribe.
/// An unsubscribed source never reports a due frame.
pub trait TimingSource {
    fn kind(&self) -> TimingSourceKind;

    /// Subscribes with the given interval, replacing any previous subscription.
    fn add(&mut self, interval: FrameInterval, now: Instant);

    /// Drops the subscription. No-op when not subscribed.
    fn invalidate(&mut self);

    fn is_subscribed(&self) -> bool;

    /// Reports one display tick. Returns `true` when a draw is due.
    fn tick(&mut self, now: Instant) -> bool;

    /// Next wake-up time for deadline-driven sources.
    ///
    /// `None` means ticks are paced by presentation and the runtime should
    /// simply request the next redraw.
    fn next_deadline(&self) -> Option<Instant> {
        None
    }
}

/// Which timing source to construct.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum TimingSourceKind {
    /// Paced by vsync.
    #[default]
    DisplaySync,
    /// Paced by a wall-clock timer.
    Timer,
}

impl TimingSourceKind {
    /// `refresh_period` is the display's tick period; `None` assumes 60 Hz.
    pub fn create(self, refresh_period: Option<Duration>) -> Box<dyn TimingSource> {
        match self {
            TimingSourceKind::DisplaySync => match refresh_period {
                Some(period) => Box::new(DisplayLink::with_refresh_period(period)),
                None => Box::new(DisplayLink::new()),
            },
            TimingSourceKind::Timer => Box::new(IntervalTimer::new()),
        }
    }
}
