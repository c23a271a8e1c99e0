use std::time::{Duration, Instant};

use super::{FrameInterval, TimingSource, TimingSourceKind};

/// Nominal display rate the timer emulates.
const BASE_PERIOD: Duration = Duration::from_nanos(1_000_000_000 / 60);

#[derive(Debug, Copy, Clone)]
struct Subscription {
    period: Duration,
    next_fire: Instant,
}

/// Wall-clock source firing every `interval / 60` seconds.
///
/// After a stall (debugger, minimized window) the schedule restarts from the
/// current time instead of firing a burst of missed frames.
#[derive(Debug)]
pub struct IntervalTimer {
    base_period: Duration,
    subscription: Option<Subscription>,
}

impl IntervalTimer {
    pub fn new() -> Self {
        Self::with_base_period(BASE_PERIOD)
    }

    /// Timer emulating a display with the given tick period.
    pub fn with_base_period(base_period: Duration) -> Self {
        debug_assert!(!base_period.is_zero());
        Self {
            base_period,
            subscription: None,
        }
    }
}

impl Default for IntervalTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingSource for IntervalTimer {
    fn kind(&self) -> TimingSourceKind {
        TimingSourceKind::Timer
    }

    fn add(&mut self, interval: FrameInterval, now: Instant) {
        let period = self.base_period * interval.get();
        self.subscription = Some(Subscription {
            period,
            next_fire: now + period,
        });
    }

    fn invalidate(&mut self) {
        self.subscription = None;
    }

    fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    fn tick(&mut self, now: Instant) -> bool {
        let Some(sub) = self.subscription.as_mut() else {
            return false;
        };

        if now < sub.next_fire {
            return false;
        }

        sub.next_fire += sub.period;
        if sub.next_fire <= now {
            sub.next_fire = now + sub.period;
        }
        true
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.subscription.map(|s| s.next_fire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    fn timer() -> IntervalTimer {
        IntervalTimer::with_base_period(10 * MS)
    }

    #[test]
    fn fires_once_per_period() {
        let t0 = Instant::now();
        let mut t = timer();
        t.add(FrameInterval::EVERY_TICK, t0);

        assert!(!t.tick(t0 + 5 * MS));
        assert!(t.tick(t0 + 10 * MS));
        assert!(!t.tick(t0 + 15 * MS));
        assert!(t.tick(t0 + 20 * MS));
        assert_eq!(t.next_deadline(), Some(t0 + 30 * MS));
    }

    #[test]
    fn interval_scales_the_period() {
        let t0 = Instant::now();
        let mut t = timer();
        t.add(FrameInterval::new(3).unwrap(), t0);

        assert!(!t.tick(t0 + 20 * MS));
        assert!(t.tick(t0 + 30 * MS));
        assert_eq!(t.next_deadline(), Some(t0 + 60 * MS));
    }

    #[test]
    fn stall_does_not_cause_a_burst() {
        let t0 = Instant::now();
        let mut t = timer();
        t.add(FrameInterval::EVERY_TICK, t0);

        let late = t0 + 500 * MS;
        assert!(t.tick(late));
        assert!(!t.tick(late));
        assert_eq!(t.next_deadline(), Some(late + 10 * MS));
    }

    #[test]
    fn invalidated_timer_has_no_deadline() {
        let t0 = Instant::now();
        let mut t = timer();
        t.add(FrameInterval::EVERY_TICK, t0);
        t.invalidate();
        assert_eq!(t.next_deadline(), None);
        assert!(!t.tick(t0 + 100 * MS));
    }

    #[test]
    fn kinds_create_matching_sources() {
        assert_eq!(TimingSourceKind::Timer.create(None).kind(), TimingSourceKind::Timer);
        assert_eq!(
            TimingSourceKind::DisplaySync.create(None).kind(),
            TimingSourceKind::DisplaySync
        );
    }
}
