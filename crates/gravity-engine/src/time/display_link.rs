use std::time::{Duration, Instant};

use super::{FrameInterval, TimingSource, TimingSourceKind};

/// Refresh period assumed when the monitor does not report one.
pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_nanos(1_000_000_000 / 60);

/// Converts a monitor refresh rate in millihertz to a tick period.
pub fn refresh_period_from_millihertz(millihertz: u32) -> Option<Duration> {
    if millihertz == 0 {
        return None;
    }
    Some(Duration::from_nanos(1_000_000_000_000 / u64::from(millihertz)))
}

#[derive(Debug, Copy, Clone)]
struct Subscription {
    interval: FrameInterval,
    ticks: u32,
    last_tick: Option<Instant>,
}

/// Vsync-paced source: every display tick is one redraw under FIFO presentation.
///
/// The first tick after `add` fires, then every `interval`-th tick after it.
/// With an interval above one, the ticks in between never present, so nothing
/// blocks on vblank; those ticks are paced by the refresh period instead.
/// A tick arriving less than half a period after the previous counted tick is
/// ignored.
#[derive(Debug)]
pub struct DisplayLink {
    refresh_period: Duration,
    subscription: Option<Subscription>,
}

impl DisplayLink {
    pub fn new() -> Self {
        Self::with_refresh_period(DEFAULT_REFRESH_PERIOD)
    }

    pub fn with_refresh_period(refresh_period: Duration) -> Self {
        debug_assert!(!refresh_period.is_zero());
        Self {
            refresh_period,
            subscription: None,
        }
    }

    #[inline]
    pub fn refresh_period(&self) -> Duration {
        self.refresh_period
    }
}

impl Default for DisplayLink {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingSource for DisplayLink {
    fn kind(&self) -> TimingSourceKind {
        TimingSourceKind::DisplaySync
    }

    fn add(&mut self, interval: FrameInterval, _now: Instant) {
        self.subscription = Some(Subscription {
            interval,
            ticks: interval.get() - 1,
            last_tick: None,
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

        if sub.interval.get() > 1 {
            if let Some(last) = sub.last_tick {
                if now < last + self.refresh_period / 2 {
                    return false;
                }
            }
            sub.last_tick = Some(now);
        }

        sub.ticks += 1;
        if sub.ticks >= sub.interval.get() {
            sub.ticks = 0;
            true
        } else {
            false
        }
    }

    /// `None` at interval one: presenting blocks on vblank.
    fn next_deadline(&self) -> Option<Instant> {
        let sub = self.subscription.as_ref()?;
        if sub.interval.get() == 1 {
            return None;
        }
        sub.last_tick.map(|last| last + self.refresh_period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_millis(10);

    fn fired(link: &mut DisplayLink, ticks: usize) -> Vec<bool> {
        let start = Instant::now();
        (0..ticks as u32)
            .map(|i| link.tick(start + PERIOD * i))
            .collect()
    }

    fn link(interval: u32) -> DisplayLink {
        let mut link = DisplayLink::with_refresh_period(PERIOD);
        link.add(FrameInterval::new(interval).unwrap(), Instant::now());
        link
    }

    #[test]
    fn unsubscribed_never_fires() {
        let mut link = DisplayLink::new();
        assert!(fired(&mut link, 5).iter().all(|f| !f));
        assert_eq!(link.next_deadline(), None);
    }

    #[test]
    fn interval_one_fires_every_tick() {
        let mut link = link(1);
        let now = Instant::now();
        assert!((0..4).all(|_| link.tick(now)));
        assert_eq!(link.next_deadline(), None);
    }

    #[test]
    fn interval_three_fires_every_third_tick() {
        let mut link = link(3);
        assert_eq!(
            fired(&mut link, 7),
            vec![true, false, false, true, false, false, true]
        );
    }

    #[test]
    fn back_to_back_ticks_do_not_advance_the_count() {
        let mut link = link(4);
        let now = Instant::now();
        let draws = (0..8).filter(|_| link.tick(now)).count();

        assert_eq!(draws, 1);
        assert_eq!(link.next_deadline(), Some(now + PERIOD));
    }

    #[test]
    fn due_frames_are_spaced_interval_refresh_periods_apart() {
        let mut link = link(4);
        let start = Instant::now();
        let mut now = start;
        let mut due = Vec::new();

        // Redraw immediately when there is no deadline, otherwise sleep until it.
        for _ in 0..40 {
            if link.tick(now) {
                due.push(now - start);
            }
            now = link.next_deadline().unwrap_or(now).max(now);
        }

        assert_eq!(due[..3], [Duration::ZERO, PERIOD * 4, PERIOD * 8]);
    }

    #[test]
    fn invalidate_stops_ticks() {
        let mut link = link(1);
        assert!(link.tick(Instant::now()));
        link.invalidate();
        assert!(!link.is_subscribed());
        assert!(!link.tick(Instant::now()));
    }

    #[test]
    fn millihertz_converts_to_period() {
        assert_eq!(refresh_period_from_millihertz(0), None);
        assert_eq!(
            refresh_period_from_millihertz(100_000),
            Some(Duration::from_millis(10))
        );
    }
}
