use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::motion::SharedGravity;

use super::{SensorError, SensorFeed};

pub const DEFAULT_SENSOR_FREQUENCY_HZ: f32 = 100.0;

/// Sensor polling configuration.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SensorConfig {
    pub frequency_hz: f32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            frequency_hz: DEFAULT_SENSOR_FREQUENCY_HZ,
        }
    }
}

impl SensorConfig {
    pub fn period(&self) -> Result<Duration, SensorError> {
        let hz = self.frequency_hz;
        if !hz.is_finite() || hz <= 0.0 {
            return Err(SensorError::InvalidFrequency(hz));
        }
        // Tiny rates overflow Duration.
        Duration::try_from_secs_f32(1.0 / hz).map_err(|_| SensorError::InvalidFrequency(hz))
    }
}

type SharedFeed = Arc<Mutex<Box<dyn SensorFeed>>>;

struct Running {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Polls a `SensorFeed` on a background thread.
///
/// `start` and `stop` are idempotent. `stop` joins the thread before
/// returning, so no reading lands in the filter afterwards.
pub struct SensorWorker {
    period: Duration,
    feed: SharedFeed,
    gravity: SharedGravity,
    running: Option<Running>,
}

impl SensorWorker {
    pub fn new(
        feed: Box<dyn SensorFeed>,
        gravity: SharedGravity,
        config: SensorConfig,
    ) -> Result<Self, SensorError> {
        Ok(Self {
            period: config.period()?,
            feed: Arc::new(Mutex::new(feed)),
            gravity,
            running: None,
        })
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    #[inline]
    pub fn period(&self) -> Duration {
        self.period
    }

    #[inline]
    pub fn gravity(&self) -> &SharedGravity {
        &self.gravity
    }

    pub fn start(&mut self) -> Result<(), SensorError> {
        if self.running.is_some() {
            return Ok(());
        }

        lock(&self.feed).activate()?;

        let stop = Arc::new(AtomicBool::new(false));
        let spawned = thread::Builder::new()
            .name("gravity-sensor".into())
            .spawn({
                let feed = self.feed.clone();
                let gravity = self.gravity.clone();
                let stop = stop.clone();
                let period = self.period;
                move || poll(&feed, &gravity, &stop, period)
            });

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                lock(&self.feed).deactivate();
                return Err(SensorError::Spawn(e));
            }
        };

        self.running = Some(Running { stop, handle });
        log::info!("sensor updates started ({:?} period)", self.period);
        Ok(())
    }

    pub fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        running.stop.store(true, Ordering::Release);
        running.handle.thread().unpark();
        if running.handle.join().is_err() {
            log::error!("sensor worker panicked");
        }

        lock(&self.feed).deactivate();
        log::info!("sensor updates stopped");
    }
}

impl Drop for SensorWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock(feed: &SharedFeed) -> MutexGuard<'_, Box<dyn SensorFeed>> {
    feed.lock().unwrap_or_else(PoisonError::into_inner)
}

fn poll(feed: &SharedFeed, gravity: &SharedGravity, stop: &AtomicBool, period: Duration) {
    let mut failing = false;

    while !stop.load(Ordering::Acquire) {
        let reading = lock(feed).read();
        match reading {
            Ok(sample) => {
                gravity.push(sample);
                if failing {
                    log::info!("accelerometer readings resumed");
                    failing = false;
                }
            }
            // Warn once per failure streak.
            Err(e) if !failing => {
                log::warn!("{e}");
                failing = true;
            }
            Err(e) => log::trace!("{e}"),
        }

        thread::park_timeout(period);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    use super::*;
    use crate::motion::{GravityFilter, GravitySample};

    #[derive(Default)]
    struct Counters {
        activations: AtomicUsize,
        deactivations: AtomicUsize,
        reads: AtomicUsize,
    }

    struct ScriptedFeed {
        counters: Arc<Counters>,
        fail: bool,
    }

    impl SensorFeed for ScriptedFeed {
        fn activate(&mut self) -> Result<(), SensorError> {
            self.counters.activations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn deactivate(&mut self) {
            self.counters.deactivations.fetch_add(1, Ordering::SeqCst);
        }

        fn read(&mut self) -> Result<GravitySample, SensorError> {
            self.counters.reads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(SensorError::Read("scripted".into()))
            } else {
                Ok(GravitySample::new(0.0, 0.0, -1.0))
            }
        }
    }

    fn worker(fail: bool) -> (SensorWorker, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let feed = ScriptedFeed {
            counters: counters.clone(),
            fail,
        };
        let gravity = SharedGravity::new(GravityFilter::new(0.5).unwrap());
        let config = SensorConfig { frequency_hz: 1000.0 };
        (SensorWorker::new(Box::new(feed), gravity, config).unwrap(), counters)
    }

    fn wait_for_reads(counters: &Counters, n: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while counters.reads.load(Ordering::SeqCst) < n {
            assert!(Instant::now() < deadline, "sensor worker made no progress");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn default_frequency_is_100_hz() {
        let period = SensorConfig::default().period().unwrap();
        assert!((period.as_secs_f64() - 0.01).abs() < 1e-6);
    }

    #[test]
    fn invalid_frequency_is_rejected() {
        for hz in [0.0, -5.0, f32::NAN, f32::INFINITY, 1e-20, f32::MIN_POSITIVE] {
            let cfg = SensorConfig { frequency_hz: hz };
            assert!(matches!(cfg.period(), Err(SensorError::InvalidFrequency(_))));
        }
    }

    #[test]
    fn readings_reach_the_shared_filter() {
        let (mut w, counters) = worker(false);
        w.start().unwrap();
        wait_for_reads(&counters, 5);
        w.stop();

        assert!(w.gravity().snapshot().z < -0.5);
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let (mut w, counters) = worker(false);

        w.stop();
        assert_eq!(counters.deactivations.load(Ordering::SeqCst), 0);

        w.start().unwrap();
        w.start().unwrap();
        assert!(w.is_running());
        assert_eq!(counters.activations.load(Ordering::SeqCst), 1);

        w.stop();
        w.stop();
        assert!(!w.is_running());
        assert_eq!(counters.deactivations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn no_reads_after_stop_returns() {
        let (mut w, counters) = worker(false);
        w.start().unwrap();
        wait_for_reads(&counters, 2);
        w.stop();

        let after_stop = counters.reads.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(counters.reads.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn worker_restarts_with_the_same_feed() {
        let (mut w, counters) = worker(false);
        w.start().unwrap();
        w.stop();
        w.start().unwrap();
        assert_eq!(counters.activations.load(Ordering::SeqCst), 2);
        w.stop();
    }

    #[test]
    fn read_errors_leave_gravity_unchanged() {
        let (mut w, counters) = worker(true);
        w.start().unwrap();
        wait_for_reads(&counters, 5);
        w.stop();

        assert_eq!(w.gravity().snapshot(), crate::motion::SmoothedGravity::ZERO);
    }
}
