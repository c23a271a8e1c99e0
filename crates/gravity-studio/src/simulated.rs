//! Stand-in accelerometers for machines without motion hardware.

use std::time::Instant;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use gravity_engine::motion::GravitySample;
use gravity_engine::sensor::{SensorError, SensorFeed};

/// Peak per-axis noise, in g.
const NOISE: f32 = 0.02;

/// A device held upright and slowly rocked, with sensor noise.
pub struct SimulatedAccelerometer {
    started: Instant,
    rng: StdRng,
}

impl SimulatedAccelerometer {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            started: Instant::now(),
            rng,
        }
    }

    /// Noise-free reading `t` seconds after start: unit length, mostly -Y.
    pub fn wobble(t: f32) -> Vec3 {
        let roll = (t * 0.7).sin() * 0.5;
        let pitch = (t * 0.45).sin() * 0.35 - 0.2;
        Vec3::new(roll.sin(), -roll.cos() * pitch.cos(), pitch.sin()).normalize()
    }
}

impl SensorFeed for SimulatedAccelerometer {
    fn activate(&mut self) -> Result<(), SensorError> {
        log::info!("using simulated accelerometer");
        Ok(())
    }

    fn read(&mut self) -> Result<GravitySample, SensorError> {
        let t = self.started.elapsed().as_secs_f32();
        let noise = Vec3::new(
            self.rng.gen_range(-NOISE..=NOISE),
            self.rng.gen_range(-NOISE..=NOISE),
            self.rng.gen_range(-NOISE..=NOISE),
        );
        Ok(GravitySample::from(Self::wobble(t) + noise))
    }
}

/// A device lying face up on a table.
pub struct FlatAccelerometer;

impl SensorFeed for FlatAccelerometer {
    fn read(&mut self) -> Result<GravitySample, SensorError> {
        Ok(GravitySample::new(0.0, 0.0, -1.0))
    }
}
