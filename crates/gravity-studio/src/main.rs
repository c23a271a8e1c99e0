//! Gravity Studio
//!
//! Desktop viewer for the gravity engine: an arrow that keeps pointing along
//! the (simulated) accelerometer's gravity vector.
//!
//! Keys: Space pauses, Up/Down change the frame interval, Escape quits.

mod simulated;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use gravity_engine::device::GpuInit;
use gravity_engine::geometry::gravity_arrow;
use gravity_engine::logging::{init_logging, LoggingConfig};
use gravity_engine::motion::{
    GravityFilter, OrientationFallbackPolicy, SharedGravity, DEFAULT_FILTERING_FACTOR,
};
use gravity_engine::sensor::{SensorConfig, SensorFeed, SensorWorker, DEFAULT_SENSOR_FREQUENCY_HZ};
use gravity_engine::surface::SurfaceConfig;
use gravity_engine::time::{FrameInterval, TimingSourceKind};
use gravity_engine::window::{GravityApp, Runtime, RuntimeConfig};

use simulated::{FlatAccelerometer, SimulatedAccelerometer};

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum TimingArg {
    /// Draw on display refresh.
    DisplaySync,
    /// Draw on a 60 Hz wall-clock timer.
    Timer,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum FallbackArg {
    /// Spin the model.
    Spin,
    /// Keep the last orientation.
    Hold,
    /// Show the model unrotated.
    Identity,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum SensorArg {
    /// Slowly rocking upright device with noise.
    Simulated,
    /// Device lying face up.
    Flat,
    /// No sensor; only the fallback orientation is shown.
    Off,
}

/// Gravity Studio - gravity-tracking model viewer
#[derive(Parser, Debug)]
#[command(name = "gravity-studio")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Frame timing source
    #[arg(long, value_enum, default_value_t = TimingArg::DisplaySync)]
    timing: TimingArg,

    /// Orientation when no usable gravity reading exists
    #[arg(long, value_enum, default_value_t = FallbackArg::Spin)]
    fallback: FallbackArg,

    /// Display ticks per drawn frame
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    frame_interval: u32,

    /// Low-pass filter weight of each new sample, in (0, 1)
    #[arg(long, default_value_t = DEFAULT_FILTERING_FACTOR)]
    filtering_factor: f32,

    /// Accelerometer polling rate
    #[arg(long, default_value_t = DEFAULT_SENSOR_FREQUENCY_HZ)]
    sensor_hz: f32,

    /// Accelerometer source
    #[arg(long, value_enum, default_value_t = SensorArg::Simulated)]
    sensor: SensorArg,

    /// Log filter (env_logger syntax); overrides RUST_LOG
    #[arg(long)]
    log: Option<String>,
}

impl Args {
    fn surface_config(&self) -> Result<SurfaceConfig> {
        let timing = match self.timing {
            TimingArg::DisplaySync => TimingSourceKind::DisplaySync,
            TimingArg::Timer => TimingSourceKind::Timer,
        };
        let fallback = match self.fallback {
            FallbackArg::Spin => OrientationFallbackPolicy::AnimatedSpin,
            FallbackArg::Hold => OrientationFallbackPolicy::HoldLastOrientation,
            FallbackArg::Identity => OrientationFallbackPolicy::Identity,
        };
        let frame_interval = FrameInterval::new(self.frame_interval)
            .context("frame interval must be at least 1")?;

        Ok(SurfaceConfig {
            timing,
            fallback,
            frame_interval,
            ..SurfaceConfig::default()
        })
    }

    fn sensor_feed(&self) -> Option<Box<dyn SensorFeed>> {
        match self.sensor {
            SensorArg::Simulated => Some(Box::new(SimulatedAccelerometer::new())),
            SensorArg::Flat => Some(Box::new(FlatAccelerometer)),
            SensorArg::Off => None,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(LoggingConfig {
        env_filter: args.log.clone(),
        ..LoggingConfig::default()
    });

    let filter = GravityFilter::new(args.filtering_factor).context("invalid --filtering-factor")?;
    let gravity = SharedGravity::new(filter);

    let sensor = args
        .sensor_feed()
        .map(|feed| {
            let config = SensorConfig {
                frequency_hz: args.sensor_hz,
            };
            SensorWorker::new(feed, gravity.clone(), config)
        })
        .transpose()
        .context("invalid --sensor-hz")?;

    let app = GravityApp {
        surface: args.surface_config()?,
        mesh: gravity_arrow().context("failed to build the arrow model")?,
        gravity,
        sensor,
    };

    log::info!(
        "starting gravity-studio ({:?} timing, {:?} fallback, {:?} sensor)",
        args.timing,
        args.fallback,
        args.sensor
    );

    Runtime::run(RuntimeConfig::default(), GpuInit::default(), app)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("gravity-studio").chain(extra.iter().copied()))
    }

    #[test]
    fn defaults_match_engine_defaults() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.timing, TimingArg::DisplaySync);
        assert_eq!(args.fallback, FallbackArg::Spin);
        assert_eq!(args.frame_interval, 1);
        assert_eq!(args.filtering_factor, 0.1);
        assert_eq!(args.sensor_hz, 100.0);
        assert_eq!(args.sensor, SensorArg::Simulated);

        let cfg = args.surface_config().unwrap();
        assert_eq!(cfg.timing, TimingSourceKind::DisplaySync);
        assert_eq!(cfg.fallback, OrientationFallbackPolicy::AnimatedSpin);
        assert_eq!(cfg.frame_interval, FrameInterval::EVERY_TICK);
    }

    #[test]
    fn value_names_are_kebab_case() {
        let args = parse(&["--timing", "display-sync", "--fallback", "hold", "--sensor", "off"]).unwrap();
        assert_eq!(args.timing, TimingArg::DisplaySync);
        assert_eq!(args.fallback, FallbackArg::Hold);
        assert!(args.sensor_feed().is_none());
    }

    #[test]
    fn timer_and_interval_flow_into_surface_config() {
        let args = parse(&["--timing", "timer", "--frame-interval", "3", "--fallback", "identity"]).unwrap();
        let cfg = args.surface_config().unwrap();
        assert_eq!(cfg.timing, TimingSourceKind::Timer);
        assert_eq!(cfg.frame_interval.get(), 3);
        assert_eq!(cfg.fallback, OrientationFallbackPolicy::Identity);
    }

    #[test]
    fn zero_frame_interval_is_rejected() {
        assert!(parse(&["--frame-interval", "0"]).is_err());
    }
}
