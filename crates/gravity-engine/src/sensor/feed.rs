use thiserror::Error;

use crate::motion::GravitySample;

#[derive(Debug, Error)]
pub enum SensorError {
    /// The feed has no hardware or data source.
    #[error("accelerometer unavailable: {0}")]
    Unavailable(String),

    /// One reading failed; later readings may succeed.
    #[error("accelerometer read failed: {0}")]
    Read(String),

    #[error("sensor frequency must be positive and finite, got {0} Hz")]
    InvalidFrequency(f32),

    #[error("failed to spawn sensor worker")]
    Spawn(#[source] std::io::Error),
}

/// Source of raw accelerometer readings, in units of g.
///
/// Implementations are polled from the sensor worker thread.
pub trait SensorFeed: Send {
    /// Called when the worker starts. Hardware feeds power up here.
    fn activate(&mut self) -> Result<(), SensorError> {
        Ok(())
    }

    /// Called when the worker stops.
    fn deactivate(&mut self) {}

    /// Reads one sample.
    fn read(&mut self) -> Result<GravitySample, SensorError>;
}
