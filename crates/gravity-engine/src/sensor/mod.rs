//! Accelerometer polling.
//!
//! A `SensorWorker` polls a `SensorFeed` on its own thread and pushes every
//! successful reading into the shared gravity filter.

mod feed;
mod worker;

pub use feed::{SensorError, SensorFeed};
pub use worker::{SensorConfig, SensorWorker, DEFAULT_SENSOR_FREQUENCY_HZ};
