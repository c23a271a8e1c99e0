//! Gravity estimation and orientation.
//!
//! This module turns raw accelerometer samples into a rotation the renderer can
//! load each frame:
//! - `GravityFilter` low-passes the sample stream into a gravity estimate
//! - `basis_from_gravity` builds an orthonormal frame from that estimate
//! - `OrientationTracker` applies the fallback policy when the estimate is unusable

mod basis;
mod error;
mod filter;
mod orientation;

pub use basis::{basis_from_gravity, RotationBasis, MIN_GRAVITY_MAGNITUDE};
pub use error::MotionError;
pub use filter::{
    GravityFilter, GravitySample, SharedGravity, SmoothedGravity, DEFAULT_FILTERING_FACTOR,
};
pub use orientation::{Orientation, OrientationFallbackPolicy, OrientationTracker, SpinState};
