//! Gravity engine crate.
//!
//! Renders a model that keeps pointing along the measured gravity vector:
//! accelerometer samples are low-pass filtered, turned into a rotation basis
//! and drawn through a wgpu-backed render surface.

pub mod coords;
pub mod device;
pub mod geometry;
pub mod logging;
pub mod motion;
pub mod render;
pub mod sensor;
pub mod surface;
pub mod time;
pub mod window;
