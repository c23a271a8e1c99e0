//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, builds the render surface on top of
//! them and drives its lifecycle, timing and keyboard controls.

mod runtime;

pub use runtime::{GravityApp, Runtime, RuntimeConfig};
