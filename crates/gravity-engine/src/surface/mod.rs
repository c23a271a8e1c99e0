//! Gravity-tracking render surface.
//!
//! `RenderSurface` owns the drawable, the animation driver and the per-frame
//! orientation. All graphics calls go through the `GraphicsBackend` seam so the
//! state machine runs without a GPU.

mod backend;
mod driver;
mod render_surface;
mod scene;

#[cfg(test)]
mod testing;

pub use backend::{
    ContextError, FrameError, FrameOutcome, FrameParams, Framebuffer, FramebufferError,
    GraphicsBackend,
};
pub use driver::AnimationDriver;
pub use render_surface::{RenderSurface, SurfaceConfig, SurfaceState};
pub use scene::{Light, Material, ModelPlacement, Projection, SceneSetup};
