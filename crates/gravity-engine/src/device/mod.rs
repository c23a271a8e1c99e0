//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Device/Queue and tracking device loss
//! - creating & configuring the Surface (swapchain) and its depth target
//! - acquiring frames and providing encoders/views for rendering
//! - implementing `GraphicsBackend` for `RenderSurface`

mod backend;
mod error;
mod frame;
mod framebuffer;
mod gpu;
mod init;
mod surface;

pub use backend::WgpuBackend;
pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use framebuffer::{WgpuFramebuffer, DEPTH_FORMAT};
pub use gpu::Gpu;
pub use init::GpuInit;
