//! GPU rendering subsystem.
//!
//! Renderers own their GPU resources (pipelines, buffers) and record into a
//! `RenderTarget` supplied by the device layer.
//!
//! Convention:
//! - Geometry is in model units; transforms arrive per frame as matrices.
//! - Clip space follows wgpu (depth 0..1).

mod ctx;
mod model;

pub use ctx::{RenderCtx, RenderTarget};
pub use model::ModelRenderer;
