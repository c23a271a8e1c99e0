use glam::Mat4;
use thiserror::Error;

use crate::coords::PixelSize;
use crate::geometry::StripMesh;

use super::SceneSetup;

/// The rendering context could not be created or made current. Unrecoverable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("failed to create rendering context: {0}")]
    Creation(String),
    #[error("rendering context lost: {0}")]
    Lost(String),
}

/// The drawable could not be (re)built at the requested size.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FramebufferError {
    #[error("drawable size {0} has a zero side")]
    ZeroSize(PixelSize),

    #[error("drawable size {size} exceeds the device limit of {max} pixels per side")]
    TooLarge { size: PixelSize, max: u32 },

    #[error("incomplete framebuffer: color {color}, depth {depth}")]
    Incomplete { color: PixelSize, depth: PixelSize },

    #[error(transparent)]
    Context(#[from] ContextError),
}

/// A frame could not be drawn.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Presentation failed in a way the surface cannot recover from.
    #[error("presentation failed: {0}")]
    Fatal(String),

    #[error(transparent)]
    Context(#[from] ContextError),
}

/// Color and depth targets built together at one size.
pub trait Framebuffer {
    /// Size of the color target, as read back from the platform.
    fn color_size(&self) -> PixelSize;

    fn depth_size(&self) -> PixelSize;
}

/// Per-frame inputs computed by the surface.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameParams {
    pub projection: Mat4,
    pub model_view: Mat4,
    pub clear_color: [f32; 4],
}

/// Result of a draw that did not fail.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameOutcome {
    /// The frame was presented.
    Presented,
    /// The frame was dropped (transient presentation error); try again next tick.
    Skipped,
    /// There is no complete drawable; nothing was drawn.
    Undrawable,
}

/// Graphics API seam used by `RenderSurface`.
///
/// Every method that touches GPU state is preceded by `make_current` on the
/// surface side, so backends may assume a current context.
pub trait GraphicsBackend {
    type Framebuffer: Framebuffer;

    /// Binds the rendering context to the calling thread, or reports it lost.
    fn make_current(&mut self) -> Result<(), ContextError>;

    /// One-time upload of static rendering state.
    fn configure(&mut self, scene: &SceneSetup, mesh: &StripMesh) -> Result<(), ContextError>;

    /// Current backing size of the window, as reported by the platform.
    fn backing_size(&self) -> PixelSize;

    /// Allocates color and depth targets for `requested` and validates them.
    ///
    /// The returned framebuffer reports the sizes actually allocated, which may
    /// be smaller than requested when the device limits the drawable size.
    fn create_framebuffer(
        &mut self,
        requested: PixelSize,
    ) -> Result<Self::Framebuffer, FramebufferError>;

    /// Clears, draws the static geometry with `params`, and presents.
    fn draw_frame(
        &mut self,
        framebuffer: &Self::Framebuffer,
        params: &FrameParams,
    ) -> Result<FrameOutcome, FrameError>;
}
