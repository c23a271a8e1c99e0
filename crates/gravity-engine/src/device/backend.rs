use winit::window::Window;

use crate::coords::PixelSize;
use crate::geometry::StripMesh;
use crate::render::{ModelRenderer, RenderCtx, RenderTarget};
use crate::surface::{
    ContextError, FrameError, FrameOutcome, FrameParams, Framebuffer, FramebufferError,
    GraphicsBackend, SceneSetup,
};

use super::{Gpu, GpuInit, WgpuFramebuffer, DEPTH_FORMAT};

/// `GraphicsBackend` over wgpu, bound to one window.
pub struct WgpuBackend<'w> {
    window: &'w Window,
    gpu: Gpu<'w>,
    renderer: ModelRenderer,
}

impl<'w> WgpuBackend<'w> {
    /// Creates the device and surface for `window`. Blocks on adapter acquisition.
    pub fn new(window: &'w Window, init: GpuInit) -> Result<Self, ContextError> {
        let gpu = pollster::block_on(Gpu::new(window, init))
            .map_err(|e| ContextError::Creation(format!("{e:#}")))?;

        Ok(Self {
            window,
            gpu,
            renderer: ModelRenderer::new(),
        })
    }

    #[inline]
    pub fn window(&self) -> &'w Window {
        self.window
    }

    #[inline]
    pub fn gpu(&self) -> &Gpu<'w> {
        &self.gpu
    }
}

impl<'w> GraphicsBackend for WgpuBackend<'w> {
    type Framebuffer = WgpuFramebuffer;

    fn make_current(&mut self) -> Result<(), ContextError> {
        if self.gpu.is_lost() {
            return Err(ContextError::Lost("the GPU device was lost".into()));
        }
        Ok(())
    }

    fn configure(&mut self, scene: &SceneSetup, mesh: &StripMesh) -> Result<(), ContextError> {
        let ctx = RenderCtx::new(
            self.gpu.device(),
            self.gpu.queue(),
            self.gpu.surface_format(),
            DEPTH_FORMAT,
        );
        self.renderer.configure(&ctx, scene, mesh);
        Ok(())
    }

    fn backing_size(&self) -> PixelSize {
        PixelSize::from(self.window.inner_size())
    }

    fn create_framebuffer(
        &mut self,
        requested: PixelSize,
    ) -> Result<WgpuFramebuffer, FramebufferError> {
        let color = self.gpu.configure_surface(requested)?;
        WgpuFramebuffer::new(self.gpu.device(), color, self.gpu.max_drawable_side())
    }

    fn draw_frame(
        &mut self,
        framebuffer: &WgpuFramebuffer,
        params: &FrameParams,
    ) -> Result<FrameOutcome, FrameError> {
        if framebuffer.color_size() != self.gpu.size() {
            log::debug!(
                "framebuffer {} does not match surface {}; skipping",
                framebuffer.color_size(),
                self.gpu.size()
            );
            return Ok(FrameOutcome::Skipped);
        }

        let mut frame = match self.gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => {
                let action = self.gpu.handle_surface_error(&err);
                return action.into_frame_result(&err);
            }
        };

        {
            let ctx = RenderCtx::new(
                self.gpu.device(),
                self.gpu.queue(),
                self.gpu.surface_format(),
                DEPTH_FORMAT,
            );
            let mut target =
                RenderTarget::new(&mut frame.encoder, &frame.view, framebuffer.depth_view());
            self.renderer.render(&ctx, &mut target, params);
        }

        self.gpu.submit(frame);
        Ok(FrameOutcome::Presented)
    }
}
