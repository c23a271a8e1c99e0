use crate::coords::PixelSize;
use crate::surface::{Framebuffer, FramebufferError};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Drawable bundle: the configured swapchain (color) plus a matching depth texture.
///
/// The swapchain image itself is acquired per frame; this records the size it
/// was configured with.
pub struct WgpuFramebuffer {
    color_size: PixelSize,
    depth_size: PixelSize,
    _depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
}

impl WgpuFramebuffer {
    /// Allocates a depth target for a swapchain configured at `color_size`.
    pub fn new(
        device: &wgpu::Device,
        color_size: PixelSize,
        max_side: u32,
    ) -> Result<Self, FramebufferError> {
        let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("gravity depth texture"),
            size: wgpu::Extent3d {
                width: color_size.width,
                height: color_size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        let depth_size = PixelSize::new(depth_texture.width(), depth_texture.height());
        check_complete(color_size, depth_size, max_side)?;

        let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(Self {
            color_size,
            depth_size,
            _depth_texture: depth_texture,
            depth_view,
        })
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }
}

impl Framebuffer for WgpuFramebuffer {
    fn color_size(&self) -> PixelSize {
        self.color_size
    }

    fn depth_size(&self) -> PixelSize {
        self.depth_size
    }
}

/// Completeness rules for a color/depth pair.
pub(crate) fn check_complete(
    color: PixelSize,
    depth: PixelSize,
    max_side: u32,
) -> Result<(), FramebufferError> {
    if color.is_empty() {
        return Err(FramebufferError::ZeroSize(color));
    }
    if color.width > max_side || color.height > max_side {
        return Err(FramebufferError::TooLarge { size: color, max: max_side });
    }
    if color != depth {
        return Err(FramebufferError::Incomplete { color, depth });
    }
    Ok(())
}
