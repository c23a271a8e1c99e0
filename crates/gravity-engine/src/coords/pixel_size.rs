use winit::dpi::PhysicalSize;

/// Drawable size in physical pixels.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either side is zero (e.g. a minimized window).
    #[inline]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width over height. `None` for an empty size.
    #[inline]
    pub fn aspect_ratio(self) -> Option<f32> {
        if self.is_empty() {
            None
        } else {
            Some(self.width as f32 / self.height as f32)
        }
    }

    /// Clamps both sides to `max`.
    #[inline]
    pub fn clamp_to(self, max: u32) -> Self {
        Self::new(self.width.min(max), self.height.min(max))
    }
}

impl From<PhysicalSize<u32>> for PixelSize {
    fn from(s: PhysicalSize<u32>) -> Self {
        Self::new(s.width, s.height)
    }
}

impl std::fmt::Display for PixelSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
