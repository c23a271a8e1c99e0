//! Size types shared by the surface and the GPU backend.
//!
//! Sizes are in physical pixels, as reported by the windowing platform.

mod pixel_size;

pub use pixel_size::PixelSize;
