use std::num::NonZeroU32;

/// Number of display ticks between draws. Always at least 1.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FrameInterval(NonZeroU32);

impl FrameInterval {
    /// Draw on every tick.
    pub const EVERY_TICK: Self = Self(NonZeroU32::MIN);

    /// Returns `None` for 0.
    #[inline]
    pub fn new(ticks: u32) -> Option<Self> {
        NonZeroU32::new(ticks).map(Self)
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for FrameInterval {
    fn default() -> Self {
        Self::EVERY_TICK
    }
}
