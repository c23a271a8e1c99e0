use std::sync::{Arc, Mutex, PoisonError};

use glam::Vec3;

use super::MotionError;

/// Smoothing factor used when none is configured.
pub const DEFAULT_FILTERING_FACTOR: f32 = 0.1;

/// One raw accelerometer reading, in g.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct GravitySample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl GravitySample {
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<Vec3> for GravitySample {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

/// Low-pass filtered gravity estimate.
///
/// Invariant: all components are finite. The initial value is the zero vector.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct SmoothedGravity {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl SmoothedGravity {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.to_vec3().length()
    }
}

impl From<Vec3> for SmoothedGravity {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

/// Exponential smoothing filter isolating gravity from accelerometer samples.
///
/// `smoothed = raw * alpha + smoothed * (1 - alpha)`, applied once per sample in
/// arrival order.
#[derive(Debug, Clone)]
pub struct GravityFilter {
    alpha: f32,
    smoothed: SmoothedGravity,
}

impl GravityFilter {
    /// Creates a filter with smoothing factor `alpha`, which must be in `(0, 1)`.
    pub fn new(alpha: f32) -> Result<Self, MotionError> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(MotionError::InvalidFilteringFactor(alpha));
        }
        Ok(Self {
            alpha,
            smoothed: SmoothedGravity::ZERO,
        })
    }

    #[inline]
    pub fn filtering_factor(&self) -> f32 {
        self.alpha
    }

    #[inline]
    pub fn current(&self) -> SmoothedGravity {
        self.smoothed
    }

    /// Folds one raw sample into the estimate and returns the new value.
    ///
    /// Non-finite samples are dropped so the estimate stays finite.
    pub fn update(&mut self, raw: GravitySample) -> SmoothedGravity {
        if !raw.is_finite() {
            log::warn!("dropping non-finite accelerometer sample {raw:?}");
            return self.smoothed;
        }

        let next = raw.to_vec3() * self.alpha + self.smoothed.to_vec3() * (1.0 - self.alpha);
        self.smoothed = SmoothedGravity::from(next);
        self.smoothed
    }

    /// Returns the estimate to the zero vector.
    pub fn reset(&mut self) {
        self.smoothed = SmoothedGravity::ZERO;
    }
}

impl Default for GravityFilter {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_FILTERING_FACTOR,
            smoothed: SmoothedGravity::ZERO,
        }
    }
}

/// Gravity estimate shared between the sensor thread (writer) and the renderer (reader).
///
/// Every read returns a whole snapshot taken under the lock, so the renderer
/// never observes a vector with only some components updated.
#[derive(Debug, Clone, Default)]
pub struct SharedGravity {
    inner: Arc<Mutex<GravityFilter>>,
}

impl SharedGravity {
    pub fn new(filter: GravityFilter) -> Self {
        Self {
            inner: Arc::new(Mutex::new(filter)),
        }
    }

    /// Applies one sample. Called from the sensor feed.
    pub fn push(&self, raw: GravitySample) -> SmoothedGravity {
        // The estimate is assigned whole, so a poisoned lock still holds a valid value.
        let mut filter = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        filter.update(raw)
    }

    /// Returns the latest estimate. Called from the draw path.
    pub fn snapshot(&self) -> SmoothedGravity {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .current()
    }

    pub fn reset(&self) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .reset();
    }
}
