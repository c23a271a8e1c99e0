use glam::Mat4;

use super::{basis_from_gravity, RotationBasis, SmoothedGravity};

/// What to show when the gravity estimate is too weak to orient from.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum OrientationFallbackPolicy {
    /// Procedural spin, for running without a real sensor.
    #[default]
    AnimatedSpin,
    /// Keep the rotation used by the previous frame.
    HoldLastOrientation,
    /// Show the model unrotated.
    Identity,
}

/// Rotation resolved for one frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Orientation {
    /// Built from a usable gravity estimate.
    Tracked(RotationBasis),
    /// Produced by the fallback policy.
    Fallback(Mat4),
}

impl Orientation {
    #[inline]
    pub fn is_tracked(&self) -> bool {
        matches!(self, Orientation::Tracked(_))
    }

    /// Rotation to multiply into the model transform.
    ///
    /// A tracked basis is followed by a 90 degree turn about Z so the model's
    /// rest pose lines up with the device frame.
    pub fn rotation(&self) -> Mat4 {
        match self {
            Orientation::Tracked(basis) => {
                basis.to_mat4() * Mat4::from_rotation_z(90f32.to_radians())
            }
            Orientation::Fallback(m) => *m,
        }
    }
}

/// Angles of the procedural fallback spin, in degrees.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct SpinState {
    pub spin_x: f32,
    pub spin_y: f32,
}

impl SpinState {
    const STEP_X: f32 = 1.0;
    const STEP_Y: f32 = 0.25;

    /// Rotation for the current angles: `spin_x` about Z, `spin_y` about Y, then
    /// a fixed 90 degrees about X.
    pub fn rotation(&self) -> Mat4 {
        Mat4::from_rotation_z(self.spin_x.to_radians())
            * Mat4::from_rotation_y(self.spin_y.to_radians())
            * Mat4::from_rotation_x(90f32.to_radians())
    }

    /// Advances both angles by one frame, wrapping at 360.
    pub fn advance(&mut self) {
        self.spin_x = (self.spin_x + Self::STEP_X).rem_euclid(360.0);
        self.spin_y = (self.spin_y + Self::STEP_Y).rem_euclid(360.0);
    }
}

/// Resolves a gravity estimate into a frame rotation, applying the fallback policy.
///
/// Each render surface owns its own tracker, so spin state is never shared
/// between surfaces.
#[derive(Debug, Clone)]
pub struct OrientationTracker {
    policy: OrientationFallbackPolicy,
    spin: SpinState,
    last: Mat4,
}

impl OrientationTracker {
    pub fn new(policy: OrientationFallbackPolicy) -> Self {
        Self {
            policy,
            spin: SpinState::default(),
            last: Mat4::IDENTITY,
        }
    }

    #[inline]
    pub fn policy(&self) -> OrientationFallbackPolicy {
        self.policy
    }

    #[inline]
    pub fn spin(&self) -> SpinState {
        self.spin
    }

    /// Resolves the orientation for one frame.
    ///
    /// Call exactly once per drawn frame: the spin fallback advances on every
    /// call that takes it.
    pub fn resolve(&mut self, gravity: SmoothedGravity) -> Orientation {
        let orientation = match basis_from_gravity(gravity) {
            Some(basis) => Orientation::Tracked(basis),
            None => Orientation::Fallback(self.fallback()),
        };

        self.last = orientation.rotation();
        orientation
    }

    fn fallback(&mut self) -> Mat4 {
        match self.policy {
            OrientationFallbackPolicy::AnimatedSpin => {
                let rotation = self.spin.rotation();
                self.spin.advance();
                rotation
            }
            OrientationFallbackPolicy::HoldLastOrientation => self.last,
            OrientationFallbackPolicy::Identity => Mat4::IDENTITY,
        }
    }
}

impl Default for OrientationTracker {
    fn default() -> Self {
        Self::new(OrientationFallbackPolicy::default())
    }
}
