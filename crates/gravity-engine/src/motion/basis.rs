use glam::{Mat4, Vec3, Vec4};

use super::SmoothedGravity;

/// Below this magnitude the gravity estimate is too weak to orient from.
pub const MIN_GRAVITY_MAGNITUDE: f32 = 0.1;

/// Relative size under which the z component counts as zero when building the
/// perpendicular column.
const DEGENERATE_Z: f32 = 1e-6;

/// Orthonormal right-handed frame whose first column is the gravity direction.
///
/// Stored as a homogeneous 4x4 matrix with zero translation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RotationBasis {
    matrix: Mat4,
}

impl RotationBasis {
    /// Column `i` (0..3) of the rotation part.
    ///
    /// # Panics
    ///
    /// Panics if `i > 3`.
    #[inline]
    pub fn column(&self, i: usize) -> Vec3 {
        self.matrix.col(i).truncate()
    }

    /// Normalized gravity direction.
    #[inline]
    pub fn gravity_axis(&self) -> Vec3 {
        self.column(0)
    }

    #[inline]
    pub fn to_mat4(self) -> Mat4 {
        self.matrix
    }

    /// Column-major element array, the layout GPU uniforms expect.
    #[inline]
    pub fn to_cols_array(self) -> [f32; 16] {
        self.matrix.to_cols_array()
    }
}

/// Builds the rotation basis for gravity estimate `g`.
///
/// Returns `None` when `|g| < MIN_GRAVITY_MAGNITUDE` or `g` is not finite; the
/// caller decides what orientation to use instead.
///
/// Columns:
/// - col0 = g / |g|
/// - col1 = normalize(0, 1, -gy / gz), a vector in the plane perpendicular to g
/// - col2 = col0 x col1
///
/// When `gz` is zero relative to `|g|`, col1 takes the limit of the formula as
/// `gz` approaches zero from above: `(0, 0, -sign(gy))`, or `(0, 1, 0)` when `gy`
/// is zero too. Both are perpendicular to g in that case.
pub fn basis_from_gravity(g: SmoothedGravity) -> Option<RotationBasis> {
    let v = g.to_vec3();
    let len = v.length();
    if !len.is_finite() || len < MIN_GRAVITY_MAGNITUDE {
        return None;
    }

    let col0 = v / len;
    let col1 = perpendicular(v, len);
    let col2 = col0.cross(col1);

    Some(RotationBasis {
        matrix: Mat4::from_cols(
            col0.extend(0.0),
            col1.extend(0.0),
            col2.extend(0.0),
            Vec4::W,
        ),
    })
}

fn perpendicular(g: Vec3, len: f32) -> Vec3 {
    let eps = DEGENERATE_Z * len;

    if g.z.abs() > eps {
        return Vec3::new(0.0, 1.0, -g.y / g.z).normalize();
    }

    if g.y.abs() > eps {
        Vec3::new(0.0, 0.0, -g.y.signum())
    } else {
        Vec3::Y
    }
}
