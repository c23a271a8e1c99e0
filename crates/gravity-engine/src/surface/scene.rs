use glam::{Mat4, Vec3};

use crate::coords::PixelSize;
use crate::motion::Orientation;

/// Directional light, in eye space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Light {
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    /// Homogeneous position; `w = 0` makes it a direction.
    pub position: [f32; 4],
}

impl Default for Light {
    fn default() -> Self {
        Self {
            ambient: [0.2, 0.2, 0.2, 1.0],
            diffuse: [1.0, 0.6, 0.0, 1.0],
            specular: [1.0, 1.0, 1.0, 1.0],
            position: [0.0, 0.0, 1.0, 0.0],
        }
    }
}

/// Surface material shared by both faces.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Material {
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: [0.6, 0.6, 0.6, 1.0],
            diffuse: [1.0, 1.0, 1.0, 1.0],
            specular: [1.0, 1.0, 1.0, 1.0],
            shininess: 100.0,
        }
    }
}

/// Perspective parameters.
///
/// The field of view spans the drawable's width; the vertical extent follows
/// from the aspect ratio.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Projection {
    pub field_of_view_deg: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            field_of_view_deg: 60.0,
            z_near: 0.1,
            z_far: 1000.0,
        }
    }
}

impl Projection {
    /// Projection matrix for a drawable of `size` (wgpu clip space, depth 0..1).
    ///
    /// An empty size falls back to a square aspect ratio.
    pub fn matrix(&self, size: PixelSize) -> Mat4 {
        let aspect = size.aspect_ratio().unwrap_or(1.0);
        let half_width = (self.field_of_view_deg.to_radians() * 0.5).tan();
        let fov_y = 2.0 * (half_width / aspect).atan();
        Mat4::perspective_rh(fov_y, aspect, self.z_near, self.z_far)
    }
}

/// Fixed placement of the model in front of the camera.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ModelPlacement {
    pub translation: Vec3,
    pub scale: f32,
}

impl Default for ModelPlacement {
    fn default() -> Self {
        Self {
            translation: Vec3::new(0.0, -0.1, -1.0),
            scale: 3.0,
        }
    }
}

/// Static rendering parameters, fixed when the surface is configured.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SceneSetup {
    pub light: Light,
    pub material: Material,
    pub projection: Projection,
    pub placement: ModelPlacement,
    pub clear_color: [f32; 4],
}

impl Default for SceneSetup {
    fn default() -> Self {
        Self {
            light: Light::default(),
            material: Material::default(),
            projection: Projection::default(),
            placement: ModelPlacement::default(),
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl SceneSetup {
    /// Model-view transform: translate, scale, then the frame's rotation.
    pub fn model_view(&self, orientation: &Orientation) -> Mat4 {
        Mat4::from_translation(self.placement.translation)
            * Mat4::from_scale(Vec3::splat(self.placement.scale))
            * orientation.rotation()
    }
}
