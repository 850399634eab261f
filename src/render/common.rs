use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::texture::Sampler;

/// Object-space vertex consumed by the transform stage.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Vec3,
    pub tex_coord: Vec2,
}

/// Result of the transform stage for one vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformOutput {
    pub clip_pos: Vec4,
    pub tex_coord: Vec2,
}

/// Per-pixel attributes produced by interpolating a triangle's vertices.
///
/// `world_normal` is a blend of unit normals and is therefore not unit
/// length; shading re-normalizes it. It must not be the zero vector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InterpolatedFragment {
    pub tex_coord: Vec2,
    pub world_normal: Vec3,
    pub world_pos: Vec3,
}

/// Single directional light.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    /// Unit vector pointing from the light towards the scene.
    #[serde(default = "default_light_direction")]
    pub direction: Vec3,
    #[serde(default = "default_diffuse_color")]
    pub diffuse_color: Vec3,
    #[serde(default = "default_spec_color")]
    pub spec_color: Vec3,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: default_light_direction(),
            diffuse_color: default_diffuse_color(),
            spec_color: default_spec_color(),
        }
    }
}

pub(crate) fn default_light_direction() -> Vec3 {
    Vec3::new(0.0, -0.707, -0.707)
}

pub(crate) fn default_diffuse_color() -> Vec3 {
    Vec3::new(0.78, 0.88, 1.0)
}

pub(crate) fn default_spec_color() -> Vec3 {
    Vec3::splat(0.8)
}

pub(crate) fn default_ambient_light() -> Vec3 {
    Vec3::splat(0.2)
}

/// Uniform inputs of the shading stage, read-only for a whole batch.
#[derive(Clone, Copy, Debug)]
pub struct ShadingUniforms<'a, S: Sampler + ?Sized> {
    pub camera_pos: Vec3,
    pub ambient_light: Vec3,
    /// Specular exponent, must be greater than zero.
    pub spec_power: f32,
    pub light: DirectionalLight,
    pub texture: &'a S,
}
