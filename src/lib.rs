//! Forward-rendering shading pipeline for textured, per-pixel-lit meshes.
//!
//! The core is two pure per-element kernels: [`transform`](render::transform::transform) maps
//! object-space vertices to clip space, and [`shade`](render::shading::shade) lights an
//! interpolated fragment with one directional light, an ambient term and a
//! diffuse texture using Phong reflectance. Matrices follow the row-vector
//! convention of [`math::RowMat4`].
//!
//! Around the kernels the crate carries the collaborators needed to drive
//! them end to end: mesh and texture loading, an XML scene description, a
//! reference rasterizer and a [`Renderer`] frontend that owns the frame
//! uniforms.

pub mod app;
pub mod math;
pub mod mesh;
pub mod obj;
pub mod render;
pub mod scene;
pub mod texture;

pub use math::{world_transform, RowMat4};
pub use mesh::{Mesh, MeshVertex};
pub use obj::{load_obj, load_obj_from_str};
pub use render::{
    shade, transform, DirectionalLight, DrawItem, Framebuffer, InterpolatedFragment, LightingState,
    Renderer, ShadingUniforms, TransformOutput, Vertex,
};
pub use scene::{CameraDesc, Scene, SceneObject};
pub use texture::{FilterMode, Sampler, Texture, TextureError, WrapMode};
