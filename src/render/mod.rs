pub mod common;
pub mod raster;
pub mod renderer;
pub mod shading;
pub mod shared;
pub mod transform;

pub use common::{DirectionalLight, InterpolatedFragment, ShadingUniforms, TransformOutput, Vertex};
pub use raster::{setup_triangle, ClipVertex, Framebuffer, FramebufferBand, ScreenTriangle};
pub use renderer::{DrawItem, FrameStats, LightingState, Renderer};
pub use shading::{phong_light, reflect, shade};
pub use shared::default_cube;
pub use transform::{transform, transform_vertex, world_normal, world_position};
