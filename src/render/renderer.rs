use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use glam::Vec3;
use log::{debug, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::math::RowMat4;
use crate::mesh::Mesh;
use crate::texture::Texture;

use super::common::{default_ambient_light, DirectionalLight, InterpolatedFragment, ShadingUniforms};
use super::raster::{setup_triangle, ClipVertex, Framebuffer, ScreenTriangle};
use super::shading::shade;
use super::transform::{transform, world_normal, world_position};

/// Frame-wide lighting inputs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LightingState {
    #[serde(default = "default_ambient_light")]
    pub ambient_light: Vec3,
    #[serde(default)]
    pub light: DirectionalLight,
}

impl Default for LightingState {
    fn default() -> Self {
        Self {
            ambient_light: default_ambient_light(),
            light: DirectionalLight::default(),
        }
    }
}

/// One mesh instance to draw.
#[derive(Clone, Copy, Debug)]
pub struct DrawItem<'a> {
    pub mesh: &'a Mesh,
    pub texture: &'a Texture,
    pub world: RowMat4,
    pub spec_power: f32,
}

impl<'a> DrawItem<'a> {
    /// Uses the mesh's own specular power.
    pub fn new(mesh: &'a Mesh, texture: &'a Texture, world: RowMat4) -> Self {
        Self {
            mesh,
            texture,
            world,
            spec_power: mesh.spec_power,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub triangles_submitted: usize,
    pub triangles_rasterized: usize,
    pub fragments_shaded: usize,
}

/// Drives both pipeline stages over a list of draw items.
///
/// Lighting lives behind a lock that `draw` holds for reading until the last
/// fragment of the batch is shaded, so lighting updates from other threads
/// land between frames and never in the middle of one.
#[derive(Debug)]
pub struct Renderer {
    view: RowMat4,
    projection: RowMat4,
    lighting: RwLock<LightingState>,
    threads: usize,
}

impl Renderer {
    pub fn new(view: RowMat4, projection: RowMat4) -> Self {
        let threads = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            view,
            projection,
            lighting: RwLock::new(LightingState::default()),
            threads,
        }
    }

    /// Number of worker threads used for the fragment stage.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn set_view_matrix(&mut self, view: RowMat4) {
        self.view = view;
    }

    pub fn set_projection_matrix(&mut self, projection: RowMat4) {
        self.projection = projection;
    }

    pub fn view(&self) -> &RowMat4 {
        &self.view
    }

    pub fn projection(&self) -> &RowMat4 {
        &self.projection
    }

    /// View then projection, in row-vector order.
    pub fn view_proj(&self) -> RowMat4 {
        self.view * self.projection
    }

    /// Camera position recovered from the inverted view matrix.
    pub fn camera_position(&self) -> Vec3 {
        self.view.inverse().translation()
    }

    pub fn lighting(&self) -> LightingState {
        *self.lighting.read()
    }

    pub fn set_lighting(&self, lighting: LightingState) {
        *self.lighting.write() = lighting;
    }

    pub fn set_ambient_light(&self, ambient_light: Vec3) {
        self.lighting.write().ambient_light = ambient_light;
    }

    pub fn set_directional_light(&self, light: DirectionalLight) {
        self.lighting.write().light = light;
    }

    /// Renders `items` into `framebuffer`, depth-testing against what is
    /// already there.
    pub fn draw(&self, items: &[DrawItem<'_>], framebuffer: &mut Framebuffer) -> FrameStats {
        let lighting = self.lighting.read();
        let view_proj = self.view_proj();
        let camera_pos = self.camera_position();
        let (width, height) = (framebuffer.width(), framebuffer.height());
        let mut stats = FrameStats::default();

        let mut batches: Vec<(ShadingUniforms<'_, Texture>, Vec<ScreenTriangle>)> = Vec::with_capacity(items.len());
        for item in items {
            let clip: Vec<ClipVertex> = item
                .mesh
                .vertices
                .iter()
                .map(|v| {
                    let out = transform(v.position(), &item.world, &view_proj, v.tex_coord());
                    ClipVertex {
                        clip_pos: out.clip_pos,
                        tex_coord: out.tex_coord,
                        world_normal: world_normal(v.normal(), &item.world),
                        world_pos: world_position(v.position(), &item.world),
                    }
                })
                .collect();

            let mut triangles = Vec::new();
            for indices in item.mesh.indices.chunks_exact(3) {
                stats.triangles_submitted += 1;
                let corner = |i: u32| clip.get(i as usize).copied();
                let (Some(a), Some(b), Some(c)) = (corner(indices[0]), corner(indices[1]), corner(indices[2])) else {
                    warn!("skipping triangle with out of range index {indices:?}");
                    continue;
                };
                triangles.extend(setup_triangle(&[a, b, c], width, height));
            }
            stats.triangles_rasterized += triangles.len();

            let uniforms = ShadingUniforms {
                camera_pos,
                ambient_light: lighting.ambient_light,
                spec_power: item.spec_power,
                light: lighting.light,
                texture: item.texture,
            };
            batches.push((uniforms, triangles));
        }

        let rows_per_band = height.div_ceil(self.threads as u32).max(1);
        let fragments = AtomicUsize::new(0);
        thread::scope(|scope| {
            for mut band in framebuffer.bands_mut(rows_per_band) {
                let batches = &batches;
                let fragments = &fragments;
                scope.spawn(move || {
                    let mut shaded = 0;
                    for (uniforms, triangles) in batches {
                        let shader = |frag: &InterpolatedFragment| shade(frag, uniforms);
                        for triangle in triangles {
                            shaded += triangle.rasterize(&mut band, &shader);
                        }
                    }
                    fragments.fetch_add(shaded, Ordering::Relaxed);
                });
            }
        });
        stats.fragments_shaded = fragments.into_inner();

        debug!(
            "drew {} items: {} triangles submitted, {} rasterized, {} fragments",
            items.len(),
            stats.triangles_submitted,
            stats.triangles_rasterized,
            stats.fragments_shaded
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    use crate::render::shared::default_cube;

    fn camera() -> Renderer {
        let view = RowMat4::look_at(Vec3::new(-3.0, 0.0, 0.0), Vec3::ZERO, Vec3::Z);
        let projection = RowMat4::perspective_fov(60f32.to_radians(), 64.0, 64.0, 0.5, 100.0);
        Renderer::new(view, projection)
    }

    #[test]
    fn camera_position_comes_from_inverted_view() {
        let renderer = camera();
        assert!((renderer.camera_position() - Vec3::new(-3.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn cube_covers_center_of_the_frame() {
        let renderer = camera();
        let cube = default_cube();
        let texture = Texture::white();
        let mut framebuffer = Framebuffer::new(64, 64);
        let stats = renderer.draw(
            &[DrawItem::new(&cube, &texture, RowMat4::IDENTITY)],
            &mut framebuffer,
        );
        assert_eq!(stats.triangles_submitted, 12);
        assert!(stats.fragments_shaded > 0);
        // the -X face is edge-on to the default light, so it is ambient only
        assert_eq!(framebuffer.pixel(32, 32), Vec4::new(0.2, 0.2, 0.2, 1.0));
        assert_eq!(framebuffer.pixel(0, 0), Vec4::ZERO);
    }

    #[test]
    fn thread_count_does_not_change_the_image() {
        let cube = default_cube();
        let texture = Texture::checkerboard(32, [255, 0, 0, 255], [0, 0, 255, 255]);
        let world = RowMat4::from_rotation_z(0.6) * RowMat4::from_rotation_y(0.3);
        let mut single = Framebuffer::new(48, 48);
        let mut many = Framebuffer::new(48, 48);
        camera()
            .with_threads(1)
            .draw(&[DrawItem::new(&cube, &texture, world)], &mut single);
        camera()
            .with_threads(7)
            .draw(&[DrawItem::new(&cube, &texture, world)], &mut many);
        assert_eq!(single.to_rgba8(), many.to_rgba8());
    }

    #[test]
    fn lighting_updates_apply_to_the_next_frame() {
        let renderer = camera();
        let cube = default_cube();
        let texture = Texture::white();
        renderer.set_directional_light(DirectionalLight {
            direction: Vec3::X,
            diffuse_color: Vec3::ZERO,
            spec_color: Vec3::ZERO,
        });
        renderer.set_ambient_light(Vec3::splat(0.5));
        let mut framebuffer = Framebuffer::new(32, 32);
        renderer.draw(&[DrawItem::new(&cube, &texture, RowMat4::IDENTITY)], &mut framebuffer);
        assert_eq!(framebuffer.pixel(16, 16), Vec4::new(0.5, 0.5, 0.5, 1.0));
        assert_eq!(renderer.lighting().ambient_light, Vec3::splat(0.5));
    }
}
