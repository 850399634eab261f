use std::path::Path;

use anyhow::{bail, Result};
use glam::{Vec3, Vec4};
use log::{info, warn};

use crate::math::RowMat4;
use crate::mesh::Mesh;
use crate::obj::load_obj;
use crate::render::{default_cube, DrawItem, FrameStats, Framebuffer, Renderer};
use crate::scene::{Scene, SceneObject};
use crate::texture::Texture;

pub const CLEAR_COLOR: Vec4 = Vec4::new(0.0, 0.0, 0.0, 1.0);

/// Scene object with its assets resolved.
#[derive(Debug, Clone)]
pub struct LoadedObject {
    pub name: String,
    pub mesh: Mesh,
    pub texture: Texture,
    pub world: RowMat4,
    pub spec_power: f32,
}

impl LoadedObject {
    pub fn draw_item(&self) -> DrawItem<'_> {
        DrawItem {
            mesh: &self.mesh,
            texture: &self.texture,
            world: self.world,
            spec_power: self.spec_power,
        }
    }
}

/// Loads a mesh by extension: `.obj` or `.gpmesh`.
pub fn load_mesh(path: &Path) -> Result<Mesh> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("obj") => load_obj(path),
        Some(ext) if ext.eq_ignore_ascii_case("gpmesh") => Mesh::load_gpmesh(path),
        _ => bail!("unsupported mesh format: {}", path.display()),
    }
}

/// Resolves meshes and textures relative to `base_dir`.
///
/// A missing or broken mesh is replaced by the built-in cube and a missing
/// or broken texture by a white texel; both are logged and never fatal.
pub fn load_objects(scene: &Scene, base_dir: &Path) -> Vec<LoadedObject> {
    scene
        .objects
        .iter()
        .map(|object| load_object(object, base_dir))
        .collect()
}

fn load_object(object: &SceneObject, base_dir: &Path) -> LoadedObject {
    let mesh = match &object.mesh {
        Some(name) => load_mesh(&base_dir.join(name)).unwrap_or_else(|err| {
            warn!("failed to load mesh {name} for {}: {err:?}", object.name);
            default_cube()
        }),
        None => default_cube(),
    };

    let texture_name = object.texture.as_ref().or(mesh.textures.first());
    let texture = match texture_name {
        Some(name) => Texture::open(base_dir.join(name)).unwrap_or_else(|err| {
            warn!("failed to load texture {name} for {}: {err}", object.name);
            Texture::white()
        }),
        None => Texture::white(),
    };

    LoadedObject {
        name: object.name.clone(),
        spec_power: object.spec_power.unwrap_or(mesh.spec_power),
        world: object.world_transform(),
        mesh,
        texture,
    }
}

pub fn renderer_for_scene(scene: &Scene, width: u32, height: u32) -> Renderer {
    let renderer = Renderer::new(scene.camera.view(), scene.camera.projection(width, height));
    renderer.set_lighting(scene.lighting);
    renderer
}

/// Renders one frame of `objects` as seen by the scene camera.
pub fn render_frame(scene: &Scene, objects: &[LoadedObject], width: u32, height: u32) -> (Framebuffer, FrameStats) {
    let renderer = renderer_for_scene(scene, width, height);
    let mut framebuffer = Framebuffer::new(width, height);
    framebuffer.clear(CLEAR_COLOR);
    let items: Vec<DrawItem<'_>> = objects.iter().map(LoadedObject::draw_item).collect();
    let stats = renderer.draw(&items, &mut framebuffer);
    info!(
        "rendered {}x{} frame with {} objects",
        framebuffer.width(),
        framebuffer.height(),
        objects.len()
    );
    (framebuffer, stats)
}

fn fmt_vec3(v: Vec3) -> String {
    format!("({:.2}, {:.2}, {:.2})", v.x, v.y, v.z)
}

pub fn print_summary(scene: &Scene) {
    println!("Loaded scene with {} objects", scene.objects.len());
    for object in &scene.objects {
        println!(
            " - {} (mesh: {}, texture: {})",
            object.name,
            object.mesh.as_deref().unwrap_or("<cube>"),
            object.texture.as_deref().unwrap_or("<mesh default>")
        );
    }
    println!(
        "Camera at {} looking at {}",
        fmt_vec3(scene.camera.position),
        fmt_vec3(scene.camera.target)
    );
    let lighting = &scene.lighting;
    println!(
        "Ambient {} light direction {} diffuse {} specular {}",
        fmt_vec3(lighting.ambient_light),
        fmt_vec3(lighting.light.direction),
        fmt_vec3(lighting.light.diffuse_color),
        fmt_vec3(lighting.light.spec_color)
    );
}
