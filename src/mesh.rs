use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use serde::Deserialize;

/// Interleaved vertex as stored in vertex buffers: position, normal, UV.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coord: [f32; 2],
}

impl MeshVertex {
    pub const FLOATS: usize = 8;

    pub fn new(position: Vec3, normal: Vec3, tex_coord: Vec2) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            tex_coord: tex_coord.to_array(),
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn normal(&self) -> Vec3 {
        Vec3::from_array(self.normal)
    }

    pub fn tex_coord(&self) -> Vec2 {
        Vec2::from_array(self.tex_coord)
    }
}

/// Indexed triangle mesh with its material inputs.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    /// Texture file names, first one is the diffuse map.
    pub textures: Vec<String>,
    pub spec_power: f32,
    /// Distance of the farthest vertex from the object origin.
    pub radius: f32,
}

pub const DEFAULT_SPEC_POWER: f32 = 100.0;

#[derive(Debug, Deserialize)]
struct GpMeshFile {
    version: i64,
    #[serde(default)]
    shader: Option<String>,
    #[serde(default)]
    textures: Vec<String>,
    #[serde(rename = "specularPower", default = "default_spec_power")]
    spec_power: f32,
    #[serde(default)]
    vertices: Vec<Vec<f32>>,
    #[serde(default)]
    indices: Vec<Vec<u32>>,
}

fn default_spec_power() -> f32 {
    DEFAULT_SPEC_POWER
}

impl Mesh {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        let radius = bounding_radius(&vertices);
        Self {
            vertices,
            indices,
            textures: Vec::new(),
            spec_power: DEFAULT_SPEC_POWER,
            radius,
        }
    }

    /// Parses a version 1 `.gpmesh` JSON document.
    pub fn from_gpmesh_str(data: &str) -> Result<Self> {
        let file: GpMeshFile = serde_json::from_str(data).context("invalid gpmesh JSON")?;
        if file.version != 1 {
            bail!("mesh is version {}, expected 1", file.version);
        }
        if let Some(shader) = &file.shader {
            log::debug!("gpmesh requests shader {shader}");
        }
        if !(file.spec_power > 0.0) {
            bail!("specular power must be positive, got {}", file.spec_power);
        }
        if file.textures.is_empty() {
            bail!("mesh has no textures, there should be at least one");
        }
        if file.vertices.is_empty() {
            bail!("mesh has no vertices");
        }

        let vertices = file
            .vertices
            .iter()
            .enumerate()
            .map(|(i, v)| {
                if v.len() != MeshVertex::FLOATS {
                    return Err(anyhow!(
                        "vertex {i} has {} components, expected {}",
                        v.len(),
                        MeshVertex::FLOATS
                    ));
                }
                Ok(*bytemuck::from_bytes::<MeshVertex>(bytemuck::cast_slice(v)))
            })
            .collect::<Result<Vec<_>>>()?;

        if file.indices.is_empty() {
            bail!("mesh has no indices");
        }
        let mut indices = Vec::with_capacity(file.indices.len() * 3);
        for (i, triangle) in file.indices.iter().enumerate() {
            if triangle.len() != 3 {
                bail!("triangle {i} has {} indices, expected 3", triangle.len());
            }
            if let Some(bad) = triangle.iter().find(|&&idx| idx as usize >= vertices.len()) {
                bail!("triangle {i} references vertex {bad} out of {}", vertices.len());
            }
            indices.extend_from_slice(triangle);
        }

        let mut mesh = Self::new(vertices, indices);
        mesh.textures = file.textures;
        mesh.spec_power = file.spec_power;
        Ok(mesh)
    }

    pub fn load_gpmesh<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read {}", path.display()))?;
        Self::from_gpmesh_str(&data).with_context(|| format!("failed to load mesh {}", path.display()))
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// The vertex buffer as a flat float slice, 8 floats per vertex.
    pub fn vertex_data(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }
}

fn bounding_radius(vertices: &[MeshVertex]) -> f32 {
    vertices
        .iter()
        .map(|v| v.position().length_squared())
        .fold(0.0, f32::max)
        .sqrt()
}
