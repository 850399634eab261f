use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use glam::{Vec2, Vec3};

use crate::mesh::{Mesh, MeshVertex};

/// Parses an OBJ file from memory into an indexed mesh.
///
/// Faces may reference positions, texture coordinates and normals
/// (`v/vt/vn`). Vertices without a normal get an area-weighted average of
/// the surrounding face normals.
pub fn load_obj_from_str(data: &str) -> Result<Mesh> {
    let mut positions = Vec::new();
    let mut tex_coords = Vec::new();
    let mut normals = Vec::new();
    let mut faces: Vec<[FaceIndex; 3]> = Vec::new();

    for (line_no, line) in data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };
        match tag {
            "v" => positions.push(
                parse_vec3(parts)
                    .with_context(|| format!("invalid vertex on line {}", line_no + 1))?,
            ),
            "vt" => tex_coords.push(
                parse_vec2(parts)
                    .with_context(|| format!("invalid texture coordinate on line {}", line_no + 1))?,
            ),
            "vn" => normals.push(
                parse_vec3(parts)
                    .with_context(|| format!("invalid normal on line {}", line_no + 1))?,
            ),
            "f" => {
                let polygon = parse_face(parts)
                    .with_context(|| format!("invalid face on line {}", line_no + 1))?;
                triangulate_face(&polygon, &mut faces);
            }
            _ => {}
        }
    }

    if positions.is_empty() {
        return Err(anyhow!("OBJ file does not define any vertices"));
    }

    let mut mesh = build_mesh(&positions, &tex_coords, &normals, &faces)?;
    if needs_normals(&mesh.vertices) {
        compute_normals(&mut mesh);
    }
    Ok(mesh)
}

pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<Mesh> {
    let path = path.as_ref();
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("unable to read {}", path.display()))?;
    load_obj_from_str(&data).with_context(|| format!("failed to load mesh {}", path.display()))
}

fn parse_component<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<f32> {
    Ok(parts
        .next()
        .ok_or_else(|| anyhow!("missing vector component"))?
        .parse::<f32>()?)
}

fn parse_vec3<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Vec3> {
    let x = parse_component(&mut parts)?;
    let y = parse_component(&mut parts)?;
    let z = parse_component(&mut parts)?;
    Ok(Vec3::new(x, y, z))
}

fn parse_vec2<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Vec2> {
    let u = parse_component(&mut parts)?;
    // a lone u coordinate is legal, v defaults to 0
    let v = match parts.next() {
        Some(v) => v.parse::<f32>()?,
        None => 0.0,
    };
    Ok(Vec2::new(u, v))
}

fn parse_optional_index(segment: Option<&str>) -> Result<i32> {
    match segment {
        Some(s) if !s.is_empty() => Ok(s.parse::<i32>()?),
        _ => Ok(0),
    }
}

fn parse_face<'a>(parts: impl Iterator<Item = &'a str>) -> Result<Vec<FaceIndex>> {
    let mut indices = Vec::new();
    for part in parts {
        let mut segments = part.split('/');
        let v = segments
            .next()
            .ok_or_else(|| anyhow!("missing vertex index"))?
            .parse::<i32>()?;
        let vt = parse_optional_index(segments.next())?;
        let vn = parse_optional_index(segments.next())?;
        indices.push(FaceIndex { v, vt, vn });
    }
    if indices.len() < 3 {
        return Err(anyhow!("faces must reference at least 3 vertices"));
    }
    Ok(indices)
}

fn triangulate_face(polygon: &[FaceIndex], faces: &mut Vec<[FaceIndex; 3]>) {
    for i in 1..(polygon.len() - 1) {
        faces.push([polygon[0], polygon[i], polygon[i + 1]]);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Key {
    position: usize,
    tex_coord: Option<usize>,
    normal: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct FaceIndex {
    v: i32,
    vt: i32,
    vn: i32,
}

fn build_mesh(
    positions: &[Vec3],
    tex_coords: &[Vec2],
    normals: &[Vec3],
    faces: &[[FaceIndex; 3]],
) -> Result<Mesh> {
    let mut lookup: HashMap<Key, u32> = HashMap::new();
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for face in faces {
        for idx in face {
            let key = Key {
                position: fix_index(idx.v, positions.len())
                    .ok_or_else(|| anyhow!("invalid vertex index {}", idx.v))?,
                tex_coord: fix_index(idx.vt, tex_coords.len()),
                normal: fix_index(idx.vn, normals.len()),
            };
            let next_index = vertices.len() as u32;
            let entry = lookup.entry(key).or_insert_with(|| {
                vertices.push(MeshVertex::new(
                    positions[key.position],
                    key.normal.map(|i| normals[i]).unwrap_or(Vec3::ZERO),
                    key.tex_coord.map(|i| tex_coords[i]).unwrap_or(Vec2::ZERO),
                ));
                next_index
            });
            indices.push(*entry);
        }
    }

    Ok(Mesh::new(vertices, indices))
}

fn fix_index(index: i32, len: usize) -> Option<usize> {
    if index > 0 {
        let zero_based = index as usize - 1;
        (zero_based < len).then_some(zero_based)
    } else if index < 0 {
        let abs = index.unsigned_abs() as usize;
        (abs <= len).then_some(len - abs)
    } else {
        None
    }
}

fn needs_normals(vertices: &[MeshVertex]) -> bool {
    vertices.iter().any(|v| v.normal() == Vec3::ZERO)
}

fn compute_normals(mesh: &mut Mesh) {
    let mut accum = vec![Vec3::ZERO; mesh.vertices.len()];

    for triangle in mesh.indices.chunks_exact(3) {
        let [i0, i1, i2] = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];
        let p0 = mesh.vertices[i0].position();
        let p1 = mesh.vertices[i1].position();
        let p2 = mesh.vertices[i2].position();
        // unnormalized cross product weights by triangle area
        let normal = (p1 - p0).cross(p2 - p0);
        accum[i0] += normal;
        accum[i1] += normal;
        accum[i2] += normal;
    }

    for (vertex, normal) in mesh.vertices.iter_mut().zip(accum) {
        if vertex.normal() == Vec3::ZERO {
            vertex.normal = normal.normalize_or_zero().to_array();
        }
    }
}
