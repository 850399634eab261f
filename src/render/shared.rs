use glam::{Vec2, Vec3};

use crate::mesh::{Mesh, MeshVertex};

/// (normal, u axis, v axis) for each cube face.
const CUBE_FACES: [(Vec3, Vec3, Vec3); 6] = [
    (Vec3::Z, Vec3::X, Vec3::NEG_Y),
    (Vec3::NEG_Z, Vec3::NEG_X, Vec3::NEG_Y),
    (Vec3::X, Vec3::NEG_Z, Vec3::NEG_Y),
    (Vec3::NEG_X, Vec3::Z, Vec3::NEG_Y),
    (Vec3::Y, Vec3::X, Vec3::Z),
    (Vec3::NEG_Y, Vec3::X, Vec3::NEG_Z),
];

/// Unit cube centered on the origin with per-face normals and UVs covering
/// each face once. Used when a scene object names no mesh or its mesh fails
/// to load.
pub fn default_cube() -> Mesh {
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, u_axis, v_axis) in CUBE_FACES {
        let base = vertices.len() as u32;
        for (u, v) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
            let position = normal * 0.5 + u_axis * (u - 0.5) + v_axis * (v - 0.5);
            vertices.push(MeshVertex::new(position, normal, Vec2::new(u, v)));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    Mesh::new(vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_six_quads_on_its_faces() {
        let cube = default_cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.triangle_count(), 12);
        for vertex in &cube.vertices {
            // every corner lies on the face its normal points out of
            assert!((vertex.position().dot(vertex.normal()) - 0.5).abs() < 1e-6);
            assert_eq!(vertex.position().abs(), Vec3::splat(0.5));
        }
        assert!((cube.radius - 0.75f32.sqrt()).abs() < 1e-6);
    }
}
