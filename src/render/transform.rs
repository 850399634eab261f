//! Geometry stage: object space to clip space.
//!
//! Every matrix here is a [`RowMat4`]: points are row vectors multiplied on
//! the left, so `point * world * view_proj` maps object space to world
//! space first and world space to clip space second. Callers holding
//! column-vector matrices must convert them with
//! [`RowMat4::from_column_major`] rather than reorder the product.

use glam::{Vec2, Vec3, Vec4};

use crate::math::RowMat4;

use super::common::{TransformOutput, Vertex};

/// Maps `position` to clip space and passes `tex_coord` through untouched.
pub fn transform(position: Vec3, world: &RowMat4, view_proj: &RowMat4, tex_coord: Vec2) -> TransformOutput {
    let point = position.extend(1.0);
    let clip_pos = point * *world * *view_proj;
    TransformOutput { clip_pos, tex_coord }
}

pub fn transform_vertex(vertex: &Vertex, world: &RowMat4, view_proj: &RowMat4) -> TransformOutput {
    transform(vertex.position, world, view_proj, vertex.tex_coord)
}

/// World-space position of an object-space point.
pub fn world_position(position: Vec3, world: &RowMat4) -> Vec3 {
    (position.extend(1.0) * *world).truncate()
}

/// World-space normal. The normal is embedded with `w = 0` so translation
/// drops out; the result is not normalized.
pub fn world_normal(normal: Vec3, world: &RowMat4) -> Vec3 {
    (Vec4::new(normal.x, normal.y, normal.z, 0.0) * *world).truncate()
}
