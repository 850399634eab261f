//! Lighting stage: Phong reflectance from one directional light, modulated
//! by a diffuse texture.
//!
//! The operation order (normalize, dot, branch, pow) is fixed so results are
//! reproducible against other implementations of the same kernel. Output is
//! not clamped; over-bright channels are left for the display step.

use glam::{Vec3, Vec4};

use crate::texture::Sampler;

use super::common::{InterpolatedFragment, ShadingUniforms};

/// Reflects `incident` about `normal`: `I - 2 * dot(N, I) * N`.
pub fn reflect(incident: Vec3, normal: Vec3) -> Vec3 {
    incident - 2.0 * normal.dot(incident) * normal
}

/// Light term before texture modulation.
///
/// `n`, `l` and `v` must already be unit vectors: the surface normal, the
/// surface-to-light direction and the surface-to-camera direction.
pub fn phong_light<S: Sampler + ?Sized>(n: Vec3, l: Vec3, v: Vec3, uniforms: &ShadingUniforms<'_, S>) -> Vec3 {
    let r = reflect(-l, n).normalize();
    let n_dot_l = n.dot(l);
    // edge-on fragments (n_dot_l == 0) only get ambient
    if n_dot_l > 0.0 {
        let diffuse = uniforms.light.diffuse_color * n_dot_l;
        // the base is clamped so pow never sees a negative number
        let specular = uniforms.light.spec_color * r.dot(v).max(0.0).powf(uniforms.spec_power);
        uniforms.ambient_light + diffuse + specular
    } else {
        uniforms.ambient_light
    }
}

/// Final color for one fragment. Alpha comes straight from the texture.
pub fn shade<S: Sampler + ?Sized>(frag: &InterpolatedFragment, uniforms: &ShadingUniforms<'_, S>) -> Vec4 {
    let n = frag.world_normal.normalize();
    let l = (-uniforms.light.direction).normalize();
    let v = (uniforms.camera_pos - frag.world_pos).normalize();
    let phong = phong_light(n, l, v, uniforms);
    uniforms.texture.sample(frag.tex_coord) * phong.extend(1.0)
}
