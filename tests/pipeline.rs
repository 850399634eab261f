use glam::{Quat, Vec2, Vec3, Vec4};

use phong_pipeline::render::phong_light;
use phong_pipeline::{
    shade, transform, world_transform, DirectionalLight, InterpolatedFragment, RowMat4,
    ShadingUniforms, Texture,
};

fn assert_close(actual: Vec4, expected: Vec4) {
    assert!(
        (actual - expected).abs().max_element() < 1e-6,
        "expected {expected:?}, got {actual:?}"
    );
}

fn sample_points() -> Vec<Vec3> {
    vec![
        Vec3::ZERO,
        Vec3::new(1.0, -2.0, 3.5),
        Vec3::new(-1000.0, 0.25, 42.0),
        Vec3::new(1e-7, 7e6, -3.0),
    ]
}

#[test]
fn identity_transform_embeds_point_and_keeps_uv() {
    for p in sample_points() {
        let uv = Vec2::new(p.x.fract(), p.y.fract());
        let out = transform(p, &RowMat4::IDENTITY, &RowMat4::IDENTITY, uv);
        assert_eq!(out.clip_pos, p.extend(1.0));
        assert_eq!(out.tex_coord, uv);
    }
}

#[test]
fn tex_coord_passes_through_any_matrices() {
    let world = world_transform(Vec3::new(2.0, 0.5, 1.0), Quat::from_rotation_y(0.4), Vec3::new(5.0, 6.0, 7.0));
    let view_proj = RowMat4::look_at(Vec3::new(-10.0, 1.0, 2.0), Vec3::ZERO, Vec3::Z)
        * RowMat4::perspective_fov(1.2, 800.0, 600.0, 0.1, 500.0);
    for (i, p) in sample_points().into_iter().enumerate() {
        let uv = Vec2::new(i as f32 * 1.75 - 2.0, -0.5 * i as f32);
        assert_eq!(transform(p, &world, &view_proj, uv).tex_coord, uv);
    }
}

#[test]
fn row_vector_order_matches_column_vector_equivalent() {
    let world = world_transform(Vec3::splat(1.5), Quat::from_rotation_x(0.9), Vec3::new(1.0, 2.0, 3.0));
    let view_proj = RowMat4::look_at(Vec3::new(0.0, -8.0, 1.0), Vec3::ZERO, Vec3::Z)
        * RowMat4::perspective_fov(1.0, 4.0, 3.0, 0.5, 50.0);
    let p = Vec3::new(0.3, -0.7, 1.1);
    let row = transform(p, &world, &view_proj, Vec2::ZERO).clip_pos;
    // a column-vector library multiplies the converted matrices in reverse
    let column = view_proj.to_column_major() * world.to_column_major() * p.extend(1.0);
    assert!((row - column).abs().max_element() < 1e-4);
}

#[test]
fn surface_facing_away_from_light_is_ambient_only() {
    let texture = Texture::solid_color([255, 128, 0, 255]);
    let uniforms = ShadingUniforms {
        camera_pos: Vec3::new(0.0, 5.0, 0.0),
        ambient_light: Vec3::new(0.2, 0.3, 0.4),
        spec_power: 10.0,
        light: DirectionalLight {
            direction: Vec3::Y,
            diffuse_color: Vec3::ONE,
            spec_color: Vec3::ONE,
        },
        texture: &texture,
    };
    let frag = InterpolatedFragment {
        tex_coord: Vec2::new(0.3, 0.6),
        world_normal: Vec3::Y,
        world_pos: Vec3::ZERO,
    };
    let texel = Vec4::new(1.0, 128.0 / 255.0, 0.0, 1.0);
    assert_close(shade(&frag, &uniforms), texel * Vec4::new(0.2, 0.3, 0.4, 1.0));
}

#[test]
fn pure_ambient_on_white_texel() {
    let texture = Texture::white();
    let uniforms = ShadingUniforms {
        camera_pos: Vec3::new(3.0, 1.0, 2.0),
        ambient_light: Vec3::splat(0.2),
        spec_power: 32.0,
        light: DirectionalLight {
            direction: Vec3::new(0.0, -1.0, 0.0),
            diffuse_color: Vec3::ZERO,
            spec_color: Vec3::ZERO,
        },
        texture: &texture,
    };
    let frag = InterpolatedFragment {
        tex_coord: Vec2::new(0.5, 0.5),
        world_normal: Vec3::new(0.0, 2.0, 0.0),
        world_pos: Vec3::ZERO,
    };
    assert_eq!(shade(&frag, &uniforms), Vec4::new(0.2, 0.2, 0.2, 1.0));
}

#[test]
fn specular_is_zero_when_reflection_is_orthogonal_to_view() {
    let texture = Texture::white();
    let uniforms = ShadingUniforms {
        camera_pos: Vec3::ZERO,
        ambient_light: Vec3::ZERO,
        spec_power: 7.5,
        light: DirectionalLight {
            direction: Vec3::new(0.0, 0.0, -1.0),
            diffuse_color: Vec3::ZERO,
            spec_color: Vec3::splat(1000.0),
        },
        texture: &texture,
    };
    assert_eq!(phong_light(Vec3::Z, Vec3::Z, Vec3::X, &uniforms), Vec3::ZERO);

    // same geometry through the full kernel: camera along +X from the fragment
    let uniforms = ShadingUniforms {
        camera_pos: Vec3::new(10.0, 0.0, 0.0),
        light: DirectionalLight {
            diffuse_color: Vec3::splat(0.5),
            ..uniforms.light
        },
        ..uniforms
    };
    let frag = InterpolatedFragment {
        tex_coord: Vec2::ZERO,
        world_normal: Vec3::Z,
        world_pos: Vec3::ZERO,
    };
    assert_eq!(shade(&frag, &uniforms), Vec4::new(0.5, 0.5, 0.5, 1.0));
}

#[test]
fn negative_specular_base_never_produces_nan() {
    let texture = Texture::white();
    for spec_power in [0.5, 1.0, 2.5, 100.0] {
        let uniforms = ShadingUniforms {
            // camera below the surface, so dot(R, V) < 0
            camera_pos: Vec3::new(0.0, 0.0, -5.0),
            ambient_light: Vec3::ZERO,
            spec_power,
            light: DirectionalLight {
                direction: Vec3::new(0.3, 0.0, -1.0).normalize(),
                diffuse_color: Vec3::ZERO,
                spec_color: Vec3::ONE,
            },
            texture: &texture,
        };
        let frag = InterpolatedFragment {
            tex_coord: Vec2::ZERO,
            world_normal: Vec3::Z,
            world_pos: Vec3::ZERO,
        };
        let color = shade(&frag, &uniforms);
        assert_eq!(color, Vec4::new(0.0, 0.0, 0.0, 1.0), "spec_power {spec_power}");
    }
}

#[test]
fn both_stages_are_bit_for_bit_repeatable() {
    let world = world_transform(Vec3::splat(0.7), Quat::from_rotation_z(2.1), Vec3::new(-3.0, 4.0, 0.5));
    let view_proj = RowMat4::perspective_fov(0.9, 16.0, 9.0, 0.1, 80.0);
    let p = Vec3::new(0.123, 4.56, -7.89);
    let first = transform(p, &world, &view_proj, Vec2::new(0.1, 0.9));
    let second = transform(p, &world, &view_proj, Vec2::new(0.1, 0.9));
    assert_eq!(first.clip_pos.to_array().map(f32::to_bits), second.clip_pos.to_array().map(f32::to_bits));

    let texture = Texture::checkerboard(16, [255, 0, 0, 255], [0, 255, 0, 128]);
    let uniforms = ShadingUniforms {
        camera_pos: Vec3::new(1.0, 2.0, 3.0),
        ambient_light: Vec3::splat(0.1),
        spec_power: 13.0,
        light: DirectionalLight::default(),
        texture: &texture,
    };
    let frag = InterpolatedFragment {
        tex_coord: Vec2::new(0.37, 0.81),
        world_normal: Vec3::new(0.2, 0.9, 0.4),
        world_pos: Vec3::new(-0.5, 0.25, 1.0),
    };
    let a = shade(&frag, &uniforms).to_array().map(f32::to_bits);
    let b = shade(&frag, &uniforms).to_array().map(f32::to_bits);
    assert_eq!(a, b);
}
