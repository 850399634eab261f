//! Reference rasterizer feeding the shading stage.
//!
//! Clip-space triangles are clipped against the near plane (`z >= 0`),
//! projected to the viewport and scanned over pixel centers. Attributes are
//! interpolated perspective-correctly, so every fragment value is a convex
//! combination of the three vertex values.

use glam::{Vec2, Vec3, Vec4};

use super::common::InterpolatedFragment;

const AREA_EPSILON: f32 = 1e-8;

/// Output of the geometry step for one vertex, ready for clipping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipVertex {
    pub clip_pos: Vec4,
    pub tex_coord: Vec2,
    pub world_normal: Vec3,
    pub world_pos: Vec3,
}

impl ClipVertex {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            clip_pos: self.clip_pos.lerp(other.clip_pos, t),
            tex_coord: self.tex_coord.lerp(other.tex_coord, t),
            world_normal: self.world_normal.lerp(other.world_normal, t),
            world_pos: self.world_pos.lerp(other.world_pos, t),
        }
    }
}

/// Color and depth targets. Color is kept unclamped until [`Framebuffer::to_rgba8`].
#[derive(Clone, Debug)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    color: Vec<Vec4>,
    depth: Vec<f32>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            color: vec![Vec4::ZERO; len],
            depth: vec![f32::INFINITY; len],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear(&mut self, color: Vec4) {
        self.color.fill(color);
        self.depth.fill(f32::INFINITY);
    }

    pub fn pixel(&self, x: u32, y: u32) -> Vec4 {
        self.color[(y * self.width + x) as usize]
    }

    pub fn depth(&self, x: u32, y: u32) -> f32 {
        self.depth[(y * self.width + x) as usize]
    }

    /// Splits the targets into horizontal bands of `rows_per_band` rows.
    pub fn bands_mut(&mut self, rows_per_band: u32) -> impl Iterator<Item = FramebufferBand<'_>> {
        let width = self.width;
        let rows = rows_per_band.max(1);
        let chunk = width as usize * rows as usize;
        self.color
            .chunks_mut(chunk)
            .zip(self.depth.chunks_mut(chunk))
            .enumerate()
            .map(move |(i, (color, depth))| FramebufferBand {
                row_start: i as u32 * rows,
                width,
                color,
                depth,
            })
    }

    /// Display conversion: channels are clamped to `[0, 1]` here and only here.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.color
            .iter()
            .flat_map(|c| c.to_array())
            .map(|channel| (channel.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect()
    }

    pub fn to_image(&self) -> image::RgbaImage {
        // the buffer length always matches width * height * 4
        image::RgbaImage::from_raw(self.width, self.height, self.to_rgba8())
            .unwrap_or_else(|| image::RgbaImage::new(self.width, self.height))
    }
}

/// Mutable view of consecutive framebuffer rows.
pub struct FramebufferBand<'a> {
    row_start: u32,
    width: u32,
    color: &'a mut [Vec4],
    depth: &'a mut [f32],
}

impl FramebufferBand<'_> {
    pub fn row_start(&self) -> u32 {
        self.row_start
    }

    pub fn row_end(&self) -> u32 {
        self.row_start + (self.color.len() / self.width as usize) as u32
    }
}

#[derive(Clone, Copy, Debug)]
struct ScreenVertex {
    pos: Vec2,
    depth: f32,
    inv_w: f32,
    tex_coord: Vec2,
    world_normal: Vec3,
    world_pos: Vec3,
}

/// A clipped, projected triangle in pixel coordinates (y down).
#[derive(Clone, Copy, Debug)]
pub struct ScreenTriangle {
    v: [ScreenVertex; 3],
    area: f32,
    min: Vec2,
    max: Vec2,
}

/// Clips a triangle against the near plane and projects it to a
/// `width`×`height` viewport. Returns zero, one or two triangles.
pub fn setup_triangle(tri: &[ClipVertex; 3], width: u32, height: u32) -> Vec<ScreenTriangle> {
    let polygon = clip_near(tri);
    if polygon.len() < 3 {
        return Vec::new();
    }
    if polygon.iter().any(|v| !(v.clip_pos.w > 0.0)) {
        return Vec::new();
    }
    let projected: Vec<ScreenVertex> = polygon.iter().map(|v| project(v, width, height)).collect();
    (1..projected.len() - 1)
        .filter_map(|i| ScreenTriangle::new([projected[0], projected[i], projected[i + 1]]))
        .collect()
}

fn clip_near(tri: &[ClipVertex; 3]) -> Vec<ClipVertex> {
    let mut out = Vec::with_capacity(4);
    for i in 0..3 {
        let current = &tri[i];
        let next = &tri[(i + 1) % 3];
        let current_in = current.clip_pos.z >= 0.0;
        let next_in = next.clip_pos.z >= 0.0;
        if current_in {
            out.push(*current);
        }
        if current_in != next_in {
            let t = current.clip_pos.z / (current.clip_pos.z - next.clip_pos.z);
            out.push(current.lerp(next, t));
        }
    }
    out
}

fn project(v: &ClipVertex, width: u32, height: u32) -> ScreenVertex {
    let inv_w = 1.0 / v.clip_pos.w;
    let ndc = v.clip_pos.truncate() * inv_w;
    ScreenVertex {
        pos: Vec2::new(
            (ndc.x + 1.0) * 0.5 * width as f32,
            (1.0 - ndc.y) * 0.5 * height as f32,
        ),
        depth: ndc.z,
        inv_w,
        tex_coord: v.tex_coord,
        world_normal: v.world_normal,
        world_pos: v.world_pos,
    }
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

impl ScreenTriangle {
    fn new(v: [ScreenVertex; 3]) -> Option<Self> {
        let area = edge(v[0].pos, v[1].pos, v[2].pos);
        if !(area.abs() > AREA_EPSILON) {
            return None;
        }
        let min = v[0].pos.min(v[1].pos).min(v[2].pos);
        let max = v[0].pos.max(v[1].pos).max(v[2].pos);
        Some(Self { v, area, min, max })
    }

    /// Scans the part of the triangle inside `band`, depth-tests each covered
    /// pixel and writes `shader`'s color for the survivors. Returns the
    /// number of fragments shaded.
    pub fn rasterize<F>(&self, band: &mut FramebufferBand<'_>, shader: &F) -> usize
    where
        F: Fn(&InterpolatedFragment) -> Vec4,
    {
        let x_start = (self.min.x - 0.5).ceil().max(0.0) as u32;
        let x_end = ((self.max.x - 0.5).floor() + 1.0).clamp(0.0, band.width as f32) as u32;
        let y_start = ((self.min.y - 0.5).ceil().max(band.row_start as f32)) as u32;
        let y_end = ((self.max.y - 0.5).floor() + 1.0).clamp(0.0, band.row_end() as f32) as u32;

        let [a, b, c] = &self.v;
        let mut shaded = 0;
        for y in y_start..y_end {
            for x in x_start..x_end {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                // dividing by the signed area makes both windings positive inside
                let w0 = edge(b.pos, c.pos, p) / self.area;
                let w1 = edge(c.pos, a.pos, p) / self.area;
                let w2 = edge(a.pos, b.pos, p) / self.area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * a.depth + w1 * b.depth + w2 * c.depth;
                let index = ((y - band.row_start) * band.width + x) as usize;
                if !(depth <= 1.0) || depth >= band.depth[index] {
                    continue;
                }

                let p0 = w0 * a.inv_w;
                let p1 = w1 * b.inv_w;
                let p2 = w2 * c.inv_w;
                let sum = p0 + p1 + p2;
                let (p0, p1, p2) = (p0 / sum, p1 / sum, p2 / sum);

                let fragment = InterpolatedFragment {
                    tex_coord: a.tex_coord * p0 + b.tex_coord * p1 + c.tex_coord * p2,
                    world_normal: a.world_normal * p0 + b.world_normal * p1 + c.world_normal * p2,
                    world_pos: a.world_pos * p0 + b.world_pos * p1 + c.world_pos * p2,
                };
                band.depth[index] = depth;
                band.color[index] = shader(&fragment);
                shaded += 1;
            }
        }
        shaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(x: f32, y: f32, z: f32, w: f32) -> ClipVertex {
        ClipVertex {
            clip_pos: Vec4::new(x, y, z, w),
            tex_coord: Vec2::new(x, y),
            world_normal: Vec3::Z,
            world_pos: Vec3::new(x, y, z),
        }
    }

    fn draw(fb: &mut Framebuffer, tri: [ClipVertex; 3], color: Vec4) -> usize {
        let (width, height) = (fb.width(), fb.height());
        let triangles = setup_triangle(&tri, width, height);
        let mut total = 0;
        for mut band in fb.bands_mut(3) {
            for t in &triangles {
                total += t.rasterize(&mut band, &|_: &InterpolatedFragment| color);
            }
        }
        total
    }

    #[test]
    fn full_screen_triangle_covers_every_pixel_once() {
        let mut fb = Framebuffer::new(8, 8);
        let tri = [
            vertex(-1.0, -1.0, 0.5, 1.0),
            vertex(3.0, -1.0, 0.5, 1.0),
            vertex(-1.0, 3.0, 0.5, 1.0),
        ];
        let shaded = draw(&mut fb, tri, Vec4::ONE);
        assert_eq!(shaded, 64);
        assert_eq!(fb.pixel(7, 7), Vec4::ONE);
        assert!((fb.depth(0, 0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn winding_does_not_matter() {
        let mut fb = Framebuffer::new(8, 8);
        let tri = [
            vertex(-1.0, -1.0, 0.5, 1.0),
            vertex(-1.0, 3.0, 0.5, 1.0),
            vertex(3.0, -1.0, 0.5, 1.0),
        ];
        assert_eq!(draw(&mut fb, tri, Vec4::ONE), 64);
    }

    #[test]
    fn nearer_triangle_wins_depth_test() {
        let mut fb = Framebuffer::new(4, 4);
        let far = [
            vertex(-1.0, -1.0, 0.8, 1.0),
            vertex(3.0, -1.0, 0.8, 1.0),
            vertex(-1.0, 3.0, 0.8, 1.0),
        ];
        let near = [
            vertex(-1.0, -1.0, 0.2, 1.0),
            vertex(3.0, -1.0, 0.2, 1.0),
            vertex(-1.0, 3.0, 0.2, 1.0),
        ];
        draw(&mut fb, near, Vec4::X);
        assert_eq!(draw(&mut fb, far, Vec4::Y), 0);
        assert_eq!(fb.pixel(1, 1), Vec4::X);
    }

    #[test]
    fn triangle_behind_near_plane_is_dropped() {
        let tri = [
            vertex(-1.0, -1.0, -0.5, 1.0),
            vertex(1.0, -1.0, -0.5, 1.0),
            vertex(0.0, 1.0, -0.5, 1.0),
        ];
        assert!(setup_triangle(&tri, 16, 16).is_empty());
    }

    #[test]
    fn straddling_triangle_is_clipped_into_two() {
        let tri = [
            vertex(-1.0, -1.0, -0.5, 1.0),
            vertex(1.0, -1.0, 0.5, 1.0),
            vertex(0.0, 1.0, 0.5, 1.0),
        ];
        assert_eq!(setup_triangle(&tri, 16, 16).len(), 2);
    }

    #[test]
    fn degenerate_triangle_is_skipped() {
        let tri = [
            vertex(0.0, 0.0, 0.5, 1.0),
            vertex(0.5, 0.5, 0.5, 1.0),
            vertex(1.0, 1.0, 0.5, 1.0),
        ];
        assert!(setup_triangle(&tri, 16, 16).is_empty());
    }

    #[test]
    fn interpolated_attributes_stay_inside_the_triangle() {
        let mut fb = Framebuffer::new(16, 16);
        let tri = [
            vertex(-1.0, -1.0, 0.1, 1.0),
            vertex(2.0, -2.0, 1.5, 2.0),
            vertex(-4.0, 4.0, 3.5, 4.0),
        ];
        let triangles = setup_triangle(&tri, 16, 16);
        let shader = |frag: &InterpolatedFragment| {
            assert!(frag.world_pos.x >= -4.0 - 1e-4 && frag.world_pos.x <= 2.0 + 1e-4);
            assert!(frag.world_pos.z >= 0.1 - 1e-4 && frag.world_pos.z <= 3.5 + 1e-4);
            Vec4::ONE
        };
        let mut shaded = 0;
        for mut band in fb.bands_mut(16) {
            for t in &triangles {
                shaded += t.rasterize(&mut band, &shader);
            }
        }
        assert!(shaded > 0);
    }

    #[test]
    fn display_conversion_clamps_hdr_values() {
        let mut fb = Framebuffer::new(1, 1);
        fb.clear(Vec4::new(2.0, -1.0, 0.5, 1.0));
        assert_eq!(fb.to_rgba8(), vec![255, 0, 128, 255]);
    }
}
