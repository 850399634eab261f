use std::path::Path;

use glam::{Vec2, Vec4};
use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Anything the shading stage can look colors up in by UV.
pub trait Sampler {
    fn sample(&self, uv: Vec2) -> Vec4;
}

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("texture has zero area ({width}x{height})")]
    Empty { width: u32, height: u32 },
    #[error("expected {expected} bytes of RGBA data, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// How coordinates outside `[0, 1]` are resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapMode {
    #[default]
    Repeat,
    ClampToEdge,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
}

/// RGBA image with normalized texels, sampled in UV space.
///
/// `v = 0` addresses the first row of the image data. No color-space
/// conversion is done on load.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    width: u32,
    height: u32,
    texels: Vec<Vec4>,
    pub wrap: WrapMode,
    pub filter: FilterMode,
}

impl Texture {
    pub fn from_rgba8(width: u32, height: u32, data: &[u8]) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::Empty { width, height });
        }
        let expected = rgba8_len(width, height);
        if data.len() != expected {
            return Err(TextureError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        let texels = data
            .chunks_exact(4)
            .map(|px| Vec4::new(px[0] as f32, px[1] as f32, px[2] as f32, px[3] as f32) / 255.0)
            .collect();
        Ok(Self {
            width,
            height,
            texels,
            wrap: WrapMode::default(),
            filter: FilterMode::default(),
        })
    }

    pub fn from_image(image: &DynamicImage) -> Result<Self, TextureError> {
        let (width, height) = image.dimensions();
        Self::from_rgba8(width, height, image.to_rgba8().as_raw())
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let image = image::open(path)?;
        Self::from_image(&image)
    }

    pub fn load_from_memory(bytes: &[u8]) -> Result<Self, TextureError> {
        let image = image::load_from_memory(bytes)?;
        Self::from_image(&image)
    }

    pub fn solid_color(color: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            texels: vec![Vec4::new(color[0] as f32, color[1] as f32, color[2] as f32, color[3] as f32) / 255.0],
            wrap: WrapMode::default(),
            filter: FilterMode::default(),
        }
    }

    pub fn white() -> Self {
        Self::solid_color([255, 255, 255, 255])
    }

    /// `size`×`size` checkerboard with 8-texel squares.
    pub fn checkerboard(size: u32, a: [u8; 4], b: [u8; 4]) -> Self {
        let size = size.max(1);
        let mut data = Vec::with_capacity(rgba8_len(size, size));
        for y in 0..size {
            for x in 0..size {
                let even = ((x / 8) + (y / 8)) % 2 == 0;
                data.extend_from_slice(if even { &a } else { &b });
            }
        }
        Self::from_rgba8(size, size, &data).unwrap_or_else(|_| Self::solid_color(a))
    }

    pub fn with_sampler(mut self, wrap: WrapMode, filter: FilterMode) -> Self {
        self.wrap = wrap;
        self.filter = filter;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn texel(&self, x: u32, y: u32) -> Vec4 {
        self.texels[(y * self.width + x) as usize]
    }

    fn fetch(&self, x: i64, y: i64) -> Vec4 {
        let x = wrap_index(x, self.width, self.wrap);
        let y = wrap_index(y, self.height, self.wrap);
        self.texels[y * self.width as usize + x]
    }
}

impl Sampler for Texture {
    fn sample(&self, uv: Vec2) -> Vec4 {
        let x = uv.x * self.width as f32;
        let y = uv.y * self.height as f32;
        match self.filter {
            FilterMode::Nearest => self.fetch(x.floor() as i64, y.floor() as i64),
            FilterMode::Linear => {
                // texel centers sit at half-integer coordinates
                let x = x - 0.5;
                let y = y - 0.5;
                let x0 = x.floor();
                let y0 = y.floor();
                let tx = x - x0;
                let ty = y - y0;
                let (x0, y0) = (x0 as i64, y0 as i64);
                let top = self
                    .fetch(x0, y0)
                    .lerp(self.fetch(x0.saturating_add(1), y0), tx);
                let bottom = self
                    .fetch(x0, y0.saturating_add(1))
                    .lerp(self.fetch(x0.saturating_add(1), y0.saturating_add(1)), tx);
                top.lerp(bottom, ty)
            }
        }
    }
}

/// Byte length of a `width`×`height` RGBA8 image, computed in `usize`.
fn rgba8_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}

fn wrap_index(index: i64, size: u32, wrap: WrapMode) -> usize {
    let size = size as i64;
    match wrap {
        WrapMode::Repeat => index.rem_euclid(size) as usize,
        WrapMode::ClampToEdge => index.clamp(0, size - 1) as usize,
    }
}
