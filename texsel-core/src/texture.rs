//! CPU-side texture images.
//!
//! A [`Texture`] is what the host puts into a slot: RGBA8 texels plus the
//! sampler configuration the slot is sampled with. The same value feeds the
//! CPU reference stage and the GPU upload in `texsel-render`.

use thiserror::Error;

use crate::stage::Rgba;

/// Max allowed width or height of a texture, in pixels.
pub const MAX_TEXTURE_DIMENSION: u32 = 4096;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TextureError {
    #[error("Texture dimensions must be non-zero (got {width}x{height})")]
    EmptyDimensions { width: u32, height: u32 },
    #[error("Texture dimensions {width}x{height} exceed {max}x{max}", max = MAX_TEXTURE_DIMENSION)]
    TooLarge { width: u32, height: u32 },
    #[error("Expected {expected} bytes of pixel data, got {actual}")]
    PixelCount { expected: usize, actual: usize },
}

/// Layout of incoming pixel data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorType {
    /// 3 bytes per pixel (red, green, blue).
    Rgb,
    /// 4 bytes per pixel (red, green, blue, alpha).
    Rgba,
}

impl ColorType {
    #[inline]
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            ColorType::Rgb => 3,
            ColorType::Rgba => 4,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AddressMode {
    #[default]
    ClampToEdge,
    Repeat,
    MirrorRepeat,
}

/// Per-slot sampling state, configured by the host when a texture is bound.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SamplerConfig {
    pub filter: FilterMode,
    pub address_mode: AddressMode,
}

impl SamplerConfig {
    pub const NEAREST_CLAMP: SamplerConfig = SamplerConfig {
        filter: FilterMode::Nearest,
        address_mode: AddressMode::ClampToEdge,
    };
}

/// An RGBA8 image with its sampler configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    width: u32,
    height: u32,
    /// Row-major RGBA8 texels, `width * height * 4` bytes.
    data: Vec<u8>,
    sampler: SamplerConfig,
}

impl Texture {
    /// Build a texture from raw pixels. RGB input is widened to opaque RGBA.
    pub fn from_pixels(
        width: u32,
        height: u32,
        color_type: ColorType,
        pixels: &[u8],
        sampler: SamplerConfig,
    ) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::EmptyDimensions { width, height });
        }
        if width > MAX_TEXTURE_DIMENSION || height > MAX_TEXTURE_DIMENSION {
            return Err(TextureError::TooLarge { width, height });
        }

        let texel_count = width as usize * height as usize;
        let expected = texel_count * color_type.bytes_per_pixel();
        if pixels.len() != expected {
            return Err(TextureError::PixelCount {
                expected,
                actual: pixels.len(),
            });
        }

        let data = match color_type {
            ColorType::Rgba => pixels.to_vec(),
            ColorType::Rgb => {
                let mut data = Vec::with_capacity(texel_count * 4);
                for rgb in pixels.chunks_exact(3) {
                    data.extend_from_slice(rgb);
                    data.push(u8::MAX);
                }
                data
            }
        };

        Ok(Self {
            width,
            height,
            data,
            sampler,
        })
    }

    /// A 1×1 texture holding `texel`.
    pub fn solid(texel: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            data: texel.to_vec(),
            sampler: SamplerConfig::default(),
        }
    }

    pub fn with_sampler(mut self, sampler: SamplerConfig) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Tightly packed RGBA8 rows, ready for upload.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn sampler(&self) -> SamplerConfig {
        self.sampler
    }

    /// Texel at integer coordinates, converted to normalized floats.
    ///
    /// Panics if `(x, y)` lies outside the image.
    pub fn texel(&self, x: u32, y: u32) -> Rgba {
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let px = &self.data[offset..offset + 4];
        [
            unorm(px[0]),
            unorm(px[1]),
            unorm(px[2]),
            unorm(px[3]),
        ]
    }

    /// Sample at normalized coordinates `[u, v]`, `(0, 0)` being the
    /// top-left corner, using this texture's filter and address mode.
    pub fn sample(&self, coord: [f32; 2]) -> Rgba {
        match self.sampler.filter {
            FilterMode::Nearest => {
                let x = self.wrap(texel_floor(coord[0] * self.width as f32), self.width);
                let y = self.wrap(texel_floor(coord[1] * self.height as f32), self.height);
                self.texel(x, y)
            }
            FilterMode::Linear => {
                let fx = coord[0] * self.width as f32 - 0.5;
                let fy = coord[1] * self.height as f32 - 0.5;
                let x0 = texel_floor(fx);
                let y0 = texel_floor(fy);
                let tx = fx - fx.floor();
                let ty = fy - fy.floor();

                // Huge coordinates floor to i64::MAX; the neighbour must not overflow.
                let (xa, xb) = (self.wrap(x0, self.width), self.wrap(x0.saturating_add(1), self.width));
                let (ya, yb) = (self.wrap(y0, self.height), self.wrap(y0.saturating_add(1), self.height));

                let top = lerp4(self.texel(xa, ya), self.texel(xb, ya), tx);
                let bottom = lerp4(self.texel(xa, yb), self.texel(xb, yb), tx);
                lerp4(top, bottom, ty)
            }
        }
    }

    /// Map an unbounded texel coordinate into `0..size`.
    fn wrap(&self, i: i64, size: u32) -> u32 {
        let n = size as i64;
        let wrapped = match self.sampler.address_mode {
            AddressMode::ClampToEdge => i.clamp(0, n - 1),
            AddressMode::Repeat => i.rem_euclid(n),
            AddressMode::MirrorRepeat => {
                let period = i.rem_euclid(2 * n);
                if period < n {
                    period
                } else {
                    2 * n - 1 - period
                }
            }
        };
        wrapped as u32
    }
}

#[inline]
fn unorm(v: u8) -> f32 {
    v as f32 / 255.0
}

#[inline]
fn texel_floor(v: f32) -> i64 {
    v.floor() as i64
}

/// `a + (b - a) * t`, exact when `a == b`.
#[inline]
fn lerp4(a: Rgba, b: Rgba, t: f32) -> Rgba {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
        a[3] + (b[3] - a[3]) * t,
    ]
}

// ===================================================================
// Tests
// ===================================================================
