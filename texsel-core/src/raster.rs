//! CPU framebuffer for running a whole draw through the reference stage.
//!
//! Used to compare tiers pixel for pixel. Discarded fragments leave the
//! framebuffer untouched; surviving fragments overwrite (blending is the
//! pipeline's business, not this stage's).

use crate::stage::{Fragment, FragmentOutput, Rgba, SamplerArray, TextureSelect};

/// Counts from one [`Framebuffer::draw`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub written: usize,
    pub discarded: usize,
    /// Fragments whose pixel position fell outside the framebuffer.
    pub clipped: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32, clear: Rgba) -> Self {
        Self {
            width,
            height,
            pixels: vec![clear; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Shade every `(x, y, fragment)` with `stage` and write the results.
    pub fn draw<I>(&mut self, stage: &dyn TextureSelect, array: &dyn SamplerArray, fragments: I) -> DrawStats
    where
        I: IntoIterator<Item = (u32, u32, Fragment)>,
    {
        let mut stats = DrawStats::default();
        for (x, y, fragment) in fragments {
            let Some(i) = self.index(x, y) else {
                stats.clipped += 1;
                continue;
            };
            match stage.shade(array, fragment) {
                FragmentOutput::Color(color) => {
                    self.pixels[i] = color;
                    stats.written += 1;
                }
                FragmentOutput::Discard => stats.discarded += 1,
            }
        }
        stats
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }
}

// ===================================================================
// Tests
// ===================================================================
