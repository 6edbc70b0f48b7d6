//! Spatially varying material parameters.
//!
//! Textures are looked up by surface UV. They are shared by reference across
//! worker threads.

use strata_math::{Spectrum, Vec2};

/// A colour looked up by surface coordinates.
pub trait Texture: Send + Sync {
    fn sample(&self, uv: Vec2) -> Spectrum;
}

/// The same value everywhere.
#[derive(Debug, Clone, Copy)]
pub struct ConstantTexture {
    pub value: Spectrum,
}

impl ConstantTexture {
    pub fn new(value: Spectrum) -> Self {
        Self { value }
    }
}

impl Texture for ConstantTexture {
    #[inline]
    fn sample(&self, _uv: Vec2) -> Spectrum {
        self.value
    }
}

/// Two-colour checkerboard over UV space.
#[derive(Debug, Clone, Copy)]
pub struct CheckerTexture {
    even: Spectrum,
    odd: Spectrum,
    /// Checks per unit of UV along each axis.
    scale: f32,
}

impl CheckerTexture {
    pub fn new(even: Spectrum, odd: Spectrum, scale: f32) -> Self {
        Self { even, odd, scale }
    }
}

impl Texture for CheckerTexture {
    fn sample(&self, uv: Vec2) -> Spectrum {
        let cell = (uv * self.scale).floor();
        // rem_euclid keeps negative coordinates on the same parity pattern
        if (cell.x + cell.y).rem_euclid(2.0) < 0.5 {
            self.even
        } else {
            self.odd
        }
    }
}
