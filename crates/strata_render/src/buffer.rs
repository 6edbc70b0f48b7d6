//! Image buffers and 8-bit output.

use std::path::Path;

use strata_math::Spectrum;

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a color to 8-bit RGBA.
pub fn color_to_rgba(color: Spectrum) -> [u8; 4] {
    let to_byte = |c: f32| (255.0 * linear_to_gamma(c).clamp(0.0, 1.0)) as u8;
    [to_byte(color.x), to_byte(color.y), to_byte(color.z), 255]
}

/// Row-major 2D buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer<T> {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<T>,
}

impl<T: Copy + Default> ImageBuffer<T> {
    /// Create a new buffer filled with `T::default()`.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![T::default(); (width as usize) * (height as usize)],
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> T {
        self.pixels[self.index(x, y)]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, value: T) {
        let i = self.index(x, y);
        self.pixels[i] = value;
    }
}

impl ImageBuffer<Spectrum> {
    /// Gamma-encoded RGBA bytes (for display or saving).
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for color in &self.pixels {
            bytes.extend_from_slice(&color_to_rgba(*color));
        }
        bytes
    }

    /// Write an 8-bit image; the format follows the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> image::ImageResult<()> {
        image::save_buffer(
            path,
            &self.to_rgba8(),
            self.width,
            self.height,
            image::ColorType::Rgba8,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_to_gamma() {
        assert_eq!(linear_to_gamma(0.0), 0.0);
        assert!((linear_to_gamma(1.0) - 1.0).abs() < 0.0001);
        assert!((linear_to_gamma(0.25) - 0.5).abs() < 0.0001);
    }

    #[test]
    fn test_color_to_rgba_clamps() {
        assert_eq!(color_to_rgba(Spectrum::new(4.0, -1.0, 0.25)), [255, 0, 127, 255]);
    }

    #[test]
    fn test_buffer_get_set() {
        let mut img = ImageBuffer::<Spectrum>::new(3, 2);
        img.set(2, 1, Spectrum::ONE);
        assert_eq!(img.get(2, 1), Spectrum::ONE);
        assert_eq!(img.get(0, 0), Spectrum::ZERO);
        assert_eq!(img.to_rgba8().len(), 3 * 2 * 4);
    }
}
