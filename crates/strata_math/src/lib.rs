//! Strata math primitives.
//!
//! Re-exports glam and adds the small set of geometric types the renderer
//! shares between crates: intervals, boxes, rays with a parametric range,
//! orthonormal frames, spectra and sampling warps.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod distribution;
mod frame;
mod interval;
mod ray;
pub mod sampling;
mod spectrum;

pub use aabb::Aabb;
pub use distribution::Distribution1D;
pub use frame::Frame;
pub use interval::Interval;
pub use ray::Ray;
pub use spectrum::{Spectrum, SpectrumExt};

pub const PI: f32 = std::f32::consts::PI;
pub const INV_PI: f32 = std::f32::consts::FRAC_1_PI;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reexported_vec3() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
    }
}
