//! Warps from uniform samples in `[0, 1)^n` to common distributions.

use crate::{Vec2, Vec3, INV_PI, PI};

/// Concentric mapping of the unit square onto the unit disk.
pub fn concentric_disk(u: Vec2) -> Vec2 {
    let offset = 2.0 * u - Vec2::ONE;
    if offset.x == 0.0 && offset.y == 0.0 {
        return Vec2::ZERO;
    }
    let (r, theta) = if offset.x.abs() > offset.y.abs() {
        (offset.x, 0.25 * PI * (offset.y / offset.x))
    } else {
        (offset.y, 0.5 * PI - 0.25 * PI * (offset.x / offset.y))
    };
    r * Vec2::new(theta.cos(), theta.sin())
}

/// Cosine-weighted direction on the `+z` hemisphere, with its solid-angle pdf.
pub fn cosine_hemisphere(u: Vec2) -> (Vec3, f32) {
    let d = concentric_disk(u);
    let z = (1.0 - d.length_squared()).max(0.0).sqrt();
    (Vec3::new(d.x, d.y, z), z * INV_PI)
}

#[inline]
pub fn cosine_hemisphere_pdf(cos_theta: f32) -> f32 {
    if cos_theta > 0.0 {
        cos_theta * INV_PI
    } else {
        0.0
    }
}

/// Uniform direction on the unit sphere, with its solid-angle pdf.
pub fn uniform_sphere(u: Vec2) -> (Vec3, f32) {
    let z = 1.0 - 2.0 * u.x;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * PI * u.y;
    (Vec3::new(r * phi.cos(), r * phi.sin(), z), uniform_sphere_pdf())
}

#[inline]
pub fn uniform_sphere_pdf() -> f32 {
    0.25 * INV_PI
}

/// Uniform barycentric coordinates `(b1, b2)` on a triangle; `b0 = 1 - b1 - b2`.
pub fn uniform_triangle(u: Vec2) -> (f32, f32) {
    let s = u.x.sqrt();
    (1.0 - s, u.y * s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_concentric_disk_stays_in_disk() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let p = concentric_disk(Vec2::new(rng.gen(), rng.gen()));
            assert!(p.length() <= 1.0 + 1e-5);
        }
        assert_eq!(concentric_disk(Vec2::splat(0.5)), Vec2::ZERO);
    }

    #[test]
    fn test_cosine_hemisphere_matches_pdf() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let (dir, pdf) = cosine_hemisphere(Vec2::new(rng.gen(), rng.gen()));
            assert!((dir.length() - 1.0).abs() < 1e-4);
            assert!(dir.z >= 0.0);
            assert!((pdf - cosine_hemisphere_pdf(dir.z)).abs() < 1e-5);
        }
    }

    #[test]
    fn test_uniform_sphere_is_unit() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let (dir, pdf) = uniform_sphere(Vec2::new(rng.gen(), rng.gen()));
            assert!((dir.length() - 1.0).abs() < 1e-4);
            assert_eq!(pdf, uniform_sphere_pdf());
        }
    }

    #[test]
    fn test_uniform_triangle_barycentrics_are_valid() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..1000 {
            let (b1, b2) = uniform_triangle(Vec2::new(rng.gen(), rng.gen()));
            assert!(b1 >= 0.0 && b2 >= 0.0 && b1 + b2 <= 1.0 + 1e-6);
        }
    }
}
