//! Surface hit records and ray spawning.

use strata_math::{Frame, Ray, Vec2, Vec3};

/// Relative offset used to move spawned rays off their originating surface.
const RAY_OFFSET_SCALE: f32 = 1e-4;

/// Fraction of a shadow segment left unchecked in front of the light sample.
const SHADOW_RAY_SHRINK: f32 = 1e-3;

/// Everything known about a ray/surface hit.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceIntersection {
    pub position: Vec3,
    /// Frame from the triangle tangent and the face normal.
    pub geometry: Frame,
    /// Geometry frame rotated onto the interpolated vertex normal.
    pub shading: Frame,
    pub uv: Vec2,
    /// Unit direction back toward the ray origin.
    pub wr: Vec3,
    pub t: f32,
    /// Scene entity that was hit. Set by the scene; zero for bare BVH queries.
    pub entity: usize,
    /// Index into the BVH's reordered primitive array.
    pub primitive: usize,
}

impl SurfaceIntersection {
    fn offset_origin(&self, dir: Vec3) -> Vec3 {
        let n = self.geometry.z;
        let scale = RAY_OFFSET_SCALE * (1.0 + self.position.abs().max_element());
        if n.dot(dir) >= 0.0 {
            self.position + n * scale
        } else {
            self.position - n * scale
        }
    }

    /// Ray leaving the surface in direction `dir`.
    pub fn spawn_ray(&self, dir: Vec3) -> Ray {
        Ray::new(self.offset_origin(dir), dir)
    }

    /// Shadow ray toward a light sample at `distance` along unit direction `dir`.
    /// An infinite distance checks the whole half line.
    pub fn spawn_shadow_ray(&self, dir: Vec3, distance: f32) -> Ray {
        let origin = self.offset_origin(dir);
        let t_max = if distance.is_finite() {
            (distance * (1.0 - SHADOW_RAY_SHRINK)).max(0.0)
        } else {
            f32::INFINITY
        };
        Ray::with_range(origin, dir, 0.0, t_max)
    }
}

/// A point sampled on a surface, as used for area light sampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit_at(position: Vec3, normal: Vec3) -> SurfaceIntersection {
        let frame = Frame::from_z(normal);
        SurfaceIntersection {
            position,
            geometry: frame,
            shading: frame,
            uv: Vec2::ZERO,
            wr: normal,
            t: 1.0,
            entity: 0,
            primitive: 0,
        }
    }

    #[test]
    fn test_spawn_ray_offsets_to_the_right_side() {
        let hit = hit_at(Vec3::ZERO, Vec3::Z);
        assert!(hit.spawn_ray(Vec3::Z).origin.z > 0.0);
        assert!(hit.spawn_ray(-Vec3::Z).origin.z < 0.0);
    }

    #[test]
    fn test_shadow_ray_stops_short_of_target() {
        let hit = hit_at(Vec3::ZERO, Vec3::Z);
        let ray = hit.spawn_shadow_ray(Vec3::Z, 2.0);
        assert!(ray.t_max < 2.0 && ray.t_max > 1.99);
        assert_eq!(hit.spawn_shadow_ray(Vec3::Z, f32::INFINITY).t_max, f32::INFINITY);
    }
}
