use crate::{Interval, Vec3};

/// Axis-Aligned Bounding Box for spatial acceleration structures (BVH).
///
/// An AABB is defined by three intervals (one per axis) that bound a 3D volume.
/// Unlike a padded box, zero-width axes are kept as they are: a triangle lying
/// in an axis plane produces a flat box, which the slab test handles.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    /// Create an AABB from two corner points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            x: Interval::new(a.x.min(b.x), a.x.max(b.x)),
            y: Interval::new(a.y.min(b.y), a.y.max(b.y)),
            z: Interval::new(a.z.min(b.z), a.z.max(b.z)),
        }
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            x: Interval::surrounding(&box0.x, &box1.x),
            y: Interval::surrounding(&box0.y, &box1.y),
            z: Interval::surrounding(&box0.z, &box1.z),
        }
    }

    /// Grow the box so that it contains `p`.
    pub fn include_point(&self, p: Vec3) -> Self {
        Self {
            x: self.x.include(p.x),
            y: self.y.include(p.y),
            z: self.z.include(p.z),
        }
    }

    /// Get the interval for a specific axis (0=X, 1=Y, 2=Z).
    pub fn axis_interval(&self, n: usize) -> Interval {
        match n {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    /// Lower corner.
    pub fn low(&self) -> Vec3 {
        Vec3::new(self.x.min, self.y.min, self.z.min)
    }

    /// Upper corner.
    pub fn high(&self) -> Vec3 {
        Vec3::new(self.x.max, self.y.max, self.z.max)
    }

    /// True when the box contains no point at all.
    pub fn is_empty(&self) -> bool {
        self.x.min > self.x.max || self.y.min > self.y.max || self.z.min > self.z.max
    }

    /// Returns true if `other` is inside this box, with `eps` of slack per axis.
    pub fn contains_box(&self, other: &Aabb, eps: f32) -> bool {
        self.x.contains_interval(&other.x, eps)
            && self.y.contains_interval(&other.y, eps)
            && self.z.contains_interval(&other.z, eps)
    }

    /// Returns true if `p` is inside this box, with `eps` of slack per axis.
    pub fn contains_point(&self, p: Vec3, eps: f32) -> bool {
        self.contains_box(&Aabb::from_points(p, p), eps)
    }

    /// Slab test against a ray given by its origin and precomputed inverse direction.
    ///
    /// Returns the entry distance when the ray overlaps the box within `[t_min, t_max]`.
    /// Components of `inv_dir` may be infinite; the `0 * inf` NaN that appears when
    /// the origin lies on a slab plane is discarded by `f32::min`/`f32::max`.
    #[inline]
    pub fn hit(&self, origin: Vec3, inv_dir: Vec3, t_min: f32, t_max: f32) -> Option<f32> {
        let n = (self.low() - origin) * inv_dir;
        let f = (self.high() - origin) * inv_dir;
        let mut t0 = t_min;
        let mut t1 = t_max;
        for axis in 0..3 {
            t0 = t0.max(n[axis].min(f[axis]));
            t1 = t1.min(n[axis].max(f[axis]));
        }
        (t0 <= t1).then_some(t0)
    }

    /// Returns the index (0=X, 1=Y, 2=Z) of the axis with the longest extent.
    pub fn longest_axis(&self) -> usize {
        let x_size = self.x.size();
        let y_size = self.y.size();
        let z_size = self.z.size();

        if x_size > y_size && x_size > z_size {
            0
        } else if y_size > z_size {
            1
        } else {
            2
        }
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        Vec3::new(self.x.center(), self.y.center(), self.z.center())
    }

    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_from_points() {
        let aabb = Aabb::from_points(Vec3::new(10.0, 0.0, 5.0), Vec3::new(0.0, 10.0, 0.0));
        assert_eq!(aabb.low(), Vec3::ZERO);
        assert_eq!(aabb.high(), Vec3::new(10.0, 10.0, 5.0));
    }

    #[test]
    fn test_aabb_include_point_from_empty() {
        let aabb = Aabb::EMPTY
            .include_point(Vec3::new(1.0, 2.0, 3.0))
            .include_point(Vec3::new(-1.0, 0.0, 4.0));
        assert!(!aabb.is_empty());
        assert_eq!(aabb.low(), Vec3::new(-1.0, 0.0, 3.0));
        assert_eq!(aabb.high(), Vec3::new(1.0, 2.0, 4.0));
    }

    #[test]
    fn test_aabb_surrounding_contains_both() {
        let box1 = Aabb::from_points(Vec3::ZERO, Vec3::splat(5.0));
        let box2 = Aabb::from_points(Vec3::splat(3.0), Vec3::splat(10.0));
        let surrounding = Aabb::surrounding(&box1, &box2);
        assert!(surrounding.contains_box(&box1, 0.0));
        assert!(surrounding.contains_box(&box2, 0.0));
        assert_eq!(surrounding.x.max, 10.0);
    }

    #[test]
    fn test_aabb_hit() {
        let aabb = Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0));
        let origin = Vec3::new(0.0, 0.0, -5.0);

        // Ray pointing at center
        let t = aabb.hit(origin, Vec3::new(0.0, 0.0, 1.0).recip(), 0.0, 100.0);
        assert_eq!(t, Some(4.0));

        // Ray pointing away
        assert!(aabb.hit(origin, Vec3::new(0.0, 0.0, -1.0).recip(), 0.0, 100.0).is_none());

        // Ray missing the box
        let origin = Vec3::new(10.0, 0.0, 0.0);
        assert!(aabb.hit(origin, Vec3::new(0.0, 0.0, 1.0).recip(), 0.0, 100.0).is_none());
    }

    #[test]
    fn test_aabb_hit_zero_direction_components() {
        let aabb = Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0));
        let inv_dir = Vec3::new(0.0, 0.0, 1.0).recip();
        assert!(inv_dir.x.is_infinite() && inv_dir.y.is_infinite());

        // Parallel to the x and y slabs, inside them.
        let inside = Vec3::new(0.5, -0.5, -5.0);
        assert_eq!(aabb.hit(inside, inv_dir, 0.0, f32::INFINITY), Some(4.0));

        // Parallel and outside the x slab.
        let outside = Vec3::new(1.5, 0.0, -5.0);
        assert!(aabb.hit(outside, inv_dir, 0.0, f32::INFINITY).is_none());

        // Origin exactly on the x = 1 plane gives 0 * inf = NaN for that axis;
        // the result must never be NaN.
        let grazing = Vec3::new(1.0, 0.0, -5.0);
        let t = aabb.hit(grazing, inv_dir, 0.0, f32::INFINITY);
        assert!(t.map_or(true, |t| !t.is_nan()));
    }

    #[test]
    fn test_aabb_hit_flat_box() {
        let flat = Aabb::from_points(Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 0.0));
        let origin = Vec3::new(0.2, 0.3, 2.0);
        let t = flat.hit(origin, Vec3::new(0.0, 0.0, -1.0).recip(), 0.0, f32::INFINITY);
        assert_eq!(t, Some(2.0));
    }

    #[test]
    fn test_aabb_respects_t_max() {
        let aabb = Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0));
        let origin = Vec3::new(0.0, 0.0, -5.0);
        assert!(aabb.hit(origin, Vec3::Z.recip(), 0.0, 3.0).is_none());
    }

    #[test]
    fn test_aabb_longest_axis() {
        assert_eq!(Aabb::from_points(Vec3::ZERO, Vec3::new(10.0, 1.0, 1.0)).longest_axis(), 0);
        assert_eq!(Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 10.0, 1.0)).longest_axis(), 1);
        assert_eq!(Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 1.0, 10.0)).longest_axis(), 2);
    }
}
