//! Triangle primitives and the watertight ray/triangle test.

use strata_math::{Aabb, Ray, Vec2, Vec3};

/// A mesh vertex with shading normal and texture coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// A triangle given by three vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(a: Vertex, b: Vertex, c: Vertex) -> Self {
        Self {
            vertices: [a, b, c],
        }
    }

    /// Triangle with flat shading normals and default UVs.
    pub fn from_positions(a: Vec3, b: Vec3, c: Vec3) -> Self {
        let n = (b - a).cross(c - a).normalize_or_zero();
        Self::new(
            Vertex::new(a, n, Vec2::new(0.0, 0.0)),
            Vertex::new(b, n, Vec2::new(1.0, 0.0)),
            Vertex::new(c, n, Vec2::new(0.0, 1.0)),
        )
    }

    #[inline]
    pub fn positions(&self) -> [Vec3; 3] {
        [
            self.vertices[0].position,
            self.vertices[1].position,
            self.vertices[2].position,
        ]
    }

    pub fn bounds(&self) -> Aabb {
        let [a, b, c] = self.positions();
        Aabb::from_points(a, b).include_point(c)
    }

    pub fn centroid(&self) -> Vec3 {
        let [a, b, c] = self.positions();
        (a + b + c) / 3.0
    }

    pub fn area(&self) -> f32 {
        let [a, b, c] = self.positions();
        0.5 * (b - a).cross(c - a).length()
    }

    /// A triangle is degenerate when its vertices are (nearly) collinear or
    /// coincident, or when any coordinate is not finite.
    pub fn is_degenerate(&self) -> bool {
        let [a, b, c] = self.positions();
        if !(a.is_finite() && b.is_finite() && c.is_finite()) {
            return true;
        }
        let ab = b - a;
        let ac = c - a;
        let cross = ab.cross(ac).length_squared();
        cross <= 1e-12 * ab.length_squared() * ac.length_squared() || cross == 0.0
    }
}

#[inline]
fn max_axis(v: Vec3) -> usize {
    if v.x > v.y && v.x > v.z {
        0
    } else if v.y > v.z {
        1
    } else {
        2
    }
}

/// Result of a successful ray/triangle test.
///
/// `b1` and `b2` are the barycentric weights of the second and third vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    pub t: f32,
    pub b1: f32,
    pub b2: f32,
}

/// Per-ray state of the watertight intersection test.
///
/// The ray is transformed so that it starts at the origin and points down
/// `+z`; the permutation and shear only depend on the ray, so they are
/// computed once per traversal and reused for every triangle.
#[derive(Debug, Clone, Copy)]
pub struct WatertightRay {
    origin: Vec3,
    kx: usize,
    ky: usize,
    kz: usize,
    shear: Vec3,
    t_min: f32,
}

impl WatertightRay {
    pub fn new(ray: &Ray) -> Self {
        let d = ray.direction;
        let kz = max_axis(d.abs());
        let kx = (kz + 1) % 3;
        let ky = (kx + 1) % 3;
        let dz = d[kz];
        Self {
            origin: ray.origin,
            kx,
            ky,
            kz,
            shear: Vec3::new(-d[kx] / dz, -d[ky] / dz, 1.0 / dz),
            t_min: ray.t_min,
        }
    }

    #[inline]
    fn transform(&self, p: Vec3) -> Vec3 {
        let q = p - self.origin;
        let z = q[self.kz];
        Vec3::new(
            q[self.kx] + self.shear.x * z,
            q[self.ky] + self.shear.y * z,
            z,
        )
    }

    /// Intersect the triangle `(a, b, c)` for `t` strictly inside `(t_min, t_max)`.
    ///
    /// Zero-area triangles have a zero determinant and never report a hit.
    pub fn intersect(&self, a: Vec3, b: Vec3, c: Vec3, t_max: f32) -> Option<TriangleHit> {
        let p0 = self.transform(a);
        let p1 = self.transform(b);
        let p2 = self.transform(c);

        let mut e0 = p1.x * p2.y - p1.y * p2.x;
        let mut e1 = p2.x * p0.y - p2.y * p0.x;
        let mut e2 = p0.x * p1.y - p0.y * p1.x;

        // Edge functions that round to zero are recomputed in double precision.
        if e0 == 0.0 || e1 == 0.0 || e2 == 0.0 {
            e0 = (p1.x as f64 * p2.y as f64 - p1.y as f64 * p2.x as f64) as f32;
            e1 = (p2.x as f64 * p0.y as f64 - p2.y as f64 * p0.x as f64) as f32;
            e2 = (p0.x as f64 * p1.y as f64 - p0.y as f64 * p1.x as f64) as f32;
        }

        if (e0 < 0.0 || e1 < 0.0 || e2 < 0.0) && (e0 > 0.0 || e1 > 0.0 || e2 > 0.0) {
            return None;
        }
        let det = e0 + e1 + e2;
        if det == 0.0 || !det.is_finite() {
            return None;
        }

        let sz = self.shear.z;
        let t_scaled = e0 * p0.z * sz + e1 * p1.z * sz + e2 * p2.z * sz;
        let inv_det = 1.0 / det;
        let t = t_scaled * inv_det;
        if !(t > self.t_min && t < t_max) {
            return None;
        }

        Some(TriangleHit {
            t,
            b1: e1 * inv_det,
            b2: e2 * inv_det,
        })
    }
}
