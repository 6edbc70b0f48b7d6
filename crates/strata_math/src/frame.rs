use crate::{Quat, Vec3};

/// An orthonormal coordinate frame.
///
/// Shading code works in the local space of a frame, where `z` is the surface
/// normal and `x`/`y` span the tangent plane.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    pub x: Vec3,
    pub y: Vec3,
    pub z: Vec3,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            x: Vec3::X,
            y: Vec3::Y,
            z: Vec3::Z,
        }
    }
}

impl Frame {
    /// Build a frame from three orthonormal axes.
    pub fn new(x: Vec3, y: Vec3, z: Vec3) -> Self {
        Self { x, y, z }
    }

    /// Build a frame around a normalized `z`, choosing any tangent.
    pub fn from_z(z: Vec3) -> Self {
        let (x, y) = z.any_orthonormal_pair();
        Self { x, y, z }
    }

    /// Build a frame from a normal and a tangent hint.
    ///
    /// The hint is projected onto the plane orthogonal to `z`; when it is
    /// (nearly) parallel to `z` any tangent is chosen instead.
    pub fn from_z_x(z: Vec3, x_hint: Vec3) -> Self {
        let x = x_hint - z * z.dot(x_hint);
        if x.length_squared() < 1e-12 || !x.is_finite() {
            return Self::from_z(z);
        }
        let x = x.normalize();
        Self { x, y: z.cross(x), z }
    }

    #[inline]
    pub fn global_to_local(&self, v: Vec3) -> Vec3 {
        Vec3::new(v.dot(self.x), v.dot(self.y), v.dot(self.z))
    }

    #[inline]
    pub fn local_to_global(&self, v: Vec3) -> Vec3 {
        self.x * v.x + self.y * v.y + self.z * v.z
    }

    /// Rotate the frame by the smallest rotation that maps `z` onto `new_z`.
    pub fn rotate_to_new_z(&self, new_z: Vec3) -> Self {
        let rotation = Quat::from_rotation_arc(self.z, new_z);
        Self {
            x: rotation * self.x,
            y: rotation * self.y,
            z: new_z,
        }
    }

    /// Frame with the normal reversed, keeping the frame right-handed.
    pub fn flipped(&self) -> Self {
        Self {
            x: self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}
