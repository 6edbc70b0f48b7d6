//! Scattering functions evaluated at a shading point.
//!
//! Every variant implements the same small capability set and is allocated
//! per shading point in the worker's scratch arena. All directions are in
//! world space and point away from the surface.

mod dielectric;
mod diffuse;
mod microfacet;
mod mirror;
mod mix;

pub use dielectric::DielectricBsdf;
pub use diffuse::DiffuseBsdf;
pub use microfacet::GgxConductorBsdf;
pub use mirror::MirrorBsdf;
pub use mix::MixBsdf;

use strata_math::{Frame, Spectrum, Vec3};

/// Which quantity is carried along the path being traced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Paths started at the camera.
    Radiance,
    /// Paths started at a light.
    Importance,
}

/// A sampled incident direction.
#[derive(Debug, Clone, Copy)]
pub struct BsdfSample {
    pub dir: Vec3,
    pub f: Spectrum,
    pub pdf: f32,
    /// True when the direction was chosen by a Dirac lobe; `pdf` is then a
    /// discrete probability rather than a density.
    pub is_delta: bool,
}

/// Scattering function at one shading point.
pub trait Bsdf {
    /// Value of the scattering function for light arriving from `wi` and
    /// leaving toward `wo`. Zero for delta lobes.
    fn eval(&self, wi: Vec3, wo: Vec3, mode: TransportMode) -> Spectrum;

    /// Sample an incident direction given `wo` and three uniform numbers.
    fn sample(&self, wo: Vec3, mode: TransportMode, sam: Vec3) -> Option<BsdfSample>;

    /// Solid-angle density of `sample` producing `wi`. Zero for delta lobes.
    fn pdf(&self, wi: Vec3, wo: Vec3, mode: TransportMode) -> f32;

    /// Hemispherical reflectance estimate, used for the albedo buffer.
    fn albedo(&self) -> Spectrum;

    /// True when every lobe is a Dirac delta.
    fn is_delta(&self) -> bool;
}

/// Geometry and shading frames of a shading point.
///
/// Reflection lobes are two-sided: they work in the shading frame turned
/// toward the side of `wo`, and return zero when `wi` and `wo` lie on
/// different sides of the geometric surface.
#[derive(Debug, Clone, Copy)]
pub struct ShadingFrames {
    pub geometry: Frame,
    pub shading: Frame,
}

impl ShadingFrames {
    pub fn new(geometry: Frame, shading: Frame) -> Self {
        Self { geometry, shading }
    }

    /// Shading frame whose normal points to the geometric side of `wo`.
    #[inline]
    pub fn facing(&self, wo: Vec3) -> Frame {
        if self.geometry.z.dot(wo) < 0.0 {
            self.shading.flipped()
        } else {
            self.shading
        }
    }

    /// True when `a` and `b` lie strictly on the same side of the geometric surface.
    #[inline]
    pub fn same_side(&self, a: Vec3, b: Vec3) -> bool {
        let n = self.geometry.z;
        n.dot(a) * n.dot(b) > 0.0
    }
}

/// Mirror `w` about `n`.
#[inline]
pub fn reflect(w: Vec3, n: Vec3) -> Vec3 {
    2.0 * w.dot(n) * n - w
}

/// Unpolarized Fresnel reflectance between two dielectrics.
///
/// `cos_i` is the cosine on the incident side, `eta_i`/`eta_t` the indices of
/// refraction of the incident and transmitted media. Returns 1 under total
/// internal reflection.
pub fn fresnel_dielectric(cos_i: f32, eta_i: f32, eta_t: f32) -> f32 {
    let cos_i = cos_i.clamp(0.0, 1.0);
    let sin_i = (1.0 - cos_i * cos_i).max(0.0).sqrt();
    let sin_t = eta_i / eta_t * sin_i;
    if sin_t >= 1.0 {
        return 1.0;
    }
    let cos_t = (1.0 - sin_t * sin_t).max(0.0).sqrt();
    let parallel = (eta_t * cos_i - eta_i * cos_t) / (eta_t * cos_i + eta_i * cos_t);
    let perpendicular = (eta_i * cos_i - eta_t * cos_t) / (eta_i * cos_i + eta_t * cos_t);
    0.5 * (parallel * parallel + perpendicular * perpendicular)
}

/// Schlick's approximation with a colored normal-incidence reflectance.
#[inline]
pub fn fresnel_schlick(f0: Spectrum, cos_theta: f32) -> Spectrum {
    let m = (1.0 - cos_theta.clamp(0.0, 1.0)).powi(5);
    f0 + (Spectrum::ONE - f0) * m
}
