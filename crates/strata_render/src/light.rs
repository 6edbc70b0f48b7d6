//! Light sources sampled for next event estimation.
//!
//! Area lights are triangle meshes emitting from the side their geometric
//! normal points to. Point lights are delta lights. The environment is seen by
//! every ray that leaves the scene and is also sampled like any other light.

use std::sync::Arc;

use strata_math::{sampling, Spectrum, Vec2, Vec3};

use crate::bvh::TriangleBvh;

/// Sampled incident light at a reference point.
#[derive(Debug, Clone, Copy)]
pub struct LightSample {
    /// Unit direction from the reference point toward the light.
    pub wi: Vec3,
    /// Distance to the sampled point, infinite for the environment.
    pub distance: f32,
    pub radiance: Spectrum,
    /// Solid-angle density, or the discrete probability for delta lights.
    pub pdf: f32,
    pub is_delta: bool,
}

/// Trait for anything that can be sampled toward a shading point.
pub trait Light: Send + Sync {
    /// Sample incident light at `reference` with three uniform numbers.
    fn sample(&self, reference: Vec3, sam: Vec3) -> Option<LightSample>;

    /// True for lights that can only be reached by explicit sampling.
    fn is_delta(&self) -> bool;
}

/// Shared handle to a scene light.
pub type SceneLight = Arc<dyn Light>;

/// One-sided diffuse emitter over a triangle mesh.
#[derive(Debug, Clone)]
pub struct AreaLight {
    mesh: Arc<TriangleBvh>,
    radiance: Spectrum,
}

impl AreaLight {
    pub fn new(mesh: Arc<TriangleBvh>, radiance: Spectrum) -> Self {
        Self { mesh, radiance }
    }

    pub fn mesh(&self) -> &TriangleBvh {
        &self.mesh
    }

    /// Emitted radiance leaving a point with geometric `normal` toward `wr`.
    #[inline]
    pub fn radiance(&self, normal: Vec3, wr: Vec3) -> Spectrum {
        if normal.dot(wr) > 0.0 {
            self.radiance
        } else {
            Spectrum::ZERO
        }
    }

    /// Solid-angle density of [`Light::sample`] at `reference` choosing the
    /// point `position` with geometric `normal`.
    pub fn pdf(&self, reference: Vec3, position: Vec3, normal: Vec3) -> f32 {
        let d = reference - position;
        let dist2 = d.length_squared();
        if dist2 == 0.0 {
            return 0.0;
        }
        let cos_l = normal.dot(d) / dist2.sqrt();
        if cos_l <= 0.0 {
            return 0.0;
        }
        self.mesh.pdf_area() * dist2 / cos_l
    }
}

impl Light for AreaLight {
    fn sample(&self, reference: Vec3, sam: Vec3) -> Option<LightSample> {
        let (point, pdf_area) = self.mesh.sample(sam)?;
        let d = point.position - reference;
        let dist2 = d.length_squared();
        if dist2 == 0.0 {
            return None;
        }
        let distance = dist2.sqrt();
        let wi = d / distance;
        let cos_l = -point.normal.dot(wi);
        if cos_l <= 0.0 {
            return None;
        }
        Some(LightSample {
            wi,
            distance,
            radiance: self.radiance,
            pdf: pdf_area * dist2 / cos_l,
            is_delta: false,
        })
    }

    fn is_delta(&self) -> bool {
        false
    }
}

/// Isotropic point emitter.
#[derive(Debug, Clone, Copy)]
pub struct PointLight {
    position: Vec3,
    intensity: Spectrum,
}

impl PointLight {
    pub fn new(position: Vec3, intensity: Spectrum) -> Self {
        Self {
            position,
            intensity,
        }
    }
}

impl Light for PointLight {
    fn sample(&self, reference: Vec3, _sam: Vec3) -> Option<LightSample> {
        let d = self.position - reference;
        let dist2 = d.length_squared();
        if dist2 == 0.0 {
            return None;
        }
        let distance = dist2.sqrt();
        Some(LightSample {
            wi: d / distance,
            distance,
            radiance: self.intensity / dist2,
            pdf: 1.0,
            is_delta: true,
        })
    }

    fn is_delta(&self) -> bool {
        true
    }
}

/// Radiance arriving from infinitely far away.
pub trait EnvironmentLight: Send + Sync {
    /// Radiance arriving along `-dir`, i.e. seen when looking toward `dir`.
    fn radiance(&self, dir: Vec3) -> Spectrum;

    /// Sample a unit direction toward the environment, with its density.
    fn sample(&self, sam: Vec2) -> Option<(Vec3, f32)>;

    fn pdf(&self, dir: Vec3) -> f32;
}

/// Uniform background colour.
#[derive(Debug, Clone, Copy)]
pub struct ConstantEnvironment {
    color: Spectrum,
}

impl ConstantEnvironment {
    pub fn new(color: Spectrum) -> Self {
        Self { color }
    }
}

impl EnvironmentLight for ConstantEnvironment {
    fn radiance(&self, _dir: Vec3) -> Spectrum {
        self.color
    }

    fn sample(&self, sam: Vec2) -> Option<(Vec3, f32)> {
        Some(sampling::uniform_sphere(sam))
    }

    fn pdf(&self, _dir: Vec3) -> f32 {
        sampling::uniform_sphere_pdf()
    }
}

/// Vertical blend from a horizon colour to a zenith colour.
#[derive(Debug, Clone, Copy)]
pub struct SkyGradient {
    horizon: Spectrum,
    zenith: Spectrum,
}

impl SkyGradient {
    pub fn new(horizon: Spectrum, zenith: Spectrum) -> Self {
        Self { horizon, zenith }
    }
}

impl Default for SkyGradient {
    fn default() -> Self {
        Self::new(Spectrum::ONE, Spectrum::new(0.5, 0.7, 1.0))
    }
}

impl EnvironmentLight for SkyGradient {
    fn radiance(&self, dir: Vec3) -> Spectrum {
        let a = 0.5 * (dir.normalize_or_zero().y + 1.0);
        self.horizon * (1.0 - a) + self.zenith * a
    }

    fn sample(&self, sam: Vec2) -> Option<(Vec3, f32)> {
        Some(sampling::uniform_sphere(sam))
    }

    fn pdf(&self, _dir: Vec3) -> f32 {
        sampling::uniform_sphere_pdf()
    }
}

/// Lets the environment take part in light sampling.
#[derive(Clone)]
pub struct EnvironmentSource(pub Arc<dyn EnvironmentLight>);

impl Light for EnvironmentSource {
    fn sample(&self, _reference: Vec3, sam: Vec3) -> Option<LightSample> {
        let (wi, pdf) = self.0.sample(Vec2::new(sam.x, sam.y))?;
        if pdf <= 0.0 {
            return None;
        }
        Some(LightSample {
            wi,
            distance: f32::INFINITY,
            radiance: self.0.radiance(wi),
            pdf,
            is_delta: false,
        })
    }

    fn is_delta(&self) -> bool {
        false
    }
}
