use strata_math::{sampling, Spectrum, Vec2, Vec3, INV_PI};

use super::{Bsdf, BsdfSample, ShadingFrames, TransportMode};

/// Lambertian reflection.
#[derive(Debug, Clone, Copy)]
pub struct DiffuseBsdf {
    frames: ShadingFrames,
    albedo: Spectrum,
}

impl DiffuseBsdf {
    pub fn new(frames: ShadingFrames, albedo: Spectrum) -> Self {
        Self { frames, albedo }
    }
}

impl Bsdf for DiffuseBsdf {
    fn eval(&self, wi: Vec3, wo: Vec3, _mode: TransportMode) -> Spectrum {
        if !self.frames.same_side(wi, wo) {
            return Spectrum::ZERO;
        }
        let frame = self.frames.facing(wo);
        if frame.z.dot(wi) <= 0.0 || frame.z.dot(wo) <= 0.0 {
            return Spectrum::ZERO;
        }
        self.albedo * INV_PI
    }

    fn sample(&self, wo: Vec3, _mode: TransportMode, sam: Vec3) -> Option<BsdfSample> {
        let frame = self.frames.facing(wo);
        if frame.z.dot(wo) <= 0.0 {
            return None;
        }
        let (local, pdf) = sampling::cosine_hemisphere(Vec2::new(sam.x, sam.y));
        let dir = frame.local_to_global(local);
        if pdf <= 0.0 || !self.frames.same_side(dir, wo) {
            return None;
        }
        Some(BsdfSample {
            dir,
            f: self.albedo * INV_PI,
            pdf,
            is_delta: false,
        })
    }

    fn pdf(&self, wi: Vec3, wo: Vec3, _mode: TransportMode) -> f32 {
        if !self.frames.same_side(wi, wo) {
            return 0.0;
        }
        let frame = self.frames.facing(wo);
        if frame.z.dot(wo) <= 0.0 {
            return 0.0;
        }
        sampling::cosine_hemisphere_pdf(frame.z.dot(wi))
    }

    fn albedo(&self) -> Spectrum {
        self.albedo
    }

    fn is_delta(&self) -> bool {
        false
    }
}
