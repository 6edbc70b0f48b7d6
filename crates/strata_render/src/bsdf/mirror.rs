use strata_math::{Spectrum, Vec3};

use super::{Bsdf, BsdfSample, ShadingFrames, TransportMode};

/// Perfect specular reflection.
#[derive(Debug, Clone, Copy)]
pub struct MirrorBsdf {
    frames: ShadingFrames,
    color: Spectrum,
}

impl MirrorBsdf {
    pub fn new(frames: ShadingFrames, color: Spectrum) -> Self {
        Self { frames, color }
    }
}

impl Bsdf for MirrorBsdf {
    fn eval(&self, _wi: Vec3, _wo: Vec3, _mode: TransportMode) -> Spectrum {
        Spectrum::ZERO
    }

    fn sample(&self, wo: Vec3, _mode: TransportMode, _sam: Vec3) -> Option<BsdfSample> {
        let frame = self.frames.facing(wo);
        let local_wo = frame.global_to_local(wo);
        if local_wo.z <= 0.0 {
            return None;
        }
        let local_wi = Vec3::new(-local_wo.x, -local_wo.y, local_wo.z);
        let dir = frame.local_to_global(local_wi);
        if !self.frames.same_side(dir, wo) {
            return None;
        }
        Some(BsdfSample {
            dir,
            f: self.color / local_wi.z,
            pdf: 1.0,
            is_delta: true,
        })
    }

    fn pdf(&self, _wi: Vec3, _wo: Vec3, _mode: TransportMode) -> f32 {
        0.0
    }

    fn albedo(&self) -> Spectrum {
        self.color
    }

    fn is_delta(&self) -> bool {
        true
    }
}
