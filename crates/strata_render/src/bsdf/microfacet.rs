use strata_math::{Spectrum, Vec3, PI};

use super::{fresnel_schlick, Bsdf, BsdfSample, ShadingFrames, TransportMode};

/// Rough conductor with a GGX normal distribution, separable Smith masking
/// and Schlick Fresnel.
#[derive(Debug, Clone, Copy)]
pub struct GgxConductorBsdf {
    frames: ShadingFrames,
    color: Spectrum,
    alpha: f32,
}

impl GgxConductorBsdf {
    /// `roughness` is perceptual; the distribution width is its square.
    pub fn new(frames: ShadingFrames, color: Spectrum, roughness: f32) -> Self {
        let r = roughness.clamp(0.0, 1.0);
        Self {
            frames,
            color,
            alpha: (r * r).max(1e-3),
        }
    }

    fn distribution(&self, cos_h: f32) -> f32 {
        if cos_h <= 0.0 {
            return 0.0;
        }
        let a2 = self.alpha * self.alpha;
        let d = cos_h * cos_h * (a2 - 1.0) + 1.0;
        a2 / (PI * d * d)
    }

    fn masking(&self, cos_theta: f32) -> f32 {
        if cos_theta <= 0.0 {
            return 0.0;
        }
        let cos2 = cos_theta * cos_theta;
        let tan2 = (1.0 - cos2).max(0.0) / cos2;
        2.0 / (1.0 + (1.0 + self.alpha * self.alpha * tan2).sqrt())
    }

    /// Local-space value and pdf for a pair of directions above the surface.
    fn eval_local(&self, li: Vec3, lo: Vec3) -> Option<(Spectrum, f32)> {
        if li.z <= 0.0 || lo.z <= 0.0 {
            return None;
        }
        let h = (li + lo).normalize();
        let d = self.distribution(h.z);
        let g = self.masking(li.z) * self.masking(lo.z);
        let f = fresnel_schlick(self.color, li.dot(h));
        let value = f * (d * g / (4.0 * li.z * lo.z));
        let pdf = d * h.z / (4.0 * lo.dot(h).abs());
        Some((value, pdf))
    }
}

impl Bsdf for GgxConductorBsdf {
    fn eval(&self, wi: Vec3, wo: Vec3, _mode: TransportMode) -> Spectrum {
        if !self.frames.same_side(wi, wo) {
            return Spectrum::ZERO;
        }
        let frame = self.frames.facing(wo);
        self.eval_local(frame.global_to_local(wi), frame.global_to_local(wo))
            .map_or(Spectrum::ZERO, |(f, _)| f)
    }

    fn sample(&self, wo: Vec3, _mode: TransportMode, sam: Vec3) -> Option<BsdfSample> {
        let frame = self.frames.facing(wo);
        let lo = frame.global_to_local(wo);
        if lo.z <= 0.0 {
            return None;
        }

        let a2 = self.alpha * self.alpha;
        let phi = 2.0 * PI * sam.x;
        let cos_theta = ((1.0 - sam.y) / (1.0 + (a2 - 1.0) * sam.y)).max(0.0).sqrt();
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
        let h = Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta);

        let li = 2.0 * lo.dot(h) * h - lo;
        let (f, pdf) = self.eval_local(li, lo)?;
        let dir = frame.local_to_global(li);
        if pdf <= 0.0 || !self.frames.same_side(dir, wo) {
            return None;
        }
        Some(BsdfSample {
            dir,
            f,
            pdf,
            is_delta: false,
        })
    }

    fn pdf(&self, wi: Vec3, wo: Vec3, _mode: TransportMode) -> f32 {
        if !self.frames.same_side(wi, wo) {
            return 0.0;
        }
        let frame = self.frames.facing(wo);
        self.eval_local(frame.global_to_local(wi), frame.global_to_local(wo))
            .map_or(0.0, |(_, pdf)| pdf)
    }

    fn albedo(&self) -> Spectrum {
        self.color
    }

    fn is_delta(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use strata_math::Frame;

    fn metal(roughness: f32) -> GgxConductorBsdf {
        GgxConductorBsdf::new(
            ShadingFrames::new(Frame::default(), Frame::default()),
            Spectrum::new(0.9, 0.7, 0.4),
            roughness,
        )
    }

    #[test]
    fn test_sample_consistent_with_eval_and_pdf() {
        let bsdf = metal(0.5);
        let wo = Vec3::new(0.4, 0.1, 0.9).normalize();
        let mut rng = StdRng::seed_from_u64(21);
        let mut checked = 0;
        for _ in 0..500 {
            let sam = Vec3::new(rng.gen(), rng.gen(), rng.gen());
            if let Some(s) = bsdf.sample(wo, TransportMode::Radiance, sam) {
                let pdf = bsdf.pdf(s.dir, wo, TransportMode::Radiance);
                assert!((pdf - s.pdf).abs() <= 1e-3 * s.pdf.max(1.0));
                let f = bsdf.eval(s.dir, wo, TransportMode::Radiance);
                assert!((f - s.f).length() <= 1e-3 * s.f.length().max(1.0));
                checked += 1;
            }
        }
        assert!(checked > 300);
    }

    #[test]
    fn test_weak_energy_conservation() {
        let bsdf = metal(0.3);
        let wo = Vec3::new(0.2, 0.0, 1.0).normalize();
        let mut rng = StdRng::seed_from_u64(4);
        let n = 20_000;
        let mut sum = Spectrum::ZERO;
        for _ in 0..n {
            let sam = Vec3::new(rng.gen(), rng.gen(), rng.gen());
            if let Some(s) = bsdf.sample(wo, TransportMode::Radiance, sam) {
                sum += s.f * s.dir.z / s.pdf;
            }
        }
        let estimate = sum / n as f32;
        assert!(estimate.max_element() <= 1.0);
        assert!(estimate.min_element() > 0.0);
    }

    #[test]
    fn test_no_transmission() {
        let bsdf = metal(0.5);
        assert_eq!(bsdf.eval(-Vec3::Z, Vec3::Z, TransportMode::Radiance), Spectrum::ZERO);
        assert_eq!(bsdf.pdf(-Vec3::Z, Vec3::Z, TransportMode::Radiance), 0.0);
    }
}
