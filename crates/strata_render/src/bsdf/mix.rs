use strata_math::{Spectrum, Vec3};

use super::{Bsdf, BsdfSample, TransportMode};

/// Linear blend of two scattering functions: `(1 - weight) * a + weight * b`.
///
/// Both components live in the same arena as the mixture.
pub struct MixBsdf<'a> {
    a: &'a dyn Bsdf,
    b: &'a dyn Bsdf,
    weight: f32,
}

impl<'a> MixBsdf<'a> {
    pub fn new(a: &'a dyn Bsdf, b: &'a dyn Bsdf, weight: f32) -> Self {
        Self {
            a,
            b,
            weight: weight.clamp(0.0, 1.0),
        }
    }
}

impl Bsdf for MixBsdf<'_> {
    fn eval(&self, wi: Vec3, wo: Vec3, mode: TransportMode) -> Spectrum {
        self.a.eval(wi, wo, mode) * (1.0 - self.weight) + self.b.eval(wi, wo, mode) * self.weight
    }

    fn sample(&self, wo: Vec3, mode: TransportMode, sam: Vec3) -> Option<BsdfSample> {
        if self.weight <= 0.0 {
            return self.a.sample(wo, mode, sam);
        }
        if self.weight >= 1.0 {
            return self.b.sample(wo, mode, sam);
        }

        // Pick a component with sam.x and reuse the remainder of it.
        let (chosen, prob, remapped) = if sam.x < self.weight {
            (self.b, self.weight, sam.x / self.weight)
        } else {
            (self.a, 1.0 - self.weight, (sam.x - self.weight) / (1.0 - self.weight))
        };
        let s = chosen.sample(wo, mode, Vec3::new(remapped.min(0.999_999), sam.y, sam.z))?;

        if s.is_delta {
            return Some(BsdfSample {
                dir: s.dir,
                f: s.f * prob,
                pdf: s.pdf * prob,
                is_delta: true,
            });
        }

        let pdf = self.pdf(s.dir, wo, mode);
        if pdf <= 0.0 {
            return None;
        }
        Some(BsdfSample {
            dir: s.dir,
            f: self.eval(s.dir, wo, mode),
            pdf,
            is_delta: false,
        })
    }

    fn pdf(&self, wi: Vec3, wo: Vec3, mode: TransportMode) -> f32 {
        self.a.pdf(wi, wo, mode) * (1.0 - self.weight) + self.b.pdf(wi, wo, mode) * self.weight
    }

    fn albedo(&self) -> Spectrum {
        self.a.albedo() * (1.0 - self.weight) + self.b.albedo() * self.weight
    }

    fn is_delta(&self) -> bool {
        self.a.is_delta() && self.b.is_delta()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsdf::{DiffuseBsdf, MirrorBsdf, ShadingFrames};
    use strata_math::{Frame, INV_PI};

    fn frames() -> ShadingFrames {
        ShadingFrames::new(Frame::default(), Frame::default())
    }

    #[test]
    fn test_mix_of_diffuse_and_mirror() {
        let diffuse = DiffuseBsdf::new(frames(), Spectrum::splat(0.5));
        let mirror = MirrorBsdf::new(frames(), Spectrum::ONE);
        let mix = MixBsdf::new(&diffuse, &mirror, 0.25);
        assert!(!mix.is_delta());
        assert!((mix.albedo() - Spectrum::splat(0.625)).length() < 1e-6);

        let wo = Vec3::new(0.0, 0.6, 0.8);
        // sam.x below the weight picks the mirror.
        let s = mix.sample(wo, TransportMode::Radiance, Vec3::new(0.1, 0.5, 0.5)).unwrap();
        assert!(s.is_delta);
        assert!((s.pdf - 0.25).abs() < 1e-6);
        let throughput = s.f * s.dir.z / s.pdf;
        assert!((throughput - Spectrum::ONE).length() < 1e-5);

        // Otherwise the diffuse lobe, with the blended value and density.
        let s = mix.sample(wo, TransportMode::Radiance, Vec3::new(0.6, 0.3, 0.7)).unwrap();
        assert!(!s.is_delta);
        assert!((s.f - Spectrum::splat(0.5 * INV_PI * 0.75)).length() < 1e-6);
        assert!((s.pdf - 0.75 * s.dir.z * INV_PI).abs() < 1e-5);
    }
}
