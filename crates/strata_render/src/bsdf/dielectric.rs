use strata_math::{Spectrum, Vec3};

use super::{fresnel_dielectric, reflect, Bsdf, BsdfSample, ShadingFrames, TransportMode};

/// Smooth dielectric interface: Fresnel-weighted choice between specular
/// reflection and refraction.
///
/// The shading normal points to the outside medium (index 1).
#[derive(Debug, Clone, Copy)]
pub struct DielectricBsdf {
    frames: ShadingFrames,
    color: Spectrum,
    ior: f32,
}

impl DielectricBsdf {
    pub fn new(frames: ShadingFrames, color: Spectrum, ior: f32) -> Self {
        Self { frames, color, ior }
    }
}

impl Bsdf for DielectricBsdf {
    fn eval(&self, _wi: Vec3, _wo: Vec3, _mode: TransportMode) -> Spectrum {
        Spectrum::ZERO
    }

    fn sample(&self, wo: Vec3, mode: TransportMode, sam: Vec3) -> Option<BsdfSample> {
        let n = self.frames.shading.z;
        let cos_o = n.dot(wo);
        if cos_o == 0.0 {
            return None;
        }
        let (eta_i, eta_t, normal) = if cos_o > 0.0 {
            (1.0, self.ior, n)
        } else {
            (self.ior, 1.0, -n)
        };
        let cos_i = cos_o.abs();
        let fr = fresnel_dielectric(cos_i, eta_i, eta_t);

        if sam.x < fr {
            let dir = reflect(wo, normal);
            if !self.frames.same_side(dir, wo) {
                return None;
            }
            return Some(BsdfSample {
                dir,
                f: self.color * fr / cos_i,
                pdf: fr,
                is_delta: true,
            });
        }

        let eta = eta_i / eta_t;
        let sin2_t = eta * eta * (1.0 - cos_i * cos_i).max(0.0);
        if sin2_t >= 1.0 {
            return None;
        }
        let cos_t = (1.0 - sin2_t).sqrt();
        let dir = (-wo * eta + normal * (eta * cos_i - cos_t)).normalize();
        if self.frames.same_side(dir, wo) {
            return None;
        }
        let mut f = self.color * (1.0 - fr) / cos_t;
        if mode == TransportMode::Radiance {
            f *= eta * eta;
        }
        Some(BsdfSample {
            dir,
            f,
            pdf: 1.0 - fr,
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

#[cfg(test)]
mod tests {
    use super::*;
    use strata_math::Frame;

    fn glass() -> DielectricBsdf {
        DielectricBsdf::new(
            ShadingFrames::new(Frame::default(), Frame::default()),
            Spectrum::ONE,
            1.5,
        )
    }

    #[test]
    fn test_normal_incidence_split() {
        let bsdf = glass();
        let reflected = bsdf.sample(Vec3::Z, TransportMode::Radiance, Vec3::splat(0.01)).unwrap();
        assert!((reflected.dir - Vec3::Z).length() < 1e-6);
        assert!((reflected.pdf - 0.04).abs() < 1e-4);

        let refracted = bsdf.sample(Vec3::Z, TransportMode::Radiance, Vec3::splat(0.5)).unwrap();
        assert!((refracted.dir + Vec3::Z).length() < 1e-6);
        assert!((refracted.pdf - 0.96).abs() < 1e-4);
        // Entering glass compresses radiance by 1 / 1.5^2.
        let throughput = refracted.f * refracted.dir.z.abs() / refracted.pdf;
        assert!((throughput.x - 1.0 / 2.25).abs() < 1e-4);

        let importance = bsdf.sample(Vec3::Z, TransportMode::Importance, Vec3::splat(0.5)).unwrap();
        let throughput = importance.f * importance.dir.z.abs() / importance.pdf;
        assert!((throughput.x - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_refraction_obeys_snell() {
        let bsdf = glass();
        let wo = Vec3::new(0.5, 0.0, 0.75_f32.sqrt());
        let s = bsdf.sample(wo, TransportMode::Radiance, Vec3::splat(0.99)).unwrap();
        assert!(s.dir.z < 0.0);
        let sin_o = 0.5;
        let sin_t = (1.0 - s.dir.z * s.dir.z).sqrt();
        assert!((sin_o - 1.5 * sin_t).abs() < 1e-4);
    }

    #[test]
    fn test_total_internal_reflection() {
        let bsdf = glass();
        // Inside the glass at a grazing angle: always reflect.
        let wo = Vec3::new(0.9, 0.0, -(1.0_f32 - 0.81).sqrt());
        let s = bsdf.sample(wo, TransportMode::Radiance, Vec3::splat(0.99)).unwrap();
        assert!(s.dir.z < 0.0);
        assert!((s.pdf - 1.0).abs() < 1e-6);
    }
}
