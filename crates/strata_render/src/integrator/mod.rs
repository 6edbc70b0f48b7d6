//! Light transport integrators.
//!
//! An integrator estimates the radiance arriving along one camera ray. It is
//! shared by all workers; the sampler and scratch arena passed in belong to
//! the calling worker.

mod mis;

pub use mis::{MisConfig, MisPathTracer};

use bumpalo::Bump;
use strata_math::{Ray, Spectrum};

use crate::film::GBufferPixel;
use crate::sampler::Sampler;
use crate::scene::Scene;

/// Radiance estimate for one camera ray, with its first-hit data.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathSample {
    pub radiance: Spectrum,
    pub gbuffer: GBufferPixel,
}

/// Trait for radiance estimators.
pub trait Integrator: Send + Sync {
    fn eval(&self, scene: &Scene, ray: &Ray, sampler: &mut dyn Sampler, arena: &Bump) -> PathSample;
}

/// Balance heuristic weight of a strategy with density `p_this` against one
/// with density `p_other`.
#[inline]
pub fn mis_weight(p_this: f32, p_other: f32) -> f32 {
    let sum = p_this + p_other;
    if sum > 0.0 {
        p_this / sum
    } else {
        0.0
    }
}
