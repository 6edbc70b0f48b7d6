use bumpalo::Bump;
use serde::{Deserialize, Serialize};
use strata_math::{Ray, Spectrum, SpectrumExt, Vec3};

use super::{mis_weight, Integrator, PathSample};
use crate::bsdf::{Bsdf, TransportMode};
use crate::error::{ConfigError, ConfigResult};
use crate::film::GBufferPixel;
use crate::intersection::SurfaceIntersection;
use crate::light::Light;
use crate::sampler::Sampler;
use crate::scene::Scene;

/// Path tracing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MisConfig {
    /// Bounces before Russian roulette may end a path.
    pub min_depth: i32,
    /// Hard limit on the number of bounces.
    pub max_depth: i32,
    /// Survival probability once Russian roulette applies.
    pub cont_prob: f32,
    /// Sample every light per vertex instead of one picked at random.
    pub sample_all_lights: bool,
}

impl Default for MisConfig {
    fn default() -> Self {
        Self {
            min_depth: 5,
            max_depth: 10,
            cont_prob: 0.9,
            sample_all_lights: true,
        }
    }
}

impl MisConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.min_depth < 1 {
            return Err(ConfigError::InvalidMinDepth(self.min_depth));
        }
        if self.max_depth < self.min_depth {
            return Err(ConfigError::InvalidMaxDepth {
                min: self.min_depth,
                max: self.max_depth,
            });
        }
        if !(self.cont_prob > 0.0 && self.cont_prob <= 1.0) {
            return Err(ConfigError::InvalidContProb(self.cont_prob));
        }
        Ok(())
    }
}

/// Unidirectional path tracer combining light and BSDF sampling with the
/// balance heuristic.
#[derive(Debug, Clone)]
pub struct MisPathTracer {
    config: MisConfig,
}

impl MisPathTracer {
    pub fn new(config: MisConfig) -> ConfigResult<Self> {
        config.validate()?;
        log::debug!("MIS path tracer: {:?}", config);
        Ok(Self { config })
    }

    pub fn config(&self) -> &MisConfig {
        &self.config
    }

    /// Probability with which the light used for a light sample was picked.
    fn light_select_pdf(&self, scene: &Scene) -> f32 {
        if self.config.sample_all_lights {
            1.0
        } else {
            scene.light_select_pdf()
        }
    }

    /// Direct light from one light sample, weighted against BSDF sampling.
    fn sample_light(
        &self,
        scene: &Scene,
        light: &dyn Light,
        select_pdf: f32,
        hit: &SurfaceIntersection,
        bsdf: &dyn Bsdf,
        sam: [f32; 5],
    ) -> Spectrum {
        let Some(ls) = light.sample(hit.position, Vec3::new(sam[0], sam[1], sam[2])) else {
            return Spectrum::ZERO;
        };
        let radiance = ls.radiance.sanitized();
        if radiance.is_black() || !(ls.pdf > 0.0) {
            return Spectrum::ZERO;
        }

        if scene.has_intersection(&hit.spawn_shadow_ray(ls.wi, ls.distance)) {
            return Spectrum::ZERO;
        }

        let f = bsdf.eval(ls.wi, hit.wr, TransportMode::Radiance).sanitized();
        if f.is_black() {
            return Spectrum::ZERO;
        }

        let value = radiance * f * ls.wi.dot(hit.geometry.z).abs();
        let p_light = ls.pdf * select_pdf;
        if ls.is_delta {
            return value / p_light;
        }
        let p_bsdf = bsdf.pdf(ls.wi, hit.wr, TransportMode::Radiance);
        value / p_light * mis_weight(p_light, p_bsdf)
    }
}

impl Integrator for MisPathTracer {
    fn eval(&self, scene: &Scene, ray: &Ray, sampler: &mut dyn Sampler, arena: &Bump) -> PathSample {
        let mut result = PathSample::default();

        let Some(mut hit) = scene.closest_intersection(ray) else {
            if let Some(env) = scene.environment() {
                result.radiance = env.radiance(ray.direction).sanitized();
            }
            return result;
        };
        if let Some(light) = &scene.entity(hit.entity).area_light {
            result.radiance += light.radiance(hit.geometry.z, hit.wr).sanitized();
        }

        let select_pdf = self.light_select_pdf(scene);
        let mut coef = Spectrum::ONE;
        let mut radiance = result.radiance;

        for depth in 1..=self.config.max_depth {
            if depth > self.config.min_depth {
                if sampler.sample1() > self.config.cont_prob {
                    break;
                }
                coef /= self.config.cont_prob;
            }

            let entity = scene.entity(hit.entity);
            let shading = entity.material.shade(&hit, arena);
            let bsdf = shading.bsdf;

            if depth == 1 {
                result.gbuffer = GBufferPixel {
                    albedo: bsdf.albedo(),
                    position: hit.position,
                    normal: hit.shading.z,
                    depth: ray.direction.length() * hit.t,
                    mask: 1.0,
                };
            }

            // Direct lighting
            if !bsdf.is_delta() {
                if self.config.sample_all_lights {
                    for light in scene.lights() {
                        let direct = self.sample_light(scene, light.as_ref(), 1.0, &hit, bsdf, sampler.sample5());
                        radiance += coef * direct;
                    }
                } else if let Some((light, pdf)) = scene.sample_light(sampler.sample1()) {
                    let direct = self.sample_light(scene, light.as_ref(), pdf, &hit, bsdf, sampler.sample5());
                    radiance += coef * direct;
                }
            }

            // BSDF sampling, picking up emitters the sampled ray reaches
            let Some(bs) = bsdf.sample(hit.wr, TransportMode::Radiance, sampler.sample3()) else {
                break;
            };
            let f = bs.f.sanitized();
            if f.is_black() || !(bs.pdf > 0.0) || !bs.pdf.is_finite() {
                break;
            }

            let cos_geometry = bs.dir.dot(hit.geometry.z).abs();
            let next_ray = hit.spawn_ray(bs.dir);
            let next = scene.closest_intersection(&next_ray);

            // Shadow-only geometry is skipped by the closest-hit query but still
            // occludes everything behind it, as it does for light samples.
            let mut segment = next_ray;
            if let Some(next_hit) = &next {
                segment.t_max = next_hit.t;
            }
            if scene.shadow_only_blocks(&segment) {
                break;
            }

            let emitted = match &next {
                Some(next_hit) => scene
                    .entity(next_hit.entity)
                    .area_light
                    .as_ref()
                    .map(|light| {
                        let le = light.radiance(next_hit.geometry.z, next_hit.wr).sanitized();
                        let p_light = light.pdf(hit.position, next_hit.position, next_hit.geometry.z);
                        (le, p_light)
                    }),
                None => scene
                    .environment()
                    .map(|env| (env.radiance(bs.dir).sanitized(), env.pdf(bs.dir))),
            };
            if let Some((le, p_light)) = emitted {
                if !le.is_black() {
                    let value = le * f * cos_geometry / bs.pdf;
                    let weight = if bs.is_delta {
                        1.0
                    } else {
                        mis_weight(bs.pdf, p_light * select_pdf)
                    };
                    radiance += coef * value * weight;
                }
            }

            let cos_shading = bs.dir.dot(shading.shading_normal).abs();
            coef = (coef * f * (cos_shading / bs.pdf)).sanitized();

            match next {
                Some(next_hit) => hit = next_hit,
                None => break,
            }
            if coef.is_black() {
                break;
            }
        }

        result.radiance = radiance.sanitized();
        result
    }
}
