//! Render settings loaded from JSON.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::film::Film;
use crate::filter::{Filter, FilterConfig};
use crate::integrator::{MisConfig, MisPathTracer};
use crate::renderer::{PathTracer, RendererConfig};
use crate::sampler::NativeSampler;

/// Everything needed to set up a render apart from the scene.
///
/// Missing fields take their defaults, so `{}` is a valid 512x512 render.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    /// Samples per pixel.
    pub spp: i32,
    pub seed: u64,
    pub integrator: MisConfig,
    pub renderer: RendererConfig,
    pub filter: FilterConfig,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            spp: 16,
            seed: 0,
            integrator: MisConfig::default(),
            renderer: RendererConfig::default(),
            filter: FilterConfig::default(),
        }
    }
}

impl RenderSettings {
    /// Parse and validate settings.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every parameter, reporting the first invalid one.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidFilmSize {
                width: self.width,
                height: self.height,
            });
        }
        if self.spp <= 0 {
            return Err(ConfigError::InvalidSamplesPerPixel(self.spp));
        }
        self.integrator.validate()?;
        self.renderer.validate()?;
        self.filter.build()?;
        Ok(())
    }

    pub fn build_film(&self) -> ConfigResult<Film> {
        let filter: Arc<dyn Filter> = Arc::from(self.filter.build()?);
        Film::new(self.width, self.height, filter)
    }

    pub fn build_tracer(&self) -> ConfigResult<PathTracer> {
        let integrator = MisPathTracer::new(self.integrator)?;
        let sampler = NativeSampler::new(self.spp, self.seed)?;
        PathTracer::new(Arc::new(integrator), Arc::new(sampler), self.renderer)
    }
}
