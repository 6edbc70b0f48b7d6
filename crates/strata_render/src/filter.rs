//! Separable pixel reconstruction filters.
//!
//! Offsets passed to [`Filter::eval`] are signed distances from the sample to
//! the pixel centre, in pixels.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Trait for reconstruction kernels with finite support.
pub trait Filter: Send + Sync {
    /// Half-width of the support in pixels.
    fn radius(&self) -> f32;

    /// One-dimensional kernel.
    fn eval_1d(&self, d: f32) -> f32;

    /// Kernel weight at `(dx, dy)`.
    fn eval(&self, dx: f32, dy: f32) -> f32 {
        self.eval_1d(dx) * self.eval_1d(dy)
    }
}

fn check_radius(radius: f32) -> ConfigResult<f32> {
    if radius.is_finite() && radius > 0.0 {
        Ok(radius)
    } else {
        Err(ConfigError::InvalidFilterRadius(radius))
    }
}

/// Constant weight over `[-r, r)`.
#[derive(Debug, Clone, Copy)]
pub struct BoxFilter {
    radius: f32,
}

impl BoxFilter {
    pub fn new(radius: f32) -> ConfigResult<Self> {
        Ok(Self {
            radius: check_radius(radius)?,
        })
    }
}

impl Filter for BoxFilter {
    fn radius(&self) -> f32 {
        self.radius
    }

    fn eval_1d(&self, d: f32) -> f32 {
        // Half-open so a sample on a pixel border lands in exactly one pixel
        if -self.radius <= d && d < self.radius {
            1.0
        } else {
            0.0
        }
    }
}

/// Linear falloff to zero at the radius.
#[derive(Debug, Clone, Copy)]
pub struct TentFilter {
    radius: f32,
}

impl TentFilter {
    pub fn new(radius: f32) -> ConfigResult<Self> {
        Ok(Self {
            radius: check_radius(radius)?,
        })
    }
}

impl Filter for TentFilter {
    fn radius(&self) -> f32 {
        self.radius
    }

    fn eval_1d(&self, d: f32) -> f32 {
        (1.0 - d.abs() / self.radius).max(0.0)
    }
}

/// Gaussian shifted so it reaches zero at the radius.
#[derive(Debug, Clone, Copy)]
pub struct GaussianFilter {
    radius: f32,
    alpha: f32,
    edge: f32,
}

impl GaussianFilter {
    pub fn new(radius: f32, alpha: f32) -> ConfigResult<Self> {
        let radius = check_radius(radius)?;
        if !(alpha.is_finite() && alpha > 0.0) {
            return Err(ConfigError::InvalidFilterAlpha(alpha));
        }
        Ok(Self {
            radius,
            alpha,
            edge: (-alpha * radius * radius).exp(),
        })
    }
}

impl Filter for GaussianFilter {
    fn radius(&self) -> f32 {
        self.radius
    }

    fn eval_1d(&self, d: f32) -> f32 {
        if d.abs() >= self.radius {
            return 0.0;
        }
        ((-self.alpha * d * d).exp() - self.edge).max(0.0)
    }
}

/// Serializable filter choice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterConfig {
    Box { radius: f32 },
    Tent { radius: f32 },
    Gaussian { radius: f32, alpha: f32 },
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig::Box { radius: 0.5 }
    }
}

impl FilterConfig {
    pub fn build(&self) -> ConfigResult<Box<dyn Filter>> {
        Ok(match *self {
            FilterConfig::Box { radius } => Box::new(BoxFilter::new(radius)?),
            FilterConfig::Tent { radius } => Box::new(TentFilter::new(radius)?),
            FilterConfig::Gaussian { radius, alpha } => Box::new(GaussianFilter::new(radius, alpha)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_is_half_open() {
        let f = BoxFilter::new(0.5).unwrap();
        assert_eq!(f.eval_1d(-0.5), 1.0);
        assert_eq!(f.eval_1d(0.4999), 1.0);
        assert_eq!(f.eval_1d(0.5), 0.0);
        assert_eq!(f.eval(0.1, -0.2), 1.0);
    }

    #[test]
    fn test_tent_and_gaussian_shapes() {
        let tent = TentFilter::new(2.0).unwrap();
        assert_eq!(tent.eval_1d(0.0), 1.0);
        assert!((tent.eval_1d(1.0) - 0.5).abs() < 1e-6);
        assert_eq!(tent.eval_1d(2.5), 0.0);

        let gauss = GaussianFilter::new(1.5, 2.0).unwrap();
        assert!(gauss.eval_1d(0.0) > gauss.eval_1d(0.5));
        assert_eq!(gauss.eval_1d(1.5), 0.0);
        assert!(gauss.eval_1d(1.49) >= 0.0);
    }

    #[test]
    fn test_invalid_radius() {
        assert!(matches!(BoxFilter::new(0.0), Err(ConfigError::InvalidFilterRadius(_))));
        assert!(TentFilter::new(f32::NAN).is_err());
    }

    #[test]
    fn test_invalid_gaussian_alpha() {
        for alpha in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let err = GaussianFilter::new(1.5, alpha).err();
            assert!(matches!(err, Some(ConfigError::InvalidFilterAlpha(_))), "alpha {alpha}");
        }
        let cfg = FilterConfig::Gaussian { radius: 1.5, alpha: 0.0 };
        assert!(cfg.build().is_err());
    }

    #[test]
    fn test_filter_config_json() {
        let cfg: FilterConfig = serde_json::from_str(r#"{"type":"gaussian","radius":2.0,"alpha":1.0}"#).unwrap();
        assert_eq!(cfg, FilterConfig::Gaussian { radius: 2.0, alpha: 1.0 });
        assert_eq!(cfg.build().unwrap().radius(), 2.0);
    }
}
