use crate::Vec3;

/// RGB radiometric quantity (radiance, reflectance, throughput).
pub type Spectrum = Vec3;

/// Helpers on [`Spectrum`] used throughout light transport.
pub trait SpectrumExt {
    /// True when every channel is zero.
    fn is_black(&self) -> bool;

    /// Luminance with Rec. 709 weights.
    fn luminance(&self) -> f32;

    /// Replace NaN, infinite and negative channels with zero.
    fn sanitized(&self) -> Spectrum;
}

impl SpectrumExt for Spectrum {
    #[inline]
    fn is_black(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    #[inline]
    fn luminance(&self) -> f32 {
        0.2126 * self.x + 0.7152 * self.y + 0.0722 * self.z
    }

    #[inline]
    fn sanitized(&self) -> Spectrum {
        let fix = |c: f32| if c.is_finite() && c > 0.0 { c } else { 0.0 };
        Spectrum::new(fix(self.x), fix(self.y), fix(self.z))
    }
}
