//! Materials turn a surface hit into a scattering function.
//!
//! A material resolves its textures at the hit and allocates the resulting
//! BSDF in the caller's scratch arena. The arena is reset by the caller once
//! the pixel is done, so BSDFs must not own heap data.

use std::sync::Arc;

use bumpalo::Bump;
use strata_math::{Spectrum, Vec3};

use crate::bsdf::{
    Bsdf, DielectricBsdf, DiffuseBsdf, GgxConductorBsdf, MirrorBsdf, MixBsdf, ShadingFrames,
};
use crate::intersection::SurfaceIntersection;
use crate::texture::{ConstantTexture, Texture};

/// The result of shading a hit.
#[derive(Clone, Copy)]
pub struct ShadingPoint<'a> {
    pub bsdf: &'a dyn Bsdf,
    /// Normal the throughput cosine is taken against.
    pub shading_normal: Vec3,
}

/// Trait for surface appearance.
pub trait Material: Send + Sync {
    fn shade<'a>(&self, hit: &SurfaceIntersection, arena: &'a Bump) -> ShadingPoint<'a>;
}

fn frames(hit: &SurfaceIntersection) -> ShadingFrames {
    ShadingFrames::new(hit.geometry, hit.shading)
}

fn constant(value: Spectrum) -> Arc<dyn Texture> {
    Arc::new(ConstantTexture::new(value))
}

/// Lambertian (diffuse) material.
#[derive(Clone)]
pub struct DiffuseMaterial {
    albedo: Arc<dyn Texture>,
}

impl DiffuseMaterial {
    pub fn new(albedo: Spectrum) -> Self {
        Self::textured(constant(albedo))
    }

    pub fn textured(albedo: Arc<dyn Texture>) -> Self {
        Self { albedo }
    }
}

impl Material for DiffuseMaterial {
    fn shade<'a>(&self, hit: &SurfaceIntersection, arena: &'a Bump) -> ShadingPoint<'a> {
        let albedo = self.albedo.sample(hit.uv).clamp(Spectrum::ZERO, Spectrum::ONE);
        ShadingPoint {
            bsdf: arena.alloc(DiffuseBsdf::new(frames(hit), albedo)),
            shading_normal: hit.shading.z,
        }
    }
}

/// Perfect mirror.
#[derive(Clone)]
pub struct MirrorMaterial {
    color: Arc<dyn Texture>,
}

impl MirrorMaterial {
    pub fn new(color: Spectrum) -> Self {
        Self {
            color: constant(color),
        }
    }
}

impl Material for MirrorMaterial {
    fn shade<'a>(&self, hit: &SurfaceIntersection, arena: &'a Bump) -> ShadingPoint<'a> {
        let color = self.color.sample(hit.uv);
        ShadingPoint {
            bsdf: arena.alloc(MirrorBsdf::new(frames(hit), color)),
            shading_normal: hit.shading.z,
        }
    }
}

/// Smooth glass.
#[derive(Clone)]
pub struct GlassMaterial {
    color: Arc<dyn Texture>,
    /// Index of refraction (1.0 = air, 1.5 = glass, 2.4 = diamond)
    ior: f32,
}

impl GlassMaterial {
    pub fn new(color: Spectrum, ior: f32) -> Self {
        Self {
            color: constant(color),
            ior,
        }
    }
}

impl Material for GlassMaterial {
    fn shade<'a>(&self, hit: &SurfaceIntersection, arena: &'a Bump) -> ShadingPoint<'a> {
        let color = self.color.sample(hit.uv);
        ShadingPoint {
            bsdf: arena.alloc(DielectricBsdf::new(frames(hit), color, self.ior)),
            shading_normal: hit.shading.z,
        }
    }
}

/// Rough metal with a GGX microfacet distribution.
#[derive(Clone)]
pub struct MetalMaterial {
    color: Arc<dyn Texture>,
    /// 0.0 = near mirror, 1.0 = very rough
    roughness: f32,
}

impl MetalMaterial {
    pub fn new(color: Spectrum, roughness: f32) -> Self {
        Self::textured(constant(color), roughness)
    }

    pub fn textured(color: Arc<dyn Texture>, roughness: f32) -> Self {
        Self {
            color,
            roughness: roughness.clamp(0.0, 1.0),
        }
    }
}

impl Material for MetalMaterial {
    fn shade<'a>(&self, hit: &SurfaceIntersection, arena: &'a Bump) -> ShadingPoint<'a> {
        let color = self.color.sample(hit.uv).clamp(Spectrum::ZERO, Spectrum::ONE);
        ShadingPoint {
            bsdf: arena.alloc(GgxConductorBsdf::new(frames(hit), color, self.roughness)),
            shading_normal: hit.shading.z,
        }
    }
}

/// Blend of two materials; `weight` is the share of the second one.
#[derive(Clone)]
pub struct MixMaterial {
    first: Arc<dyn Material>,
    second: Arc<dyn Material>,
    weight: f32,
}

impl MixMaterial {
    pub fn new(first: Arc<dyn Material>, second: Arc<dyn Material>, weight: f32) -> Self {
        Self {
            first,
            second,
            weight: weight.clamp(0.0, 1.0),
        }
    }
}

impl Material for MixMaterial {
    fn shade<'a>(&self, hit: &SurfaceIntersection, arena: &'a Bump) -> ShadingPoint<'a> {
        let a = self.first.shade(hit, arena);
        let b = self.second.shade(hit, arena);
        ShadingPoint {
            bsdf: arena.alloc(MixBsdf::new(a.bsdf, b.bsdf, self.weight)),
            shading_normal: a.shading_normal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsdf::TransportMode;
    use strata_math::{Frame, Vec2};

    fn hit() -> SurfaceIntersection {
        SurfaceIntersection {
            position: Vec3::ZERO,
            geometry: Frame::default(),
            shading: Frame::default(),
            uv: Vec2::new(0.5, 0.5),
            wr: Vec3::Z,
            t: 1.0,
            entity: 0,
            primitive: 0,
        }
    }

    #[test]
    fn test_materials_allocate_in_arena() {
        let arena = Bump::new();
        let diffuse = DiffuseMaterial::new(Spectrum::splat(0.8));
        let p = diffuse.shade(&hit(), &arena);
        assert!(!p.bsdf.is_delta());
        assert_eq!(p.bsdf.albedo(), Spectrum::splat(0.8));
        assert_eq!(p.shading_normal, Vec3::Z);

        let mirror = MirrorMaterial::new(Spectrum::ONE);
        assert!(mirror.shade(&hit(), &arena).bsdf.is_delta());

        let glass = GlassMaterial::new(Spectrum::ONE, 1.5);
        assert!(glass.shade(&hit(), &arena).bsdf.is_delta());

        let metal = MetalMaterial::new(Spectrum::splat(0.9), 0.4);
        let p = metal.shade(&hit(), &arena);
        let wo = Vec3::new(0.3, 0.0, 1.0).normalize();
        let s = p.bsdf.sample(wo, TransportMode::Radiance, Vec3::new(0.2, 0.3, 0.5));
        assert!(s.is_some());
        assert!(arena.allocated_bytes() > 0);
    }

    #[test]
    fn test_mix_material_blends_albedo() {
        let arena = Bump::new();
        let mix = MixMaterial::new(
            Arc::new(DiffuseMaterial::new(Spectrum::ZERO)),
            Arc::new(DiffuseMaterial::new(Spectrum::ONE)),
            0.25,
        );
        let p = mix.shade(&hit(), &arena);
        assert!((p.bsdf.albedo() - Spectrum::splat(0.25)).length() < 1e-6);
    }
}
