//! Strata - tiled MIS path tracing on the CPU
//!
//! Triangle meshes are organised in a BVH and intersected with a watertight
//! ray/triangle test. A path tracer combining light sampling and BSDF
//! sampling with multiple importance sampling estimates radiance, which is
//! splatted through a reconstruction filter into per-task film grids. The
//! grids are rendered by a worker pool and merged into one film.

mod arena;
pub mod bsdf;
mod buffer;
mod bvh;
mod camera;
mod config;
mod error;
mod film;
mod filter;
mod grid;
mod integrator;
mod intersection;
mod light;
mod material;
mod renderer;
mod reporter;
mod sampler;
mod scene;
pub mod shapes;
mod texture;
mod triangle;

pub use arena::{ScratchArena, DEFAULT_RESET_THRESHOLD};
pub use bsdf::{Bsdf, BsdfSample, ShadingFrames, TransportMode};
pub use buffer::{color_to_rgba, linear_to_gamma, ImageBuffer};
pub use bvh::{BvhNode, TriangleBvh, LEAF_SIZE_THRESHOLD, TRAVERSAL_STACK_SIZE};
pub use camera::{Camera, CameraRay, CameraSample, OrthographicCamera, PerspectiveCamera};
pub use config::RenderSettings;
pub use error::{
    ConfigError, ConfigResult, RenderError, RenderResult, SceneError, SceneResult, TaskError,
};
pub use film::{Film, FilmGrid, GBuffer, GBufferPixel};
pub use filter::{BoxFilter, Filter, FilterConfig, GaussianFilter, TentFilter};
pub use grid::{divide_into_tasks, GridTask, DEFAULT_TASK_GRID_SIZE};
pub use integrator::{mis_weight, Integrator, MisConfig, MisPathTracer, PathSample};
pub use intersection::{SurfaceIntersection, SurfacePoint};
pub use light::{
    AreaLight, ConstantEnvironment, EnvironmentLight, EnvironmentSource, Light, LightSample,
    PointLight, SceneLight, SkyGradient,
};
pub use material::{
    DiffuseMaterial, GlassMaterial, Material, MetalMaterial, MirrorMaterial, MixMaterial,
    ShadingPoint,
};
pub use renderer::{PathTracer, RenderHandle, RenderReport, RendererConfig};
pub use reporter::{LogReporter, NullReporter, ProgressBarReporter, ProgressReporter};
pub use sampler::{NativeSampler, Sampler};
pub use scene::{Entity, Scene, SceneBuilder, Visibility};
pub use texture::{CheckerTexture, ConstantTexture, Texture};
pub use triangle::{Triangle, TriangleHit, Vertex, WatertightRay};

/// Re-export the math types shared with `strata_math`
pub use strata_math::{Aabb, Frame, Interval, Ray, Spectrum, SpectrumExt, Vec2, Vec3};
