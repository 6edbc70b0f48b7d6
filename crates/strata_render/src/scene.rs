//! Scene container: entities, lights, environment and camera.
//!
//! The scene is immutable once built and shared read-only by every worker.

use std::sync::Arc;

use strata_math::{Aabb, Ray, Spectrum, Vec3};

use crate::bvh::TriangleBvh;
use crate::camera::Camera;
use crate::error::{SceneError, SceneResult};
use crate::intersection::SurfaceIntersection;
use crate::light::{AreaLight, EnvironmentLight, EnvironmentSource, Light, SceneLight};
use crate::material::{DiffuseMaterial, Material};
use crate::triangle::Triangle;

/// Fraction of a visibility segment left unchecked at each end.
const VISIBILITY_EPSILON: f32 = 1e-4;

/// How an entity takes part in rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Seen by every ray.
    #[default]
    Visible,
    /// Only blocks shadow rays; camera and scattered rays pass through it.
    ShadowOnly,
}

/// A mesh with its material, and its emission when it is a light.
#[derive(Clone)]
pub struct Entity {
    pub name: String,
    pub mesh: Arc<TriangleBvh>,
    pub material: Arc<dyn Material>,
    pub area_light: Option<Arc<AreaLight>>,
    pub visibility: Visibility,
}

/// Collects entities and lights, then validates them into a [`Scene`].
#[derive(Default)]
pub struct SceneBuilder {
    entities: Vec<Entity>,
    lights: Vec<SceneLight>,
    environment: Option<Arc<dyn EnvironmentLight>>,
    camera: Option<Arc<dyn Camera>>,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_mesh(
        &mut self,
        name: &str,
        triangles: &[Triangle],
        material: Arc<dyn Material>,
        visibility: Visibility,
    ) -> SceneResult<Arc<TriangleBvh>> {
        let mesh = TriangleBvh::build(triangles);
        if mesh.is_empty() {
            return Err(SceneError::EmptyMesh(name.to_string()));
        }
        let mesh = Arc::new(mesh);
        self.entities.push(Entity {
            name: name.to_string(),
            mesh: Arc::clone(&mesh),
            material,
            area_light: None,
            visibility,
        });
        Ok(mesh)
    }

    /// Add a visible mesh.
    pub fn add_mesh(
        mut self,
        name: &str,
        triangles: &[Triangle],
        material: Arc<dyn Material>,
    ) -> SceneResult<Self> {
        self.push_mesh(name, triangles, material, Visibility::Visible)?;
        Ok(self)
    }

    /// Add a mesh that only casts shadows.
    pub fn add_shadow_only(
        mut self,
        name: &str,
        triangles: &[Triangle],
        material: Arc<dyn Material>,
    ) -> SceneResult<Self> {
        self.push_mesh(name, triangles, material, Visibility::ShadowOnly)?;
        Ok(self)
    }

    /// Add a one-sided emitting mesh. Its surface is otherwise black.
    pub fn add_area_light(
        mut self,
        name: &str,
        triangles: &[Triangle],
        radiance: Spectrum,
    ) -> SceneResult<Self> {
        let material: Arc<dyn Material> = Arc::new(DiffuseMaterial::new(Spectrum::ZERO));
        let mesh = self.push_mesh(name, triangles, material, Visibility::Visible)?;
        if mesh.surface_area() <= 0.0 {
            return Err(SceneError::ZeroAreaLight(name.to_string()));
        }
        let light = Arc::new(AreaLight::new(mesh, radiance));
        if let Some(entity) = self.entities.last_mut() {
            entity.area_light = Some(Arc::clone(&light));
        }
        self.lights.push(light);
        Ok(self)
    }

    /// Add a light with no geometry, such as a point light.
    pub fn add_light(mut self, light: Arc<dyn Light>) -> Self {
        self.lights.push(light);
        self
    }

    /// Set the environment; it is also sampled as a light.
    pub fn environment(mut self, environment: Arc<dyn EnvironmentLight>) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn camera(mut self, camera: Arc<dyn Camera>) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn build(self) -> SceneResult<Scene> {
        let camera = self.camera.ok_or(SceneError::MissingCamera)?;
        let mut lights = self.lights;
        if let Some(env) = &self.environment {
            lights.push(Arc::new(EnvironmentSource(Arc::clone(env))));
        }

        let world_bound = self
            .entities
            .iter()
            .fold(Aabb::EMPTY, |acc, e| Aabb::surrounding(&acc, &e.mesh.world_bound()));

        if lights.is_empty() {
            log::warn!("Scene has no lights; only emitters hit directly will show");
        }
        log::info!(
            "Built scene: {} entities, {} triangles, {} lights",
            self.entities.len(),
            self.entities.iter().map(|e| e.mesh.primitive_count()).sum::<usize>(),
            lights.len()
        );

        Ok(Scene {
            entities: self.entities,
            lights,
            environment: self.environment,
            camera,
            world_bound,
        })
    }
}

/// Everything a render reads.
pub struct Scene {
    entities: Vec<Entity>,
    lights: Vec<SceneLight>,
    environment: Option<Arc<dyn EnvironmentLight>>,
    camera: Arc<dyn Camera>,
    world_bound: Aabb,
}

impl Scene {
    /// Closest hit among visible entities. `entity` is set on the result.
    pub fn closest_intersection(&self, ray: &Ray) -> Option<SurfaceIntersection> {
        let mut ray = *ray;
        let mut closest = None;
        for (index, entity) in self.entities.iter().enumerate() {
            if entity.visibility != Visibility::Visible {
                continue;
            }
            if let Some(mut hit) = entity.mesh.closest_intersection(&ray) {
                hit.entity = index;
                ray.t_max = hit.t;
                closest = Some(hit);
            }
        }
        closest
    }

    /// True when any entity, shadow-only ones included, blocks the ray.
    pub fn has_intersection(&self, ray: &Ray) -> bool {
        self.entities.iter().any(|e| e.mesh.has_intersection(ray))
    }

    /// True when a shadow-only entity blocks the ray. Visible entities are
    /// not tested; [`Scene::closest_intersection`] covers those.
    pub fn shadow_only_blocks(&self, ray: &Ray) -> bool {
        self.entities
            .iter()
            .filter(|e| e.visibility == Visibility::ShadowOnly)
            .any(|e| e.mesh.has_intersection(ray))
    }

    /// True when nothing blocks the segment between `a` and `b`.
    pub fn visible(&self, a: Vec3, b: Vec3) -> bool {
        let ray = Ray::with_range(a, b - a, VISIBILITY_EPSILON, 1.0 - VISIBILITY_EPSILON);
        !self.has_intersection(&ray)
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity(&self, index: usize) -> &Entity {
        &self.entities[index]
    }

    /// All lights, the environment last when there is one.
    pub fn lights(&self) -> &[SceneLight] {
        &self.lights
    }

    /// Pick one light uniformly; returns it with its selection probability.
    pub fn sample_light(&self, u: f32) -> Option<(&SceneLight, f32)> {
        let n = self.lights.len();
        if n == 0 {
            return None;
        }
        let index = ((u * n as f32) as usize).min(n - 1);
        Some((&self.lights[index], 1.0 / n as f32))
    }

    /// Probability of [`Scene::sample_light`] returning any given light.
    pub fn light_select_pdf(&self) -> f32 {
        if self.lights.is_empty() {
            0.0
        } else {
            1.0 / self.lights.len() as f32
        }
    }

    pub fn environment(&self) -> Option<&dyn EnvironmentLight> {
        self.environment.as_deref()
    }

    pub fn camera(&self) -> &dyn Camera {
        self.camera.as_ref()
    }

    pub fn world_bound(&self) -> Aabb {
        self.world_bound
    }
}
