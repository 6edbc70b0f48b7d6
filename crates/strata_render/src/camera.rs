//! Cameras for primary ray generation.
//!
//! Film coordinates are normalized to `[0, 1]²` with `(0, 0)` at the top-left
//! corner of the image.

use strata_math::{sampling, Ray, Spectrum, Vec2, Vec3};

/// Where on the film and the lens a primary ray starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSample {
    pub film: Vec2,
    pub lens: Vec2,
}

/// A primary ray together with its importance and sampling densities.
#[derive(Debug, Clone, Copy)]
pub struct CameraRay {
    pub ray: Ray,
    /// Viewing direction of the camera.
    pub normal: Vec3,
    pub importance: Spectrum,
    /// Area density of the ray origin on the lens.
    pub pdf_pos: f32,
    /// Solid-angle density of the ray direction.
    pub pdf_dir: f32,
}

impl CameraRay {
    /// Monte Carlo weight of the ray: `W·|cos| / (p_pos·p_dir)`.
    pub fn weight(&self) -> Spectrum {
        let denom = self.pdf_pos * self.pdf_dir;
        if denom <= 0.0 {
            return Spectrum::ZERO;
        }
        let cos = self.normal.dot(self.ray.direction.normalize()).abs();
        self.importance * (cos / denom)
    }
}

/// Trait for ray generation.
pub trait Camera: Send + Sync {
    fn generate_ray(&self, sample: &CameraSample) -> CameraRay;
}

/// Pinhole or thin-lens perspective camera.
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    // Image settings
    image_width: u32,
    image_height: u32,

    // Camera positioning
    look_from: Vec3,
    look_at: Vec3,
    vup: Vec3,

    // Lens settings
    vfov: f32,          // Vertical field of view in degrees
    defocus_angle: f32, // Variation angle of rays through each pixel
    focus_dist: f32,    // Distance from camera to plane of perfect focus

    // Cached computed values (set by initialize())
    center: Vec3,
    viewport_upper_left: Vec3,
    viewport_u: Vec3,
    viewport_v: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
    defocus_disk_u: Vec3,
    defocus_disk_v: Vec3,
    film_area: f32,
    lens_area: f32,
}

impl PerspectiveCamera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        let mut camera = Self {
            image_width: 800,
            image_height: 450,
            look_from: Vec3::ZERO,
            look_at: Vec3::new(0.0, 0.0, -1.0),
            vup: Vec3::Y,
            vfov: 90.0,
            defocus_angle: 0.0,
            focus_dist: 1.0,
            center: Vec3::ZERO,
            viewport_upper_left: Vec3::ZERO,
            viewport_u: Vec3::ZERO,
            viewport_v: Vec3::ZERO,
            u: Vec3::X,
            v: Vec3::Y,
            w: Vec3::Z,
            defocus_disk_u: Vec3::ZERO,
            defocus_disk_v: Vec3::ZERO,
            film_area: 1.0,
            lens_area: 0.0,
        };
        camera.initialize();
        camera
    }

    /// Set image resolution; only the aspect ratio matters for ray generation.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.image_width = width.max(1);
        self.image_height = height.max(1);
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, vfov: f32, defocus_angle: f32, focus_dist: f32) -> Self {
        self.vfov = vfov;
        self.defocus_angle = defocus_angle;
        self.focus_dist = focus_dist;
        self
    }

    /// Recompute the cached basis (must be called after the `with_*` setters).
    pub fn initialize(&mut self) {
        self.center = self.look_from;

        // Calculate viewport dimensions
        let theta = self.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h * self.focus_dist;
        let viewport_width = viewport_height * (self.image_width as f32 / self.image_height as f32);

        // Calculate camera basis vectors
        self.w = (self.look_from - self.look_at).normalize();
        self.u = self.vup.cross(self.w).normalize();
        self.v = self.w.cross(self.u);

        self.viewport_u = viewport_width * self.u;
        self.viewport_v = -viewport_height * self.v;
        self.viewport_upper_left =
            self.center - self.focus_dist * self.w - self.viewport_u / 2.0 - self.viewport_v / 2.0;
        self.film_area = viewport_width * viewport_height;

        // Calculate defocus disk basis vectors
        let defocus_radius = self.focus_dist * (self.defocus_angle / 2.0).to_radians().tan();
        self.defocus_disk_u = self.u * defocus_radius;
        self.defocus_disk_v = self.v * defocus_radius;
        self.lens_area = strata_math::PI * defocus_radius * defocus_radius;
    }

    /// Forward viewing direction.
    pub fn forward(&self) -> Vec3 {
        -self.w
    }
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera for PerspectiveCamera {
    fn generate_ray(&self, sample: &CameraSample) -> CameraRay {
        let target = self.viewport_upper_left
            + sample.film.x * self.viewport_u
            + sample.film.y * self.viewport_v;

        let (origin, pdf_pos) = if self.lens_area <= 0.0 {
            (self.center, 1.0)
        } else {
            let p = sampling::concentric_disk(sample.lens);
            (
                self.center + p.x * self.defocus_disk_u + p.y * self.defocus_disk_v,
                1.0 / self.lens_area,
            )
        };

        let direction = (target - origin).normalize();
        let normal = self.forward();
        let cos = direction.dot(normal);
        let cos3 = cos * cos * cos;
        // Importance over the film plane at the focus distance, split so the
        // ray weight is exactly one.
        let pdf_dir = 1.0 / (self.film_area * cos3);
        let importance = Spectrum::splat(pdf_pos * pdf_dir / cos);

        CameraRay {
            ray: Ray::new(origin, direction),
            normal,
            importance,
            pdf_pos,
            pdf_dir,
        }
    }
}

/// Parallel projection onto a `width × height` window.
#[derive(Debug, Clone, Copy)]
pub struct OrthographicCamera {
    center: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
    width: f32,
    height: f32,
}

impl OrthographicCamera {
    pub fn new(look_from: Vec3, look_at: Vec3, vup: Vec3, width: f32, height: f32) -> Self {
        let w = (look_from - look_at).normalize();
        let u = vup.cross(w).normalize();
        let v = w.cross(u);
        Self {
            center: look_from,
            u,
            v,
            w,
            width,
            height,
        }
    }
}

impl Camera for OrthographicCamera {
    fn generate_ray(&self, sample: &CameraSample) -> CameraRay {
        let origin = self.center
            + (sample.film.x - 0.5) * self.width * self.u
            - (sample.film.y - 0.5) * self.height * self.v;
        let area = self.width * self.height;
        CameraRay {
            ray: Ray::new(origin, -self.w),
            normal: -self.w,
            importance: Spectrum::splat(1.0 / area),
            pdf_pos: 1.0 / area,
            pdf_dir: 1.0,
        }
    }
}
