//! Whole-pipeline renders of small scenes.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bumpalo::Bump;
use strata_render::shapes;
use strata_render::{
    BoxFilter, ConstantEnvironment, DiffuseMaterial, Film, FilterConfig, Integrator, MisConfig,
    MisPathTracer, NativeSampler, NullReporter, OrthographicCamera, PathSample, PathTracer,
    ProgressReporter, Ray, RenderSettings, RendererConfig, Sampler, Scene, SceneBuilder, Spectrum,
    Vec3,
};

const ENV: Spectrum = Spectrum::new(0.1, 0.1, 0.1);

/// Unit sphere seen from +z through a 3x3 orthographic window, lit by a
/// downward-facing quad light above the view.
fn sphere_scene() -> Scene {
    let camera = OrthographicCamera::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y, 3.0, 3.0);
    SceneBuilder::new()
        .add_mesh(
            "sphere",
            &shapes::uv_sphere(Vec3::ZERO, 1.0, 32, 16),
            Arc::new(DiffuseMaterial::new(Spectrum::splat(0.8))),
        )
        .unwrap()
        .add_area_light(
            "light",
            &shapes::quad(Vec3::new(0.0, 3.0, 0.0), Vec3::X * 0.5, Vec3::Z * 0.5),
            Spectrum::splat(10.0),
        )
        .unwrap()
        .environment(Arc::new(ConstantEnvironment::new(ENV)))
        .camera(Arc::new(camera))
        .build()
        .unwrap()
}

fn sphere_settings(workers: i32) -> RenderSettings {
    RenderSettings {
        width: 30,
        height: 30,
        spp: 1,
        seed: 5,
        integrator: MisConfig {
            min_depth: 2,
            max_depth: 2,
            ..Default::default()
        },
        renderer: RendererConfig {
            worker_count: workers,
            task_grid_size: 8,
        },
        filter: FilterConfig::Box { radius: 0.5 },
    }
}

fn render_sphere(workers: i32) -> Film {
    let settings = sphere_settings(workers);
    let film = settings.build_film().unwrap();
    let report = settings
        .build_tracer()
        .unwrap()
        .render(&sphere_scene(), &film, &NullReporter)
        .unwrap();
    assert!(report.is_complete());
    film
}

/// Distance range from the view axis covered by pixel `(x, y)` of the 30x30
/// film over `[-1.5, 1.5]²`.
fn pixel_radius_range(x: u32, y: u32) -> (f32, f32) {
    let axis = |i: u32| {
        let lo = -1.5 + 0.1 * i as f32;
        let hi = lo + 0.1;
        let near = if lo > 0.0 { lo } else if hi < 0.0 { -hi } else { 0.0 };
        (near, lo.abs().max(hi.abs()))
    };
    let (nx, fx) = axis(x);
    let (ny, fy) = axis(y);
    ((nx * nx + ny * ny).sqrt(), (fx * fx + fy * fy).sqrt())
}

#[test]
fn test_sphere_scenario() {
    let film = render_sphere(2);
    let image = film.image();

    let mut sphere_pixels = 0;
    let mut sphere_sum = 0.0;
    for y in 0..30 {
        for x in 0..30 {
            let p = image.get(x, y);
            // Silhouette pixels included
            assert!(p.is_finite(), "pixel ({x}, {y}) = {p}");
            assert!(p.min_element() >= 0.0, "pixel ({x}, {y}) = {p}");
            assert!(p.max_element() <= 10.0 * 0.8, "pixel ({x}, {y}) = {p}");

            let (near, far) = pixel_radius_range(x, y);
            if near > 1.01 {
                assert_eq!(p, ENV, "background pixel ({x}, {y})");
            } else if far < 0.9 {
                sphere_pixels += 1;
                sphere_sum += p.x;
            }
        }
    }
    assert!(sphere_pixels > 100);
    assert!(sphere_sum > 0.0);

    let gbuffer = film.gbuffer();
    assert_eq!(gbuffer.mask.get(15, 15), 1.0);
    assert_eq!(gbuffer.mask.get(0, 0), 0.0);
}

#[test]
fn test_render_is_deterministic() {
    let first = render_sphere(1).image();
    let second = render_sphere(1).image();
    assert_eq!(first, second);

    // Tasks write disjoint pixels, so the worker count does not matter.
    let parallel = render_sphere(4).image();
    assert_eq!(first, parallel);
}

#[test]
fn test_stopped_render_leaves_film_untouched() {
    let settings = sphere_settings(2);
    let film = settings.build_film().unwrap();
    let stop = AtomicBool::new(true);
    let report = settings
        .build_tracer()
        .unwrap()
        .render_with_stop(&sphere_scene(), &film, &NullReporter, &stop)
        .unwrap();

    assert!(report.stopped);
    assert!(!report.is_complete());
    assert_eq!(report.completed_tasks, 0);
    assert!(film.weights().pixels.iter().all(|&w| w == 0.0));
}

/// Returns the environment colour, except right of `x = 1` where it panics.
struct PanickyIntegrator;

impl Integrator for PanickyIntegrator {
    fn eval(&self, _scene: &Scene, ray: &Ray, _sampler: &mut dyn Sampler, _arena: &Bump) -> PathSample {
        if ray.origin.x > 1.0 {
            panic!("boom");
        }
        PathSample {
            radiance: ENV,
            ..Default::default()
        }
    }
}

#[test]
fn test_worker_panic_is_reported() {
    let camera = OrthographicCamera::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y, 4.0, 4.0);
    let scene = SceneBuilder::new().camera(Arc::new(camera)).build().unwrap();
    let film = Film::new(32, 32, Arc::new(BoxFilter::new(0.5).unwrap())).unwrap();
    let tracer = PathTracer::new(
        Arc::new(PanickyIntegrator),
        Arc::new(NativeSampler::new(1, 0).unwrap()),
        RendererConfig {
            worker_count: 2,
            task_grid_size: 8,
        },
    )
    .unwrap();

    let report = tracer.render(&scene, &film, &NullReporter).unwrap();

    assert_eq!(report.total_tasks, 16);
    assert_eq!(report.errors.len(), 4);
    assert_eq!(report.completed_tasks, 12);
    assert!(!report.stopped);
    for err in &report.errors {
        assert_eq!(err.x_begin, 24);
        assert_eq!(err.message, "boom");
    }

    // Tasks left of the failing column were still merged.
    let image = film.image();
    let weights = film.weights();
    for y in 0..32 {
        for x in 0..24 {
            assert_eq!(weights.get(x, y), 1.0);
            assert_eq!(image.get(x, y), ENV);
        }
        for x in 24..32 {
            assert_eq!(weights.get(x, y), 0.0);
        }
    }
}

/// The sphere resting on a ground plane, so paths bounce between the two.
fn sphere_on_ground_scene() -> Scene {
    let camera = OrthographicCamera::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y, 3.0, 3.0);
    SceneBuilder::new()
        .add_mesh(
            "ground",
            &shapes::quad(Vec3::NEG_Y, Vec3::X * 10.0, Vec3::NEG_Z * 10.0),
            Arc::new(DiffuseMaterial::new(Spectrum::splat(0.7))),
        )
        .unwrap()
        .add_mesh(
            "sphere",
            &shapes::uv_sphere(Vec3::ZERO, 1.0, 32, 16),
            Arc::new(DiffuseMaterial::new(Spectrum::splat(0.8))),
        )
        .unwrap()
        .add_area_light(
            "light",
            &shapes::quad(Vec3::new(0.0, 3.0, 0.0), Vec3::X * 0.5, Vec3::Z * 0.5),
            Spectrum::splat(10.0),
        )
        .unwrap()
        .environment(Arc::new(ConstantEnvironment::new(ENV)))
        .camera(Arc::new(camera))
        .build()
        .unwrap()
}

/// Mean radiance seen along a ray hitting the ground next to the sphere.
fn mean_ground_radiance(scene: &Scene, config: MisConfig, seed: u64, n: usize) -> f64 {
    let tracer = MisPathTracer::new(config).unwrap();
    let mut sampler = NativeSampler::new(1, seed).unwrap();
    let mut arena = Bump::new();
    let ray = Ray::new(Vec3::new(1.5, 4.0, 0.0), Vec3::NEG_Y);
    let mut sum = 0.0;
    for _ in 0..n {
        let sample = tracer.eval(scene, &ray, &mut sampler, &arena);
        assert!(sample.radiance.is_finite());
        sum += sample.radiance.x as f64;
        arena.reset();
    }
    sum / n as f64
}

#[test]
fn test_single_light_mode_matches_all_lights() {
    let scene = sphere_on_ground_scene();
    let all = MisConfig {
        min_depth: 3,
        max_depth: 3,
        cont_prob: 1.0,
        sample_all_lights: true,
    };
    let one = MisConfig {
        sample_all_lights: false,
        ..all
    };
    let reference = mean_ground_radiance(&scene, all, 1, 20_000);
    let estimate = mean_ground_radiance(&scene, one, 2, 20_000);
    assert!(reference > 0.0);
    assert!(
        (estimate - reference).abs() < 0.05 * reference,
        "one light {estimate}, all lights {reference}"
    );
}

#[test]
fn test_russian_roulette_is_unbiased() {
    let scene = sphere_on_ground_scene();
    let fixed = MisConfig {
        min_depth: 5,
        max_depth: 5,
        cont_prob: 1.0,
        sample_all_lights: true,
    };
    let roulette = MisConfig {
        min_depth: 1,
        cont_prob: 0.5,
        ..fixed
    };
    let reference = mean_ground_radiance(&scene, fixed, 3, 40_000);
    let estimate = mean_ground_radiance(&scene, roulette, 4, 40_000);
    assert!(
        (estimate - reference).abs() < 0.05 * reference,
        "roulette {estimate}, fixed depth {reference}"
    );
}

/// Sleeps on every sample so a render lasts long enough to be stopped.
struct SlowIntegrator;

impl Integrator for SlowIntegrator {
    fn eval(&self, _scene: &Scene, _ray: &Ray, _sampler: &mut dyn Sampler, _arena: &Bump) -> PathSample {
        std::thread::sleep(Duration::from_micros(500));
        PathSample {
            radiance: ENV,
            ..Default::default()
        }
    }
}

#[derive(Default)]
struct CountingReporter {
    updates: AtomicUsize,
}

impl ProgressReporter for CountingReporter {
    fn progress(&self, _percent: f64) {
        self.updates.fetch_add(1, Ordering::SeqCst);
    }

    fn message(&self, _msg: &str) {}
}

#[test]
fn test_stop_during_async_render() {
    let camera = OrthographicCamera::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y, 4.0, 4.0);
    let scene = Arc::new(SceneBuilder::new().camera(Arc::new(camera)).build().unwrap());
    let film = Arc::new(Film::new(32, 32, Arc::new(BoxFilter::new(0.5).unwrap())).unwrap());
    let tracer = Arc::new(
        PathTracer::new(
            Arc::new(SlowIntegrator),
            Arc::new(NativeSampler::new(1, 0).unwrap()),
            RendererConfig {
                worker_count: 1,
                task_grid_size: 8,
            },
        )
        .unwrap(),
    );
    let reporter = Arc::new(CountingReporter::default());

    let handle = tracer
        .render_async(Arc::clone(&scene), Arc::clone(&film), reporter.clone())
        .unwrap();
    let deadline = Instant::now() + Duration::from_secs(30);
    while reporter.updates.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(1));
    }
    handle.stop();
    let report = handle.join().unwrap();

    assert!(report.stopped);
    assert!(report.errors.is_empty());
    assert!(report.completed_tasks >= 1);
    assert!(report.completed_tasks < report.total_tasks);

    // Only whole tasks reach the film.
    let weights = film.weights();
    assert!(weights.pixels.iter().all(|&w| w == 0.0 || w == 1.0));
    let covered = weights.pixels.iter().filter(|&&w| w == 1.0).count();
    assert_eq!(covered, report.completed_tasks * 64);
}
