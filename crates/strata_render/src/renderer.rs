//! Tiled multi-threaded rendering.
//!
//! The image is split into grid tasks (see [`crate::grid`]) that a fixed pool
//! of workers pulls from a shared queue. Every task renders into its own
//! [`FilmGrid`] and merges it into the [`Film`] when done.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use strata_math::{SpectrumExt, Vec2};

use crate::arena::ScratchArena;
use crate::camera::CameraSample;
use crate::error::{panic_message, ConfigError, ConfigResult, RenderError, RenderResult, TaskError};
use crate::film::{Film, FilmGrid};
use crate::grid::{self, GridTask, DEFAULT_TASK_GRID_SIZE};
use crate::integrator::Integrator;
use crate::reporter::ProgressReporter;
use crate::sampler::Sampler;
use crate::scene::Scene;

/// Scheduler settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Number of worker threads; zero or less uses the hardware concurrency.
    pub worker_count: i32,
    /// Edge length of a grid task in pixels.
    pub task_grid_size: i32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            worker_count: 0,
            task_grid_size: DEFAULT_TASK_GRID_SIZE,
        }
    }
}

impl RendererConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.task_grid_size <= 0 {
            return Err(ConfigError::InvalidTaskGridSize(self.task_grid_size));
        }
        Ok(())
    }

    /// Worker count with the hardware default applied.
    pub fn resolved_worker_count(&self) -> usize {
        if self.worker_count > 0 {
            self.worker_count as usize
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}

/// Outcome of one render invocation.
#[derive(Debug, Clone, Default)]
pub struct RenderReport {
    pub total_tasks: usize,
    /// Tasks merged into the film.
    pub completed_tasks: usize,
    /// The stop flag was raised before every task finished.
    pub stopped: bool,
    pub errors: Vec<TaskError>,
    pub elapsed: Duration,
}

impl RenderReport {
    /// True when every task was rendered and merged.
    pub fn is_complete(&self) -> bool {
        self.completed_tasks == self.total_tasks && self.errors.is_empty()
    }
}

/// Drives an [`Integrator`] over the whole film.
pub struct PathTracer {
    integrator: Arc<dyn Integrator>,
    sampler: Arc<dyn Sampler>,
    config: RendererConfig,
}

impl PathTracer {
    /// `sampler` is the prototype every task clones its own sampler from.
    pub fn new(
        integrator: Arc<dyn Integrator>,
        sampler: Arc<dyn Sampler>,
        config: RendererConfig,
    ) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            integrator,
            sampler,
            config,
        })
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Render the scene into `film`, blocking until every task is done.
    pub fn render(
        &self,
        scene: &Scene,
        film: &Film,
        reporter: &dyn ProgressReporter,
    ) -> RenderResult<RenderReport> {
        self.render_with_stop(scene, film, reporter, &AtomicBool::new(false))
    }

    /// Like [`PathTracer::render`], returning early once `stop` is raised.
    ///
    /// Tasks interrupted by the flag are dropped without touching the film, so
    /// the film only ever holds whole tasks.
    pub fn render_with_stop(
        &self,
        scene: &Scene,
        film: &Film,
        reporter: &dyn ProgressReporter,
        stop: &AtomicBool,
    ) -> RenderResult<RenderReport> {
        let start = Instant::now();
        let (width, height) = film.resolution();
        let tasks = grid::divide_into_tasks(width, height, self.config.task_grid_size);
        let total = tasks.len();
        let workers = self.config.resolved_worker_count().clamp(1, total.max(1));

        log::info!(
            "Rendering {}x{} image: {} tasks on {} workers ({} spp)",
            width,
            height,
            total,
            workers,
            self.sampler.samples_per_pixel()
        );
        reporter.begin();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("strata-worker-{i}"))
            .build()?;

        let (tx, rx) = crossbeam_channel::unbounded::<GridTask>();
        for task in tasks {
            // The receiver outlives this loop, so sending cannot fail.
            let _ = tx.send(task);
        }
        drop(tx);

        let completed = AtomicUsize::new(0);
        let errors = Mutex::new(Vec::new());

        pool.scope(|scope| {
            for _ in 0..workers {
                let rx = rx.clone();
                let completed = &completed;
                let errors = &errors;
                scope.spawn(move |_| {
                    let mut arena = ScratchArena::default();
                    for task in rx.iter() {
                        if stop.load(Ordering::Acquire) {
                            break;
                        }
                        let result = panic::catch_unwind(AssertUnwindSafe(|| {
                            self.render_task(&task, scene, film, &mut arena, stop)
                        }));
                        match result {
                            Ok(Some(grid)) => {
                                film.merge_grid(&grid);
                                let done = completed.fetch_add(1, Ordering::AcqRel) + 1;
                                reporter.progress(100.0 * done as f64 / total as f64);
                            }
                            Ok(None) => break,
                            Err(payload) => {
                                arena.reset();
                                let err = TaskError {
                                    task: task.index,
                                    x_begin: task.x_begin,
                                    x_end: task.x_end,
                                    y_begin: task.y_begin,
                                    y_end: task.y_end,
                                    message: panic_message(payload.as_ref()),
                                };
                                log::error!("{}", err);
                                reporter.message(&err.to_string());
                                errors
                                    .lock()
                                    .unwrap_or_else(PoisonError::into_inner)
                                    .push(err);
                            }
                        }
                    }
                });
            }
        });

        let completed_tasks = completed.into_inner();
        let errors = errors.into_inner().unwrap_or_else(PoisonError::into_inner);
        let stopped = stop.load(Ordering::Acquire) && completed_tasks + errors.len() < total;
        let elapsed = start.elapsed();

        if stopped {
            log::info!(
                "Render stopped after {}/{} tasks ({:.2?})",
                completed_tasks,
                total,
                elapsed
            );
        } else {
            log::info!(
                "Render finished: {}/{} tasks in {:.2?}",
                completed_tasks,
                total,
                elapsed
            );
        }
        if !errors.is_empty() {
            log::warn!("{} tasks failed", errors.len());
        }
        reporter.end(elapsed);

        Ok(RenderReport {
            total_tasks: total,
            completed_tasks,
            stopped,
            errors,
            elapsed,
        })
    }

    /// Start rendering on a background thread.
    pub fn render_async(
        self: &Arc<Self>,
        scene: Arc<Scene>,
        film: Arc<Film>,
        reporter: Arc<dyn ProgressReporter>,
    ) -> RenderResult<RenderHandle> {
        let stop = Arc::new(AtomicBool::new(false));
        let tracer = Arc::clone(self);
        let flag = Arc::clone(&stop);
        let thread = std::thread::Builder::new()
            .name("strata-render".to_string())
            .spawn(move || tracer.render_with_stop(&scene, &film, reporter.as_ref(), &flag))?;
        Ok(RenderHandle { stop, thread })
    }

    /// Render one task into a fresh grid. Returns `None` if stopped midway.
    fn render_task(
        &self,
        task: &GridTask,
        scene: &Scene,
        film: &Film,
        arena: &mut ScratchArena,
        stop: &AtomicBool,
    ) -> Option<FilmGrid> {
        let (width, height) = film.resolution();
        let resolution = Vec2::new(width as f32, height as f32);
        let camera = scene.camera();
        let mut grid = film.new_grid(task.x_begin, task.x_end, task.y_begin, task.y_end);
        let mut sampler = self.sampler.clone_seeded(task.seed(width));

        for y in grid.sample_y_range() {
            if stop.load(Ordering::Relaxed) {
                return None;
            }
            for x in grid.sample_x_range() {
                sampler.start_pixel(x, y);
                loop {
                    let pos = Vec2::new(x as f32, y as f32) + sampler.sample2();
                    let camera_sample = CameraSample {
                        film: pos / resolution,
                        lens: sampler.sample2(),
                    };
                    let camera_ray = camera.generate_ray(&camera_sample);
                    let weight = camera_ray.weight();
                    if !weight.is_black() {
                        let sample =
                            self.integrator
                                .eval(scene, &camera_ray.ray, sampler.as_mut(), arena.bump());
                        grid.add_sample(pos, weight * sample.radiance, &sample.gbuffer, 1.0);
                    }
                    arena.reset_if_full();
                    if !sampler.next_sample() {
                        break;
                    }
                }
                arena.reset();
            }
        }

        Some(grid)
    }
}

/// A render running on a background thread.
pub struct RenderHandle {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<RenderResult<RenderReport>>,
}

impl RenderHandle {
    /// Ask the workers to stop after their current row.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the render to finish.
    pub fn join(self) -> RenderResult<RenderReport> {
        self.thread
            .join()
            .map_err(|payload| RenderError::Aborted(panic_message(payload.as_ref())))?
    }
}
