//! Error types for render setup and execution.

use thiserror::Error;

/// Invalid render configuration. Raised before any work is scheduled.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid min depth value: {0} (must be at least 1)")]
    InvalidMinDepth(i32),

    #[error("invalid max depth value: {max} (must be at least min depth {min})")]
    InvalidMaxDepth { min: i32, max: i32 },

    #[error("invalid continue prob value: {0} (must be in (0, 1])")]
    InvalidContProb(f32),

    #[error("invalid task grid size value: {0} (must be positive)")]
    InvalidTaskGridSize(i32),

    #[error("invalid samples per pixel value: {0} (must be positive)")]
    InvalidSamplesPerPixel(i32),

    #[error("invalid film resolution: {width}x{height}")]
    InvalidFilmSize { width: u32, height: u32 },

    #[error("invalid filter radius value: {0}")]
    InvalidFilterRadius(f32),

    #[error("invalid filter alpha value: {0} (must be positive)")]
    InvalidFilterAlpha(f32),

    #[error("failed to parse render settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Scene assembly error.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("mesh '{0}' has no non-degenerate triangles")]
    EmptyMesh(String),

    #[error("emissive mesh '{0}' has zero surface area")]
    ZeroAreaLight(String),

    #[error("scene has no camera")]
    MissingCamera,
}

/// Failure of the render invocation as a whole.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to spawn render thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("render thread panicked: {0}")]
    Aborted(String),
}

/// A grid task that panicked. Collected into the render report.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("task {task} ({x_begin}..{x_end}, {y_begin}..{y_end}) failed: {message}")]
pub struct TaskError {
    pub task: usize,
    pub x_begin: i32,
    pub x_end: i32,
    pub y_begin: i32,
    pub y_end: i32,
    pub message: String,
}

pub type ConfigResult<T> = Result<T, ConfigError>;
pub type SceneResult<T> = Result<T, SceneError>;
pub type RenderResult<T> = Result<T, RenderError>;

/// Extract a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
