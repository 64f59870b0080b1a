//! Error types for the light builder.

use thiserror::Error;

/// Main error type for bake operations.
///
/// Only configuration and input problems end up here; numerical trouble
/// inside the integrators is clamped locally and cancellation is reported as
/// a regular completion.
#[derive(Error, Debug)]
pub enum Error {
    /// Requested image has no pixels
    #[error("image must not be empty (got {width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    /// Tile cell has no pixels
    #[error("tile cell must not be empty (got {width}x{height})")]
    EmptyCell { width: u32, height: u32 },

    /// No worker could ever be started
    #[error("at least one worker thread is required")]
    NoWorkers,

    /// Subdivision-like setting is zero
    #[error("{0} must be at least 1")]
    InvalidSubdivisions(&'static str),

    /// Camera aperture cannot be derived
    #[error("camera f-number must be positive (got {0})")]
    InvalidFNumber(f32),

    /// Scheduler got asked to bake without a scene
    #[error("no scene has been assigned to the scheduler")]
    NoScene,

    /// Scheduler got started before `create()`
    #[error("bake has not been created yet")]
    NotCreated,

    /// Index buffer points past the vertex buffer
    #[error(
        "mesh of actor `{actor}` references vertex {index}, but has only \
         {vertex_count} vertices"
    )]
    InvalidMesh {
        actor: String,
        index: u32,
        vertex_count: usize,
    },

    /// Worker thread couldn't be spawned
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Result type alias for bake operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
