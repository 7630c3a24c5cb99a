use std::io;
use thiserror::Error;

/// Errors returned synchronously by the lifecycle operations.
///
/// Running out of seats or forks is never an error: actors handle that with their own retry logic.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("simulation is already running")]
    AlreadyRunning,

    #[error("simulation is not running")]
    NotRunning,

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("simulation is already paused")]
    AlreadyPaused,

    #[error("simulation is not paused")]
    NotPaused,

    /// A defensive check failed. Never expected in correct operation.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// The OS refused to create an actor thread.
    #[error("failed to spawn actor thread: {0}")]
    Spawn(#[from] io::Error),
}

pub type Result<T, E = SimulationError> = std::result::Result<T, E>;
