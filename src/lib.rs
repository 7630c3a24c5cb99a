//! Live, observable simulations of two classic synchronization problems.
//!
//! - [`sleeping_ta`]: students queue on a bounded set of hallway chairs for a single TA.
//! - [`dining`]: philosophers contend for forks with retry and back-off, and can be paused.
//!
//! Each simulation runs one OS thread per actor against state guarded by a single session lock. Callers drive it
//! through a [`sim::Controller`]: start, stop, pause/resume where supported, and take consistent snapshots at any
//! time.

pub mod config;
pub mod dining;
pub mod error;
pub mod pool;
pub mod sim;
pub mod sleeping_ta;
pub mod sync;

pub use config::{DelayRange, SimulationConfig, Timing};
pub use dining::{DiningController, PhilosopherState};
pub use error::SimulationError;
pub use sim::{Lifecycle, Snapshot};
pub use sleeping_ta::{SleepingTaController, StudentState, TaState};
