//! The generic half of the engine: lifecycle control, sessions, snapshots and the event log.
//!
//! A concrete simulation implements [`Problem`]; [`Controller`] turns it into something that can be started,
//! stopped, observed and, for [`Pausable`] problems, paused.

pub mod log;
pub mod session;
pub mod status;

use std::{
    fmt::Debug,
    marker::PhantomData,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use serde::Serialize;
use tracing::{error, info};

use crate::{
    config::SimulationConfig,
    error::{Result, SimulationError},
};
pub use log::LogSink;
pub use session::{Session, Shared};
pub use status::{ActorStatus, Lifecycle, ResourceStatus, Snapshot, WorldView};

/// One concurrency problem: its shared world and how its actors are spawned against it.
pub trait Problem: Send + Sync + 'static {
    /// Everything the actors share, guarded by the session lock.
    type World: Send + 'static;
    type ActorState: Copy + Debug + Eq + Serialize + Send + 'static;
    type Coordinator: Copy + Debug + Eq + Serialize + Send + 'static;

    const NAME: &'static str;

    fn validate(config: &SimulationConfig) -> Result<()>;

    fn build(config: &SimulationConfig) -> Self::World;

    /// Spawns one worker per actor. On error the caller aborts the session, stopping whatever did start.
    fn spawn(session: &Arc<Session<Self::World>>, config: &SimulationConfig) -> Result<()>;

    fn observe(world: &Self::World) -> WorldView<Self::ActorState, Self::Coordinator>;

    /// Defensive consistency checks; `Err(InvariantViolation)` means the engine is broken.
    fn check(world: &Self::World) -> Result<()>;
}

/// Problems whose actors honour the pause gate at every wait point.
pub trait Pausable: Problem {}

/// Lifecycle controller for one problem: at most one live session at a time.
///
/// A stopped session is kept around so observers can still read its final snapshot, and is replaced by the next
/// `start`.
pub struct Controller<P: Problem> {
    current: Mutex<Option<Arc<Session<P::World>>>>,
    _problem: PhantomData<fn() -> P>,
}

impl<P: Problem> Controller<P> {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
            _problem: PhantomData,
        }
    }

    fn current(&self) -> Option<Arc<Session<P::World>>> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Creates a fresh session and spawns its actors. Returns as soon as they are running.
    pub fn start(&self, config: SimulationConfig) -> Result<()> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = current.as_ref() {
            if session.lock().lifecycle.is_live() {
                return Err(SimulationError::AlreadyRunning);
            }
        }
        P::validate(&config)?;
        config.timing.validate()?;

        let session = Arc::new(Session::new(P::build(&config)));
        if let Err(e) = P::spawn(&session, &config) {
            error!(problem = P::NAME, error = %e, "failed to start simulation");
            session.abort();
            return Err(e);
        }
        info!(
            problem = P::NAME,
            actors = config.actor_count,
            resources = config.resource_count,
            "simulation started"
        );
        *current = Some(session);
        Ok(())
    }

    /// Fires cancellation and returns without waiting for the actors.
    pub fn stop(&self) -> Result<()> {
        self.current()
            .ok_or(SimulationError::NotRunning)?
            .stop()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.current()
            .map_or(Lifecycle::NotStarted, |session| session.lock().lifecycle)
    }

    /// Always succeeds; before the first `start` it describes an empty, idle simulation.
    pub fn snapshot(&self) -> Snapshot<P::ActorState, P::Coordinator> {
        let Some(session) = self.current() else {
            return Snapshot::new(Lifecycle::NotStarted, WorldView::default(), Vec::new());
        };
        let shared = session.lock();
        Snapshot::new(shared.lifecycle, P::observe(&shared.world), shared.log.entries())
    }

    /// Runs the problem's consistency checks against the live state, under the session lock.
    pub fn check_invariants(&self) -> Result<()> {
        let Some(session) = self.current() else {
            return Ok(());
        };
        let shared = session.lock();
        P::check(&shared.world).map_err(|e| {
            error!(problem = P::NAME, error = %e, "consistency check failed");
            e
        })
    }

    /// Optional bounded join on the current session's actor threads. `true` once all have returned.
    pub fn wait_for_exit(&self, timeout: Duration) -> bool {
        self.current()
            .map_or(true, |session| session.wait_for_exit(timeout))
    }
}

impl<P: Pausable> Controller<P> {
    /// Closes the gate: actors block before their next transition.
    pub fn pause(&self) -> Result<()> {
        self.current()
            .ok_or(SimulationError::NotRunning)?
            .pause()
    }

    pub fn resume(&self) -> Result<()> {
        self.current()
            .ok_or(SimulationError::NotRunning)?
            .resume()
    }
}

impl<P: Problem> Default for Controller<P> {
    fn default() -> Self {
        Self::new()
    }
}
