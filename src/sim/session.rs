use std::{
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    thread,
    time::Duration,
};

use tracing::{debug, info};

use super::{log::LogSink, Lifecycle};
use crate::{
    error::{Result, SimulationError},
    sync::{CancelToken, Cancelled},
};

/// Everything guarded by the one session lock.
pub struct Shared<W> {
    pub lifecycle: Lifecycle,
    pub log: LogSink,
    pub world: W,
}

/// One complete, independent run of a simulation.
///
/// All mutable state sits behind a single lock. The pause gate is a condition variable on that same lock, so
/// pausing and every actor transition are totally ordered: once `pause` returns, no actor can change anything
/// until `resume`.
pub struct Session<W> {
    shared: Mutex<Shared<W>>,
    gate: Condvar,
    cancel: CancelToken,
    workers: Mutex<usize>,
    exited: Condvar,
}

impl<W> Session<W> {
    pub fn new(world: W) -> Self {
        Self {
            shared: Mutex::new(Shared {
                lifecycle: Lifecycle::Running,
                log: LogSink::default(),
                world,
            }),
            gate: Condvar::new(),
            cancel: CancelToken::new(),
            workers: Mutex::new(0),
            exited: Condvar::new(),
        }
    }

    /// Takes the session lock without looking at the gate. For observers, the controller, and actors tidying up
    /// after cancellation.
    pub fn lock(&self) -> MutexGuard<'_, Shared<W>> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes the session lock for an actor transition: blocks while the gate is closed and refuses once the
    /// session is cancelled.
    pub fn enter(&self) -> Result<MutexGuard<'_, Shared<W>>, Cancelled> {
        let shared = self
            .gate
            .wait_while(self.lock(), |shared| {
                shared.lifecycle == Lifecycle::Paused && !self.cancel.is_cancelled()
            })
            .unwrap_or_else(PoisonError::into_inner);
        if self.cancel.is_cancelled() || !shared.lifecycle.is_live() {
            return Err(Cancelled);
        }
        Ok(shared)
    }

    /// Waits at the gate without changing anything.
    pub fn pass_gate(&self) -> Result<(), Cancelled> {
        self.enter().map(drop)
    }

    /// Interruptible delay.
    pub fn sleep(&self, duration: Duration) -> Result<(), Cancelled> {
        self.cancel.sleep(duration)
    }

    pub fn token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn pause(&self) -> Result<()> {
        let mut shared = self.lock();
        match shared.lifecycle {
            Lifecycle::Running => {
                shared.lifecycle = Lifecycle::Paused;
                shared.log.push("simulation paused");
                info!("simulation paused");
                Ok(())
            }
            Lifecycle::Paused => Err(SimulationError::AlreadyPaused),
            Lifecycle::NotStarted | Lifecycle::Stopped => Err(SimulationError::NotRunning),
        }
    }

    pub fn resume(&self) -> Result<()> {
        let mut shared = self.lock();
        match shared.lifecycle {
            Lifecycle::Paused => {
                shared.lifecycle = Lifecycle::Running;
                shared.log.push("simulation resumed");
                info!("simulation resumed");
                self.gate.notify_all();
                Ok(())
            }
            Lifecycle::Running => Err(SimulationError::NotPaused),
            Lifecycle::NotStarted | Lifecycle::Stopped => Err(SimulationError::NotRunning),
        }
    }

    /// Marks the session stopped and fires cancellation. Does not wait for the actors.
    pub fn stop(&self) -> Result<()> {
        let mut shared = self.lock();
        if !shared.lifecycle.is_live() {
            return Err(SimulationError::NotRunning);
        }
        self.shut_down(&mut shared);
        Ok(())
    }

    /// Unconditional version of [`Session::stop`], also used to tear down a half-started session.
    pub(crate) fn abort(&self) {
        let mut shared = self.lock();
        if shared.lifecycle != Lifecycle::Stopped {
            self.shut_down(&mut shared);
        }
    }

    fn shut_down(&self, shared: &mut Shared<W>) {
        shared.lifecycle = Lifecycle::Stopped;
        shared.log.push("simulation stopped");
        shared.log.seal();
        self.cancel.cancel();
        self.gate.notify_all();
        info!("simulation stopped");
    }

    /// Number of actor threads that have not returned yet.
    pub fn live_workers(&self) -> usize {
        *self.workers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn worker_exited(&self) {
        let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
        *workers = workers.saturating_sub(1);
        self.exited.notify_all();
    }

    /// Bounded join: waits until every actor thread has returned. Returns `false` on timeout.
    pub fn wait_for_exit(&self, timeout: Duration) -> bool {
        let workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
        let (workers, _) = self
            .exited
            .wait_timeout_while(workers, timeout, |n| *n > 0)
            .unwrap_or_else(PoisonError::into_inner);
        *workers == 0
    }
}

impl<W: Send + 'static> Session<W> {
    /// Runs `work` on a new named OS thread that is counted until it returns.
    pub fn spawn_worker<F>(self: &Arc<Self>, name: impl Into<String>, work: F) -> Result<()>
    where
        F: FnOnce(&Session<W>) + Send + 'static,
    {
        let name = name.into();
        *self.workers.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        let session = self.clone();
        let spawned = thread::Builder::new().name(name.clone()).spawn(move || {
            let _exit = WorkerExit(&*session);
            work(&*session);
        });
        match spawned {
            Ok(_) => {
                debug!(worker = %name, "actor thread started");
                Ok(())
            }
            Err(e) => {
                self.worker_exited();
                Err(SimulationError::Spawn(e))
            }
        }
    }
}

/// Decrements the live-worker count when an actor thread ends, even by panic.
struct WorkerExit<'a, W>(&'a Session<W>);

impl<W> Drop for WorkerExit<'_, W> {
    fn drop(&mut self) {
        self.0.worker_exited();
    }
}
