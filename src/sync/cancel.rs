use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Condvar, Mutex, PoisonError,
    },
    time::Duration,
};

use super::{Cancelled, Interrupt};

#[derive(Default)]
struct Inner {
    cancelled: AtomicBool,
    sleepers: Mutex<()>,
    wake: Condvar,
    hooks: Mutex<Vec<Arc<dyn Interrupt>>>,
}

/// Cooperative, one-way cancellation flag shared by every actor of a session.
///
/// Besides the flag itself it owns an interruptible sleep, and it wakes any registered [`Interrupt`] waiters when
/// it fires.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<Inner>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.cancelled.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Fires the token. Only the first call has any effect.
    pub fn cancel(&self) {
        if self.0.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        // Sleepers test the flag under this lock, so taking it here orders us after any pending check
        drop(self.0.sleepers.lock().unwrap_or_else(PoisonError::into_inner));
        self.0.wake.notify_all();

        let hooks = std::mem::take(&mut *self.0.hooks.lock().unwrap_or_else(PoisonError::into_inner));
        for hook in hooks {
            hook.interrupt();
        }
    }

    /// Registers a waiter to be interrupted on cancellation. Interrupts immediately if already cancelled.
    pub fn register(&self, hook: Arc<dyn Interrupt>) {
        let mut hooks = self.0.hooks.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_cancelled() {
            drop(hooks);
            hook.interrupt();
        } else {
            hooks.push(hook);
        }
    }

    /// Sleeps for `duration`, returning early with `Err(Cancelled)` as soon as the token fires.
    pub fn sleep(&self, duration: Duration) -> Result<(), Cancelled> {
        let guard = self.0.sleepers.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = self
            .0
            .wake
            .wait_timeout_while(guard, duration, |_| !self.is_cancelled())
            .unwrap_or_else(PoisonError::into_inner);
        self.check()
    }
}
