use std::sync::{Condvar, Mutex, PoisonError};

use super::{CancelToken, Cancelled, Interrupt};

/// Single-slot wake-up signal.
///
/// Setting a pending signal again is a no-op, and a successful [`Signal::wait`] consumes it. It is used both as
/// the coordinator's "someone needs me" flag and as each student's private "you have been served" rendezvous.
#[derive(Default)]
pub struct Signal {
    pending: Mutex<bool>,
    cond: Condvar,
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the signal was already pending.
    pub fn set(&self) -> bool {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if *pending {
            return false;
        }
        *pending = true;
        self.cond.notify_all();
        true
    }

    #[cfg(test)]
    fn is_set(&self) -> bool {
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks until the signal is set, then consumes it.
    ///
    /// A signal that is already pending wins over cancellation, so a waiter that was served just before a stop
    /// still sees `Ok`.
    pub fn wait(&self, token: &CancelToken) -> Result<(), Cancelled> {
        let guard = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let mut pending = self
            .cond
            .wait_while(guard, |pending| !*pending && !token.is_cancelled())
            .unwrap_or_else(PoisonError::into_inner);
        if *pending {
            *pending = false;
            Ok(())
        } else {
            Err(Cancelled)
        }
    }
}

impl Interrupt for Signal {
    fn interrupt(&self) {
        let _pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        self.cond.notify_all();
    }
}
