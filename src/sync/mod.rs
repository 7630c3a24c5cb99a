pub mod cancel;
pub mod signal;

pub use cancel::CancelToken;
pub use signal::Signal;

/// Returned by every cancellable wait when the owning session was cancelled before or during the wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

/// Something a thread may be blocked on that must be woken when its session is cancelled.
///
/// The requirements for an implementation are
/// 1. Waiters re-check [`CancelToken::is_cancelled`] while holding the same lock they wait with.
/// 2. `interrupt()` takes that lock before notifying, so a waiter is either about to observe the flag or is
/// already parked and receives the notification. Otherwise the wakeup can be lost.
pub trait Interrupt: Send + Sync {
    fn interrupt(&self);
}
