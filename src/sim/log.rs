use std::collections::VecDeque;

use chrono::Local;

pub const LOG_CAPACITY: usize = 50;

/// Bounded ring of timestamped, human-readable events.
///
/// Lives inside the session lock, so entries are ordered consistently with the state changes they describe.
/// Once sealed (the session stopped) new entries are only traced, never stored.
#[derive(Debug, Clone)]
pub struct LogSink {
    entries: VecDeque<String>,
    capacity: usize,
    sealed: bool,
}

impl LogSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            sealed: false,
        }
    }

    pub fn push(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        if self.sealed || self.capacity == 0 {
            tracing::trace!(entry = message, "log sealed, entry dropped");
            return;
        }
        tracing::debug!("{message}");
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries
            .push_back(format!("[{}] {message}", Local::now().format("%H:%M:%S%.3f")));
    }

    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new(LOG_CAPACITY)
    }
}
