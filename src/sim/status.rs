use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    NotStarted,
    Running,
    Paused,
    Stopped,
}

impl Lifecycle {
    /// Running or paused: actors exist and a further `start` is refused.
    pub fn is_live(self) -> bool {
        matches!(self, Lifecycle::Running | Lifecycle::Paused)
    }

    pub fn describe(self) -> &'static str {
        match self {
            Lifecycle::NotStarted => "idle",
            Lifecycle::Running => "running",
            Lifecycle::Paused => "paused",
            Lifecycle::Stopped => "stopped",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActorStatus<S> {
    pub id: usize,
    pub state: S,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResourceStatus {
    pub id: usize,
    pub available: bool,
}

/// What a problem exposes about its own world. The session adds lifecycle and log on top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldView<S, C> {
    pub actors: Vec<ActorStatus<S>>,
    pub resources: Vec<ResourceStatus>,
    pub queue_length: usize,
    pub available_seats: Option<usize>,
    pub coordinator: Option<C>,
}

impl<S, C> Default for WorldView<S, C> {
    fn default() -> Self {
        Self {
            actors: Vec::new(),
            resources: Vec::new(),
            queue_length: 0,
            available_seats: None,
            coordinator: None,
        }
    }
}

/// Immutable, consistent copy of one simulation at one instant.
///
/// `S` is the actor state machine, `C` the coordinator's (unit for problems without one).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot<S, C> {
    pub lifecycle: Lifecycle,
    pub is_paused: bool,
    pub message: String,
    pub coordinator: Option<C>,
    pub actors: Vec<ActorStatus<S>>,
    pub resources: Vec<ResourceStatus>,
    pub queue_length: usize,
    pub available_seats: Option<usize>,
    pub recent_log: Vec<String>,
}

impl<S, C> Snapshot<S, C> {
    pub(crate) fn new(lifecycle: Lifecycle, view: WorldView<S, C>, recent_log: Vec<String>) -> Self {
        Self {
            lifecycle,
            is_paused: lifecycle == Lifecycle::Paused,
            message: lifecycle.describe().to_string(),
            coordinator: view.coordinator,
            actors: view.actors,
            resources: view.resources,
            queue_length: view.queue_length,
            available_seats: view.available_seats,
            recent_log,
        }
    }

    pub fn state_of(&self, id: usize) -> Option<&S> {
        self.actors.iter().find(|a| a.id == id).map(|a| &a.state)
    }
}
