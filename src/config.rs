//! Simulation parameters.
//!
//! Everything is `serde`-(de)serializable with defaults, so a config file section or a request body only needs to
//! name what it changes.

use std::time::Duration;

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};

/// Inclusive range of milliseconds a randomized delay is drawn from. `min_ms == max_ms` is a fixed delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub const fn fixed(ms: u64) -> Self {
        Self::new(ms, ms)
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> Duration {
        let ms = if self.min_ms >= self.max_ms {
            self.min_ms
        } else {
            rng.gen_range(self.min_ms..=self.max_ms)
        };
        Duration::from_millis(ms)
    }

    fn validate(&self, phase: &str) -> Result<()> {
        if self.min_ms > self.max_ms {
            return Err(SimulationError::InvalidParameters(format!(
                "{phase} delay range is inverted: {}ms > {}ms",
                self.min_ms, self.max_ms
            )));
        }
        Ok(())
    }
}

/// One delay range per wait phase. Each simulation reads only the phases it has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Student or philosopher thinking
    pub think: DelayRange,
    /// TA helping one student
    pub help: DelayRange,
    /// Student coming back later after finding every chair taken
    pub retry: DelayRange,
    /// Philosopher eating
    pub eat: DelayRange,
    /// Philosopher waiting before reaching for the forks again
    pub backoff: DelayRange,
}

impl Timing {
    pub const fn sleeping_ta() -> Self {
        Self {
            think: DelayRange::new(2_000, 5_000),
            help: DelayRange::new(1_000, 3_000),
            retry: DelayRange::new(5_000, 10_000),
            eat: DelayRange::new(1_000, 5_000),
            backoff: DelayRange::new(500, 1_500),
        }
    }

    pub const fn dining() -> Self {
        Self {
            think: DelayRange::new(1_000, 5_000),
            ..Self::sleeping_ta()
        }
    }

    /// Every phase takes exactly `ms`.
    pub const fn fixed(ms: u64) -> Self {
        let d = DelayRange::fixed(ms);
        Self {
            think: d,
            help: d,
            retry: d,
            eat: d,
            backoff: d,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.think.validate("think")?;
        self.help.validate("help")?;
        self.retry.validate("retry")?;
        self.eat.validate("eat")?;
        self.backoff.validate("backoff")
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::sleeping_ta()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Students or philosophers
    pub actor_count: usize,
    /// Waiting-room chairs. Ignored by the dining philosophers, who get one fork each.
    pub resource_count: usize,
    /// Students come back for more help after being served; otherwise they finish after one visit
    pub loop_after_served: bool,
    /// Makes every actor's delays reproducible
    pub seed: Option<u64>,
    pub timing: Timing,
}

impl SimulationConfig {
    pub fn sleeping_ta(students: usize, chairs: usize) -> Self {
        Self {
            actor_count: students,
            resource_count: chairs,
            loop_after_served: true,
            seed: None,
            timing: Timing::sleeping_ta(),
        }
    }

    pub fn dining(philosophers: usize) -> Self {
        Self {
            actor_count: philosophers,
            resource_count: philosophers,
            timing: Timing::dining(),
            ..Self::sleeping_ta(philosophers, 0)
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn once(mut self) -> Self {
        self.loop_after_served = false;
        self
    }

    /// Delay source for one actor. Seeded configs give each actor its own reproducible stream.
    pub(crate) fn rng_for(&self, actor: usize) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(actor as u64)),
            None => StdRng::from_entropy(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::sleeping_ta(5, 3)
    }
}
