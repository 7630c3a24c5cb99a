//! Dining philosophers with retry and back-off.
//!
//! A hungry philosopher picks up the left fork, then tries the right one. If the right fork is taken the left one
//! goes straight back on the table and the philosopher waits a random while before trying the pair again. Nobody
//! ever holds one fork while waiting for the other, so the table cannot deadlock; an unlucky philosopher can still
//! starve.

mod philosopher;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    config::SimulationConfig,
    error::{Result, SimulationError},
    pool::ForkTable,
    sim::{ActorStatus, Controller, Pausable, Problem, Session, WorldView},
};
use philosopher::PhilosopherActor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhilosopherState {
    Thinking,
    Hungry,
    WaitingForForks,
    Eating,
}

pub struct Table {
    pub philosophers: Vec<PhilosopherState>,
    pub forks: ForkTable,
}

impl Table {
    pub fn new(n: usize) -> Self {
        Self {
            philosophers: vec![PhilosopherState::Thinking; n],
            forks: ForkTable::new(n),
        }
    }

    /// Forks are picked up and put down in the same critical section as the state change, so an eating
    /// philosopher holds exactly two forks and everybody else holds none.
    pub fn check(&self) -> Result<()> {
        self.forks.check()?;
        for (id, state) in self.philosophers.iter().enumerate() {
            let held = self.forks.held_by(id);
            let expected = if *state == PhilosopherState::Eating { 2 } else { 0 };
            if held != expected {
                return Err(SimulationError::InvariantViolation(format!(
                    "philosopher {id} is {state:?} holding {held} forks"
                )));
            }
        }
        Ok(())
    }
}

pub struct DiningPhilosophers;

pub type DiningController = Controller<DiningPhilosophers>;

impl Problem for DiningPhilosophers {
    type World = Table;
    type ActorState = PhilosopherState;
    type Coordinator = ();

    const NAME: &'static str = "dining-philosophers";

    fn validate(config: &SimulationConfig) -> Result<()> {
        if config.actor_count < 2 {
            return Err(SimulationError::InvalidParameters(format!(
                "need at least two philosophers, got {}",
                config.actor_count
            )));
        }
        Ok(())
    }

    fn build(config: &SimulationConfig) -> Table {
        Table::new(config.actor_count)
    }

    fn spawn(session: &Arc<Session<Table>>, config: &SimulationConfig) -> Result<()> {
        session.lock().log.push(format!(
            "dining philosophers started: {n} philosophers, {n} forks",
            n = config.actor_count
        ));
        for id in 0..config.actor_count {
            let philosopher = PhilosopherActor::new(id, config);
            session.spawn_worker(format!("philosopher-{id}"), move |session| {
                philosopher.run(session)
            })?;
        }
        Ok(())
    }

    fn observe(table: &Table) -> WorldView<PhilosopherState, ()> {
        WorldView {
            actors: table
                .philosophers
                .iter()
                .enumerate()
                .map(|(id, state)| ActorStatus { id, state: *state })
                .collect(),
            resources: table.forks.statuses(),
            ..WorldView::default()
        }
    }

    fn check(table: &Table) -> Result<()> {
        table.check()
    }
}

impl Pausable for DiningPhilosophers {}

#[cfg(test)]
mod tests {
    use crate::{
        config::{DelayRange, SimulationConfig, Timing},
        dining::{DiningController, PhilosopherState, Table},
        error::SimulationError,
        sim::Lifecycle,
    };
    use std::time::{Duration, Instant};

    fn fixed_timing() -> Timing {
        Timing {
            think: DelayRange::fixed(30),
            eat: DelayRange::fixed(30),
            backoff: DelayRange::fixed(10),
            ..Timing::fixed(10)
        }
    }

    #[test]
    fn table_invariants() {
        let mut table = Table::new(3);
        assert!(table.check().is_ok());

        assert!(table.forks.try_take(0, 0));
        // holding a fork without eating
        assert!(table.check().is_err());
        assert!(table.forks.try_take(1, 0));
        table.philosophers[0] = PhilosopherState::Eating;
        assert!(table.check().is_ok());

        table.philosophers[0] = PhilosopherState::Thinking;
        assert_eq!(table.forks.release_all(0), 2);
        assert!(table.check().is_ok());
    }

    #[test]
    fn needs_two_philosophers() {
        let ctl = DiningController::new();
        for n in [0, 1] {
            assert!(matches!(
                ctl.start(SimulationConfig::dining(n)),
                Err(SimulationError::InvalidParameters(_))
            ));
        }
        assert_eq!(ctl.lifecycle(), Lifecycle::NotStarted);
        assert!(matches!(ctl.pause(), Err(SimulationError::NotRunning)));
        assert!(matches!(ctl.resume(), Err(SimulationError::NotRunning)));
    }

    #[test]
    fn inverted_delay_range_is_rejected() {
        let ctl = DiningController::new();
        let timing = Timing {
            eat: DelayRange::new(50, 10),
            ..fixed_timing()
        };
        assert!(matches!(
            ctl.start(SimulationConfig::dining(3).with_timing(timing)),
            Err(SimulationError::InvalidParameters(_))
        ));
        assert_eq!(ctl.lifecycle(), Lifecycle::NotStarted);
        assert!(ctl.snapshot().actors.is_empty());
        assert!(ctl.wait_for_exit(Duration::from_millis(10)));
    }

    #[test]
    fn two_philosophers_both_eat() {
        let ctl = DiningController::new();
        ctl.start(SimulationConfig::dining(2).with_timing(fixed_timing()))
            .unwrap();

        let mut ate = [false; 2];
        let deadline = Instant::now() + Duration::from_millis(600);
        while Instant::now() < deadline {
            let snap = ctl.snapshot();
            assert_eq!(snap.resources.len(), 2);
            // with two philosophers both forks are shared, so at most one of them eats
            let eating = snap
                .actors
                .iter()
                .filter(|a| a.state == PhilosopherState::Eating)
                .inspect(|a| ate[a.id] = true)
                .count();
            assert!(eating <= 1);
            if eating == 1 {
                assert!(snap.resources.iter().all(|f| !f.available));
            }
            ctl.check_invariants().unwrap();
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(ate, [true, true]);

        ctl.stop().unwrap();
        assert!(ctl.wait_for_exit(Duration::from_secs(5)));
    }

    #[test]
    fn neighbours_never_eat_together() {
        let ctl = DiningController::new();
        let timing = Timing {
            think: DelayRange::new(1, 10),
            eat: DelayRange::new(1, 10),
            backoff: DelayRange::new(1, 5),
            ..Timing::fixed(1)
        };
        ctl.start(SimulationConfig::dining(5).with_timing(timing).with_seed(9))
            .unwrap();

        let deadline = Instant::now() + Duration::from_millis(400);
        while Instant::now() < deadline {
            let snap = ctl.snapshot();
            let eating = |i: usize| snap.actors[i % 5].state == PhilosopherState::Eating;
            assert!((0..5).all(|i| !(eating(i) && eating(i + 1))));
            ctl.check_invariants().unwrap();
            std::thread::sleep(Duration::from_micros(200));
        }
        ctl.stop().unwrap();
        assert!(ctl.wait_for_exit(Duration::from_secs(5)));
    }

    #[test]
    fn pause_freezes_everything() {
        let ctl = DiningController::new();
        let timing = Timing {
            think: DelayRange::fixed(20),
            eat: DelayRange::fixed(20),
            backoff: DelayRange::fixed(10),
            ..Timing::fixed(10)
        };
        ctl.start(SimulationConfig::dining(3).with_timing(timing))
            .unwrap();
        std::thread::sleep(Duration::from_millis(100));

        ctl.pause().unwrap();
        assert!(matches!(ctl.pause(), Err(SimulationError::AlreadyPaused)));
        let before = ctl.snapshot();
        std::thread::sleep(Duration::from_millis(150));
        let after = ctl.snapshot();
        assert!(before.is_paused);
        assert_eq!(before.lifecycle, Lifecycle::Paused);
        assert_eq!(before, after);

        ctl.resume().unwrap();
        assert!(matches!(ctl.resume(), Err(SimulationError::NotPaused)));
        let deadline = Instant::now() + Duration::from_secs(2);
        let mut moved = false;
        while Instant::now() < deadline && !moved {
            std::thread::sleep(Duration::from_millis(10));
            let resumed = ctl.snapshot();
            assert!(!resumed.is_paused);
            moved = resumed.actors != after.actors;
        }
        assert!(moved);

        ctl.stop().unwrap();
        assert!(ctl.wait_for_exit(Duration::from_secs(5)));
    }

    #[test]
    fn back_to_back_snapshots_match() {
        let ctl = DiningController::new();
        ctl.start(SimulationConfig::dining(4).with_timing(fixed_timing()))
            .unwrap();
        std::thread::sleep(Duration::from_millis(50));
        ctl.pause().unwrap();
        assert_eq!(ctl.snapshot(), ctl.snapshot());
        ctl.stop().unwrap();
        assert!(ctl.wait_for_exit(Duration::from_secs(5)));
    }

    #[test]
    fn stop_is_prompt_and_final() {
        let ctl = DiningController::new();
        let timing = Timing {
            think: DelayRange::fixed(5),
            eat: DelayRange::fixed(60_000),
            backoff: DelayRange::fixed(60_000),
            ..Timing::fixed(60_000)
        };
        ctl.start(SimulationConfig::dining(5).with_timing(timing))
            .unwrap();
        std::thread::sleep(Duration::from_millis(100));
        assert!(ctl
            .snapshot()
            .actors
            .iter()
            .any(|a| a.state == PhilosopherState::Eating));

        let stopped = Instant::now();
        ctl.stop().unwrap();
        assert!(stopped.elapsed() < Duration::from_secs(1));
        assert!(ctl.wait_for_exit(Duration::from_secs(5)));

        let first = ctl.snapshot();
        std::thread::sleep(Duration::from_millis(100));
        let second = ctl.snapshot();
        assert_eq!(first.lifecycle, Lifecycle::Stopped);
        assert_eq!(first.recent_log, second.recent_log);
        assert!(first.recent_log.last().unwrap().ends_with("simulation stopped"));

        // everyone put their forks down on the way out
        assert!(second.resources.iter().all(|f| f.available));
        assert!(second
            .actors
            .iter()
            .all(|a| a.state == PhilosopherState::Thinking));
        assert!(ctl.check_invariants().is_ok());
    }

    #[test]
    fn stop_while_paused() {
        let ctl = DiningController::new();
        ctl.start(SimulationConfig::dining(3).with_timing(fixed_timing()))
            .unwrap();
        std::thread::sleep(Duration::from_millis(50));
        ctl.pause().unwrap();
        ctl.stop().unwrap();
        assert!(ctl.wait_for_exit(Duration::from_secs(5)));
        assert!(matches!(ctl.resume(), Err(SimulationError::NotRunning)));
        assert_eq!(ctl.snapshot().lifecycle, Lifecycle::Stopped);
    }
}
