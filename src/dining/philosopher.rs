use rand::rngs::StdRng;
use tracing::{debug, error};

use super::{PhilosopherState, Table};
use crate::{
    config::{SimulationConfig, Timing},
    sim::Session,
    sync::Cancelled,
};

pub(super) struct PhilosopherActor {
    id: usize,
    rng: StdRng,
    timing: Timing,
}

impl PhilosopherActor {
    pub(super) fn new(id: usize, config: &SimulationConfig) -> Self {
        Self {
            id,
            rng: config.rng_for(id),
            timing: config.timing,
        }
    }

    pub(super) fn run(mut self, session: &Session<Table>) {
        if let Ok(mut table) = session.enter() {
            table.log.push(format!("philosopher {} sits down and thinks", self.id));
        }
        let _ = self.dine(session);

        let mut table = session.lock();
        let dropped = table.world.forks.release_all(self.id);
        table.world.philosophers[self.id] = PhilosopherState::Thinking;
        table.log.push(format!("philosopher {} leaves the table", self.id));
        debug!(philosopher = self.id, forks = dropped, "left the table");
    }

    /// Only ever returns through cancellation.
    fn dine(&mut self, session: &Session<Table>) -> Result<(), Cancelled> {
        loop {
            session.pass_gate()?;
            session.sleep(self.timing.think.sample(&mut self.rng))?;

            {
                let mut table = session.enter()?;
                table.world.philosophers[self.id] = PhilosopherState::Hungry;
                table.log.push(format!("philosopher {} is hungry", self.id));
            }
            while !self.pick_up_forks(session)? {
                session.sleep(self.timing.backoff.sample(&mut self.rng))?;
            }

            session.sleep(self.timing.eat.sample(&mut self.rng))?;
            self.put_down_forks(session)?;
        }
    }

    /// One attempt at the pair: left first, then right, putting the left back if the right is taken.
    fn pick_up_forks(&mut self, session: &Session<Table>) -> Result<bool, Cancelled> {
        let mut table = session.enter()?;
        let table = &mut *table;
        let id = self.id;
        let (left, right) = (table.world.forks.left_of(id), table.world.forks.right_of(id));

        if !table.world.forks.try_take(left, id) {
            table.world.philosophers[id] = PhilosopherState::WaitingForForks;
            return Ok(false);
        }
        if !table.world.forks.try_take(right, id) {
            if let Err(e) = table.world.forks.put_down(left, id) {
                error!(philosopher = id, error = %e, "could not put back left fork");
            }
            table.world.philosophers[id] = PhilosopherState::WaitingForForks;
            table.log.push(format!(
                "philosopher {id} cannot get right fork {right}, puts left fork {left} back"
            ));
            return Ok(false);
        }

        table.world.philosophers[id] = PhilosopherState::Eating;
        table.log.push(format!("philosopher {id} picks up forks {left} and {right} and eats"));
        Ok(true)
    }

    fn put_down_forks(&mut self, session: &Session<Table>) -> Result<(), Cancelled> {
        let mut table = session.enter()?;
        let id = self.id;
        let (left, right) = (table.world.forks.left_of(id), table.world.forks.right_of(id));
        for fork in [left, right] {
            if let Err(e) = table.world.forks.put_down(fork, id) {
                error!(philosopher = id, error = %e, "could not put down fork");
            }
        }
        table.world.philosophers[id] = PhilosopherState::Thinking;
        table.log.push(format!("philosopher {id} puts down forks {left} and {right} and thinks"));
        Ok(())
    }
}
