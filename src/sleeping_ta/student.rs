use std::sync::Arc;

use rand::rngs::StdRng;
use tracing::debug;

use super::{Office, StudentState, TaState};
use crate::{
    config::{SimulationConfig, Timing},
    sim::Session,
    sync::{Cancelled, Signal},
};

pub(super) struct StudentActor {
    id: usize,
    served: Arc<Signal>,
    rng: StdRng,
    timing: Timing,
    loop_after_served: bool,
}

impl StudentActor {
    pub(super) fn new(id: usize, served: Arc<Signal>, config: &SimulationConfig) -> Self {
        Self {
            id,
            served,
            rng: config.rng_for(id),
            timing: config.timing,
            loop_after_served: config.loop_after_served,
        }
    }

    pub(super) fn run(mut self, session: &Session<Office>) {
        match self.visit_until_done(session) {
            Ok(()) => debug!(student = self.id, "done for the day"),
            Err(Cancelled) => self.leave(session),
        }
    }

    fn visit_until_done(&mut self, session: &Session<Office>) -> Result<(), Cancelled> {
        loop {
            self.think(session)?;
            if self.seek_help(session)? {
                self.served.wait(session.token())?;
                if !self.loop_after_served {
                    let mut office = session.enter()?;
                    office.world.set_state(self.id, StudentState::Finished);
                    office.log.push(format!("student {} got help and is done", self.id));
                    return Ok(());
                }
            } else {
                session.sleep(self.timing.retry.sample(&mut self.rng))?;
            }
        }
    }

    fn think(&mut self, session: &Session<Office>) -> Result<(), Cancelled> {
        {
            let mut office = session.enter()?;
            office.world.set_state(self.id, StudentState::Thinking);
            office.log.push(format!("student {} is thinking", self.id));
        }
        session.sleep(self.timing.think.sample(&mut self.rng))
    }

    /// Returns whether the student got a chair.
    fn seek_help(&mut self, session: &Session<Office>) -> Result<bool, Cancelled> {
        {
            let mut office = session.enter()?;
            office.world.set_state(self.id, StudentState::SeekingHelp);
            office.log.push(format!("student {} needs help", self.id));
        }

        let mut office = session.enter()?;
        let office = &mut *office;
        let ta_asleep = office.world.ta == TaState::Sleeping;
        if ta_asleep && office.world.wake.set() {
            office.log.push(format!("student {} wakes the TA", self.id));
        }
        if !office.world.seats.try_acquire() {
            office.world.set_state(self.id, StudentState::Leaving);
            office.log.push(format!("student {} finds no free chair and leaves", self.id));
            return Ok(false);
        }

        office.world.queue.push_back(self.id);
        office.world.set_state(self.id, StudentState::WaitingInChair);
        if ta_asleep {
            office.world.ta = TaState::CheckingForStudents;
        }
        office.log.push(format!("student {} sits down and waits", self.id));
        Ok(true)
    }

    /// Cancelled: give up the chair if still seated, and show as leaving.
    fn leave(&self, session: &Session<Office>) {
        let mut office = session.lock();
        if office.world.abandon_chair(self.id) {
            office.log.push(format!("student {} leaves the hallway", self.id));
        }
        if office.world.students[self.id].state != StudentState::Finished {
            office.world.set_state(self.id, StudentState::Leaving);
        }
        debug!(student = self.id, "left");
    }
}
