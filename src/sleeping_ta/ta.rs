use std::sync::Arc;

use rand::rngs::StdRng;
use tracing::debug;

use super::{Office, StudentState, TaState};
use crate::{
    config::{SimulationConfig, Timing},
    sim::{Session, Shared},
    sync::{Cancelled, Signal},
};

pub(super) struct TaActor {
    wake: Arc<Signal>,
    rng: StdRng,
    timing: Timing,
}

impl TaActor {
    pub(super) fn new(wake: Arc<Signal>, config: &SimulationConfig) -> Self {
        Self {
            wake,
            // one past the last student, so the TA never shares a delay stream with one
            rng: config.rng_for(config.actor_count),
            timing: config.timing,
        }
    }

    pub(super) fn run(mut self, session: &Session<Office>) {
        while self.wake.wait(session.token()).is_ok() {
            if self.serve_hallway(session).is_err() {
                break;
            }
        }

        let mut office = session.lock();
        office.world.ta = if office.world.queue.is_empty() {
            TaState::Sleeping
        } else {
            TaState::CheckingForStudents
        };
        debug!("TA went home");
    }

    /// Helps seated students until the hallway is empty.
    fn serve_hallway(&mut self, session: &Session<Office>) -> Result<(), Cancelled> {
        let mut office = session.enter()?;
        let mut next = call_next(&mut office);
        drop(office);
        while let Some((id, served)) = next {
            let helped = session.sleep(self.timing.help.sample(&mut self.rng));

            let mut office = session.lock();
            if helped.is_err() {
                stop_helping(&mut office, id, &served);
                return Err(Cancelled);
            }
            hand_back(&mut office, id, &served);
            office.log.push(format!("TA finished helping student {id}"));
            next = call_next(&mut office);
        }
        Ok(())
    }
}

/// Sends the student on their way; they would wait forever otherwise.
fn hand_back(office: &mut Shared<Office>, id: usize, served: &Signal) {
    office.world.set_state(id, StudentState::Leaving);
    served.set();
}

/// Cancelled mid-help: the student is handed back and the TA stops helping in the same step.
fn stop_helping(office: &mut Shared<Office>, id: usize, served: &Signal) {
    hand_back(office, id, served);
    office.world.ta = if office.world.queue.is_empty() {
        TaState::Sleeping
    } else {
        TaState::CheckingForStudents
    };
    office.log.push(format!("TA stops helping student {id}"));
}

/// Takes the head of the hallway queue into the office, or puts the TA back to sleep if nobody is waiting.
fn call_next(office: &mut Shared<Office>) -> Option<(usize, Arc<Signal>)> {
    let Some(id) = office.world.queue.pop_front() else {
        if office.world.ta != TaState::Sleeping {
            office.log.push("nobody is waiting, TA goes back to sleep");
        }
        office.world.ta = TaState::Sleeping;
        return None;
    };
    // the chair frees up as soon as its student walks in
    if !office.world.seats.release() {
        tracing::error!(student = id, "chair released with every chair already free");
    }
    office.world.ta = TaState::HelpingStudent;
    office.world.set_state(id, StudentState::GettingHelp);
    office.log.push(format!("TA calls in student {id}"));
    Some((id, office.world.students[id].served.clone()))
}

#[cfg(test)]
mod tests {
    use crate::{
        sim::Session,
        sleeping_ta::{
            ta::{call_next, stop_helping},
            Office, StudentState, TaState,
        },
    };

    fn seat(office: &mut Office, id: usize) {
        assert!(office.seats.try_acquire());
        office.queue.push_back(id);
        office.set_state(id, StudentState::WaitingInChair);
        office.ta = TaState::CheckingForStudents;
    }

    #[test]
    fn interrupted_help_leaves_consistent_office() {
        let session = Session::new(Office::new(3, 2));
        let mut office = session.lock();
        seat(&mut office.world, 0);
        seat(&mut office.world, 1);

        let (id, served) = call_next(&mut office).unwrap();
        assert_eq!(id, 0);
        assert_eq!(office.world.ta, TaState::HelpingStudent);
        assert!(office.world.check().is_ok());

        // someone still waits, so the TA is not asleep
        stop_helping(&mut office, id, &served);
        assert_eq!(office.world.students[0].state, StudentState::Leaving);
        assert_eq!(office.world.ta, TaState::CheckingForStudents);
        assert!(office.world.check().is_ok());
        assert!(office.log.entries().last().unwrap().ends_with("TA stops helping student 0"));

        let (id, served) = call_next(&mut office).unwrap();
        assert_eq!(id, 1);
        stop_helping(&mut office, id, &served);
        assert_eq!(office.world.ta, TaState::Sleeping);
        assert!(office.world.check().is_ok());
    }
}
