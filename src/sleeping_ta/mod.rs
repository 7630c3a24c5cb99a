//! Sleeping TA: a bounded waiting room in front of a single helper.
//!
//! Students think, then look for help. A student that finds the TA asleep wakes them, then tries to sit on one of
//! the hallway chairs; with no free chair the student leaves and comes back later. The TA serves seated students
//! in arrival order and goes back to sleep when the hallway is empty.
//!
//! A chair is given back the moment its student is called in, not when the help ends, so the student being helped
//! no longer counts against the waiting-room capacity.

mod student;
mod ta;

use std::{collections::VecDeque, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    config::SimulationConfig,
    error::{Result, SimulationError},
    pool::Seats,
    sim::{ActorStatus, Controller, Problem, ResourceStatus, Session, WorldView},
    sync::Signal,
};
use student::StudentActor;
use ta::TaActor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StudentState {
    Thinking,
    SeekingHelp,
    WaitingInChair,
    GettingHelp,
    Leaving,
    /// Served once with looping disabled; the student's thread has ended
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaState {
    Sleeping,
    HelpingStudent,
    /// Woken up with students in the hallway, about to call the next one in
    CheckingForStudents,
}

pub struct Student {
    pub id: usize,
    pub state: StudentState,
    served: Arc<Signal>,
}

/// The TA's office and hallway.
pub struct Office {
    pub students: Vec<Student>,
    pub ta: TaState,
    pub queue: VecDeque<usize>,
    pub seats: Seats,
    wake: Arc<Signal>,
}

impl Office {
    pub fn new(students: usize, chairs: usize) -> Self {
        Self {
            students: (0..students)
                .map(|id| Student {
                    id,
                    state: StudentState::Thinking,
                    served: Arc::new(Signal::new()),
                })
                .collect(),
            ta: TaState::Sleeping,
            queue: VecDeque::with_capacity(chairs),
            seats: Seats::new(chairs),
            wake: Arc::new(Signal::new()),
        }
    }

    fn set_state(&mut self, id: usize, state: StudentState) {
        self.students[id].state = state;
    }

    /// Gives back the chair of a student leaving the hallway without being served.
    fn abandon_chair(&mut self, id: usize) -> bool {
        let Some(pos) = self.queue.iter().position(|queued| *queued == id) else {
            return false;
        };
        self.queue.remove(pos);
        self.seats.release();
        if self.queue.is_empty() && self.ta == TaState::CheckingForStudents {
            self.ta = TaState::Sleeping;
        }
        true
    }

    pub fn check(&self) -> Result<()> {
        let violation = |msg: String| Err(SimulationError::InvariantViolation(msg));

        if self.seats.occupied() != self.queue.len() {
            return violation(format!(
                "{} chairs occupied but {} students queued",
                self.seats.occupied(),
                self.queue.len()
            ));
        }
        if self.queue.len() > self.seats.total() {
            return violation(format!(
                "{} students queued for {} chairs",
                self.queue.len(),
                self.seats.total()
            ));
        }
        if self.ta == TaState::Sleeping && !self.queue.is_empty() {
            return violation(format!("TA asleep with {} students waiting", self.queue.len()));
        }
        for (pos, id) in self.queue.iter().enumerate() {
            if self.queue.iter().skip(pos + 1).any(|other| other == id) {
                return violation(format!("student {id} queued twice"));
            }
            if self.students[*id].state != StudentState::WaitingInChair {
                return violation(format!(
                    "student {id} queued while {:?}",
                    self.students[*id].state
                ));
            }
        }
        let helped = self
            .students
            .iter()
            .filter(|s| s.state == StudentState::GettingHelp)
            .count();
        if helped > 1 || (helped == 1 && self.ta != TaState::HelpingStudent) {
            return violation(format!("{helped} students getting help while TA is {:?}", self.ta));
        }
        Ok(())
    }
}

pub struct SleepingTa;

pub type SleepingTaController = Controller<SleepingTa>;

impl Problem for SleepingTa {
    type World = Office;
    type ActorState = StudentState;
    type Coordinator = TaState;

    const NAME: &'static str = "sleeping-ta";

    fn validate(config: &SimulationConfig) -> Result<()> {
        if config.actor_count == 0 {
            return Err(SimulationError::InvalidParameters(
                "need at least one student".to_string(),
            ));
        }
        Ok(())
    }

    fn build(config: &SimulationConfig) -> Office {
        Office::new(config.actor_count, config.resource_count)
    }

    fn spawn(session: &Arc<Session<Office>>, config: &SimulationConfig) -> Result<()> {
        let (wake, served) = {
            let mut office = session.lock();
            office.log.push(format!(
                "sleeping TA simulation started: {} students, {} chairs",
                config.actor_count, config.resource_count
            ));
            let served = office
                .world
                .students
                .iter()
                .map(|s| s.served.clone())
                .collect::<Vec<_>>();
            (office.world.wake.clone(), served)
        };

        session.token().register(wake.clone());
        let ta = TaActor::new(wake, config);
        session.spawn_worker("ta", move |session| ta.run(session))?;

        for (id, served) in served.into_iter().enumerate() {
            session.token().register(served.clone());
            let student = StudentActor::new(id, served, config);
            session.spawn_worker(format!("student-{id}"), move |session| student.run(session))?;
        }
        Ok(())
    }

    fn observe(office: &Office) -> WorldView<StudentState, TaState> {
        let available = office.seats.available();
        WorldView {
            actors: office
                .students
                .iter()
                .map(|s| ActorStatus {
                    id: s.id,
                    state: s.state,
                })
                .collect(),
            resources: (0..office.seats.total())
                .map(|id| ResourceStatus {
                    id,
                    available: id < available,
                })
                .collect(),
            queue_length: office.queue.len(),
            available_seats: Some(available),
            coordinator: Some(office.ta),
        }
    }

    fn check(office: &Office) -> Result<()> {
        office.check()
    }
}
