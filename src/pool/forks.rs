use crate::{error::SimulationError, sim::ResourceStatus};

/// Forks laid around a round table. Philosopher `i` owns left fork `i` and contends for right fork `(i + 1) % n`.
///
/// The table is plain data: it is only ever mutated under the session lock, together with the philosopher states
/// that depend on it.
#[derive(Debug, Clone)]
pub struct ForkTable {
    holders: Vec<Option<usize>>,
}

impl ForkTable {
    pub fn new(n: usize) -> Self {
        Self {
            holders: vec![None; n],
        }
    }

    fn len(&self) -> usize {
        self.holders.len()
    }

    pub fn left_of(&self, philosopher: usize) -> usize {
        philosopher
    }

    pub fn right_of(&self, philosopher: usize) -> usize {
        (philosopher + 1) % self.holders.len()
    }

    pub fn is_available(&self, fork: usize) -> bool {
        self.holders[fork].is_none()
    }

    pub fn holder(&self, fork: usize) -> Option<usize> {
        self.holders[fork]
    }

    pub fn try_take(&mut self, fork: usize, philosopher: usize) -> bool {
        match self.holders[fork] {
            Some(_) => false,
            None => {
                self.holders[fork] = Some(philosopher);
                true
            }
        }
    }

    pub fn put_down(&mut self, fork: usize, philosopher: usize) -> Result<(), SimulationError> {
        match self.holders[fork] {
            Some(holder) if holder == philosopher => {
                self.holders[fork] = None;
                Ok(())
            }
            other => Err(SimulationError::InvariantViolation(format!(
                "philosopher {philosopher} put down fork {fork} held by {other:?}"
            ))),
        }
    }

    /// Puts down everything `philosopher` holds, returning how many forks that was.
    pub fn release_all(&mut self, philosopher: usize) -> usize {
        self.holders
            .iter_mut()
            .filter(|holder| **holder == Some(philosopher))
            .map(|holder| *holder = None)
            .count()
    }

    pub fn held_by(&self, philosopher: usize) -> usize {
        self.holders
            .iter()
            .filter(|holder| **holder == Some(philosopher))
            .count()
    }

    pub fn statuses(&self) -> Vec<ResourceStatus> {
        self.holders
            .iter()
            .enumerate()
            .map(|(id, holder)| ResourceStatus {
                id,
                available: holder.is_none(),
            })
            .collect()
    }

    /// Every held fork is one of its holder's own two forks.
    pub fn check(&self) -> Result<(), SimulationError> {
        for (fork, holder) in self.holders.iter().enumerate() {
            if let Some(p) = *holder {
                if p >= self.len() || (fork != self.left_of(p) && fork != self.right_of(p)) {
                    return Err(SimulationError::InvariantViolation(format!(
                        "fork {fork} held by philosopher {p}, who cannot reach it"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{error::SimulationError, pool::ForkTable};

    #[test]
    fn neighbours_share_forks() {
        let table = ForkTable::new(5);
        assert_eq!(table.left_of(0), 0);
        assert_eq!(table.right_of(0), 1);
        assert_eq!(table.left_of(4), 4);
        assert_eq!(table.right_of(4), 0);
    }

    #[test]
    fn single_holder() {
        let mut table = ForkTable::new(2);
        assert!(table.try_take(1, 0));
        assert!(!table.try_take(1, 1));
        assert!(!table.try_take(1, 0));
        assert_eq!(table.holder(1), Some(0));
        assert!(!table.is_available(1));
        assert!(table.is_available(0));

        assert!(matches!(
            table.put_down(1, 1),
            Err(SimulationError::InvariantViolation(_))
        ));
        assert!(table.put_down(1, 0).is_ok());
        assert!(table.try_take(1, 1));
    }

    #[test]
    fn release_all_only_touches_own_forks() {
        let mut table = ForkTable::new(3);
        assert!(table.try_take(0, 0));
        assert!(table.try_take(1, 0));
        assert!(table.try_take(2, 2));
        assert_eq!(table.held_by(0), 2);

        assert_eq!(table.release_all(0), 2);
        assert_eq!(table.held_by(0), 0);
        assert_eq!(table.holder(2), Some(2));
        let available = table.statuses().iter().filter(|f| f.available).count();
        assert_eq!(available, 2);
    }

    #[test]
    fn check_rejects_unreachable_fork() {
        let mut table = ForkTable::new(4);
        assert!(table.try_take(3, 3));
        assert!(table.try_take(0, 3));
        assert!(table.check().is_ok());
        assert!(table.try_take(2, 0));
        assert!(table.check().is_err());
    }
}
