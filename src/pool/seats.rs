use std::sync::atomic::{AtomicUsize, Ordering};

/// Counted resource with a fixed capacity, e.g. waiting-room chairs.
pub struct Seats {
    total: usize,
    available: AtomicUsize,
}

impl Seats {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            available: AtomicUsize::new(total),
        }
    }

    /// Takes a seat if one is free. Never blocks.
    pub fn try_acquire(&self) -> bool {
        self.available
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    /// Gives a seat back. Returns `false` (and changes nothing) if every seat is already free.
    pub fn release(&self) -> bool {
        self.available
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < self.total).then_some(n + 1)
            })
            .is_ok()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn available(&self) -> usize {
        self.available.load(Ordering::SeqCst)
    }

    pub fn occupied(&self) -> usize {
        self.total - self.available()
    }
}

#[cfg(test)]
mod tests {
    use crate::pool::Seats;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };
    const N_THREADS: usize = 8;
    const WORK: usize = 100_000 / N_THREADS;

    #[test]
    fn sequential_works() {
        let seats = Seats::new(2);
        assert!(seats.try_acquire());
        assert!(seats.try_acquire());
        assert!(!seats.try_acquire());
        assert_eq!(seats.occupied(), 2);

        assert!(seats.release());
        assert!(seats.release());
        assert!(!seats.release()); // capped at total
        assert_eq!(seats.available(), 2);
    }

    #[test]
    fn no_seats() {
        let seats = Seats::new(0);
        assert!(!seats.try_acquire());
        assert!(!seats.release());
        assert_eq!(seats.total(), 0);
        assert_eq!(seats.occupied(), 0);
    }

    #[test]
    fn never_oversubscribed() {
        const TOTAL: usize = 3;
        let seats = Arc::new(Seats::new(TOTAL));
        let seated = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let ths = (0..N_THREADS)
            .map(|_| {
                let seats = seats.clone();
                let seated = seated.clone();
                let peak = peak.clone();
                std::thread::spawn(move || {
                    for _ in 0..WORK {
                        if seats.try_acquire() {
                            let now = seated.fetch_add(1, Ordering::SeqCst) + 1;
                            peak.fetch_max(now, Ordering::SeqCst);
                            seated.fetch_sub(1, Ordering::SeqCst);
                            assert!(seats.release());
                        }
                    }
                })
            })
            .collect::<Vec<_>>();
        ths.into_iter().for_each(|th| th.join().unwrap());
        assert!(peak.load(Ordering::SeqCst) <= TOTAL);
        assert!(peak.load(Ordering::SeqCst) >= 1);
        assert_eq!(seats.available(), TOTAL);
    }
}
