//! Scarce shared resources the actors contend for.
//!
//! Seats are anonymous and counted, forks are individually identified. Neither blocks: a failed acquisition is an
//! expected outcome that the caller answers with its own back-off.

pub mod forks;
pub mod seats;

pub use forks::ForkTable;
pub use seats::Seats;
