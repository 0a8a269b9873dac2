//! Core traits and types for deterministic emulation.
//!
//! Machines take their time and randomness through these seams rather than
//! reaching for the host clock or a process-wide generator. Tests substitute
//! the doubles behind the `test-utils` feature and drive both exactly.

mod clock;
mod random;

pub use clock::{Clock, WallClock};
pub use random::{RandomSource, ThreadRandom};

#[cfg(feature = "test-utils")]
pub use clock::ManualClock;
#[cfg(feature = "test-utils")]
pub use random::FixedRandom;
