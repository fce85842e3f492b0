//! External collaborators the core depends on through narrow traits rather
//! than concrete types: RNG and probability distributions are supplied by
//! the host, not owned by this crate.

pub mod distribution;
pub mod rng;

pub use distribution::{DelayDistribution, SizeDistribution};
pub use rng::RandomNumberGenerator;
