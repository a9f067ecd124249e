//! Load Balancing Module
//!
//! Picks one endpoint out of the candidate list a registry lookup returned.
//!
//! ## Strategies
//! - **Random**: uniform pick, the default.
//! - **RoundRobin**: atomic counter modulo list length. The counter is a
//!   single process-wide sequence shared by every service and caller, so
//!   interleaved calls to different services advance the same sequence.
//! - **WeightedRandom**: draw proportional to endpoint weights.
//!
//! Every strategy returns a member of the given slice and rejects an empty
//! slice with an invalid-argument error. Selection is stateless apart from
//! the round-robin counter; nothing here knows about health or breakers.

pub mod strategy;

#[cfg(test)]
mod tests;
