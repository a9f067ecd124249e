//! Endpoint Selection Strategies

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::RpcError;
use crate::registry::types::Endpoint;

/// One sequence for the whole process: every service and caller advances the
/// same counter.
static ROUND_ROBIN_SEQ: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Strategy {
    #[default]
    Random,
    RoundRobin,
    WeightedRandom,
}

/// Applies `strategy` to the candidate list.
pub fn select(endpoints: &[Endpoint], strategy: Strategy) -> Result<&Endpoint, RpcError> {
    match strategy {
        Strategy::Random => random(endpoints),
        Strategy::RoundRobin => round_robin(endpoints),
        Strategy::WeightedRandom => weighted_random(endpoints),
    }
}

/// Uniform pick across the candidates.
pub fn random(endpoints: &[Endpoint]) -> Result<&Endpoint, RpcError> {
    ensure_candidates(endpoints)?;
    let index = rand::thread_rng().gen_range(0..endpoints.len());
    Ok(&endpoints[index])
}

/// Next endpoint in the shared process-wide sequence.
pub fn round_robin(endpoints: &[Endpoint]) -> Result<&Endpoint, RpcError> {
    ensure_candidates(endpoints)?;
    let sequence = ROUND_ROBIN_SEQ.fetch_add(1, Ordering::Relaxed);
    Ok(&endpoints[sequence % endpoints.len()])
}

/// Draw proportional to weights: an endpoint with weight 4 is picked four
/// times as often as one with weight 1.
pub fn weighted_random(endpoints: &[Endpoint]) -> Result<&Endpoint, RpcError> {
    ensure_candidates(endpoints)?;

    let total: u64 = endpoints.iter().map(|e| u64::from(e.weight())).sum();
    if total == 0 {
        return random(endpoints);
    }

    let draw = rand::thread_rng().gen_range(0..total);
    let mut cumulative = 0u64;
    for endpoint in endpoints {
        cumulative += u64::from(endpoint.weight());
        if draw < cumulative {
            return Ok(endpoint);
        }
    }
    // Boundary fallback; the loop covers [0, total) so this is the last slot.
    Ok(&endpoints[endpoints.len() - 1])
}

/// Resets the shared round-robin sequence. Lets tests (and operators poking
/// at a live process) start the cycle from index zero again.
pub fn reset_round_robin() {
    ROUND_ROBIN_SEQ.store(0, Ordering::SeqCst);
}

fn ensure_candidates(endpoints: &[Endpoint]) -> Result<(), RpcError> {
    if endpoints.is_empty() {
        return Err(RpcError::InvalidArgument(
            "endpoint candidate list is empty".to_string(),
        ));
    }
    Ok(())
}
