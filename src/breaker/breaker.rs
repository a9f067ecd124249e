//! Per-Service Breaker State Machine
//!
//! One `CircuitBreaker` instance per service name. All bookkeeping sits
//! behind a single mutex; the guarded sections only touch counters and an
//! instant, never user code, so contention stays negligible. The wrapped
//! operation itself always runs outside the lock.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use tracing::{info, warn};

use crate::config::BreakerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerStatus {
    Closed,
    Open,
    HalfOpen,
}

struct BreakerState {
    status: BreakerStatus,
    /// Most recent call outcomes, `true` = success. Oldest evicted beyond
    /// the configured window size.
    window: VecDeque<bool>,
    opened_at: Option<Instant>,
    /// Trial permits left to hand out while half-open.
    half_open_budget: u32,
    half_open_successes: u32,
}

pub struct CircuitBreaker {
    service: String,
    config: BreakerConfig,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(service: &str, config: BreakerConfig) -> Self {
        Self {
            service: service.to_string(),
            config,
            state: Mutex::new(BreakerState {
                status: BreakerStatus::Closed,
                window: VecDeque::new(),
                opened_at: None,
                half_open_budget: 0,
                half_open_successes: 0,
            }),
        }
    }

    /// Asks for permission to place one call.
    ///
    /// An open breaker whose wait has elapsed flips to half-open here and the
    /// asking call becomes the first trial.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.lock();
        match state.status {
            BreakerStatus::Closed => true,
            BreakerStatus::Open => {
                let waited_long_enough = state
                    .opened_at
                    .map(|at| at.elapsed() >= self.config.wait_duration_in_open)
                    .unwrap_or(true);
                if !waited_long_enough {
                    return false;
                }
                state.status = BreakerStatus::HalfOpen;
                state.half_open_budget = self.config.permitted_half_open_calls;
                state.half_open_successes = 0;
                info!(
                    service = %self.service,
                    trials = self.config.permitted_half_open_calls,
                    "circuit breaker half-open, admitting trials"
                );
                state.half_open_budget -= 1;
                true
            }
            BreakerStatus::HalfOpen => {
                if state.half_open_budget == 0 {
                    return false;
                }
                state.half_open_budget -= 1;
                true
            }
        }
    }

    pub fn record_success(&self) {
        let mut state = self.lock();
        match state.status {
            BreakerStatus::Closed => {
                Self::push_outcome(&mut state, self.config.sliding_window_size, true);
                self.evaluate_window(&mut state);
            }
            BreakerStatus::HalfOpen => {
                state.half_open_successes += 1;
                if state.half_open_successes >= self.config.permitted_half_open_calls {
                    state.status = BreakerStatus::Closed;
                    state.window.clear();
                    state.opened_at = None;
                    info!(service = %self.service, "circuit breaker closed");
                }
            }
            // A call admitted before the trip finished late; its outcome no
            // longer matters.
            BreakerStatus::Open => {}
        }
    }

    pub fn record_failure(&self) {
        let mut state = self.lock();
        match state.status {
            BreakerStatus::Closed => {
                Self::push_outcome(&mut state, self.config.sliding_window_size, false);
                self.evaluate_window(&mut state);
            }
            BreakerStatus::HalfOpen => {
                state.status = BreakerStatus::Open;
                state.opened_at = Some(Instant::now());
                warn!(service = %self.service, "trial call failed, circuit breaker reopened");
            }
            BreakerStatus::Open => {}
        }
    }

    /// Hands back a permission from [`try_acquire`](Self::try_acquire) whose
    /// call never produced an outcome, such as a request that failed to
    /// encode before anything was sent. Only the half-open budget tracks
    /// permits, so elsewhere this is a no-op.
    pub fn release(&self) {
        let mut state = self.lock();
        if state.status == BreakerStatus::HalfOpen {
            state.half_open_budget =
                (state.half_open_budget + 1).min(self.config.permitted_half_open_calls);
        }
    }

    pub fn status(&self) -> BreakerStatus {
        self.lock().status
    }

    /// Outcomes currently in the sliding window.
    pub fn recorded_calls(&self) -> usize {
        self.lock().window.len()
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Trips the breaker once the window holds `minimum_calls` outcomes and
    /// the failure rate is at or over the threshold. Runs after every
    /// recorded outcome while closed; a success can be the call that pushes
    /// the window past `minimum_calls` with the rate already too high.
    fn evaluate_window(&self, state: &mut BreakerState) {
        if state.window.len() < self.config.minimum_calls {
            return;
        }
        let rate = Self::failure_rate(&state.window);
        if rate >= self.config.failure_rate_threshold {
            state.status = BreakerStatus::Open;
            state.opened_at = Some(Instant::now());
            warn!(
                service = %self.service,
                failure_rate = rate,
                "circuit breaker opened"
            );
        }
    }

    fn push_outcome(state: &mut BreakerState, window_size: usize, success: bool) {
        state.window.push_back(success);
        while state.window.len() > window_size {
            state.window.pop_front();
        }
    }

    fn failure_rate(window: &VecDeque<bool>) -> f32 {
        if window.is_empty() {
            return 0.0;
        }
        let failures = window.iter().filter(|ok| !**ok).count();
        failures as f32 / window.len() as f32 * 100.0
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        // Recover from poisoning; the guarded state is only counters.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
