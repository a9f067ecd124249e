//! Circuit Breaker Module
//!
//! Guards every remote service (granularity: `interface.method`) with its own
//! breaker so one failing dependency cannot drag the caller down with it.
//!
//! ## State machine
//! - **Closed**: calls pass; outcomes fill a count-based sliding window. Once
//!   at least `minimum_calls` outcomes exist and the failure rate reaches the
//!   threshold, the breaker opens.
//! - **Open**: calls are rejected (the fallback answers) until
//!   `wait_duration_in_open` has elapsed, then the breaker goes half-open.
//! - **HalfOpen**: a limited budget of trial calls passes. Any failure reopens
//!   the breaker and restarts the wait; if every permitted trial succeeds the
//!   breaker closes and the window starts fresh.
//!
//! ## Submodules
//! - **`breaker`**: The per-service state machine.
//! - **`registry`**: Lazy breaker creation plus the execute wrappers that
//!   route failures into fallbacks.

pub mod breaker;
pub mod registry;
