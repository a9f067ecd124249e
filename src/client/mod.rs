//! RPC Client Module
//!
//! Everything the calling side needs, layered bottom up:
//!
//! ## Layers
//! 1. **`transport`**: a pooled HTTP client that POSTs descriptor bytes to a
//!    provider and hands back the text response. Network-level errors retry
//!    with backoff and jitter; bad statuses and empty bodies do not.
//! 2. **`manager`**: the async call manager. Allocates monotonic request ids,
//!    tracks in-flight calls, races completions against the timer, and hands
//!    completion callbacks to their own pool. A timed-out call is abandoned,
//!    not cancelled; it cleans its in-flight record up when it finishes.
//! 3. **`proxy`**: the call-by-name service stub. Mock short-circuit,
//!    discovery, endpoint selection and the circuit-breaker wrap live here.
//!
//! A stub call blocks its caller (as an await) until the result, the timeout
//! or a fallback answers; the asynchrony underneath is not visible in the
//! call contract.

pub mod manager;
pub mod proxy;
pub mod transport;
