//! Failure taxonomy for the call pipeline.
//!
//! Every stage reports through [`RpcError`] so callers can tell apart the four
//! fates of a call: it never found a provider, the network lost it, the wire
//! format broke, or the server-side dispatch rejected it. Circuit breakers only
//! ever count `Transport` and `Timeout` outcomes; `Codec` failures are fatal for
//! the one call and are never treated as a provider being unhealthy.
//!
//! All variants are `Clone` because a single completion may be delivered twice:
//! once through the caller's handle and once to a registered callback.

use std::time::Duration;

/// Server-side dispatch failures, tagged by cause.
///
/// The HTTP surface still flattens these to a 500 plus display text, but
/// in-process callers (and logs) keep the structured cause.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("no service bound for '{interface}' version '{version}'")]
    UnresolvedBinding { interface: String, version: String },

    #[error("unknown method '{method}' on '{interface}'")]
    UnknownMethod { interface: String, method: String },

    #[error("no overload of '{interface}.{method}' accepts parameter types {supplied:?}")]
    SignatureMismatch {
        interface: String,
        method: String,
        supplied: Vec<String>,
    },

    #[error("handler for '{interface}.{method}' failed: {reason}")]
    HandlerFailed {
        interface: String,
        method: String,
        reason: String,
    },
}

/// The error type every public operation of the framework returns.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RpcError {
    /// Discovery found no provider endpoints. Raised before any network or
    /// breaker involvement; the call fails fast.
    #[error("no available providers for '{interface}'")]
    Discovery { interface: String },

    /// The request left the process but no usable response came back:
    /// connect/read errors, non-success status codes or an empty body.
    #[error("transport failure for {endpoint}: {reason}")]
    Transport { endpoint: String, reason: String },

    /// The timer won the race against the in-flight call. The abandoned call
    /// keeps running in the background and cleans up after itself.
    #[error("call timed out after {elapsed:?}")]
    Timeout { elapsed: Duration },

    /// Encoding or decoding the invocation descriptor failed.
    #[error("codec failure: {reason}")]
    Codec { reason: String },

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The breaker rejected the call and no fallback was supplied.
    #[error("circuit breaker open for '{service}'")]
    CircuitOpen { service: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Framework plumbing failed (dropped handles, pools already shut down).
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for RpcError {
    fn from(err: serde_json::Error) -> Self {
        RpcError::Codec {
            reason: err.to_string(),
        }
    }
}
