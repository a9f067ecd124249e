//! Descriptor Codec
//!
//! JSON on the wire. A codec failure is fatal for that one call: it is
//! propagated as [`RpcError::Codec`] and never counted against a provider's
//! circuit breaker, since the bytes were broken before any provider saw them.

use super::types::Invocation;
use crate::error::RpcError;

pub fn encode_invocation(invocation: &Invocation) -> Result<Vec<u8>, RpcError> {
    Ok(serde_json::to_vec(invocation)?)
}

pub fn decode_invocation(bytes: &[u8]) -> Result<Invocation, RpcError> {
    Ok(serde_json::from_slice(bytes)?)
}
