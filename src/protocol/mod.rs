//! Wire Protocol Module
//!
//! Defines what actually crosses the network between a service client and a
//! provider: the invocation descriptor, the route it is POSTed to, and the
//! codec turning descriptors into bytes and back.
//!
//! ## Contract
//! - Request: the JSON-encoded [`types::Invocation`] as the request body.
//! - Response: plain text. A success status with a non-empty body is the call
//!   result; anything else is treated as a transport failure by the caller.
//!
//! ## Submodules
//! - **`types`**: The descriptor DTO and the invoke route constant.
//! - **`codec`**: Encode/decode between descriptors and body bytes.

pub mod codec;
pub mod types;
