//! Lightweight RPC Framework Library
//!
//! This library crate defines the building blocks of a small request/response RPC
//! framework. It serves as the foundation for the demo binaries (`provider`, `consumer`)
//! and for embedding the client or server side into other services.
//!
//! ## Architecture Modules
//! A call travels through six loosely coupled subsystems:
//!
//! - **`protocol`**: The wire contract. Defines the invocation descriptor that crosses
//!   the network and the codec that turns it into bytes and back.
//! - **`registry`**: Service discovery state. Local bindings (interface + version to an
//!   invokable dispatch table) and remote endpoint lists, optionally shared between
//!   processes through a snapshot file.
//! - **`balance`**: Endpoint selection. Random, round-robin and weighted-random
//!   strategies over the candidate list a lookup returned.
//! - **`breaker`**: Per-service circuit breakers with a count-based sliding window,
//!   half-open trial calls and deterministic fallback responses.
//! - **`client`**: The calling side. Pooled HTTP transport, the async call manager
//!   (request ids, in-flight tracking, timeout racing, callback dispatch) and the
//!   call-by-name service stub.
//! - **`server`**: The serving side. An axum endpoint that decodes descriptors,
//!   resolves the local binding and invokes it through the dispatch table.
//!
//! Cross-cutting support lives in `config` (tunables with production defaults),
//! `context` (explicit wiring of all components, no globals), `pool` (bounded task
//! pools with drain-on-shutdown) and `error` (the tagged failure taxonomy).

pub mod balance;
pub mod breaker;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod pool;
pub mod protocol;
pub mod registry;
pub mod server;
