//! RPC Server Module
//!
//! The provider-facing half: an axum endpoint that accepts descriptor bytes
//! on the invoke route and runs them through the local dispatch table.
//!
//! ## Request path
//! decode descriptor -> resolve `(interface, "1.0")` in the local registry ->
//! dispatch-table invoke -> text response. Failures map to a 500 with the
//! error's display text as the body; the caller's transport counts that as a
//! provider failure.
//!
//! Dispatch concurrency is bounded by the context's server pool, not by the
//! HTTP listener.
//!
//! ## Submodules
//! - **`dispatch`**: Decode/resolve/invoke, independent of HTTP.
//! - **`handlers`**: The axum handler, router assembly and the serve loop.

pub mod dispatch;
pub mod handlers;
