//! Service Registry Module
//!
//! Holds both halves of service discovery:
//!
//! ## Local side (providers)
//! `(interface name, version)` maps to a [`local::ServiceBinding`], a dispatch
//! table of async handler closures built once at registration time. Resolution
//! is an exact version match; re-registering the same pair replaces the old
//! binding (last write wins).
//!
//! ## Remote side (consumers)
//! An interface name maps to the list of weighted provider endpoints. With a
//! [`snapshot::SnapshotStore`] attached the whole table is persisted on every
//! registration and reloaded from disk on EVERY lookup, which is how separate
//! processes on one machine see each other. The write path is read-modify-write
//! without any cross-process locking, so concurrent registrars can overwrite
//! each other's updates; the reader simply gets whichever snapshot won.
//!
//! ## Submodules
//! - **`types`**: The weighted `Endpoint` value.
//! - **`local`**: Bindings and the registration-time dispatch table.
//! - **`remote`**: The endpoint table with optional snapshot reload/persist.
//! - **`snapshot`**: Load/save of the table file (bincode).

pub mod local;
pub mod remote;
pub mod snapshot;
pub mod types;

#[cfg(test)]
mod tests;
