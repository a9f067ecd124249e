//! Remote Endpoint Table
//!
//! Consumer-side discovery: which endpoints currently provide an interface.
//! Runs in two modes:
//!
//! - **In-process** (no store): a plain concurrent table, for tests and for
//!   deployments where registration and calling happen in one process.
//! - **Shared snapshot**: every lookup reloads the table from the snapshot
//!   file first, so registrations made by other processes become visible
//!   without any push mechanism. The in-process view is therefore never
//!   authoritative between lookups, and registration persists by rewriting
//!   the whole table (read-modify-write, last writer wins across processes).

use dashmap::DashMap;
use std::collections::HashMap;
use tracing::{debug, info};

use super::snapshot::SnapshotStore;
use super::types::Endpoint;

pub struct RemoteRegistry {
    table: DashMap<String, Vec<Endpoint>>,
    store: Option<SnapshotStore>,
}

impl RemoteRegistry {
    /// Table without persistence; visible to this process only.
    pub fn in_process() -> Self {
        Self {
            table: DashMap::new(),
            store: None,
        }
    }

    /// Table backed by a shared snapshot file.
    pub fn with_store(store: SnapshotStore) -> Self {
        Self {
            table: DashMap::new(),
            store: Some(store),
        }
    }

    /// Appends an endpoint to the interface's provider list and, when a store
    /// is attached, persists the whole table.
    pub fn register(&self, interface: &str, endpoint: Endpoint) {
        info!(
            interface,
            endpoint = %endpoint,
            weight = endpoint.weight(),
            "registered remote endpoint"
        );
        self.table
            .entry(interface.to_string())
            .or_default()
            .push(endpoint);
        if let Some(store) = &self.store {
            store.save(&self.export());
        }
    }

    /// Returns the current provider list for `interface`; empty when unknown.
    ///
    /// With a store attached the table is reloaded from disk first, every
    /// single lookup. No caching layer sits in between.
    pub fn resolve(&self, interface: &str) -> Vec<Endpoint> {
        if let Some(store) = &self.store {
            let loaded = store.load();
            debug!(
                interface,
                interfaces = loaded.len(),
                "reloaded registry snapshot"
            );
            self.table.clear();
            for (key, endpoints) in loaded {
                self.table.insert(key, endpoints);
            }
        }
        self.table
            .get(interface)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Interfaces currently known to this process's view of the table.
    pub fn interfaces(&self) -> Vec<String> {
        self.table.iter().map(|entry| entry.key().clone()).collect()
    }

    fn export(&self) -> HashMap<String, Vec<Endpoint>> {
        self.table
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}
