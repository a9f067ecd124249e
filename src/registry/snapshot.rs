//! Registry Snapshot Store
//!
//! Load/save of the whole remote endpoint table to one file, bincode-encoded.
//! This is the only persistence the framework does. Failures never surface to
//! callers: a missing or unreadable snapshot just reads as an empty table,
//! because discovery must keep working while the file is being (re)written by
//! someone else.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{debug, warn};

use super::types::Endpoint;

pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn load(&self) -> HashMap<String, Vec<Endpoint>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no registry snapshot yet");
                return HashMap::new();
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to read registry snapshot");
                return HashMap::new();
            }
        };

        match bincode::deserialize(&bytes) {
            Ok(table) => table,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "registry snapshot is corrupt, treating as empty");
                HashMap::new()
            }
        }
    }

    pub fn save(&self, table: &HashMap<String, Vec<Endpoint>>) {
        let bytes = match bincode::serialize(table) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(error = %err, "failed to encode registry snapshot");
                return;
            }
        };
        if let Err(err) = std::fs::write(&self.path, bytes) {
            warn!(path = %self.path.display(), error = %err, "failed to write registry snapshot");
        }
    }
}
