//! Registry Data Types

use serde::{Deserialize, Serialize};

/// A provider address with a load-balancing weight.
///
/// The weight never drops below 1, on construction or mutation, so the
/// weighted-random strategy always has a positive total to draw from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
    weight: u32,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            weight: 1,
        }
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.set_weight(weight);
        self
    }

    pub fn set_weight(&mut self, weight: u32) {
        self.weight = weight.max(1);
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// `host:port`, the form logs and transport URLs use.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
