//! Wire Data Types
//!
//! The descriptor DTO exchanged between client and server, plus the route
//! every call is POSTed to.

use serde::{Deserialize, Serialize};

/// The single HTTP route all remote invocations go through.
pub const ENDPOINT_INVOKE: &str = "/invoke";

/// Everything a provider needs to execute one call.
///
/// Deliberately carries no service version: the serving side resolves a fixed
/// version for every remote call (see `server::dispatch`). Arguments travel as
/// JSON values and are interpreted by the bound handler; `parameter_types` is
/// the overload key that selects which handler runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Invocation {
    pub interface_name: String,
    pub method_name: String,
    pub parameter_types: Vec<String>,
    pub arguments: Vec<serde_json::Value>,
}

impl Invocation {
    pub fn new(
        interface_name: &str,
        method_name: &str,
        parameter_types: &[&str],
        arguments: Vec<serde_json::Value>,
    ) -> Self {
        Self {
            interface_name: interface_name.to_string(),
            method_name: method_name.to_string(),
            parameter_types: parameter_types.iter().map(|t| t.to_string()).collect(),
            arguments,
        }
    }

    /// Breaker / logging granularity: one service name per interface+method.
    pub fn service_name(&self) -> String {
        format!("{}.{}", self.interface_name, self.method_name)
    }
}
