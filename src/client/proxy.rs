//! Call-By-Name Service Stub
//!
//! The caller-facing entry point. A `ServiceClient` is bound to one interface
//! name and funnels every call through the same pipeline:
//!
//! 1. mock short-circuit (when configured, nothing else runs)
//! 2. build the invocation descriptor
//! 3. discovery: resolve provider endpoints, fail fast when there are none
//! 4. circuit-breaker wrap around endpoint selection + the timed network call
//!
//! Discovery failures never reach the breaker: a service nobody provides is
//! not an unhealthy provider. Per-call state is nil; clients are cheap and
//! freely cloneable.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use super::manager::AsyncCallManager;
use crate::balance::strategy::{self, Strategy};
use crate::breaker::registry::BreakerRegistry;
use crate::error::RpcError;
use crate::protocol::types::Invocation;
use crate::registry::remote::RemoteRegistry;

#[derive(Clone)]
pub struct ServiceClient {
    interface: String,
    strategy: Strategy,
    call_timeout: Duration,
    remote_registry: Arc<RemoteRegistry>,
    breakers: Arc<BreakerRegistry>,
    calls: Arc<AsyncCallManager>,
    mock_response: Option<String>,
}

impl ServiceClient {
    pub(crate) fn new(
        interface: &str,
        strategy: Strategy,
        call_timeout: Duration,
        remote_registry: Arc<RemoteRegistry>,
        breakers: Arc<BreakerRegistry>,
        calls: Arc<AsyncCallManager>,
        mock_response: Option<String>,
    ) -> Self {
        Self {
            interface: interface.to_string(),
            strategy,
            call_timeout,
            remote_registry,
            breakers,
            calls,
            mock_response,
        }
    }

    /// Overrides the endpoint selection strategy for this stub.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Overrides how long a call may take before it is abandoned.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Invokes `method` remotely and waits for the outcome: the provider's
    /// text response, the breaker fallback, or an error.
    pub async fn call(
        &self,
        method: &str,
        parameter_types: &[&str],
        arguments: Vec<Value>,
    ) -> Result<String, RpcError> {
        if let Some(mock) = &self.mock_response {
            debug!(interface = %self.interface, method, "mock short-circuit");
            return Ok(mock.clone());
        }

        let invocation = Invocation::new(&self.interface, method, parameter_types, arguments);
        let service = invocation.service_name();

        let candidates = self.remote_registry.resolve(&self.interface);
        if candidates.is_empty() {
            warn!(interface = %self.interface, "no providers registered");
            return Err(RpcError::Discovery {
                interface: self.interface.clone(),
            });
        }

        self.breakers
            .execute_with_fallback(
                &service,
                || async {
                    let endpoint = strategy::select(&candidates, self.strategy)?;
                    self.calls
                        .call_with_timeout(endpoint, &invocation, self.call_timeout)
                        .await
                },
                || BreakerRegistry::fallback_response(&service),
            )
            .await
    }
}
