//! Breaker Registry and Execute Wrappers
//!
//! Creates one breaker per service name on first use and wraps async
//! operations with the acquire/record protocol. Callers never talk to a
//! breaker directly; they run their operation through `execute` or
//! `execute_with_fallback`.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use super::breaker::{BreakerStatus, CircuitBreaker};
use crate::config::BreakerConfig;
use crate::error::RpcError;

pub struct BreakerRegistry {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    config: BreakerConfig,
}

impl BreakerRegistry {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            breakers: DashMap::new(),
            config,
        }
    }

    /// The breaker for `service`, created lazily with the shared config.
    pub fn breaker(&self, service: &str) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(service.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(service, self.config.clone())))
            .clone()
    }

    /// Runs `operation` under the breaker; degraded paths answer with
    /// `fallback` instead of an error.
    ///
    /// The fallback covers both rejection (breaker open) and the operation's
    /// own failure. Codec failures are the exception: broken bytes say
    /// nothing about provider health, so they propagate unrecorded and the
    /// acquired permission goes back to the breaker.
    pub async fn execute_with_fallback<T, F, Fut>(
        &self,
        service: &str,
        operation: F,
        fallback: impl FnOnce() -> T,
    ) -> Result<T, RpcError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, RpcError>>,
    {
        let breaker = self.breaker(service);
        if !breaker.try_acquire() {
            debug!(service, "circuit open, serving fallback");
            return Ok(fallback());
        }

        match operation().await {
            Ok(value) => {
                breaker.record_success();
                Ok(value)
            }
            Err(err @ RpcError::Codec { .. }) => {
                // Nothing was sent, so no outcome; a half-open trial must not
                // be burned on it.
                breaker.release();
                Err(err)
            }
            Err(err) => {
                breaker.record_failure();
                warn!(service, error = %err, "call failed, serving fallback");
                Ok(fallback())
            }
        }
    }

    /// Runs `operation` under the breaker with no fallback: rejection
    /// surfaces as [`RpcError::CircuitOpen`], failures surface as themselves.
    pub async fn execute<T, F, Fut>(&self, service: &str, operation: F) -> Result<T, RpcError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, RpcError>>,
    {
        let breaker = self.breaker(service);
        if !breaker.try_acquire() {
            return Err(RpcError::CircuitOpen {
                service: service.to_string(),
            });
        }

        match operation().await {
            Ok(value) => {
                breaker.record_success();
                Ok(value)
            }
            Err(err @ RpcError::Codec { .. }) => {
                breaker.release();
                Err(err)
            }
            Err(err) => {
                breaker.record_failure();
                Err(err)
            }
        }
    }

    /// The deterministic unavailability answer for a degraded service.
    pub fn fallback_response(service: &str) -> String {
        format!("Service '{service}' is currently unavailable. Please try again later.")
    }

    /// Services whose breaker is currently not closed.
    pub fn open_services(&self) -> Vec<String> {
        self.breakers
            .iter()
            .filter(|entry| entry.value().status() != BreakerStatus::Closed)
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}
