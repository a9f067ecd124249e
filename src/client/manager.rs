//! Async Call Manager
//!
//! Owns the lifecycle of every outbound call: a process-unique monotonic
//! request id, an in-flight record, execution on the client pool, and the
//! race between completion and the timer.
//!
//! The in-flight record is removed by a guard owned by the spawned call
//! itself, so the record disappears exactly when the call finishes, whether
//! anyone is still waiting for it or not. A caller that times out walks away;
//! the abandoned call keeps running and cleans up behind itself.
//!
//! Completion callbacks are handed to the dedicated callback pool. They never
//! run inline on the network task and never on the caller.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::transport::HttpTransport;
use crate::error::RpcError;
use crate::pool::TaskPool;
use crate::protocol::codec;
use crate::protocol::types::Invocation;
use crate::registry::types::Endpoint;

pub type SuccessCallback = Box<dyn FnOnce(String) + Send + 'static>;
pub type FailureCallback = Box<dyn FnOnce(RpcError) + Send + 'static>;

/// Bookkeeping for one call that has left but not yet returned.
#[derive(Debug, Clone)]
pub struct InFlightCall {
    pub request_id: u64,
    pub interface: String,
    pub method: String,
    pub endpoint: String,
    pub started_at: Instant,
}

/// Await-able completion of one dispatched call.
pub struct CallHandle {
    request_id: u64,
    rx: oneshot::Receiver<Result<String, RpcError>>,
}

impl CallHandle {
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    /// Waits for the call to finish, however long that takes.
    pub async fn wait(self) -> Result<String, RpcError> {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err(RpcError::Internal(
                "call task dropped before completing".to_string(),
            )),
        }
    }
}

/// Removes the in-flight record when the owning call finishes, aborts or is
/// refused by the pool.
struct InFlightGuard {
    table: Arc<DashMap<u64, InFlightCall>>,
    request_id: u64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.table.remove(&self.request_id);
    }
}

pub struct AsyncCallManager {
    transport: Arc<HttpTransport>,
    client_pool: Arc<TaskPool>,
    callback_pool: Arc<TaskPool>,
    next_request_id: AtomicU64,
    in_flight: Arc<DashMap<u64, InFlightCall>>,
}

impl AsyncCallManager {
    pub fn new(
        transport: Arc<HttpTransport>,
        client_pool: Arc<TaskPool>,
        callback_pool: Arc<TaskPool>,
    ) -> Self {
        Self {
            transport,
            client_pool,
            callback_pool,
            next_request_id: AtomicU64::new(0),
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// Dispatches the call and returns immediately with its handle.
    pub fn call(&self, endpoint: &Endpoint, invocation: &Invocation) -> CallHandle {
        self.call_with_callbacks(endpoint, invocation, None, None)
    }

    /// Dispatches the call; on completion the matching callback (if any) is
    /// delivered through the callback pool.
    pub fn call_with_callbacks(
        &self,
        endpoint: &Endpoint,
        invocation: &Invocation,
        on_success: Option<SuccessCallback>,
        on_failure: Option<FailureCallback>,
    ) -> CallHandle {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.in_flight.insert(
            request_id,
            InFlightCall {
                request_id,
                interface: invocation.interface_name.clone(),
                method: invocation.method_name.clone(),
                endpoint: endpoint.address(),
                started_at: Instant::now(),
            },
        );
        debug!(
            request_id,
            interface = %invocation.interface_name,
            method = %invocation.method_name,
            endpoint = %endpoint,
            "call dispatched"
        );

        let (tx, rx) = oneshot::channel();
        let guard = InFlightGuard {
            table: self.in_flight.clone(),
            request_id,
        };
        let transport = self.transport.clone();
        let callback_pool = self.callback_pool.clone();
        let endpoint = endpoint.clone();
        let invocation = invocation.clone();

        let accepted = self.client_pool.spawn(async move {
            let _cleanup = guard;
            let result = match codec::encode_invocation(&invocation) {
                Ok(payload) => transport.send(&endpoint, payload).await,
                Err(err) => Err(err),
            };

            match &result {
                Ok(value) => {
                    if let Some(callback) = on_success {
                        let value = value.clone();
                        callback_pool.spawn(async move { callback(value) });
                    }
                }
                Err(err) => {
                    if let Some(callback) = on_failure {
                        let err = err.clone();
                        callback_pool.spawn(async move { callback(err) });
                    }
                }
            }

            // Nobody listening (timed out or fire-and-forget) is fine.
            let _ = tx.send(result);
        });

        if !accepted {
            // The pool dropped the task unrun; its guard already cleared the
            // record and the receiver will report the dropped channel.
            warn!(request_id, "call refused, client pool is shutting down");
        }

        CallHandle { request_id, rx }
    }

    /// Races the call against the timer. When the timer wins the caller gets
    /// [`RpcError::Timeout`] and the call itself is left to finish in the
    /// background.
    pub async fn call_with_timeout(
        &self,
        endpoint: &Endpoint,
        invocation: &Invocation,
        timeout: Duration,
    ) -> Result<String, RpcError> {
        let handle = self.call(endpoint, invocation);
        let request_id = handle.request_id();

        match tokio::time::timeout(timeout, handle.wait()).await {
            Ok(result) => result,
            Err(_) => {
                warn!(request_id, ?timeout, "call timed out, abandoning it");
                Err(RpcError::Timeout { elapsed: timeout })
            }
        }
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Point-in-time copy of the in-flight table, for logs and diagnostics.
    pub fn in_flight_snapshot(&self) -> Vec<InFlightCall> {
        self.in_flight
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}
