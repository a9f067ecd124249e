//! Application Context
//!
//! One `RpcContext` per process wires every component out of one config:
//! pools, transport, both registries, the breaker registry and the async call
//! manager. Nothing in the framework reaches for globals; whoever owns the
//! context decides how widely to share it.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

use crate::breaker::registry::BreakerRegistry;
use crate::client::manager::AsyncCallManager;
use crate::client::proxy::ServiceClient;
use crate::client::transport::HttpTransport;
use crate::config::RpcConfig;
use crate::error::RpcError;
use crate::pool::PoolManager;
use crate::registry::local::LocalRegistry;
use crate::registry::remote::RemoteRegistry;
use crate::registry::snapshot::SnapshotStore;
use crate::server::dispatch::Dispatcher;
use crate::server::handlers::ServerState;

pub struct RpcContext {
    config: RpcConfig,
    pools: Arc<PoolManager>,
    transport: Arc<HttpTransport>,
    local_registry: Arc<LocalRegistry>,
    remote_registry: Arc<RemoteRegistry>,
    breakers: Arc<BreakerRegistry>,
    calls: Arc<AsyncCallManager>,
}

impl RpcContext {
    pub fn new(config: RpcConfig) -> Result<Arc<Self>, RpcError> {
        let pools = Arc::new(PoolManager::new(&config));
        let transport = Arc::new(HttpTransport::new(&config)?);
        let local_registry = Arc::new(LocalRegistry::new());
        let remote_registry = Arc::new(match &config.snapshot_path {
            Some(path) => RemoteRegistry::with_store(SnapshotStore::new(path.clone())),
            None => RemoteRegistry::in_process(),
        });
        let breakers = Arc::new(BreakerRegistry::new(config.breaker.clone()));
        let calls = Arc::new(AsyncCallManager::new(
            transport.clone(),
            pools.client.clone(),
            pools.callback.clone(),
        ));

        info!(
            snapshot = config.snapshot_path.is_some(),
            "rpc context ready"
        );
        Ok(Arc::new(Self {
            config,
            pools,
            transport,
            local_registry,
            remote_registry,
            breakers,
            calls,
        }))
    }

    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    pub fn pools(&self) -> &Arc<PoolManager> {
        &self.pools
    }

    pub fn transport(&self) -> &Arc<HttpTransport> {
        &self.transport
    }

    pub fn local_registry(&self) -> &Arc<LocalRegistry> {
        &self.local_registry
    }

    pub fn remote_registry(&self) -> &Arc<RemoteRegistry> {
        &self.remote_registry
    }

    pub fn breakers(&self) -> &Arc<BreakerRegistry> {
        &self.breakers
    }

    pub fn calls(&self) -> &Arc<AsyncCallManager> {
        &self.calls
    }

    /// A call-by-name stub for `interface`, preloaded with the configured
    /// strategy, timeout and mock setting.
    pub fn client(&self, interface: &str) -> ServiceClient {
        ServiceClient::new(
            interface,
            self.config.balance_strategy,
            self.config.call_timeout,
            self.remote_registry.clone(),
            self.breakers.clone(),
            self.calls.clone(),
            self.config.mock_response.clone(),
        )
    }

    /// The shared state the server router needs.
    pub fn server_state(&self) -> Arc<ServerState> {
        Arc::new(ServerState {
            dispatcher: Dispatcher::new(self.local_registry.clone()),
            pools: self.pools.clone(),
        })
    }

    /// Periodic one-line runtime report, the long-running-process heartbeat.
    pub fn spawn_stats_loop(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let context = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await; // the first tick fires immediately
            loop {
                ticker.tick().await;
                info!(
                    in_flight = context.calls.in_flight_count(),
                    services_called = context.breakers.len(),
                    open_breakers = ?context.breakers.open_services(),
                    local_services = context.local_registry.len(),
                    "rpc stats"
                );
            }
        })
    }

    /// Drains the pools in order; in-flight work gets the configured grace.
    pub async fn shutdown(&self) {
        info!("rpc context shutting down");
        self.pools.shutdown_all().await;
    }
}
