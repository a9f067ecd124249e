//! Runtime configuration with production defaults.
//!
//! One `RpcConfig` value feeds every component wired by the application
//! context: pool sizing, transport timeouts, retry backoff, breaker thresholds
//! and the call-layer defaults. Construct with `RpcConfig::default()` and
//! override fields as needed; nothing reads configuration from globals.

use std::path::PathBuf;
use std::time::Duration;

use crate::balance::strategy::Strategy;

/// Environment variable enabling the client-side mock short-circuit.
pub const MOCK_ENV: &str = "RPC_MOCK";
/// Required prefix of the mock value; the remainder is returned verbatim.
pub const MOCK_PREFIX: &str = "return:";

/// Circuit breaker tuning, shared by every breaker a registry creates.
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Failure percentage at which a closed breaker opens.
    pub failure_rate_threshold: f32,
    /// Number of most-recent call outcomes kept in the sliding window.
    pub sliding_window_size: usize,
    /// Outcomes required before the failure rate is evaluated at all.
    pub minimum_calls: usize,
    /// How long an open breaker rejects calls before admitting trial calls.
    pub wait_duration_in_open: Duration,
    /// Trial calls allowed through while half-open.
    pub permitted_half_open_calls: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 50.0,
            sliding_window_size: 10,
            minimum_calls: 5,
            wait_duration_in_open: Duration::from_secs(30),
            permitted_half_open_calls: 5,
        }
    }
}

/// Top-level framework configuration.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// Concurrency bound of the server-side dispatch pool.
    pub server_pool_size: usize,
    /// Concurrency bound of the outbound call pool.
    pub client_pool_size: usize,
    /// Concurrency bound of the callback delivery pool.
    pub callback_pool_size: usize,
    /// Waiting-task threshold above which a pool logs saturation warnings.
    pub queue_capacity: usize,
    /// How long `shutdown` waits for in-flight tasks before aborting them.
    pub shutdown_grace: Duration,

    /// TCP connect timeout of the pooled HTTP client.
    pub connect_timeout: Duration,
    /// Whole-request timeout of a single transport attempt.
    pub request_timeout: Duration,
    /// Idle connections the transport keeps per provider host.
    pub max_idle_connections_per_host: usize,
    /// Idle time after which a pooled connection is dropped.
    pub pool_idle_timeout: Duration,

    /// Transport attempts per send (1 = no retry). Only network-level
    /// errors retry; non-success statuses never do.
    pub retry_attempts: u32,
    /// Base delay between attempts; doubles per attempt with jitter.
    pub retry_interval: Duration,

    pub breaker: BreakerConfig,

    /// Upper bound a caller waits for one call before it is abandoned.
    pub call_timeout: Duration,
    /// Endpoint selection strategy used by service clients.
    pub balance_strategy: Strategy,

    /// Shared registry snapshot file. `None` keeps discovery in-process.
    pub snapshot_path: Option<PathBuf>,
    /// When set, service clients return this literal instead of calling out.
    pub mock_response: Option<String>,
}

impl Default for RpcConfig {
    fn default() -> Self {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self {
            server_pool_size: cores * 2,
            client_pool_size: cores,
            callback_pool_size: 2,
            queue_capacity: 1000,
            shutdown_grace: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            max_idle_connections_per_host: 50,
            pool_idle_timeout: Duration::from_secs(60),
            retry_attempts: 3,
            retry_interval: Duration::from_secs(1),
            breaker: BreakerConfig::default(),
            call_timeout: Duration::from_secs(30),
            balance_strategy: Strategy::Random,
            snapshot_path: None,
            mock_response: None,
        }
    }
}

impl RpcConfig {
    /// Default location of the shared registry snapshot.
    pub fn default_snapshot_path() -> PathBuf {
        std::env::temp_dir().join("rpc_fabric_registry.bin")
    }

    /// Picks up `RPC_MOCK=return:<literal>` from the environment, the
    /// process-wide way to force every client into mock mode.
    pub fn with_mock_from_env(mut self) -> Self {
        if let Ok(raw) = std::env::var(MOCK_ENV) {
            if let Some(literal) = raw.strip_prefix(MOCK_PREFIX) {
                self.mock_response = Some(literal.to_string());
            }
        }
        self
    }
}
