//! Pooled HTTP Transport
//!
//! The only place bytes leave the process. One reqwest client per context
//! carries every call; connection pooling, keep-alive and timeouts are
//! configured once from `RpcConfig`.
//!
//! Retry policy: network-level errors (connect refused, resets, read
//! timeouts) retry up to the configured attempts with doubling backoff plus
//! jitter. A response that arrived, whatever its status, is never retried
//! here. The breaker layer above counts one outcome per `send`, not per
//! attempt.

use std::time::Duration;

use reqwest::header;
use tracing::{debug, warn};

use crate::config::RpcConfig;
use crate::error::RpcError;
use crate::protocol::types::ENDPOINT_INVOKE;
use crate::registry::types::Endpoint;

const USER_AGENT_VALUE: &str = concat!("rpc-fabric/", env!("CARGO_PKG_VERSION"));
const RETRY_BACKOFF_CAP: Duration = Duration::from_secs(10);

pub struct HttpTransport {
    client: reqwest::Client,
    request_timeout: Duration,
    retry_attempts: u32,
    retry_interval: Duration,
}

impl HttpTransport {
    pub fn new(config: &RpcConfig) -> Result<Self, RpcError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.max_idle_connections_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .build()
            .map_err(|err| RpcError::Internal(format!("http client construction: {err}")))?;

        Ok(Self {
            client,
            request_timeout: config.request_timeout,
            retry_attempts: config.retry_attempts.max(1),
            retry_interval: config.retry_interval,
        })
    }

    /// POSTs `payload` to the endpoint's invoke route and returns the text
    /// body of a successful response.
    pub async fn send(&self, endpoint: &Endpoint, payload: Vec<u8>) -> Result<String, RpcError> {
        let url = format!("http://{}{}", endpoint.address(), ENDPOINT_INVOKE);
        let mut delay = self.retry_interval;
        let mut last_error = String::new();

        for attempt in 1..=self.retry_attempts {
            let response = self
                .client
                .post(&url)
                .header(header::CONTENT_TYPE, "application/octet-stream")
                .header(header::USER_AGENT, USER_AGENT_VALUE)
                .timeout(self.request_timeout)
                .body(payload.clone())
                .send()
                .await;

            match response {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(RpcError::Transport {
                            endpoint: endpoint.address(),
                            reason: format!("status {status}: {body}"),
                        });
                    }

                    let body = response.text().await.map_err(|err| RpcError::Transport {
                        endpoint: endpoint.address(),
                        reason: format!("reading response body: {err}"),
                    })?;
                    if body.is_empty() {
                        // An empty entity is indistinguishable from a broken
                        // reply and is treated as one.
                        return Err(RpcError::Transport {
                            endpoint: endpoint.address(),
                            reason: "empty response body".to_string(),
                        });
                    }
                    debug!(%url, attempt, bytes = body.len(), "call delivered");
                    return Ok(body);
                }
                Err(err) => {
                    last_error = err.to_string();
                    if attempt < self.retry_attempts {
                        let jitter = Duration::from_millis(rand::random::<u64>() % 50);
                        warn!(%url, attempt, error = %err, "request failed, retrying");
                        tokio::time::sleep(delay + jitter).await;
                        delay = (delay * 2).min(RETRY_BACKOFF_CAP);
                    }
                }
            }
        }

        Err(RpcError::Transport {
            endpoint: endpoint.address(),
            reason: format!(
                "request failed after {} attempts: {last_error}",
                self.retry_attempts
            ),
        })
    }
}
