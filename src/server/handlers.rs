//! HTTP Handlers and Serve Loop
//!
//! The axum glue around the dispatcher: one POST route, bytes in, text out.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Extension, Router};
use tracing::{error, info};

use super::dispatch::Dispatcher;
use crate::pool::PoolManager;
use crate::protocol::types::ENDPOINT_INVOKE;

/// Everything a request needs, shared via `Extension`.
pub struct ServerState {
    pub dispatcher: Dispatcher,
    pub pools: Arc<PoolManager>,
}

/// POST handler for the invoke route.
///
/// Success maps to 200 with the result text as the body. Every failure maps
/// to 500 with the error's display text; callers treat that as a transport
/// failure of this provider.
pub async fn handle_invoke(
    Extension(state): Extension<Arc<ServerState>>,
    body: Bytes,
) -> (StatusCode, String) {
    let outcome = state.pools.server.run(state.dispatcher.dispatch(&body)).await;

    match outcome {
        Ok(result) => (StatusCode::OK, result),
        Err(err) => {
            error!(error = %err, "invoke failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route(ENDPOINT_INVOKE, post(handle_invoke))
        .layer(Extension(state))
}

/// Binds the listener and serves until the task is stopped.
pub async fn serve(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "rpc server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
