//! Descriptor Dispatch
//!
//! Turns descriptor bytes into an executed local handler. No HTTP in here;
//! the axum layer feeds bytes in and ships the result back.

use std::sync::Arc;

use tracing::debug;

use crate::error::{DispatchError, RpcError};
use crate::protocol::codec;
use crate::protocol::types::Invocation;
use crate::registry::local::LocalRegistry;

/// Descriptors carry no version field; every remote call resolves against
/// this one, whatever else is registered.
pub const DEFAULT_SERVICE_VERSION: &str = "1.0";

pub struct Dispatcher {
    registry: Arc<LocalRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<LocalRegistry>) -> Self {
        Self { registry }
    }

    pub async fn dispatch(&self, body: &[u8]) -> Result<String, RpcError> {
        let invocation = codec::decode_invocation(body)?;
        debug!(
            interface = %invocation.interface_name,
            method = %invocation.method_name,
            "dispatching incoming call"
        );
        let Invocation {
            interface_name,
            method_name,
            parameter_types,
            arguments,
        } = invocation;

        let binding = self
            .registry
            .resolve(&interface_name, DEFAULT_SERVICE_VERSION)
            .ok_or_else(|| DispatchError::UnresolvedBinding {
                interface: interface_name.clone(),
                version: DEFAULT_SERVICE_VERSION.to_string(),
            })?;

        let result = binding.invoke(&method_name, &parameter_types, arguments).await?;
        Ok(result)
    }
}
