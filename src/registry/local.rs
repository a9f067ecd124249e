//! Local Bindings and Dispatch Tables
//!
//! Maps string identifiers arriving off the wire to executable Rust code.
//! Handlers are async closures bound once at registration time; the serving
//! side only ever does table lookups, never reflection or instantiation.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Result;
use dashmap::DashMap;
use serde_json::Value;
use tracing::info;

use crate::error::DispatchError;

/// Type-erased method handler: JSON arguments in, text result out.
///
/// Handlers report their own failures through `anyhow`; the dispatch layer
/// wraps those into a tagged [`DispatchError::HandlerFailed`].
pub type MethodHandlerFn =
    Arc<dyn Fn(Vec<Value>) -> Pin<Box<dyn Future<Output = Result<String>> + Send>> + Send + Sync>;

/// Method lookup key: name plus the declared parameter types, so one method
/// name can carry several overloads.
type MethodKey = (String, Vec<String>);

/// One registered service implementation: the dispatch table for a single
/// `(interface, version)` pair.
pub struct ServiceBinding {
    interface: String,
    version: String,
    methods: DashMap<MethodKey, MethodHandlerFn>,
}

impl ServiceBinding {
    pub fn new(interface: &str, version: &str) -> Self {
        Self {
            interface: interface.to_string(),
            version: version.to_string(),
            methods: DashMap::new(),
        }
    }

    /// Binds a handler closure under `(name, parameter_types)`.
    ///
    /// Builder-style so registrations read as one declaration per method.
    pub fn method<F, Fut>(self, name: &str, parameter_types: &[&str], handler: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        let key = (
            name.to_string(),
            parameter_types.iter().map(|t| t.to_string()).collect(),
        );
        let handler: MethodHandlerFn = Arc::new(move |arguments: Vec<Value>| {
            Box::pin(handler(arguments))
                as Pin<Box<dyn Future<Output = Result<String>> + Send>>
        });
        self.methods.insert(key, handler);
        self
    }

    /// Looks up the handler for `(method, parameter_types)` and runs it.
    pub async fn invoke(
        &self,
        method: &str,
        parameter_types: &[String],
        arguments: Vec<Value>,
    ) -> std::result::Result<String, DispatchError> {
        let key = (method.to_string(), parameter_types.to_vec());
        // Clone the handler out so no map guard is held across the await.
        let handler = match self.methods.get(&key) {
            Some(entry) => entry.value().clone(),
            None => {
                let name_exists = self.methods.iter().any(|entry| entry.key().0 == method);
                return Err(if name_exists {
                    DispatchError::SignatureMismatch {
                        interface: self.interface.clone(),
                        method: method.to_string(),
                        supplied: parameter_types.to_vec(),
                    }
                } else {
                    DispatchError::UnknownMethod {
                        interface: self.interface.clone(),
                        method: method.to_string(),
                    }
                });
            }
        };

        handler(arguments)
            .await
            .map_err(|err| DispatchError::HandlerFailed {
                interface: self.interface.clone(),
                method: method.to_string(),
                reason: err.to_string(),
            })
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }
}

/// Provider-side registry: `(interface, version)` to its binding.
pub struct LocalRegistry {
    bindings: DashMap<(String, String), Arc<ServiceBinding>>,
}

impl LocalRegistry {
    pub fn new() -> Self {
        Self {
            bindings: DashMap::new(),
        }
    }

    /// Registers a binding under its own interface and version.
    /// Re-registering the same pair replaces the previous binding.
    pub fn register(&self, binding: ServiceBinding) {
        info!(
            interface = binding.interface(),
            version = binding.version(),
            methods = binding.method_count(),
            "registered local service"
        );
        let key = (binding.interface.clone(), binding.version.clone());
        self.bindings.insert(key, Arc::new(binding));
    }

    /// Exact-match resolution; there is no fallback across versions.
    pub fn resolve(&self, interface: &str, version: &str) -> Option<Arc<ServiceBinding>> {
        self.bindings
            .get(&(interface.to_string(), version.to_string()))
            .map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Default for LocalRegistry {
    fn default() -> Self {
        Self::new()
    }
}
