//! Registry Module Tests
//!
//! Validates local binding resolution (exact version semantics, dispatch-table
//! lookups) and the remote endpoint table in both in-process and shared
//! snapshot modes.

#[cfg(test)]
mod tests {
    use crate::error::DispatchError;
    use crate::registry::local::{LocalRegistry, ServiceBinding};
    use crate::registry::remote::RemoteRegistry;
    use crate::registry::snapshot::SnapshotStore;
    use crate::registry::types::Endpoint;
    use serde_json::json;
    use std::path::PathBuf;

    fn greeting_binding(version: &str, greeting: &'static str) -> ServiceBinding {
        ServiceBinding::new("demo.HelloService", version).method(
            "sayHello",
            &["String"],
            move |args| async move {
                let name = args
                    .first()
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                Ok(format!("{greeting}, {name}"))
            },
        )
    }

    /// Unique file per test so parallel tests never share a snapshot.
    fn temp_snapshot_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("rpc_fabric_test_{}_{}.bin", tag, std::process::id()))
    }

    // ============================================================
    // LOCAL REGISTRY TESTS
    // ============================================================

    #[tokio::test]
    async fn test_register_and_resolve_exact_version() {
        let registry = LocalRegistry::new();
        registry.register(greeting_binding("1.0", "Hello"));

        let binding = registry.resolve("demo.HelloService", "1.0");
        assert!(binding.is_some(), "registered version should resolve");
        assert_eq!(binding.unwrap().method_count(), 1);
    }

    #[tokio::test]
    async fn test_resolve_unregistered_version_is_none() {
        let registry = LocalRegistry::new();
        registry.register(greeting_binding("1.0", "Hello"));

        // Exact match only: "2.0" was never bound.
        assert!(registry.resolve("demo.HelloService", "2.0").is_none());
        assert!(registry.resolve("demo.OtherService", "1.0").is_none());
    }

    #[tokio::test]
    async fn test_reregistration_last_write_wins() {
        let registry = LocalRegistry::new();
        registry.register(greeting_binding("1.0", "Hello"));
        registry.register(greeting_binding("1.0", "Howdy"));

        let binding = registry.resolve("demo.HelloService", "1.0").unwrap();
        let reply = binding
            .invoke("sayHello", &["String".to_string()], vec![json!("Ann")])
            .await
            .unwrap();

        assert_eq!(reply, "Howdy, Ann", "second registration should replace the first");
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_invoke_returns_handler_result() {
        let binding = greeting_binding("1.0", "Hello");
        let reply = binding
            .invoke("sayHello", &["String".to_string()], vec![json!("x")])
            .await
            .unwrap();
        assert_eq!(reply, "Hello, x");
    }

    #[tokio::test]
    async fn test_invoke_unknown_method() {
        let binding = greeting_binding("1.0", "Hello");
        let err = binding
            .invoke("wave", &["String".to_string()], vec![json!("x")])
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnknownMethod { .. }));
    }

    #[tokio::test]
    async fn test_invoke_signature_mismatch() {
        let binding = greeting_binding("1.0", "Hello");
        // Right method name, wrong parameter types.
        let err = binding
            .invoke("sayHello", &["i64".to_string()], vec![json!(7)])
            .await
            .unwrap_err();
        assert!(
            matches!(err, DispatchError::SignatureMismatch { ref supplied, .. } if supplied == &["i64".to_string()]),
            "expected a signature mismatch, got: {err}"
        );
    }

    #[tokio::test]
    async fn test_invoke_wraps_handler_failure() {
        let binding = ServiceBinding::new("demo.Flaky", "1.0").method(
            "explode",
            &[],
            |_args| async move { Err(anyhow::anyhow!("wires crossed")) },
        );

        let err = binding.invoke("explode", &[], vec![]).await.unwrap_err();
        match err {
            DispatchError::HandlerFailed { reason, .. } => {
                assert!(reason.contains("wires crossed"), "handler reason kept: {reason}")
            }
            other => panic!("expected HandlerFailed, got: {other}"),
        }
    }

    #[tokio::test]
    async fn test_overloads_share_a_method_name() {
        let binding = ServiceBinding::new("demo.Calculator", "1.0")
            .method("add", &["i64", "i64"], |args| async move {
                let a = args[0].as_i64().unwrap_or(0);
                let b = args[1].as_i64().unwrap_or(0);
                Ok((a + b).to_string())
            })
            .method("add", &["String", "String"], |args| async move {
                let a = args[0].as_str().unwrap_or_default();
                let b = args[1].as_str().unwrap_or_default();
                Ok(format!("{a}{b}"))
            });

        let sum = binding
            .invoke(
                "add",
                &["i64".to_string(), "i64".to_string()],
                vec![json!(20), json!(22)],
            )
            .await
            .unwrap();
        let joined = binding
            .invoke(
                "add",
                &["String".to_string(), "String".to_string()],
                vec![json!("4"), json!("2")],
            )
            .await
            .unwrap();

        assert_eq!(sum, "42");
        assert_eq!(joined, "42");
    }

    // ============================================================
    // ENDPOINT WEIGHT INVARIANT
    // ============================================================

    #[test]
    fn test_endpoint_weight_never_below_one() {
        let endpoint = Endpoint::new("127.0.0.1", 8080).with_weight(0);
        assert_eq!(endpoint.weight(), 1, "zero weight clamps up to 1");

        let mut endpoint = Endpoint::new("127.0.0.1", 8080).with_weight(7);
        assert_eq!(endpoint.weight(), 7);
        endpoint.set_weight(0);
        assert_eq!(endpoint.weight(), 1, "mutation clamps too");
    }

    // ============================================================
    // REMOTE REGISTRY (IN-PROCESS MODE)
    // ============================================================

    #[test]
    fn test_remote_register_and_resolve() {
        let registry = RemoteRegistry::in_process();
        registry.register("demo.HelloService", Endpoint::new("10.0.0.1", 8080));
        registry.register("demo.HelloService", Endpoint::new("10.0.0.2", 8080));

        let endpoints = registry.resolve("demo.HelloService");
        assert_eq!(endpoints.len(), 2);
        assert_eq!(endpoints[0].address(), "10.0.0.1:8080");
    }

    #[test]
    fn test_remote_unknown_interface_is_empty() {
        let registry = RemoteRegistry::in_process();
        assert!(registry.resolve("demo.Nothing").is_empty());
    }

    // ============================================================
    // REMOTE REGISTRY (SHARED SNAPSHOT MODE)
    // ============================================================

    #[test]
    fn test_snapshot_visible_across_registries() {
        let path = temp_snapshot_path("visible");
        let _ = std::fs::remove_file(&path);

        // Two registries standing in for two processes sharing one file.
        let writer = RemoteRegistry::with_store(SnapshotStore::new(path.clone()));
        let reader = RemoteRegistry::with_store(SnapshotStore::new(path.clone()));

        writer.register(
            "demo.HelloService",
            Endpoint::new("10.0.0.1", 8080).with_weight(4),
        );

        let endpoints = reader.resolve("demo.HelloService");
        assert_eq!(endpoints.len(), 1, "lookup reloads the shared snapshot");
        assert_eq!(endpoints[0].weight(), 4, "weight survives the snapshot");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_snapshot_registration_after_lookup_appends() {
        let path = temp_snapshot_path("append");
        let _ = std::fs::remove_file(&path);

        let first = RemoteRegistry::with_store(SnapshotStore::new(path.clone()));
        let second = RemoteRegistry::with_store(SnapshotStore::new(path.clone()));

        first.register("demo.HelloService", Endpoint::new("10.0.0.1", 8080));

        // Second process loads the table via a lookup, then adds itself.
        assert_eq!(second.resolve("demo.HelloService").len(), 1);
        second.register("demo.HelloService", Endpoint::new("10.0.0.2", 8080));

        assert_eq!(
            first.resolve("demo.HelloService").len(),
            2,
            "both providers visible after the second registration"
        );

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_snapshot_blind_write_loses_other_entries() {
        let path = temp_snapshot_path("lost_update");
        let _ = std::fs::remove_file(&path);

        let first = RemoteRegistry::with_store(SnapshotStore::new(path.clone()));
        let second = RemoteRegistry::with_store(SnapshotStore::new(path.clone()));

        first.register("demo.HelloService", Endpoint::new("10.0.0.1", 8080));
        // Registering without a prior lookup rewrites the file from this
        // process's (empty) view: the documented read-modify-write race.
        second.register("demo.OtherService", Endpoint::new("10.0.0.2", 9090));

        let reader = RemoteRegistry::with_store(SnapshotStore::new(path.clone()));
        assert!(
            reader.resolve("demo.HelloService").is_empty(),
            "last writer wins: the first registration was overwritten"
        );
        assert_eq!(reader.resolve("demo.OtherService").len(), 1);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_corrupt_snapshot_reads_as_empty() {
        let path = temp_snapshot_path("corrupt");
        std::fs::write(&path, b"not a snapshot").unwrap();

        let registry = RemoteRegistry::with_store(SnapshotStore::new(path.clone()));
        assert!(registry.resolve("demo.HelloService").is_empty());

        let _ = std::fs::remove_file(&path);
    }
}
