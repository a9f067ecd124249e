use rpc_fabric::config::RpcConfig;
use rpc_fabric::context::RpcContext;
use rpc_fabric::registry::local::ServiceBinding;
use rpc_fabric::registry::types::Endpoint;
use rpc_fabric::server::handlers;
use std::net::SocketAddr;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        // .with_max_level(tracing::Level::DEBUG)
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut bind_addr: SocketAddr = "127.0.0.1:8080".parse()?;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" => {
                bind_addr = args[i + 1].parse()?;
                i += 2;
            }
            "--help" => {
                eprintln!("Usage: {} [--bind <addr:port>]", args[0]);
                eprintln!("Example: {} --bind 127.0.0.1:8080", args[0]);
                std::process::exit(1);
            }
            _ => {
                i += 1;
            }
        }
    }

    let config = RpcConfig {
        snapshot_path: Some(RpcConfig::default_snapshot_path()),
        ..RpcConfig::default()
    };
    let context = RpcContext::new(config)?;

    tracing::info!("Starting provider on {}", bind_addr);

    // 1. Local bindings. Both versions are registered, but incoming calls
    //    always dispatch against 1.0.
    context.local_registry().register(
        ServiceBinding::new("demo.HelloService", "1.0").method(
            "sayHello",
            &["String"],
            |args| async move {
                let name = args
                    .first()
                    .and_then(|v| v.as_str())
                    .unwrap_or("stranger")
                    .to_string();
                Ok(format!("Hello, {name}"))
            },
        ),
    );
    context.local_registry().register(
        ServiceBinding::new("demo.HelloService", "2.0").method(
            "sayHello",
            &["String"],
            |args| async move {
                let name = args
                    .first()
                    .and_then(|v| v.as_str())
                    .unwrap_or("stranger")
                    .to_string();
                Ok(format!("Hello from v2, {name}"))
            },
        ),
    );

    // 2. Service discovery: publish this process as a HelloService provider.
    context.remote_registry().register(
        "demo.HelloService",
        Endpoint::new(bind_addr.ip().to_string(), bind_addr.port()),
    );

    // 3. Stats reporter:
    context.spawn_stats_loop(Duration::from_secs(60));

    // 4. Serve until Ctrl+C:
    tracing::info!("Press Ctrl+C to shutdown");
    handlers::serve(bind_addr, context.server_state()).await?;

    Ok(())
}
