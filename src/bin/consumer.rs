use rpc_fabric::config::RpcConfig;
use rpc_fabric::context::RpcContext;
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut name = "coldscholor".to_string();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--name" => {
                name = args[i + 1].clone();
                i += 2;
            }
            "--help" => {
                eprintln!("Usage: {} [--name <who to greet>]", args[0]);
                eprintln!("Set RPC_MOCK=return:<text> to skip the network entirely.");
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
    }
    .with_mock_from_env();
    let context = RpcContext::new(config)?;

    let client = context.client("demo.HelloService");
    let result = client.call("sayHello", &["String"], vec![json!(name)]).await?;
    println!("{result}");

    context.shutdown().await;
    Ok(())
}
