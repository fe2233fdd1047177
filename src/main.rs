//! Example host binary: wires up logging, builds a [`ServerConfig`] from
//! environment variables, registers the demo tools, and runs the chosen
//! transport.

mod demo;

use std::env;

use mcp_server::{McpServer, ServerConfig, TransportKind};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let name = env::var("SERVER_NAME").unwrap_or_else(|_| "mcp-server".to_string());
    let version = env::var("SERVER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
    let transport = env::var("MCP_TRANSPORT_MODE").unwrap_or_else(|_| "stdio".to_string());

    let mut config = ServerConfig::new(name, version);
    if transport == "http" {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        config = config.with_http(host, port, "/mcp");
    }

    let server = McpServer::create(config).map_err(std::io::Error::other)?;
    demo::register_all(&server)
        .await
        .map_err(std::io::Error::other)?;

    match transport.as_str() {
        "stdio" => server.run(TransportKind::Stdio).await.map_err(std::io::Error::other),
        "http" => server.run(TransportKind::Http).await.map_err(std::io::Error::other),
        other => {
            eprintln!("Error: Invalid transport mode '{other}'. Must be 'stdio' or 'http'");
            std::process::exit(1);
        }
    }
}
