/// MCP Utility Server Entry Point
///
/// Loads configuration from environment variables, initializes structured
/// logging, and starts the HTTP server.
///
/// Environment Variables:
/// - SERVER_NAME: Name of the server (default: "mcp-utils-server")
/// - SERVER_VERSION: Version string (default: "1.0.0")
/// - HOST: Bind address (default: "0.0.0.0")
/// - PORT: Port number (default: 8000)
/// - MCP_API_KEY: When set, required in the X-API-Key header on every endpoint
/// - CORS_ORIGINS: Comma-separated allowed origins (default: localhost:8000)
/// - COMMAND_TIMEOUT: Default command timeout in seconds (default: 30)
/// - MAX_RANDOM_NUMBERS: Batch cap for random draws (default: 100)
/// - LOG_FILE: Path to the request log file (default: logs/requests_log.txt)
/// - WORKER_THREADS: Override for the HTTP worker count
/// - RUST_LOG: Tracing filter (default: "info")

mod core;
mod tools;

use tracing_subscriber::EnvFilter;

use crate::core::config::Config;
use crate::core::server;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    server::run_server_http(config).await
}
