/// Server Configuration
///
/// All settings are derived from environment variables with defaults, loaded
/// once at startup and shared across worker threads behind an Arc.
///
/// Environment Variables:
/// - SERVER_NAME: Name reported in initialize responses (default: "mcp-utils-server")
/// - SERVER_VERSION: Version string (default: "1.0.0")
/// - HOST: Bind address (default: "0.0.0.0")
/// - PORT: Port number (default: 8000)
/// - MCP_API_KEY: Shared secret for the X-API-Key header; unset disables auth
/// - CORS_ORIGINS: Comma-separated allowed origins
/// - COMMAND_TIMEOUT: Default command timeout in seconds (default: 30)
/// - MAX_RANDOM_NUMBERS: Upper bound on random-number batch size (default: 100)
/// - LOG_FILE: Path of the structured request log (default: "logs/requests_log.txt")

use std::env;
use std::path::PathBuf;

/// Header carrying the shared-secret API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Runtime configuration shared by all request handlers.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server name as reported in initialize responses
    pub server_name: String,
    /// Server version string as reported in initialize responses
    pub server_version: String,
    /// Bind address for the HTTP server
    pub host: String,
    /// Port number for the HTTP server
    pub port: u16,
    /// Shared-secret API key; None disables the auth check entirely
    pub api_key: Option<String>,
    /// Origins allowed by the CORS response headers
    pub cors_origins: Vec<String>,
    /// Default hard deadline for execute_command, in seconds
    pub command_timeout: u64,
    /// Upper bound on the count accepted by generate_random_number
    pub max_random_numbers: u64,
    /// Path of the structured request/response log file
    pub log_file: PathBuf,
}

impl Config {
    /// Load the configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let api_key = env::var("MCP_API_KEY").ok().filter(|k| !k.is_empty());

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|raw| parse_origins(&raw))
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:8000".to_string(),
                    "http://127.0.0.1:8000".to_string(),
                ]
            });

        Self {
            server_name: env::var("SERVER_NAME")
                .unwrap_or_else(|_| "mcp-utils-server".to_string()),
            server_version: env::var("SERVER_VERSION").unwrap_or_else(|_| "1.0.0".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|s| s.parse::<u16>().ok())
                .unwrap_or(8000),
            api_key,
            cors_origins,
            command_timeout: env::var("COMMAND_TIMEOUT")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(30),
            max_random_numbers: env::var("MAX_RANDOM_NUMBERS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(100),
            log_file: env::var("LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("logs/requests_log.txt")),
        }
    }
}

/// Split a comma-separated origin list, dropping empty entries.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
