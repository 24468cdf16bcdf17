/// Core Server Framework Module
///
/// This module contains the core server implementation including:
/// - auth.rs: API key verification for protected endpoints
/// - config.rs: Environment-driven server configuration
/// - logging.rs: File-based request logging
/// - protocol.rs: JSON-RPC 2.0 message types and parsing
/// - server.rs: HTTP server, tool registry, and request dispatch
/// - session.rs: SSE session registry and streaming

pub mod auth;
pub mod config;
pub mod logging;
pub mod protocol;
pub mod server;
pub mod session;
