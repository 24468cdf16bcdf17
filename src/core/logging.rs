/// Structured Request Logging
///
/// Every HTTP request and tool invocation is appended to a plain-text log
/// file as a banner-delimited, pretty-printed JSON entry. The file log is
/// best-effort: failures are reported through tracing and never break
/// request serving.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use actix_web::HttpRequest;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::core::config::Config;

/// Append-only structured request log.
#[derive(Debug, Clone)]
pub struct RequestLog {
    path: PathBuf,
    server_name: String,
    server_version: String,
}

impl RequestLog {
    pub fn new(config: &Config) -> Self {
        Self {
            path: config.log_file.clone(),
            server_name: config.server_name.clone(),
            server_version: config.server_version.clone(),
        }
    }

    /// Append one banner-delimited entry to the log file.
    ///
    /// The log directory is created on demand. Any I/O failure is reported
    /// via tracing::warn and otherwise swallowed.
    pub fn record(&self, info: &Value) {
        if let Err(e) = self.try_record(info) {
            tracing::warn!(error = %e, path = %self.path.display(), "request log write failed");
        }
    }

    fn try_record(&self, info: &Value) -> std::io::Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }

        let request_id = Uuid::new_v4();
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let body = serde_json::to_string_pretty(info)
            .unwrap_or_else(|_| "{}".to_string());

        let banner = "=".repeat(80);
        let entry = format!(
            "\n{banner}\nREQUEST LOG ENTRY - {request_id}\nTimestamp: {timestamp}\n{banner}\n\n\
             REQUEST INFORMATION:\n{body}\n\n{banner}\nEND OF ENTRY\n{banner}\n\n"
        );

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(entry.as_bytes())
    }

    /// Record an HTTP request entry for the given endpoint.
    pub fn log_http(&self, req: &HttpRequest, endpoint: &str) {
        let peer = req.peer_addr();
        let header = |name: &str| -> Value {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|s| json!(s))
                .unwrap_or(Value::Null)
        };

        let info = json!({
            "request_type": "http_request",
            "endpoint": endpoint,
            "method": req.method().as_str(),
            "url": req.uri().to_string(),
            "client_info": {
                "ip_address": peer.map(|a| a.ip().to_string()),
                "port": peer.map(|a| a.port()),
                "user_agent": header("user-agent"),
                "accept": header("accept"),
                "content_type": header("content-type"),
                "host": header("host"),
                "origin": header("origin"),
            },
            "server_info": {
                "server_name": self.server_name,
                "server_version": self.server_version,
                "request_id": Uuid::new_v4().to_string(),
            },
            "timestamp": Utc::now().to_rfc3339(),
        });

        self.record(&info);
    }

    /// Build the start-of-call entry for a tool invocation. The caller
    /// completes it with tool_log_finish once the handler returns.
    pub fn tool_log_start(&self, name: &str, arguments: &Value) -> Value {
        json!({
            "request_type": "tool_call",
            "tool_name": name,
            "arguments": arguments,
            "server_info": {
                "server_name": self.server_name,
                "server_version": self.server_version,
                "request_id": Uuid::new_v4().to_string(),
            },
            "timestamp_start": Utc::now().to_rfc3339(),
        })
    }

    /// Attach the outcome to a start-of-call entry and record it.
    pub fn tool_log_finish(&self, mut info: Value, response: &Value, success: bool) {
        if let Some(obj) = info.as_object_mut() {
            obj.insert("response".to_string(), response.clone());
            obj.insert("success".to_string(), json!(success));
            obj.insert("timestamp_end".to_string(), json!(Utc::now().to_rfc3339()));
        }
        self.record(&info);
    }
}
