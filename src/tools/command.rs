/// Command Execution Tool
///
/// Runs a shell-like command string as a directly-spawned argv (never
/// through a shell) with piped output, an optional working directory and a
/// hard deadline. The child is spawned with kill_on_drop, so abandoning the
/// wait at the deadline also terminates and reaps the process; no child
/// outlives its invocation.

use std::io::ErrorKind;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use serde_json::{json, Value};
use tokio::process::Command;

use crate::core::config::Config;
use crate::core::server::{ToolHandler, ToolOutcome, ToolRegistry, ToolSpec};

/// Register the execute_command tool with the tool registry.
pub fn register(registry: &mut ToolRegistry, config: &Arc<Config>) {
    let default_timeout = config.command_timeout;

    let tool = ToolSpec {
        name: "execute_command".to_string(),
        description: "Execute a shell command and return the output. WARNING: Use with caution as this can execute arbitrary commands.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "Shell command to execute (e.g., 'ls -la', 'echo hello', 'python --version')"
                },
                "working_directory": {
                    "type": "string",
                    "description": "Working directory for the command (optional, defaults to current directory)",
                    "default": null
                },
                "timeout": {
                    "type": "integer",
                    "description": format!("Timeout in seconds (optional, defaults to {} seconds)", default_timeout),
                    "default": default_timeout
                }
            },
            "required": ["command"],
        }),
    };

    let handler: ToolHandler =
        Box::new(move |args: Value| execute(args, default_timeout).boxed());
    registry.register(tool, handler);
}

/// Split a command string into an argv.
///
/// Shell quoting rules apply first; when quoting is unbalanced the string
/// degrades to plain whitespace splitting.
fn tokenize(command: &str) -> Vec<String> {
    match shell_words::split(command) {
        Ok(parts) => parts,
        Err(_) => command.split_whitespace().map(String::from).collect(),
    }
}

async fn execute(args: Value, default_timeout: u64) -> ToolOutcome {
    let command = match args.get("command").and_then(|v| v.as_str()) {
        Some(c) if !c.trim().is_empty() => c.to_string(),
        _ => return ToolOutcome::Failure("Command is required".to_string()),
    };

    let working_directory = match args.get("working_directory") {
        None | Some(Value::Null) => None,
        Some(v) => match v.as_str() {
            Some(dir) => Some(dir.to_string()),
            None => {
                return ToolOutcome::Failure(
                    "working_directory must be a string".to_string(),
                );
            }
        },
    };

    let timeout_secs = match args.get("timeout") {
        None => default_timeout,
        Some(v) => match v.as_u64() {
            Some(t) if t >= 1 => t,
            _ => return ToolOutcome::Failure("timeout must be a positive integer".to_string()),
        },
    };

    let parts = tokenize(&command);
    let program = match parts.first() {
        Some(p) => p.clone(),
        None => return ToolOutcome::Failure("Command is required".to_string()),
    };

    let mut child = Command::new(&program);
    child
        .args(&parts[1..])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = &working_directory {
        child.current_dir(dir);
    }

    match tokio::time::timeout(Duration::from_secs(timeout_secs), child.output()).await {
        Err(_) => {
            // The dropped output future kills and reaps the child
            ToolOutcome::Failure(format!(
                "Command timed out after {} seconds",
                timeout_secs
            ))
        }
        Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
            ToolOutcome::Failure(format!("Command not found: {}", program))
        }
        Ok(Err(e)) => ToolOutcome::Failure(format!("Command execution error: {}", e)),
        Ok(Ok(output)) => ToolOutcome::Success(json!({
            "command": command,
            // -1 when the OS reports no exit code (signal-terminated)
            "return_code": output.status.code().unwrap_or(-1),
            "stdout": String::from_utf8_lossy(&output.stdout),
            "stderr": String::from_utf8_lossy(&output.stderr),
            "success": output.status.success(),
            "working_directory": working_directory.as_deref().unwrap_or("current directory"),
            "timeout_used": timeout_secs,
        })),
    }
}
