/// API-Key Authentication
///
/// A single static shared-secret check against the X-API-Key header. When no
/// key is configured the check is a no-op, which keeps local development
/// friction-free while letting deployments opt in via MCP_API_KEY.

use actix_web::{HttpRequest, HttpResponse};

use crate::core::config::{Config, API_KEY_HEADER};

/// Verify the request's API key against the configured shared secret.
///
/// Returns Ok(()) when no key is configured or the header matches; otherwise
/// returns the 401 response the caller should send.
pub fn verify_api_key(req: &HttpRequest, config: &Config) -> Result<(), HttpResponse> {
    let expected = match config.api_key.as_deref() {
        Some(key) => key,
        None => return Ok(()),
    };

    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    if provided == Some(expected) {
        Ok(())
    } else {
        Err(HttpResponse::Unauthorized().json(serde_json::json!({
            "detail": "Invalid or missing API key"
        })))
    }
}
