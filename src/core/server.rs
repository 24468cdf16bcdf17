/// HTTP Server and Transport Dispatcher
///
/// This module contains the heart of the gateway:
/// - Tool registry (specs for discovery, boxed async handlers for execution)
/// - JSON-RPC method dispatch for initialize, tools/list and tools/call
/// - Route handlers for the synchronous and SSE-oriented endpoints
/// - HTTP server setup with Actix Web
///
/// Tool-level failures, unknown tool names included, ride inside successful
/// JSON-RPC results as a single text content block; JSON-RPC error objects
/// are reserved for transport and dispatch faults.

use actix_web::{
    http::{header, StatusCode},
    middleware::{Compress, DefaultHeaders, Logger},
    web, App, HttpRequest, HttpResponse, HttpServer, Result,
};
use futures_util::future::BoxFuture;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::auth::verify_api_key;
use crate::core::config::Config;
use crate::core::logging::RequestLog;
use crate::core::protocol::{
    parse_envelope, Envelope, RpcResponse, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND,
    PARSE_ERROR,
};
use crate::core::session::{SessionRegistry, DEFAULT_CONNECTION_ID};
use crate::tools;

/// Header selecting the SSE session a request belongs to.
pub const CONNECTION_ID_HEADER: &str = "X-Connection-ID";

/// Application state shared across all worker threads.
#[derive(Clone)]
pub struct AppState {
    /// Runtime configuration loaded from the environment
    pub config: Arc<Config>,
    /// Registry of tool specs and handlers, immutable after startup
    pub registry: Arc<ToolRegistry>,
    /// Live SSE sessions keyed by connection id
    pub sessions: Arc<SessionRegistry>,
    /// Structured request/response file log
    pub request_log: Arc<RequestLog>,
}

/// Tool definition structure.
///
/// Each tool has a unique name, description, and JSON schema describing its
/// input parameters. Serialized verbatim into tools/list responses.
#[derive(Serialize, Debug, Clone)]
pub struct ToolSpec {
    /// Unique tool identifier (e.g., "calculate", "execute_command")
    pub name: String,
    /// Human-readable description of what the tool does
    pub description: String,
    /// JSON Schema defining the tool's input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Outcome of one tool invocation.
///
/// A Failure is a tool-level error (validation, timeout, unknown name) and
/// serializes as `{"error": <message>, "success": false}`. Handlers never
/// panic past this boundary.
#[derive(Debug)]
pub enum ToolOutcome {
    Success(Value),
    Failure(String),
}

impl ToolOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success(_))
    }

    /// JSON payload for this outcome, failure envelope included.
    pub fn payload(&self) -> Value {
        match self {
            ToolOutcome::Success(value) => value.clone(),
            ToolOutcome::Failure(message) => json!({
                "error": message,
                "success": false,
            }),
        }
    }

    /// Pretty-printed payload, the form delivered in text content blocks.
    pub fn text(&self) -> String {
        serde_json::to_string_pretty(&self.payload()).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Tool handler function type definition.
///
/// Handlers are boxed async closures: command execution suspends on the
/// child process, so the boundary is a future. Send + Sync lets one
/// registry serve every worker thread.
pub type ToolHandler = Box<dyn Fn(Value) -> BoxFuture<'static, ToolOutcome> + Send + Sync>;

/// Registry of available tools.
///
/// Keeps an ordered list of tool specs for discovery (registration order is
/// the canonical listing order) and a map of names to handlers for
/// execution.
pub struct ToolRegistry {
    /// All registered tools, in registration order (for tools/list)
    pub tools: Vec<ToolSpec>,
    /// Map of tool names to their handler functions (for tools/call)
    handlers: HashMap<String, ToolHandler>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            handlers: HashMap::new(),
        }
    }

    /// Register a tool with the registry.
    pub fn register(&mut self, tool: ToolSpec, handler: ToolHandler) {
        let name = tool.name.clone();
        self.tools.push(tool);
        self.handlers.insert(name, handler);
    }

    pub fn resolve(&self, name: &str) -> Option<&ToolHandler> {
        self.handlers.get(name)
    }
}

/// Create the tool registry and register every tool.
pub fn initialize_tools(config: &Arc<Config>) -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();

    tools::datetime::register(&mut registry);
    tools::calc::register(&mut registry);
    tools::format::register(&mut registry);
    tools::random::register(&mut registry, config);
    tools::command::register(&mut registry, config);

    Arc::new(registry)
}

/// Execute one tool call, file-logging the invocation and its outcome.
///
/// An unknown tool name is a tool-level failure, not a dispatch fault.
async fn invoke_tool(state: &AppState, name: &str, arguments: Value) -> ToolOutcome {
    let log_info = state.request_log.tool_log_start(name, &arguments);

    let outcome = match state.registry.resolve(name) {
        Some(handler) => handler(arguments).await,
        None => ToolOutcome::Failure(format!("Unknown tool: {}", name)),
    };

    state
        .request_log
        .tool_log_finish(log_info, &outcome.payload(), outcome.is_success());
    outcome
}

/// Dispatch one classified request to its method handler.
async fn dispatch_request(state: &AppState, id: Value, method: &str, params: Value) -> RpcResponse {
    match method {
        "initialize" => RpcResponse::success(
            id,
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": state.config.server_name,
                    "version": state.config.server_version
                }
            }),
        ),
        "tools/list" => RpcResponse::success(id, json!({ "tools": state.registry.tools })),
        "tools/call" => {
            let name = match params.get("name").and_then(|v| v.as_str()) {
                Some(n) if !n.is_empty() => n,
                _ => return RpcResponse::error(id, INVALID_PARAMS, "Tool name is required"),
            };
            let arguments = params
                .get("arguments")
                .cloned()
                .unwrap_or_else(|| json!({}));

            let outcome = invoke_tool(state, name, arguments).await;
            RpcResponse::success(
                id,
                json!({
                    "content": [
                        {
                            "type": "text",
                            "text": outcome.text()
                        }
                    ],
                    "isError": false
                }),
            )
        }
        _ => RpcResponse::error(
            id,
            METHOD_NOT_FOUND,
            format!("Method not found: {}", method),
        ),
    }
}

/// HTTP status carried alongside a JSON-RPC response on the SSE-oriented
/// POST paths.
fn status_for(response: &RpcResponse) -> StatusCode {
    match response.error_code() {
        Some(PARSE_ERROR) | Some(INVALID_REQUEST) => StatusCode::BAD_REQUEST,
        Some(METHOD_NOT_FOUND) => StatusCode::NOT_FOUND,
        _ => StatusCode::OK,
    }
}

fn connection_id(req: &HttpRequest) -> String {
    req.headers()
        .get(CONNECTION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(DEFAULT_CONNECTION_ID)
        .to_string()
}

/// Liveness endpoint handler.
async fn root(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    if let Err(response) = verify_api_key(&req, &state.config) {
        return Ok(response);
    }
    Ok(HttpResponse::Ok().json(json!({
        "status": "ok",
        "server": state.config.server_name,
        "message": "MCP Server is running"
    })))
}

/// Health probe for load balancers and monitoring.
async fn health(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    if let Err(response) = verify_api_key(&req, &state.config) {
        return Ok(response);
    }
    Ok(HttpResponse::Ok().json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

/// Tool catalogue as plain JSON, outside the JSON-RPC envelope.
async fn mcp_tools(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    if let Err(response) = verify_api_key(&req, &state.config) {
        return Ok(response);
    }
    state.request_log.log_http(&req, "/mcp/tools");
    Ok(HttpResponse::Ok().json(json!({ "tools": state.registry.tools })))
}

/// Legacy direct tool call: `{"tool": ..., "arguments": ...}` in, the
/// outcome's text block out. Never touches the session registry.
async fn legacy_call(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<Value>,
) -> Result<HttpResponse> {
    if let Err(response) = verify_api_key(&req, &state.config) {
        return Ok(response);
    }
    state.request_log.log_http(&req, "/mcp/call");

    let tool = body
        .get("tool")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    let arguments = body
        .get("arguments")
        .cloned()
        .unwrap_or_else(|| json!({}));

    let outcome = invoke_tool(&state, &tool, arguments).await;
    Ok(HttpResponse::Ok().json(json!({ "result": outcome.text() })))
}

/// Open an SSE stream for the request's connection id.
///
/// Subscribing installs a fresh queue, superseding any stale registration
/// under the same id.
async fn sse_subscribe(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    if let Err(response) = verify_api_key(&req, &state.config) {
        return Ok(response);
    }
    state.request_log.log_http(&req, "/sse");

    let connection_id = connection_id(&req);
    tracing::info!(connection_id = %connection_id, "SSE stream opened");
    let stream = state.sessions.subscribe(&connection_id);

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(header::CacheControl(vec![header::CacheDirective::NoCache]))
        // Disable nginx buffering for real-time streaming
        .insert_header(("X-Accel-Buffering", "no"))
        .streaming(stream))
}

/// Submit one JSON-RPC envelope (POST /sse and POST /message).
///
/// Every response, error responses included, is returned synchronously and
/// additionally mirrored onto the session queue when a session exists for
/// the connection id. Notifications are acknowledged with an empty object
/// and produce no response payload.
async fn rpc_endpoint(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse> {
    if let Err(response) = verify_api_key(&req, &state.config) {
        return Ok(response);
    }
    state.request_log.log_http(&req, req.path());

    let connection_id = connection_id(&req);

    let response = match parse_envelope(&body) {
        Err(error_response) => error_response,
        Ok(Envelope::Notification { method, .. }) => {
            tracing::debug!(method = %method, "notification acknowledged");
            return Ok(HttpResponse::Ok().json(json!({})));
        }
        Ok(Envelope::Request { id, method, params }) => {
            dispatch_request(&state, id, &method, params).await
        }
    };

    if let Ok(mirrored) = serde_json::to_value(&response) {
        state.sessions.push(&connection_id, mirrored);
    }

    Ok(HttpResponse::build(status_for(&response)).json(response))
}

/// OAuth discovery probe: this server does not speak OAuth.
async fn oauth_discovery() -> Result<HttpResponse> {
    Ok(HttpResponse::NotFound().json(json!({
        "detail": "OAuth not supported"
    })))
}

/// Register every route handler; shared by the server and the tests.
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(root))
        .route("/health", web::get().to(health))
        .route("/mcp/tools", web::get().to(mcp_tools))
        .route("/mcp/call", web::post().to(legacy_call))
        .route("/sse", web::get().to(sse_subscribe))
        .route("/sse", web::post().to(rpc_endpoint))
        .route("/message", web::post().to(rpc_endpoint))
        .route(
            "/.well-known/oauth-authorization-server",
            web::get().to(oauth_discovery),
        );
}

/// Run the gateway in HTTP mode.
///
/// # Configuration
/// The server is configured with:
/// - Worker threads: Auto-detected from CPU count (max 16)
/// - Max connections: 10,000 concurrent connections
/// - Connection rate limit: 1,000 connections per second
/// - Keep-alive: 30 seconds
/// - Request timeout: 30 seconds
/// - Disconnect timeout: 2 seconds
/// - Shutdown timeout: 10 seconds
pub async fn run_server_http(config: Config) -> std::io::Result<()> {
    use std::time::Duration;

    let config = Arc::new(config);
    let bind_addr = format!("{}:{}", config.host, config.port);

    let app_state = web::Data::new(AppState {
        registry: initialize_tools(&config),
        sessions: Arc::new(SessionRegistry::new()),
        request_log: Arc::new(RequestLog::new(&config)),
        config: Arc::clone(&config),
    });

    // Defaults to CPU count but capped at 16 to avoid excessive context
    // switching. Can be overridden via WORKER_THREADS.
    let workers = std::env::var("WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or_else(|| num_cpus::get().clamp(1, 16));

    tracing::info!(
        name = %config.server_name,
        version = %config.server_version,
        bind = %bind_addr,
        workers,
        auth = config.api_key.is_some(),
        "server starting (HTTP mode)"
    );

    let cors_origins = config.cors_origins.join(", ");

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            // Enable compression for JSON responses (gzip/brotli)
            .wrap(Compress::default())
            // Security and CORS headers on all responses
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
                    .add(("X-XSS-Protection", "1; mode=block"))
                    .add(("Access-Control-Allow-Origin", cors_origins.clone()))
                    .add(("Access-Control-Allow-Methods", "GET, POST, OPTIONS"))
                    .add((
                        "Access-Control-Allow-Headers",
                        "Content-Type, X-API-Key, X-Connection-ID",
                    )),
            )
            // Format: %r = request line, %s = status, %Dms = duration in milliseconds
            .wrap(Logger::new("%r %s %Dms"))
            .configure(register_routes)
    })
    .workers(workers)
    // Connection limits for high-traffic scenarios
    .max_connections(10000)
    .max_connection_rate(1000)
    // Timeout configurations to prevent resource exhaustion
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_secs(30))
    .client_disconnect_timeout(Duration::from_secs(2))
    // Graceful shutdown timeout
    .shutdown_timeout(10)
    .bind(&bind_addr)?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test;
    use futures_util::StreamExt;

    fn test_state() -> web::Data<AppState> {
        let mut config = Config::from_env();
        config.api_key = None;
        config.log_file = std::env::temp_dir().join(format!(
            "requests_log_{}.txt",
            uuid::Uuid::new_v4()
        ));
        let config = Arc::new(config);

        web::Data::new(AppState {
            registry: initialize_tools(&config),
            sessions: Arc::new(SessionRegistry::new()),
            request_log: Arc::new(RequestLog::new(&config)),
            config,
        })
    }

    async fn test_app(
        state: web::Data<AppState>,
    ) -> impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    > {
        test::init_service(App::new().app_data(state).configure(register_routes)).await
    }

    fn rpc_post(path: &str, body: Value) -> actix_http::Request {
        test::TestRequest::post()
            .uri(path)
            .set_json(body)
            .to_request()
    }

    #[actix_web::test]
    async fn initialize_echoes_string_id() {
        let app = test_app(test_state()).await;
        let req = rpc_post(
            "/sse",
            json!({"jsonrpc": "2.0", "id": "init-1", "method": "initialize"}),
        );
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["id"], "init-1");
        assert_eq!(body["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(
            body["result"]["serverInfo"]["name"],
            json!(test_state().config.server_name)
        );
    }

    #[actix_web::test]
    async fn numeric_ids_stay_numeric() {
        let app = test_app(test_state()).await;
        let req = rpc_post(
            "/message",
            json!({"jsonrpc": "2.0", "id": 42, "method": "tools/list"}),
        );
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["id"], 42);
        assert!(body["result"]["tools"].as_array().unwrap().len() >= 7);
    }

    #[actix_web::test]
    async fn tools_list_ordering_is_stable() {
        let app = test_app(test_state()).await;

        let mut listings = Vec::new();
        for id in 0..2 {
            let req = rpc_post(
                "/sse",
                json!({"jsonrpc": "2.0", "id": id, "method": "tools/list"}),
            );
            let body: Value = test::call_and_read_body_json(&app, req).await;
            let names: Vec<String> = body["result"]["tools"]
                .as_array()
                .unwrap()
                .iter()
                .map(|t| t["name"].as_str().unwrap().to_string())
                .collect();
            listings.push(names);
        }
        assert_eq!(listings[0], listings[1]);
        assert!(listings[0].contains(&"execute_command".to_string()));
    }

    #[actix_web::test]
    async fn notifications_are_acknowledged_with_empty_object() {
        let app = test_app(test_state()).await;

        for body in [
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            json!({"jsonrpc": "2.0", "method": "notifications/whatever"}),
            json!({"jsonrpc": "2.0", "method": "no-such-method", "id": null}),
        ] {
            let req = rpc_post("/sse", body);
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body, json!({}));
        }
    }

    #[actix_web::test]
    async fn unknown_method_is_404_with_rpc_error() {
        let app = test_app(test_state()).await;
        let req = rpc_post(
            "/sse",
            json!({"jsonrpc": "2.0", "id": 1, "method": "resources/list"}),
        );
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], -32601);
        assert_eq!(body["error"]["message"], "Method not found: resources/list");
    }

    #[actix_web::test]
    async fn malformed_json_is_400_parse_error() {
        let app = test_app(test_state()).await;
        let req = test::TestRequest::post()
            .uri("/sse")
            .insert_header(header::ContentType::json())
            .set_payload("{nope")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], -32700);
        assert_eq!(body["id"], Value::Null);
    }

    #[actix_web::test]
    async fn wrong_version_is_400_invalid_request() {
        let app = test_app(test_state()).await;
        let req = rpc_post(
            "/sse",
            json!({"jsonrpc": "1.0", "id": 9, "method": "tools/list"}),
        );
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], -32600);
        assert_eq!(body["id"], 9);
    }

    #[actix_web::test]
    async fn tools_call_without_name_is_invalid_params() {
        let app = test_app(test_state()).await;
        let req = rpc_post(
            "/sse",
            json!({"jsonrpc": "2.0", "id": 1, "method": "tools/call", "params": {}}),
        );
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], -32602);
        assert_eq!(body["error"]["message"], "Tool name is required");
    }

    #[actix_web::test]
    async fn unknown_tool_rides_inside_a_successful_result() {
        let app = test_app(test_state()).await;
        let req = rpc_post(
            "/sse",
            json!({
                "jsonrpc": "2.0", "id": 1, "method": "tools/call",
                "params": {"name": "no_such_tool"}
            }),
        );
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].is_null());
        assert_eq!(body["result"]["isError"], false);
        let text = body["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("Unknown tool: no_such_tool"));
        assert!(text.contains("\"success\": false"));
    }

    #[actix_web::test]
    async fn tools_call_returns_pretty_text_block() {
        let app = test_app(test_state()).await;
        let req = rpc_post(
            "/sse",
            json!({
                "jsonrpc": "2.0", "id": "calc", "method": "tools/call",
                "params": {"name": "calculate", "arguments": {"expression": "2 + 2"}}
            }),
        );
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let text = body["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("\"result\": 4"));
        assert_eq!(body["result"]["content"][0]["type"], "text");
    }

    #[actix_web::test]
    async fn responses_are_mirrored_onto_an_existing_session() {
        let state = test_state();
        let mut stream = state.sessions.subscribe("mirror-me");
        let app = test_app(state.clone()).await;

        let req = test::TestRequest::post()
            .uri("/sse")
            .insert_header((CONNECTION_ID_HEADER, "mirror-me"))
            .set_json(json!({"jsonrpc": "2.0", "id": 5, "method": "initialize"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["id"], 5);

        let frame = stream.next().await.unwrap().unwrap();
        let text = String::from_utf8(frame.to_vec()).unwrap();
        let mirrored: Value =
            serde_json::from_str(text.trim_start_matches("data: ").trim()).unwrap();
        assert_eq!(mirrored, body);
    }

    #[actix_web::test]
    async fn posts_never_create_sessions() {
        let state = test_state();
        let app = test_app(state.clone()).await;

        let req = test::TestRequest::post()
            .uri("/sse")
            .insert_header((CONNECTION_ID_HEADER, "ghost"))
            .set_json(json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        assert!(!state.sessions.push("ghost", json!({})));
    }

    #[actix_web::test]
    async fn torn_down_session_goes_synchronous_only() {
        let state = test_state();
        let stream = state.sessions.subscribe("short-lived");
        drop(stream);

        let app = test_app(state.clone()).await;
        let req = test::TestRequest::post()
            .uri("/message")
            .insert_header((CONNECTION_ID_HEADER, "short-lived"))
            .set_json(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(!state.sessions.push("short-lived", json!({})));
    }

    #[actix_web::test]
    async fn legacy_call_wraps_the_text_block() {
        let state = test_state();
        let app = test_app(state.clone()).await;

        let req = test::TestRequest::post()
            .uri("/mcp/call")
            .set_json(json!({"tool": "calculate", "arguments": {"expression": "sqrt(16)"}}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let text = body["result"].as_str().unwrap();
        assert!(text.contains("\"result\": 4"));

        // The legacy path never touches the session registry
        assert!(!state.sessions.push(DEFAULT_CONNECTION_ID, json!({})));
    }

    #[actix_web::test]
    async fn catalogue_and_probes_respond() {
        let app = test_app(test_state()).await;

        let body: Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/").to_request())
                .await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["message"], "MCP Server is running");

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/health").to_request(),
        )
        .await;
        assert_eq!(body["status"], "healthy");
        assert!(body["timestamp"].is_string());

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/mcp/tools").to_request(),
        )
        .await;
        let tools = body["tools"].as_array().unwrap();
        assert!(tools.iter().any(|t| t["name"] == "generate_random_number"));
        assert!(tools.iter().all(|t| t["inputSchema"].is_object()));
    }

    #[actix_web::test]
    async fn oauth_discovery_advertises_no_support() {
        let app = test_app(test_state()).await;
        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/.well-known/oauth-authorization-server")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["detail"], "OAuth not supported");
    }

    #[actix_web::test]
    async fn configured_api_key_guards_the_endpoints() {
        let state = test_state();
        let mut config = (*state.config).clone();
        config.api_key = Some("sekrit".to_string());
        let config = Arc::new(config);
        let guarded = web::Data::new(AppState {
            registry: Arc::clone(&state.registry),
            sessions: Arc::clone(&state.sessions),
            request_log: Arc::clone(&state.request_log),
            config,
        });
        let app = test_app(guarded).await;

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/health").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["detail"], "Invalid or missing API key");

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/health")
                .insert_header(("X-API-Key", "sekrit"))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
