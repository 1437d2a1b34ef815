//! Axum-based HTTP server for the control-panel API.
//!
//! Provides REST endpoints for:
//! - GET `/api/state` - Current bridge state snapshot
//! - POST `/api/request/raise` - Request the span to open
//! - POST `/api/request/lower` - Request the span to close
//! - POST `/api/request/abort` - Request the current motion to abort
//! - POST `/api/request/clear` - Clear all pending request flags
//! - POST `/api/estop/on` / `/api/estop/off` - Operator e-stop latch
//! - POST `/api/config` - Change one validated configuration parameter
//! - GET `/` - Control panel page
//!
//! The handlers only set request flags and read snapshots; the tick driver
//! keeps sole ownership of the control cycle.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::config::WebConfig;
use crate::sensing::PanelCommand;
use crate::parsing::parse_param_json;
use crate::traits::BridgeEffectors;

use super::api::{ApiResponse, CommandResponse, StateResponse};
use super::shared::SharedBridge;

// ============================================================================
// Route Handlers
// ============================================================================

/// GET /api/state - Returns the current bridge state
async fn get_state<IO: BridgeEffectors + Send + 'static>(
    State(state): State<Arc<SharedBridge<IO>>>,
) -> Json<ApiResponse<StateResponse>> {
    let status = state.status();
    Json(ApiResponse::ok(StateResponse::new(
        &status,
        state.requests(),
        state.estop_latched(),
    )))
}

/// POST /api/request/{raise,lower,abort,clear} - Set a panel request flag
async fn apply_request<IO: BridgeEffectors + Send + 'static>(
    state: Arc<SharedBridge<IO>>,
    command: PanelCommand,
) -> Json<ApiResponse<CommandResponse>> {
    state.apply_command(command);
    Json(ApiResponse::ok(CommandResponse::accepted(command.as_str())))
}

/// POST /api/estop/{on,off} - Operator e-stop latch
async fn set_estop<IO: BridgeEffectors + Send + 'static>(
    state: Arc<SharedBridge<IO>>,
    latched: bool,
) -> Json<ApiResponse<CommandResponse>> {
    state.set_estop(latched);
    let result = if latched { "estop_on" } else { "estop_off" };
    Json(ApiResponse::ok(CommandResponse::accepted(result)))
}

/// POST /api/config - Change one configuration parameter
///
/// Accepts JSON: `{"name": "open_max_ms", "value": "9000"}`
/// Uses the same simple parser as embedded panels for consistency.
async fn set_config<IO: BridgeEffectors + Send + 'static>(
    State(state): State<Arc<SharedBridge<IO>>>,
    body: Bytes,
) -> Json<ApiResponse<CommandResponse>> {
    let body_str = std::str::from_utf8(&body).unwrap_or("");

    let Some((name, value)) = parse_param_json(body_str) else {
        return Json(ApiResponse::err("Invalid config request"));
    };

    match state.set_param(name, value) {
        Ok(()) => Json(ApiResponse::ok(CommandResponse::accepted("param_set"))),
        Err(e) => Json(ApiResponse::ok(CommandResponse::rejected(format!("{e}")))),
    }
}

/// GET / - Serve the control panel
async fn index() -> impl IntoResponse {
    Html(include_str!("../../www/index.html"))
}

/// Fallback handler for 404
async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::err("Not found")),
    )
}

// ============================================================================
// Server Builder
// ============================================================================

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebServerConfig {
    /// Address to bind to
    pub addr: SocketAddr,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".parse().unwrap(),
            cors_permissive: true,
        }
    }
}

impl WebServerConfig {
    /// Create a new config with the given address
    pub fn new(addr: impl Into<SocketAddr>) -> Self {
        Self {
            addr: addr.into(),
            ..Default::default()
        }
    }

    /// Set whether CORS should be permissive
    pub fn cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// Create from shared WebConfig
    pub fn from_config(config: &WebConfig) -> Self {
        Self {
            addr: ([0, 0, 0, 0], config.port).into(),
            cors_permissive: config.cors_permissive,
        }
    }
}

/// Build the Axum router with all routes
pub fn build_router<IO: BridgeEffectors + Send + 'static>(
    state: Arc<SharedBridge<IO>>,
    config: &WebServerConfig,
) -> Router {
    let mut router = Router::new()
        // API routes
        .route("/api/state", get(get_state::<IO>))
        .route(
            "/api/request/raise",
            post(|State(s): State<Arc<SharedBridge<IO>>>| apply_request(s, PanelCommand::Raise)),
        )
        .route(
            "/api/request/lower",
            post(|State(s): State<Arc<SharedBridge<IO>>>| apply_request(s, PanelCommand::Lower)),
        )
        .route(
            "/api/request/abort",
            post(|State(s): State<Arc<SharedBridge<IO>>>| apply_request(s, PanelCommand::Abort)),
        )
        .route(
            "/api/request/clear",
            post(|State(s): State<Arc<SharedBridge<IO>>>| apply_request(s, PanelCommand::Clear)),
        )
        .route(
            "/api/estop/on",
            post(|State(s): State<Arc<SharedBridge<IO>>>| set_estop(s, true)),
        )
        .route(
            "/api/estop/off",
            post(|State(s): State<Arc<SharedBridge<IO>>>| set_estop(s, false)),
        )
        .route("/api/config", post(set_config::<IO>))
        // Panel UI
        .route("/", get(index))
        // Fallback
        .fallback(not_found)
        .with_state(state);

    // Add CORS if requested
    if config.cors_permissive {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router
}

/// Start the web server
///
/// This function blocks until the server is shut down. Use
/// [`run_server_with_state`] to share state with the tick driver — which
/// any real deployment needs, since the server itself never ticks the
/// machine.
pub async fn run_server<IO: BridgeEffectors + Send + 'static>(
    state: SharedBridge<IO>,
    config: WebServerConfig,
) -> Result<(), std::io::Error> {
    run_server_with_state(Arc::new(state), config).await
}

/// Start the web server with shared state
///
/// # Example
///
/// ```ignore
/// let state = Arc::new(SharedBridge::new(machine, config));
///
/// // Tick driver owns the control cycle
/// let driver_state = Arc::clone(&state);
/// std::thread::spawn(move || loop {
///     let inputs = sampler.sample(&driver_state.config().detection, driver_state.requests());
///     driver_state.tick(inputs).unwrap();
///     std::thread::sleep(Duration::from_millis(50));
/// });
///
/// run_server_with_state(state, web_config).await?;
/// ```
pub async fn run_server_with_state<IO: BridgeEffectors + Send + 'static>(
    state: Arc<SharedBridge<IO>>,
    config: WebServerConfig,
) -> Result<(), std::io::Error> {
    let router = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    println!("Control panel listening on http://{}", config.addr);

    axum::serve(listener, router).await
}
