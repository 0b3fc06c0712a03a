//! HTTP control surface for Clickmon.
//!
//! Starts, lists and stops comment-monitoring sessions. Starting a session
//! returns as soon as the monitor is spawned; the monitor keeps running in
//! the background until it is stopped or the process exits.
//!
//! Built on Axum.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use clickmon_core::task::TaskId;
use clickmon_monitor::{AnswerGenerator, LaunchError, SessionInfo, SessionRegistry};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{error, info, warn};

/// Shared application state for the gateway.
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
}

type SharedState = Arc<AppState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/monitor", get(list_handler))
        .route("/monitor/{task_id}", post(start_handler).delete(stop_handler))
        .layer(cors_layer(cors_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// `["*"]` allows every origin; anything else is an exact allow list.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the gateway HTTP server.
///
/// The task service client, provider and answer generator are built once
/// and shared by every session.
pub async fn start(config: clickmon_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let service = Arc::new(clickmon_clickup::ClickUpClient::from_config(&config.clickup));
    let providers = clickmon_providers::router::build_from_config(&config);
    let provider = providers
        .default()
        .ok_or_else(|| format!("Provider '{}' is not configured", config.default_provider))?;
    let model = clickmon_providers::router::default_model(&config);
    let answers = Arc::new(AnswerGenerator::from_config(provider, model, &config));
    let registry = Arc::new(SessionRegistry::from_config(service, answers, &config.monitor));

    let app = build_router(
        Arc::new(AppState {
            registry: registry.clone(),
        }),
        &config.gateway.cors_origins,
    );

    info!(addr = %addr, provider = %config.default_provider, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    registry.shutdown_all();
    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

// --- Errors ---

/// Error body `{"detail": "..."}`.
struct ApiError {
    status: StatusCode,
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "detail": self.detail }))).into_response()
    }
}

impl From<LaunchError> for ApiError {
    fn from(e: LaunchError) -> Self {
        let status = match e {
            LaunchError::AlreadyMonitoring(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            detail: e.to_string(),
        }
    }
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

#[derive(Serialize)]
struct StartResponse {
    status: &'static str,
    message: String,
}

async fn start_handler(
    State(state): State<SharedState>,
    Path(task_id): Path<String>,
) -> Result<Json<StartResponse>, ApiError> {
    let info = state.registry.start(TaskId::new(task_id)).map_err(|e| {
        error!(error = %e, "Failed to start monitoring");
        ApiError::from(e)
    })?;

    Ok(Json(StartResponse {
        status: "success",
        message: format!("Started monitoring task {}", info.task_id),
    }))
}

#[derive(Serialize)]
struct SessionsResponse {
    sessions: Vec<SessionInfo>,
}

async fn list_handler(State(state): State<SharedState>) -> Json<SessionsResponse> {
    Json(SessionsResponse {
        sessions: state.registry.list(),
    })
}

#[derive(Serialize)]
struct StopResponse {
    status: &'static str,
    stopped: usize,
}

async fn stop_handler(
    State(state): State<SharedState>,
    Path(task_id): Path<String>,
) -> Result<Json<StopResponse>, ApiError> {
    let task_id = TaskId::new(task_id);
    match state.registry.stop(&task_id) {
        0 => Err(ApiError {
            status: StatusCode::NOT_FOUND,
            detail: format!("Task {task_id} is not being monitored"),
        }),
        stopped => Ok(Json(StopResponse {
            status: "success",
            stopped,
        })),
    }
}
