//! HTTP dispatch for the waypoint coordination server.
//!
//! Every mutating endpoint (`/plan`, `/add_task`, `/reset`) holds the session
//! mutex for its whole handler; read-only endpoints lock briefly to take a
//! consistent snapshot, release, then serialize. `/plan` is inherently
//! serial: the planner reads and writes shared state and dominates latency
//! anyway.

pub mod coordinator;
pub mod dto;
pub mod error;
pub mod report;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, Uri};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::info;

use crate::coordinator::Coordinator;
use crate::dto::{
    AddTaskRequest, AddTaskResponse, AgentTaskStatus, HealthResponse, PlanRequest, PlanResponse,
    ResetResponse, StatusResponse,
};
use crate::error::ApiError;
use crate::report::Report;

/// Static deployment facts served by `/status`.
#[derive(Debug)]
pub struct ServerInfo {
    pub map_file: String,
    pub rows: usize,
    pub cols: usize,
    pub port: u16,
    pub started_at: Instant,
}

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Mutex<Coordinator>>,
    pub info: Arc<ServerInfo>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/plan", post(plan))
        .route("/report", get(report))
        .route("/reset", post(reset))
        .route("/add_task", post(add_task))
        .route("/task_status", get(task_status))
        .route("/health", get(health))
        .route("/status", get(status))
        .fallback(not_found)
        .with_state(state)
}

pub async fn run_server(state: AppState, listen: SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .context("bind server listener failed")?;
    info!(%listen, "waypoint server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated with error")
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown requested; draining connections");
}

async fn plan(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PlanResponse>, ApiError> {
    let request: PlanRequest = serde_json::from_slice(&body)
        .map_err(|err| ApiError::InvalidRequest(format!("malformed planning request: {err}")))?;
    if let Some(goals) = &request.goals {
        if !goals.is_array() {
            return Err(ApiError::InvalidRequest(
                "goals must be an array when present".to_string(),
            ));
        }
    }
    let agents = request
        .agents
        .iter()
        .map(|agent| agent.to_state())
        .collect::<Result<Vec<_>, _>>()?;

    let mut coordinator = state.coordinator.lock().await;
    let response = coordinator.plan_step(agents).await?;
    Ok(Json(response))
}

async fn add_task(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AddTaskResponse>, ApiError> {
    let request: AddTaskRequest = serde_json::from_slice(&body).map_err(|err| {
        ApiError::InvalidRequest(format!("malformed add_task request: {err}"))
    })?;
    let mut coordinator = state.coordinator.lock().await;
    let response = coordinator.add_task(request)?;
    Ok(Json(response))
}

async fn reset(State(state): State<AppState>) -> Json<ResetResponse> {
    let mut coordinator = state.coordinator.lock().await;
    coordinator.reset();
    Json(ResetResponse { status: "success" })
}

async fn report(State(state): State<AppState>) -> Result<Json<Report>, ApiError> {
    let report = {
        let coordinator = state.coordinator.lock().await;
        coordinator.report()?
    };
    Ok(Json(report))
}

async fn task_status(
    State(state): State<AppState>,
) -> Result<Json<Vec<AgentTaskStatus>>, ApiError> {
    let status = {
        let coordinator = state.coordinator.lock().await;
        coordinator.task_status()?
    };
    Ok(Json(status))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now().timestamp(),
    })
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let info = &state.info;
    Json(StatusResponse {
        status: "running",
        map_file: info.map_file.clone(),
        map_size: (info.rows, info.cols),
        port: info.port,
        uptime: info.started_at.elapsed().as_secs(),
    })
}

async fn not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::NotFound(format!("Endpoint not found: {method} {}", uri.path()))
}
