use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::Taskgraph;
use crate::analysis::Analysis;
use crate::config::AnalysisConfig;
use crate::export;
use crate::persistence::{PersistenceError, TaskgraphStore};
use crate::taskgraph::TaskgraphError;

pub type SharedStore = Arc<dyn TaskgraphStore + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    store: SharedStore,
    config: Arc<AnalysisConfig>,
    // Serializes read-modify-write edits against the store.
    edits: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(store: SharedStore, config: AnalysisConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
            edits: Arc::new(Mutex::new(())),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(crate::persistence::InMemoryStore::new()),
            AnalysisConfig::default(),
        )
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    Internal(String),
}

#[derive(Debug, Deserialize)]
struct DependencyPayload {
    dependency: String,
    dependent: String,
}

impl From<PersistenceError> for ApiError {
    fn from(value: PersistenceError) -> Self {
        match value {
            PersistenceError::NotFound(id) => ApiError::NotFound(format!("project {id} not found")),
            PersistenceError::InvalidProjectId(_) | PersistenceError::InvalidData(_) => {
                ApiError::Invalid(value.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<TaskgraphError> for ApiError {
    fn from(value: TaskgraphError) -> Self {
        match value {
            TaskgraphError::UnknownTask(_) => ApiError::NotFound(value.to_string()),
            TaskgraphError::WouldCreateCycle { .. }
            | TaskgraphError::SelfDependency(_)
            | TaskgraphError::DuplicateTask(_) => ApiError::Conflict(value.to_string()),
            TaskgraphError::InvalidTask(_) => ApiError::Invalid(value.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/projects", get(list_projects))
        .route("/projects/:id", get(get_project).put(put_project))
        .route("/projects/:id/analysis", get(get_analysis))
        .route("/projects/:id/dependencies", post(add_dependency))
        .route("/projects/:id/export.md", get(export_markdown))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "taskgraph HTTP API listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.store.list()?))
}

async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<Taskgraph>, ApiError> {
    Ok(Json(state.store.get(&project_id)?))
}

async fn put_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(taskgraph): Json<Taskgraph>,
) -> Result<Json<Taskgraph>, ApiError> {
    {
        let _guard = state.edits.lock();
        state.store.put(&project_id, &taskgraph)?;
    }
    debug!(project = %project_id, tasks = taskgraph.len(), "project stored");
    Ok(Json(taskgraph))
}

async fn get_analysis(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<Analysis>, ApiError> {
    let taskgraph = state.store.get(&project_id)?;
    Ok(Json(taskgraph.analyze(&state.config)))
}

async fn add_dependency(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(payload): Json<DependencyPayload>,
) -> Result<Json<Taskgraph>, ApiError> {
    let updated = {
        let _guard = state.edits.lock();
        let mut taskgraph = state.store.get(&project_id)?;
        taskgraph.add_dependency(&payload.dependency, &payload.dependent)?;
        state.store.put(&project_id, &taskgraph)?;
        taskgraph
    };
    Ok(Json(updated))
}

async fn export_markdown(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Response, ApiError> {
    let taskgraph = state.store.get(&project_id)?;
    let body = export::markdown::render(&taskgraph);
    Ok((
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        body,
    )
        .into_response())
}
