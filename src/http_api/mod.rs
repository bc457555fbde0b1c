use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::activity::Activity;
use crate::checks::{self, Finding, ThresholdConfig};
use crate::metadata::ProjectMetadata;
use crate::project::{Project, ScheduleSummary};
use crate::project_validation;
use crate::risk::{self, ActivityDistribution, CancellationToken, SimulationResult};

#[derive(Clone)]
pub struct AppState {
    project: Arc<RwLock<Project>>,
}

impl AppState {
    pub fn new(project: Project) -> Self {
        Self {
            project: Arc::new(RwLock::new(project)),
        }
    }

    pub fn with_shared(project: Arc<RwLock<Project>>) -> Self {
        Self { project }
    }

    fn project(&self) -> Arc<RwLock<Project>> {
        self.project.clone()
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
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(message) => {
                let body = Json(ErrorBody {
                    error: "not_found",
                    message,
                });
                (StatusCode::NOT_FOUND, body).into_response()
            }
            ApiError::Conflict(message) => {
                let body = Json(ErrorBody {
                    error: "conflict",
                    message,
                });
                (StatusCode::CONFLICT, body).into_response()
            }
            ApiError::Invalid(message) => {
                let body = Json(ErrorBody {
                    error: "invalid_request",
                    message,
                });
                (StatusCode::BAD_REQUEST, body).into_response()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct SimulatePayload {
    iterations: u32,
    seed: u64,
    #[serde(default)]
    distributions: Vec<ActivityDistribution>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metadata", get(get_metadata).put(update_metadata))
        .route("/activities", get(list_activities).post(create_activity))
        .route(
            "/activities/:id",
            get(get_activity).put(update_activity).delete(delete_activity),
        )
        .route("/schedule", post(run_schedule))
        .route("/check", post(run_check))
        .route("/simulate", post(run_simulation))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, project: Project) -> std::io::Result<()> {
    let state = AppState::new(project);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_metadata(State(state): State<AppState>) -> Json<ProjectMetadata> {
    let project = state.project();
    let metadata = {
        let guard = project.read();
        guard.metadata().clone()
    };
    Json(metadata)
}

async fn update_metadata(
    State(state): State<AppState>,
    Json(metadata): Json<ProjectMetadata>,
) -> Json<ProjectMetadata> {
    let project = state.project();
    let mut guard = project.write();
    guard.set_metadata(metadata);
    Json(guard.metadata().clone())
}

async fn list_activities(State(state): State<AppState>) -> Json<Vec<Activity>> {
    let project = state.project();
    let activities = {
        let guard = project.read();
        guard.activities().to_vec()
    };
    Json(activities)
}

async fn get_activity(
    State(state): State<AppState>,
    Path(activity_id): Path<i32>,
) -> Result<Json<Activity>, ApiError> {
    let project = state.project();
    let guard = project.read();
    match guard.find_activity(activity_id) {
        Some(activity) => Ok(Json(activity.clone())),
        None => Err(ApiError::not_found(format!(
            "activity {activity_id} not found"
        ))),
    }
}

async fn create_activity(
    State(state): State<AppState>,
    Json(activity): Json<Activity>,
) -> Result<(StatusCode, Json<Activity>), ApiError> {
    project_validation::validate_activity(&activity)
        .map_err(|err| ApiError::invalid(err.to_string()))?;
    let project = state.project();
    let mut guard = project.write();
    if guard.find_activity(activity.id).is_some() {
        return Err(ApiError::Conflict(format!(
            "activity {} already exists",
            activity.id
        )));
    }
    guard.upsert_activity(activity.clone());
    Ok((StatusCode::CREATED, Json(activity)))
}

async fn update_activity(
    State(state): State<AppState>,
    Path(activity_id): Path<i32>,
    Json(activity): Json<Activity>,
) -> Result<Json<Activity>, ApiError> {
    if activity.id != activity_id {
        return Err(ApiError::invalid(
            "activity id in payload does not match path parameter",
        ));
    }
    project_validation::validate_activity(&activity)
        .map_err(|err| ApiError::invalid(err.to_string()))?;
    let project = state.project();
    let mut guard = project.write();
    if guard.find_activity(activity_id).is_none() {
        return Err(ApiError::not_found(format!(
            "activity {activity_id} not found"
        )));
    }
    guard.upsert_activity(activity.clone());
    Ok(Json(activity))
}

async fn delete_activity(
    State(state): State<AppState>,
    Path(activity_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let project = state.project();
    let removed = {
        let mut guard = project.write();
        guard.remove_activity(activity_id)
    };
    if !removed {
        return Err(ApiError::not_found(format!(
            "activity {activity_id} not found"
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn run_schedule(State(state): State<AppState>) -> Result<Json<ScheduleSummary>, ApiError> {
    let project = state.project();
    let mut guard = project.write();
    let summary = guard
        .schedule()
        .map_err(|err| ApiError::invalid(err.to_string()))?;
    Ok(Json(summary))
}

async fn run_check(
    State(state): State<AppState>,
    Json(config): Json<ThresholdConfig>,
) -> Result<Json<Vec<Finding>>, ApiError> {
    let project = state.project();
    let guard = project.read();
    let findings =
        checks::run_checks(&guard, &config).map_err(|err| ApiError::invalid(err.to_string()))?;
    Ok(Json(findings))
}

async fn run_simulation(
    State(state): State<AppState>,
    Json(payload): Json<SimulatePayload>,
) -> Result<Json<SimulationResult>, ApiError> {
    let project = state.project();
    // Simulate over a snapshot so a long run never holds the lock.
    let snapshot = {
        let guard = project.read();
        guard.clone()
    };
    let cancel = CancellationToken::new();
    let result = risk::simulate(
        &snapshot,
        &payload.distributions,
        payload.iterations,
        payload.seed,
        &cancel,
    )
    .map_err(|err| ApiError::invalid(err.to_string()))?;
    Ok(Json(result))
}
