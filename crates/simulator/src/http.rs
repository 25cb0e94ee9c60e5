//! Control surface of the simulator.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use habit_core::api::{
    ErrorResponse, IntervalRequest, LogsResponse, NextEventResponse, RunToggleResponse,
    SimulatorSnapshot, StatusResponse, TaskView,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::controller::{SimError, Simulator};
use crate::store_client::ActivityStore;

impl IntoResponse for SimError {
    fn into_response(self) -> Response {
        let status = match self {
            SimError::UnknownTask(_) => StatusCode::NOT_FOUND,
            SimError::InvalidInterval => StatusCode::BAD_REQUEST,
            SimError::Closed => StatusCode::SERVICE_UNAVAILABLE,
        };
        debug!(status = %status, error = %self, "control request rejected");
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

pub fn router<S: ActivityStore>(sim: Simulator<S>) -> Router {
    Router::new()
        .route("/", get(snapshot::<S>))
        .route("/healthz", get(|| async { "ok" }))
        .route("/tasks", get(tasks::<S>))
        .route("/tasks/{task_id}/toggle", post(toggle_task::<S>))
        .route("/interval", post(set_interval::<S>))
        .route("/run/toggle", post(toggle_run::<S>))
        .route("/logs", get(logs::<S>))
        .route("/next_event", get(next_event::<S>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(sim)
}

async fn snapshot<S: ActivityStore>(State(sim): State<Simulator<S>>) -> Json<SimulatorSnapshot> {
    Json(sim.snapshot())
}

async fn tasks<S: ActivityStore>(State(sim): State<Simulator<S>>) -> Json<Vec<TaskView>> {
    Json(sim.tasks())
}

async fn toggle_task<S: ActivityStore>(
    State(sim): State<Simulator<S>>,
    Path(task_id): Path<String>,
) -> Result<Json<StatusResponse>, SimError> {
    sim.toggle_task(&task_id)?;
    Ok(Json(StatusResponse::success()))
}

async fn set_interval<S: ActivityStore>(
    State(sim): State<Simulator<S>>,
    body: Result<Json<IntervalRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, SimError> {
    let seconds = body
        .ok()
        .and_then(|Json(req)| req.interval)
        .and_then(|v| v.as_f64())
        .ok_or(SimError::InvalidInterval)?;
    sim.set_interval(seconds)?;
    Ok(Json(StatusResponse::success()))
}

async fn toggle_run<S: ActivityStore>(
    State(sim): State<Simulator<S>>,
) -> Result<Json<RunToggleResponse>, SimError> {
    let is_running = sim.toggle_run()?;
    Ok(Json(RunToggleResponse {
        status: "success".into(),
        is_running,
    }))
}

async fn logs<S: ActivityStore>(State(sim): State<Simulator<S>>) -> Json<LogsResponse> {
    Json(LogsResponse { logs: sim.logs() })
}

async fn next_event<S: ActivityStore>(State(sim): State<Simulator<S>>) -> Json<NextEventResponse> {
    Json(NextEventResponse {
        next_event_time: sim.next_event_time(),
    })
}
