use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use common::{JobClass, JobRequest};
use libsupervisor::{LaunchError, ProcessManager, SubmitError};
use serde_json::{Value, json};
use tracing::error;

pub fn router(manager: Arc<ProcessManager>) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/health", get(health))
        .route("/jobs", get(list_jobs).post(submit_job))
        .with_state(manager)
}

async fn status(State(manager): State<Arc<ProcessManager>>) -> (StatusCode, Json<Value>) {
    match serde_json::to_value(manager.status().await) {
        Ok(v) => (StatusCode::OK, Json(v)),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "msg": e.to_string() })),
        ),
    }
}

async fn health(State(manager): State<Arc<ProcessManager>>) -> StatusCode {
    if manager.can_accept(JobClass::Other).await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn list_jobs(State(manager): State<Arc<ProcessManager>>) -> Json<Vec<String>> {
    let mut jobs = manager.list_active().await;
    jobs.sort();
    Json(jobs)
}

async fn submit_job(
    State(manager): State<Arc<ProcessManager>>,
    Json(request): Json<JobRequest>,
) -> (StatusCode, Json<Value>) {
    let job_id = request.job_id.clone();
    match manager.submit(request).await {
        Ok(handler_id) => (
            StatusCode::ACCEPTED,
            Json(json!({ "jobId": job_id, "handlerId": handler_id })),
        ),
        Err(e) => {
            let code = match &e {
                SubmitError::Rejected(_) | SubmitError::Launch(LaunchError::AlreadyActive(_)) => {
                    StatusCode::CONFLICT
                }
                SubmitError::Launch(LaunchError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
                SubmitError::Launch(_) => {
                    error!(job_id = %job_id, "failed to start job: {e}");
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            (code, Json(json!({ "jobId": job_id, "msg": e.to_string() })))
        }
    }
}
