use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{dto::JobPayload, model::JobApplication};
use crate::{
    auth::{dto::MessageResponse, extractors::AuthUser},
    error::{ApiError, ApiJson, StoreError},
    state::AppState,
};

pub fn job_routes() -> Router<AppState> {
    Router::new()
        .route("/jobs", get(list_jobs).post(create_job))
        .route("/jobs/:id", get(get_job).put(update_job).delete(delete_job))
}

/// Unparseable ids get the same answer as unknown or foreign ones.
fn job_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| job_not_found())
}

fn job_not_found() -> ApiError {
    ApiError::not_found("Job not found")
}

fn scoped(e: StoreError) -> ApiError {
    match e {
        StoreError::NotFound => job_not_found(),
        other => other.into(),
    }
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list_jobs(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<JobApplication>>, ApiError> {
    let jobs = state.jobs.list(user.id).await?;
    Ok(Json(jobs))
}

#[instrument(skip_all, fields(user_id = %user.id, job_id = %id))]
pub async fn get_job(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<JobApplication>, ApiError> {
    let job = state.jobs.get(user.id, job_id(&id)?).await.map_err(scoped)?;
    Ok(Json(job))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_job(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(payload): ApiJson<JobPayload>,
) -> Result<(StatusCode, Json<JobApplication>), ApiError> {
    let job = state.jobs.create(user.id, payload.into_new_job()?).await?;
    info!(job_id = %job.id, "job created");
    Ok((StatusCode::CREATED, Json(job)))
}

#[instrument(skip_all, fields(user_id = %user.id, job_id = %id))]
pub async fn update_job(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<JobPayload>,
) -> Result<Json<JobApplication>, ApiError> {
    let id = job_id(&id)?;
    let job = state
        .jobs
        .update(user.id, id, payload.into_changes()?)
        .await
        .map_err(scoped)?;
    info!("job updated");
    Ok(Json(job))
}

#[instrument(skip_all, fields(user_id = %user.id, job_id = %id))]
pub async fn delete_job(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.jobs.delete(user.id, job_id(&id)?).await.map_err(scoped)?;
    info!("job deleted");
    Ok(Json(MessageResponse::new("Job deleted")))
}
