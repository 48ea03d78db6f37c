use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::dto::ActivitySummary;
use crate::{
    activity::{model::ActivityKind, recorder::FEED_LIMIT},
    auth::extractors::AdminUser,
    error::ApiError,
    state::AppState,
    users::model::PublicUser,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/activity", get(activity_summary))
}

#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let users = state.credentials.list().await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn activity_summary(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> Result<Json<ActivitySummary>, ApiError> {
    let (logins, registrations, total_jobs) = tokio::try_join!(
        state.activity.recent(ActivityKind::Login, FEED_LIMIT),
        state.activity.recent(ActivityKind::Register, FEED_LIMIT),
        state.jobs.count_all(),
    )?;
    Ok(Json(ActivitySummary {
        logins,
        registrations,
        total_jobs,
    }))
}
