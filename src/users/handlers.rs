use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{ChangePasswordRequest, UpdateProfileRequest},
    model::{is_valid_email, normalize_email, PublicUser},
};
use crate::{
    auth::{
        dto::{required, MessageResponse},
        extractors::AuthUser,
        password::MIN_PASSWORD_LEN,
    },
    error::{ApiError, ApiJson},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(get_me))
        .route("/users/profile", put(update_profile))
        .route("/users/password", put(change_password))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<PublicUser> {
    Json(user)
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    let (Some(name), Some(email)) = (required(payload.name), required(payload.email)) else {
        return Err(ApiError::validation("Please provide name and email"));
    };
    let email = normalize_email(&email);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::validation("Invalid email"));
    }

    let updated = state.credentials.update_profile(user.id, &name, &email).await?;
    info!("profile updated");
    Ok(Json(updated.into()))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let current = payload.current_password.filter(|p| !p.is_empty());
    let new = payload.new_password.filter(|p| !p.is_empty());
    let (Some(current), Some(new)) = (current, new) else {
        return Err(ApiError::validation("Please provide current and new password"));
    };
    if new.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    if !state.credentials.change_password(user.id, &current, &new).await? {
        warn!("wrong current password");
        return Err(ApiError::unauthenticated("Current password is incorrect"));
    }
    info!("password changed");
    Ok(Json(MessageResponse::new("Password updated successfully")))
}
