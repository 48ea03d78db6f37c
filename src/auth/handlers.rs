use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::{
    activity::model::ActivityKind,
    auth::{
        claims::Identity,
        dto::{required, LoginRequest, LoginResponse, MessageResponse, RegisterRequest},
        password::MIN_PASSWORD_LEN,
        rate_limit::LoginThrottle,
    },
    error::{ApiError, ApiJson, StoreError},
    state::AppState,
    users::model::{is_valid_email, normalize_email},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let password = payload.password.filter(|p| !p.is_empty());
    let (Some(name), Some(email), Some(password)) =
        (required(payload.name), required(payload.email), password)
    else {
        return Err(ApiError::validation("Please provide all required fields"));
    };

    let email = normalize_email(&email);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::validation("Invalid email"));
    }
    if password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(ApiError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let user = match state.credentials.create(&name, &email, &password).await {
        Ok(u) => u,
        Err(StoreError::DuplicateEmail) => {
            warn!(email = %email, "email already registered");
            return Err(StoreError::DuplicateEmail.into());
        }
        Err(e) => return Err(e.into()),
    };

    state.activity.record(user.id, ActivityKind::Register, json!({}));
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered successfully")),
    ))
}

/// `LoginThrottle` runs first, so throttled attempts never reach the store.
#[instrument(skip_all)]
pub async fn login(
    _throttle: LoginThrottle,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let password = payload.password.filter(|p| !p.is_empty());
    let (Some(email), Some(password)) = (required(payload.email), password) else {
        return Err(ApiError::validation("Please provide email and password"));
    };

    let Some(user) = state.credentials.verify_credentials(&email, &password).await? else {
        warn!(email = %normalize_email(&email), "login rejected");
        return Err(ApiError::unauthenticated("Invalid credentials"));
    };

    let token = state.keys.issue(&Identity::from(&user))?;
    state.activity.record(user.id, ActivityKind::Login, json!({}));
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}
