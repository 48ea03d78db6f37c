use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use crate::{
    error::ApiError,
    state::AppState,
    users::model::{PublicUser, Role},
};

/// Bearer token verified and resolved to a live user. Stale tokens whose
/// user no longer exists are rejected like any other bad token.
pub struct AuthUser(pub PublicUser);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<PublicUser>() {
            return Ok(AuthUser(user.clone()));
        }

        // Expect "Bearer <token>"
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer ").or_else(|| h.strip_prefix("bearer ")))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::unauthenticated("Authentication required"))?;

        let claims = state.keys.verify(token).map_err(|e| {
            warn!(error = %e, "token rejected");
            ApiError::unauthenticated("Authentication failed")
        })?;

        let user = state.credentials.find_by_id(claims.id).await?.ok_or_else(|| {
            warn!(user_id = %claims.id, "token for unknown user");
            ApiError::unauthenticated("User not found")
        })?;

        let user = PublicUser::from(user);
        parts.extensions.insert(user.clone());
        Ok(AuthUser(user))
    }
}

/// `AuthUser` whose stored role is `admin`.
pub struct AdminUser(pub PublicUser);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            warn!(user_id = %user.id, "admin route denied");
            return Err(ApiError::forbidden("Access denied: Admin privileges required"));
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::Identity;
    use axum::http::{Request, StatusCode};
    use uuid::Uuid;

    fn parts_with(auth: Option<&str>) -> Parts {
        let mut req = Request::builder().uri("/api/users/me");
        if let Some(value) = auth {
            req = req.header(AUTHORIZATION, value);
        }
        req.body(()).unwrap().into_parts().0
    }

    async fn reject(state: &AppState, auth: Option<&str>) -> StatusCode {
        let mut parts = parts_with(auth);
        match AuthUser::from_request_parts(&mut parts, state).await {
            Ok(_) => StatusCode::OK,
            Err(e) => e.status(),
        }
    }

    #[tokio::test]
    async fn missing_or_malformed_header_is_unauthenticated() {
        let state = AppState::in_memory();
        assert_eq!(reject(&state, None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(reject(&state, Some("Token abc")).await, StatusCode::UNAUTHORIZED);
        assert_eq!(reject(&state, Some("Bearer ")).await, StatusCode::UNAUTHORIZED);
        assert_eq!(reject(&state, Some("Bearer not-a-jwt")).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn token_for_deleted_user_is_unauthenticated() {
        let state = AppState::in_memory();
        let ghost = Identity {
            id: Uuid::new_v4(),
            email: "ghost@x.com".into(),
            name: "Ghost".into(),
            role: Role::Admin,
        };
        let token = state.keys.issue(&ghost).unwrap();
        let header = format!("Bearer {token}");
        assert_eq!(reject(&state, Some(&header)).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn resolves_user_and_gates_admin() {
        let state = AppState::in_memory();
        let ann = state.credentials.create("Ann", "ann@x.com", "Secret123!").await.unwrap();
        let header = format!("Bearer {}", state.keys.issue(&Identity::from(&ann)).unwrap());

        let mut parts = parts_with(Some(&header));
        let AuthUser(user) = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.id, ann.id);
        assert_eq!(user.email, "ann@x.com");

        let mut parts = parts_with(Some(&header));
        let err = AdminUser::from_request_parts(&mut parts, &state).await.err().unwrap();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn role_claim_alone_does_not_grant_admin() {
        let state = AppState::in_memory();
        let ann = state.credentials.create("Ann", "ann@x.com", "Secret123!").await.unwrap();
        // Claims say admin, the stored record says user.
        let mut identity = Identity::from(&ann);
        identity.role = Role::Admin;
        let header = format!("Bearer {}", state.keys.issue(&identity).unwrap());

        let mut parts = parts_with(Some(&header));
        let err = AdminUser::from_request_parts(&mut parts, &state).await.err().unwrap();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }
}
