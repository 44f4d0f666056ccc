use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Extension, Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{ChangePasswordRequest, CredentialsRequest, PublicUser},
        extractors::{Session, AUTH_HEADER},
        services,
    },
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/users/login", post(login))
}

/// Routes that sit behind the session gate.
pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(get_me))
        .route("/users/me/token", delete(logout))
        .route("/users/me/password", patch(change_password))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    let (user, token) = services::register(&state, &payload.email, &payload.password).await?;
    Ok(([(AUTH_HEADER, token)], Json(PublicUser::from(&user))))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    // A malformed login body is still just a failed login.
    let Json(payload) = payload.map_err(|_| AppError::Authentication)?;
    let mut user = services::authenticate(&state, &payload.email, &payload.password).await?;
    let token = services::issue_session(&state, &mut user).await?;
    info!(user_id = %user.id, "user logged in");
    Ok(([(AUTH_HEADER, token)], Json(PublicUser::from(&user))))
}

#[instrument(skip_all, fields(user_id = %session.user.id))]
pub async fn get_me(Extension(session): Extension<Session>) -> Json<PublicUser> {
    Json(PublicUser::from(&session.user))
}

#[instrument(skip_all, fields(user_id = %session.user.id))]
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<StatusCode, AppError> {
    services::revoke_session(&state, &session.user, &session.token).await?;
    Ok(StatusCode::OK)
}

#[instrument(skip_all, fields(user_id = %session.user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<PublicUser>, AppError> {
    let Json(payload) = payload?;
    let user = services::change_password(&state, session.user, &payload.password).await?;
    Ok(Json(PublicUser::from(&user)))
}

#[cfg(test)]
mod me_tests {
    use super::*;

    #[test]
    fn public_user_hides_credentials() {
        let response = PublicUser {
            id: uuid::Uuid::new_v4(),
            email: "test@example.com".to_string(),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["email"], "test@example.com");
        assert!(json.get("_id").is_some());
        assert!(json.get("password_hash").is_none());
        assert!(json.get("tokens").is_none());
    }
}
