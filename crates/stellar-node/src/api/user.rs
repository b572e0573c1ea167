//! Account endpoints: sign-up and bearer sessions.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use stellar_core::{Actor, Credentials, Registration, Role, User};
use tracing::info;

use crate::api::error::ApiResult;
use crate::api::extract::ApiJson;
use crate::auth::Session;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

/// Issued session.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub full_name: String,
    pub role: Role,
}

/// Sign up as a plain user.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(registration): ApiJson<Registration>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let user = state.accounts.register(registration).await?;
    Ok((StatusCode::CREATED, Json(UserResponse { user })))
}

/// Check credentials and issue a bearer token.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> ApiResult<Json<LoginResponse>> {
    let user = state.accounts.authenticate(credentials).await?;
    let access_token = state
        .tokens
        .issue(Actor {
            id: user.id,
            role: user.role,
        })
        .await;
    info!(user_id = user.id, "session started");

    Ok(Json(LoginResponse {
        access_token,
        full_name: user.full_name,
        role: user.role,
    }))
}

/// Revoke the presented token.
pub async fn logout(State(state): State<AppState>, session: Session) -> StatusCode {
    state.tokens.revoke(&session.token).await;
    info!(user_id = session.actor.id, "session ended");
    StatusCode::NO_CONTENT
}
