use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, warn};

use rally_types::api::{AuthResponse, LoginRequest, MessageResponse};

use crate::AppState;
use crate::error::ApiError;
use crate::middleware::{SESSION_COOKIE, create_token, decode_token, removal_cookie, session_cookie};
use crate::session::Session;

/// POST /api/auth/login — join a group by invite code.
///
/// An unknown username in the group is registered on the spot with the given
/// password. A known username must present the same password.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    if req.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if req.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }
    if req.group_code.is_empty() {
        return Err(ApiError::validation("Group code is required"));
    }

    let group = state
        .store
        .get_group_by_invite_code(&req.group_code)
        .await?
        .ok_or_else(|| ApiError::not_found("Invalid group code"))?;

    let user = match state
        .store
        .get_user_by_username_and_group(&req.username, group.id)
        .await?
    {
        Some(user) => {
            // Plaintext comparison.
            if user.password != req.password {
                warn!("Bad password for {} in group {}", user.username, group.id);
                return Err(ApiError::Unauthorized("Invalid credentials".into()));
            }
            user
        }
        None => {
            let user = state
                .store
                .create_user(&req.username, &req.password, group.id)
                .await?;
            info!("User {} joined group {}", user.username, group.id);
            user
        }
    };

    let session = state.sessions.create(user.id, group.id).await;
    let token = create_token(&state.session_secret, &session)?;

    Ok((
        jar.add(session_cookie(token, state.cookie_secure)),
        Json(AuthResponse { user, group }),
    ))
}

/// POST /api/auth/logout — always succeeds, with or without a session.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(claims) = jar
        .get(SESSION_COOKIE)
        .and_then(|c| decode_token(&state.session_secret, c.value()))
    {
        state.sessions.destroy(claims.sid).await;
    }

    (
        jar.remove(removal_cookie()),
        Json(MessageResponse::new("Logged out successfully")),
    )
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.store.get_user_by_id(session.user_id).await?;
    let group = state.store.get_group_by_id(session.group_id).await?;

    match (user, group) {
        (Some(user), Some(group)) => Ok(Json(AuthResponse { user, group })),
        _ => Err(ApiError::not_found("User or group not found")),
    }
}
