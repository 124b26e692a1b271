use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    response::IntoResponse,
};
use tracing::info;

use rally_types::api::{
    ChallengeWithStatus, CompleteChallengeResponse, CreateChallengeRequest, MessageResponse,
};
use rally_types::models::{Challenge, DEFAULT_CHALLENGE_ICON, NewChallenge};

use crate::AppState;
use crate::error::ApiError;
use crate::session::Session;

const CHALLENGE_NOT_FOUND: &str = "Challenge not found";

/// Challenge points share the 32-bit range of stored point totals.
pub const MAX_CHALLENGE_POINTS: i64 = i32::MAX as i64;

/// GET /api/challenges — the caller's group challenges with completion status.
pub async fn list_challenges(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    let challenges = state.store.get_challenges_by_group(session.group_id).await?;

    let mut with_status = Vec::with_capacity(challenges.len());
    for challenge in challenges {
        let is_completed = state
            .store
            .is_user_challenge_completed(session.user_id, challenge.id)
            .await?;
        let completed_count = state
            .store
            .get_completions_by_challenge(challenge.id)
            .await?
            .len();

        with_status.push(ChallengeWithStatus {
            challenge,
            is_completed,
            completed_count,
        });
    }

    Ok(Json(with_status))
}

/// POST /api/challenges — always created in the session's group.
pub async fn create_challenge(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    payload: Result<Json<CreateChallengeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    if req.title.trim().is_empty() {
        return Err(ApiError::validation("Title is required"));
    }
    if req.difficulty.trim().is_empty() {
        return Err(ApiError::validation("Difficulty is required"));
    }
    if !(0..=MAX_CHALLENGE_POINTS).contains(&req.points) {
        return Err(ApiError::validation(format!(
            "Points must be between 0 and {MAX_CHALLENGE_POINTS}"
        )));
    }

    let icon = req
        .icon
        .filter(|icon| !icon.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CHALLENGE_ICON.to_string());

    let challenge = state
        .store
        .create_challenge(NewChallenge {
            title: req.title,
            description: req.description,
            points: req.points,
            difficulty: req.difficulty,
            icon,
            group_id: session.group_id,
        })
        .await?;

    info!(
        "Challenge {} ({} points) created in group {}",
        challenge.id, challenge.points, challenge.group_id
    );

    Ok(Json(challenge))
}

/// DELETE /api/challenges/{id}
pub async fn delete_challenge(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let challenge = find_group_challenge(&state, &session, &id).await?;

    state.store.delete_challenge(challenge.id).await?;
    info!("Challenge {} deleted from group {}", challenge.id, session.group_id);

    Ok(Json(MessageResponse::new("Challenge deleted successfully")))
}

/// POST /api/challenges/{id}/complete
///
/// The completion and the point award are applied together by the store.
pub async fn complete_challenge(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let challenge = find_group_challenge(&state, &session, &id).await?;

    let (_, user) = state
        .store
        .complete_challenge(session.user_id, challenge.id)
        .await?;

    info!(
        "User {} completed challenge {} (+{}, total {})",
        user.id, challenge.id, challenge.points, user.points
    );

    Ok(Json(CompleteChallengeResponse {
        message: "Challenge completed successfully".into(),
        points: challenge.points,
    }))
}

/// Look up a challenge by its path id, hiding challenges of other groups.
/// Ids that are not integers are reported as missing challenges.
async fn find_group_challenge(
    state: &AppState,
    session: &Session,
    raw_id: &str,
) -> Result<Challenge, ApiError> {
    let id: i64 = raw_id
        .parse()
        .map_err(|_| ApiError::not_found(CHALLENGE_NOT_FOUND))?;

    state
        .store
        .get_challenge_by_id(id)
        .await?
        .filter(|c| c.group_id == session.group_id)
        .ok_or_else(|| ApiError::not_found(CHALLENGE_NOT_FOUND))
}
