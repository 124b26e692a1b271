use axum::{Extension, Json, extract::State, response::IntoResponse};

use rally_types::api::StatsResponse;
use rally_types::models::User;

use crate::AppState;
use crate::error::ApiError;
use crate::session::Session;

/// GET /api/leaderboard
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    let users = state.store.get_users_by_group(session.group_id).await?;
    Ok(Json(users))
}

/// GET /api/stats
pub async fn get_stats(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    let challenges = state.store.get_challenges_by_group(session.group_id).await?;
    let users = state.store.get_users_by_group(session.group_id).await?;

    // All-time completions of the group's current challenges, reported under
    // the `completedToday` name clients already read.
    let mut completed_today = 0;
    for challenge in &challenges {
        completed_today += state
            .store
            .get_completions_by_challenge(challenge.id)
            .await?
            .len();
    }

    let (group_score, average_score) = score_summary(&users)?;

    Ok(Json(StatsResponse {
        total_challenges: challenges.len(),
        active_members: users.len(),
        completed_today,
        average_score,
        group_score,
    }))
}

/// Sum of member points and their mean rounded to the nearest integer.
fn score_summary(users: &[User]) -> Result<(i64, i64), ApiError> {
    let total: i128 = users.iter().map(|u| i128::from(u.points)).sum();
    let group_score = i64::try_from(total)
        .map_err(|_| anyhow::anyhow!("group score {} out of range", total))?;
    if users.is_empty() {
        return Ok((group_score, 0));
    }
    let average = (total as f64 / users.len() as f64).round() as i64;
    Ok((group_score, average))
}
