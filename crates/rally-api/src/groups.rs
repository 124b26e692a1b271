use axum::{Json, extract::State, extract::rejection::JsonRejection, response::IntoResponse};
use tracing::info;

use rally_types::api::CreateGroupRequest;

use crate::AppState;
use crate::error::ApiError;

/// POST /api/groups — create a group and hand back its invite code.
pub async fn create_group(
    State(state): State<AppState>,
    payload: Result<Json<CreateGroupRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    let group = state.store.create_group(&req.name).await?;
    info!("Group {} created with invite code {}", group.id, group.invite_code);

    Ok(Json(group))
}
