use serde::{Deserialize, Serialize};

use crate::models::{Challenge, Group, User};

// -- Groups --

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub group_code: String,
}

/// Returned by login and by the current-identity endpoint.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub group: Group,
}

// -- Challenges --

/// Any `groupId` in the payload is ignored; the session decides the group.
#[derive(Debug, Deserialize)]
pub struct CreateChallengeRequest {
    pub title: String,
    pub description: String,
    pub points: i64,
    pub difficulty: String,
    pub icon: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeWithStatus {
    #[serde(flatten)]
    pub challenge: Challenge,
    pub is_completed: bool,
    pub completed_count: usize,
}

#[derive(Debug, Serialize)]
pub struct CompleteChallengeResponse {
    pub message: String,
    pub points: i64,
}

// -- Stats --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_challenges: usize,
    pub active_members: usize,
    /// Counts every completion of the group's challenges, not only today's.
    pub completed_today: usize,
    pub average_score: i64,
    pub group_score: i64,
}

// -- Misc --

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
