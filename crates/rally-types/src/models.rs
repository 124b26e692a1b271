use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Icon assigned to challenges created without one.
pub const DEFAULT_CHALLENGE_ICON: &str = "star";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub invite_code: String,
}

/// A group member. The password is stored as given and never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub group_id: i64,
    pub points: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub points: i64,
    pub difficulty: String,
    pub icon: String,
    pub group_id: i64,
}

/// Fields of a challenge before the store assigns it an id.
#[derive(Debug, Clone)]
pub struct NewChallenge {
    pub title: String,
    pub description: String,
    pub points: i64,
    pub difficulty: String,
    pub icon: String,
    pub group_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub id: i64,
    pub user_id: i64,
    pub challenge_id: i64,
    pub completed_at: DateTime<Utc>,
}
