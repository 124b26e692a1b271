pub mod auth;
pub mod challenges;
pub mod error;
pub mod groups;
pub mod leaderboard;
pub mod middleware;
pub mod session;


use std::sync::Arc;

use axum::{
    Json, Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};
use serde_json::{Value, json};

use rally_store::Store;

use crate::middleware::require_auth;
use crate::session::SessionStore;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub store: Store,
    pub sessions: SessionStore,
    pub session_secret: String,
    /// Mark the session cookie `Secure`. Off unless served over HTTPS.
    pub cookie_secure: bool,
}

/// All `/api` routes. Everything except group creation, login, logout and
/// health sits behind `require_auth`.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/groups", post(groups::create_group))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/health", get(health))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/challenges", get(challenges::list_challenges))
        .route("/api/challenges", post(challenges::create_challenge))
        .route("/api/challenges/{id}", delete(challenges::delete_challenge))
        .route("/api/challenges/{id}/complete", post(challenges::complete_challenge))
        .route("/api/leaderboard", get(leaderboard::get_leaderboard))
        .route("/api/stats", get(leaderboard::get_stats))
        .route_layer(from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
