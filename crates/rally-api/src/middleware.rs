use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;
use crate::session::{SESSION_TTL_HOURS, Session};

pub const SESSION_COOKIE: &str = "rally.sid";

/// Claims carried by the signed session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sid: Uuid,
    pub sub: i64,
    pub group_id: i64,
    pub exp: usize,
}

pub fn create_token(secret: &str, session: &Session) -> anyhow::Result<String> {
    let claims = Claims {
        sid: session.id,
        sub: session.user_id,
        group_id: session.group_id,
        exp: session.expires_at.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn decode_token(secret: &str, token: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| debug!("Rejected session token: {}", e))
    .ok()
    .map(|data| data.claims)
}

pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::hours(SESSION_TTL_HOURS))
        .build()
}

pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

/// Resolve the session cookie to a live session, or reject with 401.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_owned())
        .ok_or_else(ApiError::auth_required)?;

    let claims = decode_token(&state.session_secret, &token).ok_or_else(ApiError::auth_required)?;

    let session = state
        .sessions
        .get(claims.sid)
        .await
        .filter(|s| s.user_id == claims.sub && s.group_id == claims.group_id)
        .ok_or_else(ApiError::auth_required)?;

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;

    #[tokio::test]
    async fn test_token_round_trip_and_wrong_secret() {
        let sessions = SessionStore::new();
        let session = sessions.create(3, 9).await;
        let token = create_token("secret-a", &session).unwrap();

        let claims = decode_token("secret-a", &token).unwrap();
        assert_eq!(claims.sid, session.id);
        assert_eq!(claims.sub, 3);
        assert_eq!(claims.group_id, 9);

        assert!(decode_token("secret-b", &token).is_none());
        assert!(decode_token("secret-a", "not-a-token").is_none());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("tok".into(), false);
        let header = cookie.to_string();
        assert!(header.starts_with("rally.sid=tok"));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("Max-Age=86400"));
        assert!(!header.contains("Secure"));

        assert!(session_cookie("tok".into(), true).to_string().contains("Secure"));
    }
}
