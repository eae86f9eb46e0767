use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
    response::Redirect,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, warn};
use uuid::Uuid;

use super::repo_types::User;
use super::services::{JwtKeys, SESSION_COOKIE};
use crate::error::AppError;
use crate::state::AppState;

/// Token from `Authorization: Bearer` or, failing that, the session cookie.
fn session_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer ").or_else(|| h.strip_prefix("bearer ")))
        .map(str::to_string);
    bearer.or_else(|| {
        CookieJar::from_headers(&parts.headers)
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
    })
}

fn session_user(parts: &Parts, keys: &JwtKeys) -> Result<Uuid, &'static str> {
    let token = session_token(parts).ok_or("Not authenticated")?;
    match keys.verify_access(&token) {
        Ok(claims) => Ok(claims.sub),
        Err(e) => {
            warn!(error = %e, "invalid or expired token");
            Err("Invalid or expired token")
        }
    }
}

/// Extracts and validates the access token, returning the user ID.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        session_user(parts, &keys)
            .map(AuthUser)
            .map_err(|msg| AppError::Unauthorized(msg.into()))
    }
}

/// Logged-in user for HTML pages; anything else is sent to the login page.
pub struct PageUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for PageUser {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let user_id = session_user(parts, &keys).map_err(|_| Redirect::to("/login"))?;
        match state.store.find_user_by_id(user_id).await {
            Ok(Some(user)) => Ok(PageUser(user)),
            Ok(None) => {
                debug!(%user_id, "session for unknown user");
                Err(Redirect::to("/login"))
            }
            Err(e) => {
                warn!(error = %e, %user_id, "session user lookup failed");
                Err(Redirect::to("/login"))
            }
        }
    }
}
