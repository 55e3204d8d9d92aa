//! Auth routes — the gate in front of the dashboard.
//!
//! Nothing behind `/api/items` renders without a valid session: the
//! [`AuthUser`] extractor rejects with 401, and handlers receive the
//! authenticated user's id as the owner scope.

use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use time::Duration;

use crate::services::{account, dashboard, session};
use crate::state::AppState;

const COOKIE_NAME: &str = "session_token";

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

pub(crate) fn cookie_secure() -> bool {
    env_bool("COOKIE_SECURE").unwrap_or(false)
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(cookie_secure())
        .build()
}

fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(cookie_secure())
        .max_age(Duration::ZERO)
        .build()
}

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated user extracted from the session cookie.
/// Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub user: session::SessionUser,
    pub token: String,
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(COOKIE_NAME).map(Cookie::value).unwrap_or_default();
        if token.is_empty() {
            return Err(StatusCode::UNAUTHORIZED);
        }

        let app_state = AppState::from_ref(state);
        let user = session::validate_session(&app_state.pool, token)
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(Self { user, token: token.to_owned() })
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Deserialize)]
pub struct CredentialsBody {
    pub email: String,
    pub password: String,
}

fn account_error_to_status(err: &account::AccountError) -> StatusCode {
    match err {
        account::AccountError::InvalidEmail | account::AccountError::WeakPassword => StatusCode::BAD_REQUEST,
        account::AccountError::EmailTaken => StatusCode::CONFLICT,
        account::AccountError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        account::AccountError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// `POST /api/auth/signup` — create an account and open a session.
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<CredentialsBody>,
) -> Result<(StatusCode, CookieJar, Json<session::SessionUser>), StatusCode> {
    let user_id = account::create_account(&state.pool, &body.email, &body.password)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "signup rejected");
            account_error_to_status(&e)
        })?;

    open_session(&state, user_id).await.map(|(jar, user)| (StatusCode::CREATED, jar, Json(user)))
}

/// `POST /api/auth/login` — verify credentials and open a session.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<CredentialsBody>,
) -> Result<(CookieJar, Json<session::SessionUser>), StatusCode> {
    let user_id = account::verify_credentials(&state.pool, &body.email, &body.password)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "login rejected");
            account_error_to_status(&e)
        })?;

    open_session(&state, user_id).await.map(|(jar, user)| (jar, Json(user)))
}

async fn open_session(state: &AppState, user_id: uuid::Uuid) -> Result<(CookieJar, session::SessionUser), StatusCode> {
    let token = session::create_session(&state.pool, user_id).await.map_err(|e| {
        tracing::error!(error = %e, "session creation failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let user = session::validate_session(&state.pool, &token)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "session validation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

    let jar = CookieJar::new().add(session_cookie(token));
    Ok((jar, user))
}

/// `GET /api/auth/me` — return current user.
pub async fn me(auth: AuthUser) -> Json<session::SessionUser> {
    Json(auth.user)
}

/// `POST /api/auth/logout` — delete session, clear cookie, drop the owner's
/// dashboard state so the next login mounts an empty view.
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let _ = session::delete_session(&state.pool, &auth.token).await;
    dashboard::reset(&state, auth.user.id).await;

    let jar = CookieJar::new().add(clear_session_cookie());
    (jar, StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
