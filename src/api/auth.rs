//! Authentication Routes
//!
//! Email/password accounts with a session cookie.
//!
//! Routes:
//! - POST /auth/register - Sign-up form (multipart), sets the session cookie
//! - POST /auth/login - Sign in, sets the session cookie
//! - POST /auth/logout - End session, clears the cookie
//! - GET /auth/me - Current identity

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::read_form;
use crate::middleware::{
    removal_cookie, require_session, session_cookie, CurrentSession, SESSION_COOKIE_NAME,
};
use crate::models::Identity;
use crate::services::{Registration, SignedIn};
use crate::{AppState, Result};

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/me", get(me))
        .layer(middleware::from_fn_with_state(state, require_session));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .merge(protected)
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user_id: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

impl From<&SignedIn> for SessionResponse {
    fn from(signed_in: &SignedIn) -> Self {
        Self {
            user_id: signed_in.identity.user_id.clone(),
            email: signed_in.identity.email.clone(),
            expires_at: signed_in.expires_at,
        }
    }
}

fn with_session(state: &AppState, jar: CookieJar, signed_in: &SignedIn) -> CookieJar {
    jar.add(session_cookie(
        signed_in.token.clone(),
        state.config.session.max_age_seconds,
        state.config.secure_cookies(),
    ))
}

// ============================================================================
// Handlers
// ============================================================================

/// Create an account from the sign-up form.
///
/// POST /auth/register
///
/// Fields: email, password, confirmPassword, fullName, bio, linkedin,
/// github, and an optional photo file.
async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let (fields, photo) = read_form(multipart).await?;
    let signed_in = state
        .registration
        .register(Registration::from_fields(&fields, photo))
        .await?;

    let jar = with_session(&state, jar, &signed_in);
    Ok((
        StatusCode::CREATED,
        jar,
        Json(SessionResponse::from(&signed_in)),
    ))
}

/// POST /auth/login
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let signed_in = state
        .identity
        .sign_in(&request.email, &request.password)
        .await?;

    let jar = with_session(&state, jar, &signed_in);
    Ok((jar, Json(SessionResponse::from(&signed_in))))
}

/// End the current session.
///
/// POST /auth/logout
///
/// Every live view of this session observes the sign-out.
async fn logout(State(state): State<AppState>, jar: CookieJar) -> Result<impl IntoResponse> {
    if let Some(cookie) = jar.get(SESSION_COOKIE_NAME) {
        state.identity.sign_out(cookie.value()).await?;
    }

    let jar = jar.add(removal_cookie());

    Ok((
        jar,
        Json(serde_json::json!({
            "message": "Logged out successfully"
        })),
    ))
}

/// GET /auth/me
async fn me(Extension(session): Extension<CurrentSession>) -> Result<Json<Identity>> {
    Ok(Json(session.require()?))
}
