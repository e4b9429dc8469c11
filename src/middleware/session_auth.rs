//! Session-cookie middleware.
//!
//! Resolves the `folio_session` cookie to a [`SessionContext`] and injects a
//! [`CurrentSession`] into request extensions. Pages that render for
//! anonymous visitors use [`optional_session`]; endpoints that only make
//! sense for a signed-in user use [`require_session`].
//!
//! # Security Model
//!
//! - Tokens are random 64-character nanoids; only their SHA-256 is stored
//! - Cookie is HttpOnly, Secure (when served over https), SameSite=Lax
//! - Sessions can be ended server-side (logout, expiry cleanup)

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use tracing::warn;

use crate::models::Identity;
use crate::services::SessionContext;
use crate::{AppState, Result};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "folio_session";

/// Session attached to the request by the session middleware.
#[derive(Clone, Debug)]
pub struct CurrentSession {
    /// Raw cookie token, if the client sent one
    pub token: Option<String>,
    pub context: SessionContext,
}

impl CurrentSession {
    pub fn identity(&self) -> Option<Identity> {
        self.context.current()
    }

    pub fn require(&self) -> Result<Identity> {
        self.context.require()
    }
}

/// Session cookie carrying a freshly issued token.
pub fn session_cookie(token: String, max_age_seconds: u64, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age_seconds as i64))
        .build()
}

/// Expired cookie that makes the browser drop the session.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, ""))
        .path("/")
        .max_age(time::Duration::seconds(0))
        .build()
}

async fn resolve_session(state: &AppState, jar: &CookieJar) -> CurrentSession {
    let token = jar.get(SESSION_COOKIE_NAME).map(|c| c.value().to_string());

    let context = match state.identity.watch(token.as_deref()).await {
        Ok(context) => context,
        Err(e) => {
            warn!(error = %e, "Session lookup failed; treating request as signed out");
            SessionContext::signed_out()
        }
    };

    CurrentSession { token, context }
}

/// Optional session middleware - never rejects, always injects a
/// `CurrentSession` (signed out when there is no valid cookie).
///
/// # Example
///
/// ```rust,ignore
/// use axum::{Router, middleware, Extension};
/// use folio::middleware::{optional_session, CurrentSession};
///
/// async fn handler(Extension(session): Extension<CurrentSession>) -> String {
///     match session.identity() {
///         Some(identity) => format!("Hello, {}!", identity.email),
///         None => "Hello, guest!".to_string(),
///     }
/// }
///
/// let app = Router::new()
///     .route("/", get(handler))
///     .layer(middleware::from_fn_with_state(state.clone(), optional_session));
/// ```
pub async fn optional_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let session = resolve_session(&state, &jar).await;
    req.extensions_mut().insert(session);
    next.run(req).await
}

/// Middleware that requires a signed-in session.
///
/// # Errors
///
/// Returns 401 Unauthorized ("User not logged in") when the cookie is
/// missing, unknown or expired.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response> {
    let session = resolve_session(&state, &jar).await;
    session.require()?;
    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc".to_string(), 60, true);
        assert_eq!(cookie.name(), SESSION_COOKIE_NAME);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(60)));
    }

    #[test]
    fn test_removal_cookie_expires_immediately() {
        let cookie = removal_cookie();
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(0)));
    }

    #[test]
    fn test_signed_out_session_requires_login() {
        let session = CurrentSession {
            token: None,
            context: SessionContext::signed_out(),
        };
        assert!(session.identity().is_none());
        assert!(matches!(session.require(), Err(crate::Error::Unauthenticated)));
    }
}
