//! Middleware for Folio.
//!
//! - `session_auth` - session cookie resolution for every browser-facing route

mod session_auth;

pub use session_auth::{
    optional_session, removal_cookie, require_session, session_cookie, CurrentSession,
    SESSION_COOKIE_NAME,
};
