//! Layout Routes
//!
//! Routes:
//! - GET /layout - Header navigation for the current session

use axum::{routing::get, Extension, Json, Router};

use crate::middleware::CurrentSession;
use crate::views::Header;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/layout", get(header))
}

async fn header(Extension(session): Extension<CurrentSession>) -> Json<Header> {
    Json(Header::for_identity(session.identity().as_ref()))
}
