//! Blob Routes
//!
//! Routes:
//! - GET /blobs/*path - Serve an uploaded image

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::Response,
    routing::get,
    Router,
};

use crate::{AppState, Error, Result};

pub fn routes() -> Router<AppState> {
    Router::new().route("/blobs/*path", get(serve_blob))
}

/// GET /blobs/*path
async fn serve_blob(State(state): State<AppState>, Path(path): Path<String>) -> Result<Response> {
    let (record, bytes) = state.blobs.fetch(&path).await?;

    Response::builder()
        .header(header::CONTENT_TYPE, &record.content_type)
        .header(header::CONTENT_LENGTH, bytes.len())
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff")
        .header(header::CONTENT_SECURITY_POLICY, "sandbox")
        .body(Body::from(bytes))
        .map_err(|e| Error::Internal(format!("Failed to build response: {}", e)))
}
