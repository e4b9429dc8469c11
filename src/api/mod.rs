//! API Routes for Folio
//!
//! This module combines all API routes into a single router.
//! Routes are organized by page and apply the session middleware.

mod auth;
mod blobs;
mod layout;
mod portfolio;
mod profile;
pub mod status;
mod upload;

use axum::extract::Multipart;
use axum::Router;

use crate::middleware::optional_session;
use crate::models::FormFields;
use crate::services::Upload;
use crate::AppState;

/// Build the complete API router.
///
/// Route structure:
/// - /health - Health check (public)
/// - /blobs/* - Uploaded images (public)
/// - /api/auth/* - Register, login, logout, current identity
/// - /api/layout, /api/portfolio/*, /api/profile, /api/upload/* - Pages
///   (session resolved when present)
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(status::routes())
        .merge(blobs::routes())
        .nest("/api", api_routes(state))
}

fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::routes(state.clone()))
        .merge(page_routes(state))
}

/// Pages render for anonymous visitors too; handlers decide what a missing
/// identity means.
fn page_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(layout::routes())
        .merge(portfolio::routes())
        .merge(profile::routes())
        .merge(upload::routes())
        .layer(axum::middleware::from_fn_with_state(state, optional_session))
}

/// Read a multipart form into text fields and at most one file.
///
/// Any part with a file name is treated as the file; an empty file part
/// (a file input left blank) is ignored.
pub(crate) async fn read_form(mut multipart: Multipart) -> crate::Result<(FormFields, Option<Upload>)> {
    let mut fields = FormFields::new();
    let mut file = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(filename) = field.file_name().map(|s| s.to_string()) {
            let content_type = field.content_type().unwrap_or_default().to_string();
            let bytes = field.bytes().await?;
            if filename.is_empty() && bytes.is_empty() {
                continue;
            }
            if file.is_none() {
                file = Some(Upload {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let value = field.text().await?;
        fields.insert(name, value);
    }

    Ok((fields, file))
}
