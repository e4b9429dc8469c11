//! Upload Routes
//!
//! Routes:
//! - GET /upload - Upload dashboard (`?section=` selects the form)
//! - POST /upload/:section - Submit a section form (multipart)

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use super::read_form;
use crate::middleware::CurrentSession;
use crate::services::{Section, Submission, Submitted};
use crate::views::UploadDashboard;
use crate::{AppState, Error, ErrorKind, Result};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/upload", get(dashboard))
        .route("/upload/:section", post(submit))
}

#[derive(Debug, Deserialize, Default)]
pub struct DashboardQuery {
    pub section: Option<String>,
}

/// Dashboard after a submit, with the committed record when it succeeded.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    #[serde(flatten)]
    pub dashboard: UploadDashboard,
    pub submitted: Option<Submitted>,
}

/// GET /upload
async fn dashboard(Query(query): Query<DashboardQuery>) -> Json<UploadDashboard> {
    Json(UploadDashboard::select(query.section.as_deref()))
}

/// POST /upload/:section
///
/// Text fields are the record's fields; an optional `image` file part is
/// stored and linked into the record. The response carries the settled form
/// (reset on success, kept on failure) and its notice; the status code
/// reflects the outcome.
async fn submit(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(slug): Path<String>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitResponse>)> {
    let section = Section::from_slug(&slug)
        .ok_or_else(|| Error::NotFound(format!("Upload section: {}", slug)))?;
    let (fields, image) = read_form(multipart).await?;

    let (form, outcome) = state
        .forms
        .handle(
            &session.context,
            Submission {
                section,
                fields,
                image,
            },
        )
        .await;

    let status = match &outcome {
        Ok(_) => StatusCode::CREATED,
        Err(e) => {
            if e.kind() == ErrorKind::DataAccess {
                error!(section = section.slug(), error = %e, "Section submit failed");
            }
            e.status_code()
        }
    };

    Ok((
        status,
        Json(SubmitResponse {
            dashboard: UploadDashboard::with_form(form),
            submitted: outcome.ok(),
        }),
    ))
}
