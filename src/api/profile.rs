//! Profile Routes ("About me")
//!
//! Routes:
//! - GET /profile - Full profile plus item counts
//! - PATCH /profile - Update individual profile fields

use std::collections::BTreeMap;

use axum::{extract::State, routing::get, Extension, Json, Router};
use tracing::info;

use crate::middleware::CurrentSession;
use crate::models::ProfileField;
use crate::services::{Projection, ReadMode, Synchronizer};
use crate::views::{ProfileDetail, ProfileProjection};
use crate::{AppState, Error, Result};

pub fn routes() -> Router<AppState> {
    Router::new().route("/profile", get(get_profile).patch(update_profile))
}

/// GET /profile
async fn get_profile(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Json<ProfileDetail>> {
    if session.identity().is_none() {
        return Err(Error::NoActiveUser);
    }

    let synchronizer =
        Synchronizer::new(state.documents.clone(), ProfileProjection, ReadMode::Once);
    let mut view = synchronizer.mount(session.context);
    let settled = view.settled().await;

    if settled.error {
        return Err(Error::Internal("Profile read failed".to_string()));
    }
    settled.data.map(Json).ok_or(Error::UserDataNotFound)
}

/// PATCH /profile
///
/// Body: a JSON object of field name to value, e.g.
/// `{"bio": "...", "github": "https://github.com/..."}`. Unknown names are
/// rejected and nothing is written.
async fn update_profile(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Json(body): Json<BTreeMap<String, String>>,
) -> Result<Json<ProfileDetail>> {
    let identity = session.context.current().ok_or(Error::NoActiveUser)?;

    let mut updates = Vec::with_capacity(body.len());
    for (name, value) in body {
        let field = ProfileField::from_name(&name)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown profile field: {}", name)))?;
        field.check(&value)?;
        updates.push((field, value.trim().to_string()));
    }
    if updates.is_empty() {
        return Err(Error::InvalidInput("No profile fields to update".to_string()));
    }

    let snapshot = state
        .documents
        .update_fields(&identity.user_id, updates)
        .await?;
    info!(user_id = %identity.user_id, revision = snapshot.revision, "Profile fields updated");

    ProfileProjection
        .project(Some(&snapshot.document))
        .map(Json)
        .ok_or(Error::UserDataNotFound)
}
