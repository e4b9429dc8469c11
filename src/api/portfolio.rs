//! Portfolio Routes
//!
//! The home page of the signed-in user, one section at a time, a live
//! stream of the home view, and any user's public portfolio.
//!
//! Routes:
//! - GET /portfolio - Hero plus the three sections
//! - GET /portfolio/live - Server-sent events, one per view change
//! - GET /portfolio/sections/:section - One section (`?slide=n&open=i`)
//! - GET /users/:user_id/portfolio - Public portfolio of a user

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Extension, Json, Router,
};
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, warn};

use crate::db;
use crate::middleware::CurrentSession;
use crate::services::sync::snapshot;
use crate::services::{ReadMode, Synchronizer, ViewState};
use crate::views::{PortfolioData, PortfolioProjection, PortfolioView, RemoteCollection, SectionView};
use crate::{AppState, Error, Result};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/portfolio", get(home))
        .route("/portfolio/live", get(live))
        .route("/portfolio/sections/:section", get(section))
        .route("/users/:user_id/portfolio", get(public_portfolio))
}

#[derive(Debug, Deserialize, Default)]
pub struct SectionQuery {
    /// Carousel position; clamped to the last slide
    #[serde(default)]
    pub slide: usize,
    /// Entry whose detail modal is open
    pub open: Option<usize>,
}

/// GET /portfolio
async fn home(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Json<PortfolioView>> {
    let synchronizer =
        Synchronizer::new(state.documents.clone(), PortfolioProjection, ReadMode::Once);
    let mut view = synchronizer.mount(session.context);
    let settled = view.settled().await;
    view.unmount();

    Ok(Json(PortfolioView::render(&settled)?))
}

/// GET /portfolio/live
///
/// The view stays mounted while the client is connected. Every state it
/// publishes (loading, populated, signed out after logout) is sent as a
/// `portfolio` event.
async fn live(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let synchronizer = Synchronizer::new(
        state.documents.clone(),
        PortfolioProjection,
        ReadMode::Continuous,
    );
    debug!(
        user_id = ?session.identity().map(|i| i.user_id),
        "Live portfolio connected"
    );
    let mounted = synchronizer.mount(session.context);

    let states = WatchStream::new(mounted.subscribe());
    let events = states.map(move |view_state| {
        let _mounted = &mounted;
        Ok(render_event(&view_state))
    });

    Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(state.config.live.keepalive_seconds))
            .text("heartbeat"),
    )
}

fn render_event(view_state: &ViewState<PortfolioData>) -> Event {
    let rendered = PortfolioView::render(view_state).and_then(|view| {
        Event::default()
            .event("portfolio")
            .json_data(&view)
            .map_err(|e| Error::Internal(format!("Failed to encode event: {}", e)))
    });

    match rendered {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "Failed to render live portfolio");
            Event::default().event("error").data(e.user_message())
        }
    }
}

/// GET /portfolio/sections/:section
async fn section(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(key): Path<String>,
    Query(query): Query<SectionQuery>,
) -> Result<Json<SectionView>> {
    let collection = RemoteCollection::by_key(&key)
        .ok_or_else(|| Error::NotFound(format!("Section: {}", key)))?;

    let synchronizer = Synchronizer::new(state.documents.clone(), collection, ReadMode::Once);
    let mut view = synchronizer.mount(session.context);
    let settled = view.settled().await;

    Ok(Json(collection.render(&settled, query.slide, query.open)?))
}

/// GET /users/:user_id/portfolio
///
/// Read once outside any session; a failed read renders the empty sections
/// with the error flag.
async fn public_portfolio(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<PortfolioView>> {
    db::get_account(&state.db, &user_id).await?;

    let view_state = match snapshot(state.documents.as_ref(), &user_id, &PortfolioProjection).await
    {
        Ok(data) => ViewState::ready(data),
        Err(e) => {
            warn!(user_id = %user_id, error = %e, "Public portfolio read failed");
            ViewState::failed()
        }
    };

    Ok(Json(PortfolioView::render(&view_state)?))
}
