//! Folio - portfolio builder server

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio::services::IdentityProvider;
use folio::{api, config, AppState, Error, Result};

/// Multipart framing on top of the largest accepted upload.
const BODY_LIMIT_HEADROOM: usize = 64 * 1024;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::init();
    tracing::info!(
        "Starting Folio server on {}:{}",
        config.server.host,
        config.server.port
    );

    // Initialize application state
    let state = AppState::new().await?;
    tracing::info!("Application state initialized");

    api::status::init_startup_time();

    spawn_session_cleanup(
        state.identity.clone(),
        Duration::from_secs(config.session.cleanup_interval_seconds),
    );
    tracing::debug!("Session cleanup task started");

    // Build router
    let app = Router::new()
        .merge(api::routes(state.clone()))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(
            config.storage.max_upload_size + BODY_LIMIT_HEADROOM,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| Error::Internal(format!("Invalid listen address: {}", e)))?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically purge expired sessions.
fn spawn_session_cleanup(identity: std::sync::Arc<dyn IdentityProvider>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match identity.cleanup_expired().await {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "Expired sessions purged"),
                Err(e) => tracing::warn!(error = %e, "Session cleanup failed"),
            }
        }
    });
}
