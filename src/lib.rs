//! Folio - portfolio builder
//!
//! A signed-in user keeps one document holding a profile and collections of
//! projects, hackathons and positions. Views over that document follow the
//! user's identity and re-render when the document changes.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod views;

pub use config::config;
pub use error::{Error, ErrorKind, Result, GENERIC_FAILURE};
pub use state::AppState;
