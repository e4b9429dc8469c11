//! Shared helpers for the HTTP integration tests.
//!
//! Every test gets its own in-memory database and a temporary blob
//! directory that lives as long as the returned `TestApp`.

#![allow(dead_code)]

use axum::Router;
use axum_extra::extract::cookie::Cookie;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use serde_json::Value;
use tempfile::TempDir;

use folio::config::Config;
use folio::{api, AppState};

pub const PASSWORD: &str = "hunter22";

/// Smallest valid PNG header; enough for content-type checks.
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 0];

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    _blobs: TempDir,
}

pub async fn test_state() -> (AppState, TempDir) {
    let blobs = tempfile::tempdir().expect("Failed to create blob directory");
    let config = Config::for_tests(blobs.path().to_str().expect("utf-8 temp path"));
    let state = AppState::from_config(config)
        .await
        .expect("Failed to build application state");
    (state, blobs)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(api::routes(state.clone()))
        .with_state(state)
}

pub async fn test_app() -> TestApp {
    let (state, blobs) = test_state().await;
    let server = TestServer::new(router(state.clone())).expect("Failed to create test server");
    TestApp {
        server,
        state,
        _blobs: blobs,
    }
}

/// A file part with the given name and content type.
pub fn file_part(filename: &str, content_type: &str, bytes: &[u8]) -> Part {
    Part::bytes(bytes.to_vec())
        .file_name(filename)
        .mime_type(content_type)
}

pub fn registration_form(email: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("email", email)
        .add_text("password", PASSWORD)
        .add_text("confirmPassword", PASSWORD)
        .add_text("fullName", "Ada Lovelace")
        .add_text("bio", "Analyst of engines")
        .add_text("linkedin", "https://linkedin.com/in/ada")
        .add_text("github", "https://github.com/ada")
}

/// Register through the API and return the session cookie.
pub async fn register(server: &TestServer, email: &str) -> Cookie<'static> {
    let response = server
        .post("/api/auth/register")
        .multipart(registration_form(email))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.cookie("folio_session")
}

/// Submit a section form with the given session cookie.
pub async fn submit(
    server: &TestServer,
    cookie: Option<Cookie<'static>>,
    section: &str,
    form: MultipartForm,
) -> axum_test::TestResponse {
    let mut request = server
        .post(&format!("/api/upload/{}", section))
        .multipart(form);
    if let Some(cookie) = cookie {
        request = request.add_cookie(cookie);
    }
    request.await
}

pub fn portfolio_site() -> MultipartForm {
    MultipartForm::new()
        .add_text("title", "Portfolio Site")
        .add_text("description", "Personal site built with Rust")
        .add_text("deployLink", "https://x.dev")
        .add_text("githubLink", "https://github.com/x/y")
}

pub fn notice_message(body: &Value) -> &str {
    body["form"]["notice"]["message"].as_str().unwrap_or_default()
}
