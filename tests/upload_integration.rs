//! Section form submissions over HTTP.

mod common;

use axum::http::StatusCode;
use axum_test::multipart::MultipartForm;
use common::{file_part, notice_message, portfolio_site, register, submit, test_app, PNG_BYTES};
use folio::models::{Category, ContentItem};
use folio::services::DocumentStore;
use serde_json::Value;

async fn user_id(app: &common::TestApp, cookie: &axum_extra::extract::cookie::Cookie<'static>) -> String {
    let me: Value = app
        .server
        .get("/api/auth/me")
        .add_cookie(cookie.clone())
        .await
        .json();
    me["userId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_portfolio_site_is_appended_to_web_projects() {
    let app = test_app().await;
    let cookie = register(&app.server, "ada@example.com").await;
    let uid = user_id(&app, &cookie).await;

    let response = submit(&app.server, Some(cookie), "web-project", portfolio_site()).await;
    response.assert_status(StatusCode::CREATED);

    let body: Value = response.json();
    assert_eq!(notice_message(&body), "Project uploaded successfully!");
    assert_eq!(body["form"]["notice"]["kind"], "success");
    assert_eq!(body["form"]["fields"], serde_json::json!({}));
    assert_eq!(body["selected"], "web-project");

    let stored = app.state.documents.read(&uid).await.unwrap().unwrap();
    let items = stored.document.items(Category::WebProject);
    assert_eq!(items.len(), 1);
    let ContentItem::Project(project) = &items[0] else {
        panic!("expected a project");
    };
    assert_eq!(project.title, "Portfolio Site");
    assert_eq!(project.deploy_link, "https://x.dev");
    assert_eq!(project.github_link, "https://github.com/x/y");
    assert!(project.uploaded_at.is_some());
    assert_eq!(stored.document.count(Category::AiProject), 0);
}

#[tokio::test]
async fn test_submit_without_identity_writes_nothing() {
    let app = test_app().await;
    let cookie = register(&app.server, "ada@example.com").await;
    let uid = user_id(&app, &cookie).await;
    let before = app.state.documents.read(&uid).await.unwrap().unwrap();

    let response = submit(&app.server, None, "web-project", portfolio_site()).await;
    response.assert_status_unauthorized();

    let body: Value = response.json();
    assert_eq!(notice_message(&body), "User not logged in");
    assert_eq!(body["form"]["notice"]["kind"], "error");
    assert_eq!(body["form"]["fields"]["title"], "Portfolio Site");
    assert!(body["submitted"].is_null());

    let after = app.state.documents.read(&uid).await.unwrap().unwrap();
    assert_eq!(after.revision, before.revision);
    assert_eq!(after.document.count(Category::WebProject), 0);
}

#[tokio::test]
async fn test_validation_error_keeps_fields() {
    let app = test_app().await;
    let cookie = register(&app.server, "ada@example.com").await;

    let form = MultipartForm::new()
        .add_text("title", "Lead")
        .add_text("organization", "ACM")
        .add_text("description", "Ran the chapter")
        .add_text("startDate", "2024-05-01")
        .add_text("endDate", "2024-01-01");
    let response = submit(&app.server, Some(cookie), "position", form).await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(notice_message(&body), "End date cannot be before start date");
    assert_eq!(body["form"]["fields"]["organization"], "ACM");
}

#[tokio::test]
async fn test_hackathon_with_image() {
    let app = test_app().await;
    let cookie = register(&app.server, "ada@example.com").await;
    let uid = user_id(&app, &cookie).await;

    let form = MultipartForm::new()
        .add_text("name", "HackX")
        .add_text("organization", "MLH")
        .add_text("description", "Built a thing overnight")
        .add_part("image", file_part("team photo.png", "image/png", PNG_BYTES));
    let response = submit(&app.server, Some(cookie), "hackathon", form).await;
    response.assert_status(StatusCode::CREATED);

    let body: Value = response.json();
    assert_eq!(notice_message(&body), "Hackathon uploaded successfully!");
    let image_url = body["submitted"]["imageUrl"].as_str().unwrap().to_string();
    let prefix = format!("http://localhost:8765/blobs/images/hackathon/{}/", uid);
    assert!(image_url.starts_with(&prefix), "{}", image_url);
    assert!(image_url.ends_with("_team_photo.png"), "{}", image_url);

    let stored = app.state.documents.read(&uid).await.unwrap().unwrap();
    let items = stored.document.items(Category::Hackathon);
    assert_eq!(items[0].image_url(), image_url);

    let path = image_url.trim_start_matches("http://localhost:8765");
    let blob = app.server.get(path).await;
    blob.assert_status_ok();
    assert_eq!(blob.as_bytes().as_ref(), PNG_BYTES);
    assert_eq!(blob.header("x-content-type-options"), "nosniff");
    assert_eq!(blob.header("content-security-policy"), "sandbox");
}

#[tokio::test]
async fn test_svg_image_is_rejected() {
    let app = test_app().await;
    let cookie = register(&app.server, "ada@example.com").await;
    let uid = user_id(&app, &cookie).await;

    let svg = br#"<svg xmlns="http://www.w3.org/2000/svg"><script>alert(1)</script></svg>"#;
    let form = MultipartForm::new()
        .add_text("name", "HackX")
        .add_text("organization", "MLH")
        .add_text("description", "Built a thing overnight")
        .add_part("image", file_part("x.svg", "image/svg+xml", svg));
    let response = submit(&app.server, Some(cookie), "hackathon", form).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        notice_message(&response.json::<Value>()),
        "Invalid file type: image/svg+xml"
    );

    let stored = app.state.documents.read(&uid).await.unwrap().unwrap();
    assert_eq!(stored.document.count(Category::Hackathon), 0);
}

#[tokio::test]
async fn test_oversized_or_wrong_type_image_is_rejected() {
    let app = test_app().await;
    let cookie = register(&app.server, "ada@example.com").await;

    let form = portfolio_site().add_part("image", file_part("notes.txt", "text/plain", b"plain text"));
    let response = submit(&app.server, Some(cookie.clone()), "ai-project", form).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        notice_message(&response.json::<Value>()),
        "Invalid file type: text/plain"
    );

    let big = vec![0u8; app.state.config.storage.max_upload_size + 1];
    let form = portfolio_site().add_part("image", file_part("huge.png", "image/png", &big));
    let response = submit(&app.server, Some(cookie), "ai-project", form).await;
    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_profile_section_updates_fields() {
    let app = test_app().await;
    let cookie = register(&app.server, "ada@example.com").await;
    let uid = user_id(&app, &cookie).await;

    let form = MultipartForm::new()
        .add_text("fullName", "Ada King")
        .add_text("bio", "Countess")
        .add_text("collegeName", "Home schooled")
        .add_text("github", "https://github.com/ada");
    let response = submit(&app.server, Some(cookie), "profile", form).await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(
        notice_message(&response.json::<Value>()),
        "Profile information saved successfully!"
    );

    let stored = app.state.documents.read(&uid).await.unwrap().unwrap();
    assert_eq!(stored.document.profile.full_name, "Ada King");
    assert_eq!(stored.document.profile.college_name, "Home schooled");
    assert_eq!(stored.document.profile.email, "ada@example.com");
}

#[tokio::test]
async fn test_unknown_section_is_not_found() {
    let app = test_app().await;
    let response = submit(&app.server, None, "blog-post", portfolio_site()).await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_dashboard_selection() {
    let app = test_app().await;

    let default: Value = app.server.get("/api/upload").await.json();
    assert_eq!(default["selected"], "profile");
    assert_eq!(default["tabs"].as_array().unwrap().len(), 6);

    let hackathon: Value = app
        .server
        .get("/api/upload")
        .add_query_param("section", "hackathon")
        .await
        .json();
    assert_eq!(hackathon["selected"], "hackathon");
    assert_eq!(hackathon["form"]["notice"], Value::Null);

    let unknown: Value = app
        .server
        .get("/api/upload")
        .add_query_param("section", "nope")
        .await
        .json();
    assert_eq!(unknown["selected"], "profile");
}
