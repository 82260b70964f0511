use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;
use wcag_site_api::blog::{BlogPost, FactCheckStatus};
use wcag_site_api::{AppState, Settings, routes};

fn app(dir: &TempDir, configure: impl FnOnce(&mut Settings)) -> (Router, AppState) {
    let mut settings = Settings {
        data_dir: dir.path().to_path_buf(),
        ..Settings::default()
    };
    configure(&mut settings);
    let state = AppState::with_client(settings, reqwest::Client::new()).expect("state");
    (routes::router(state.clone()), state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    (status, bytes.to_vec())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = send(app, Request::get(uri).body(Body::empty()).expect("request")).await;
    (status, serde_json::from_slice(&body).expect("json body"))
}

async fn post_json(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request");
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).expect("json body"))
}

fn post(slug: &str, published: bool) -> BlogPost {
    BlogPost {
        slug: slug.into(),
        title: format!("Title of {slug}"),
        content: "Body".into(),
        excerpt: "Body...".into(),
        published_at: "2026-03-01T09:00:00.000Z".into(),
        generated_at: "2026-03-01T09:00:00.000Z".into(),
        sources: Vec::new(),
        fact_check_status: if published {
            FactCheckStatus::Verified
        } else {
            FactCheckStatus::NeedsReview
        },
        fact_check_notes: None,
        is_published: published,
        tags: vec!["accessibility".into()],
    }
}

#[tokio::test]
async fn health_reports_service_and_environment() {
    let dir = TempDir::new().expect("tempdir");
    let (app, _) = app(&dir, |settings| settings.environment = "production".into());
    let (status, body) = get_json(&app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "TheWCAG.com");
    assert_eq!(body["environment"], "production");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn accessibility_test_validates_the_url_before_fetching() {
    let dir = TempDir::new().expect("tempdir");
    let (app, _) = app(&dir, |_| {});

    let (status, body) = post_json(&app, "/api/tools/accessibility-test", "{}").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "URL is required and must be a string" }));

    let (status, body) = post_json(&app, "/api/tools/accessibility-test", r#"{"url": 42}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "URL is required and must be a string");

    let (status, body) =
        post_json(&app, "/api/tools/accessibility-test", r#"{"url": "http://localhost:8080/"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "error": "Invalid URL format or URL not allowed for security reasons" })
    );
}

#[tokio::test]
async fn quiz_scores_round_trip_through_the_leaderboard() {
    let dir = TempDir::new().expect("tempdir");
    let (app, state) = app(&dir, |_| {});

    let (status, body) =
        post_json(&app, "/api/quiz/scores", r#"{"score": 8, "total": 10, "name": "  <b>Ada</b> "}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Ada");
    assert_eq!(body["data"]["percentage"], 80);
    assert!(state.quiz.path().exists());

    post_json(&app, "/api/quiz/scores", r#"{"score": 10, "total": 10}"#).await;

    let (status, body) = get_json(&app, "/api/quiz/scores?limit=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "all-time");
    assert_eq!(body["limit"], 1);
    let data = body["data"].as_array().expect("scores");
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["percentage"], 100);

    let (_, body) = get_json(&app, "/api/quiz/scores?type=daily").await;
    assert_eq!(body["type"], "daily");
    assert_eq!(body["limit"], 10);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

    let (_, body) = get_json(&app, "/api/quiz/scores?type=stats").await;
    assert_eq!(
        body,
        json!({
            "success": true,
            "data": { "totalAttempts": 2, "todayAttempts": 2, "averageScore": 90 }
        })
    );
}

#[tokio::test]
async fn quiz_rejects_invalid_submissions() {
    let dir = TempDir::new().expect("tempdir");
    let (app, _) = app(&dir, |_| {});

    let (status, body) = post_json(&app, "/api/quiz/scores", r#"{"score": "8", "total": 10}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "success": false, "error": "Invalid score or total" }));

    let (status, body) = post_json(&app, "/api/quiz/scores", r#"{"score": 11, "total": 10}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Score must be between 0 and total");

    let (status, body) =
        post_json(&app, "/api/quiz/scores", r#"{"score": 1, "total": 10, "name": 7}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Name must be a string");

    let (status, body) =
        post_json(&app, "/api/quiz/scores", r#"{"score": 1, "total": 10, "name": null}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "success": false, "error": "Name must be a string" }));

    let (status, body) = post_json(&app, "/api/quiz/scores", r#"{"score": 2.5, "total": 5}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["percentage"], 50);

    let (status, body) = post_json(&app, "/api/quiz/scores", "not json").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to save score");
}

#[tokio::test]
async fn og_route_renders_a_cacheable_png() {
    let dir = TempDir::new().expect("tempdir");
    let (app, _) = app(&dir, |_| {});
    let request = Request::get("/api/og?title=Non-text%20Content&type=criterion&criterion=1.1.1&level=A")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(
        response.headers()[header::CACHE_CONTROL],
        "public, immutable, no-transform, max-age=31536000"
    );
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}

#[tokio::test]
async fn cron_rejects_a_wrong_bearer_token() {
    let dir = TempDir::new().expect("tempdir");
    let (app, _) = app(&dir, |settings| settings.cron_secret = Some("s3cret".into()));
    let request = Request::get("/api/cron/generate-blog")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .body(Body::empty())
        .expect("request");
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        serde_json::from_slice::<Value>(&body).expect("json"),
        json!({ "error": "Unauthorized" })
    );
}

#[tokio::test]
async fn blog_routes_serve_published_posts_only() {
    let dir = TempDir::new().expect("tempdir");
    let (app, state) = app(&dir, |_| {});

    let (status, body) = get_json(&app, "/api/blog").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    state.blog.save(&post("live-post", true)).await.expect("save live");
    state.blog.save(&post("draft-post", false)).await.expect("save draft");

    let (_, body) = get_json(&app, "/api/blog").await;
    let slugs: Vec<&str> = body
        .as_array()
        .expect("list")
        .iter()
        .filter_map(|entry| entry["slug"].as_str())
        .collect();
    assert_eq!(slugs, vec!["live-post"]);

    let (status, body) = get_json(&app, "/api/blog/live-post").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["factCheckStatus"], "verified");

    for uri in ["/api/blog/draft-post", "/api/blog/missing", "/api/blog/Not%20A%20Slug"] {
        let (status, body) = get_json(&app, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body, json!({ "error": "Post not found" }));
    }
}

#[tokio::test]
async fn revalidate_requires_configured_secret() {
    let dir = TempDir::new().expect("tempdir");
    let (app, _) = app(&dir, |_| {});
    let (status, body) = post_json(&app, "/api/revalidate", r#"{"path":"/blog","secret":"s3cret"}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Revalidation not configured" }));
}

#[tokio::test]
async fn revalidate_checks_secret_then_path() {
    let dir = TempDir::new().expect("tempdir");
    let (app, _) = app(&dir, |settings| settings.revalidate_secret = Some("s3cret".into()));

    for body in [r#"{"path":"/blog","secret":"wrong"}"#, r#"{"path":"/blog"}"#] {
        let (status, json) = post_json(&app, "/api/revalidate", body).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{body}");
        assert_eq!(json, json!({ "error": "Invalid secret" }));
    }

    for body in [r#"{"secret":"s3cret"}"#, r#"{"path":"","secret":"s3cret"}"#] {
        let (status, json) = post_json(&app, "/api/revalidate", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(json, json!({ "error": "Path is required" }));
    }

    let (status, body) = post_json(&app, "/api/revalidate", r#"{"path":"/blog/post","secret":"s3cret"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["revalidated"], true);
    assert_eq!(body["path"], "/blog/post");
    let timestamp = body["timestamp"].as_str().expect("timestamp");
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok(), "{timestamp}");
    assert!(timestamp.ends_with('Z'));
}

#[tokio::test]
async fn revalidate_reports_unreadable_bodies() {
    let dir = TempDir::new().expect("tempdir");
    let (app, _) = app(&dir, |settings| settings.revalidate_secret = Some("s3cret".into()));
    let (status, body) = post_json(&app, "/api/revalidate", "not json").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Revalidation failed");
    assert!(body["message"].as_str().is_some_and(|message| !message.is_empty()));
}
