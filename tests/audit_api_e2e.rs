//! End-to-end tests for the HTTP API.
//!
//! Each test stands up the full router over an in-memory database and a
//! mocked website, then drives it with plain HTTP requests.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::ServiceExt;

use seoaudit::api::{router, AppState};
use seoaudit::config::AppConfig;

/// Creates an in-memory SQLite database with migrations applied.
async fn setup_test_db() -> SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Builds the router over a fresh database, with file stores in a temp dir.
async fn setup_app() -> (Router, tempfile::TempDir) {
    let pool = setup_test_db().await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = AppConfig {
        bind_addr: "127.0.0.1:0".parse().expect("bind addr"),
        database_url: "sqlite::memory:".to_string(),
        data_dir: dir.path().to_path_buf(),
        reports_dir: dir.path().join("reports"),
    };
    let state = AppState::init(config, pool)
        .await
        .expect("Failed to build app state");
    (router(state), dir)
}

fn storefront_html() -> String {
    let copy: String = "word ".repeat(350);
    format!(
        r#"<html><head>
        <title>Sample Store - Quality Goods Online</title>
        <meta name="description" content="Shop quality goods with fast shipping and easy returns at Sample Store.">
        <meta name="viewport" content="width=device-width, initial-scale=1">
        <link rel="canonical" href="https://example.com/">
        </head><body>
        <h1>Welcome to Sample Store</h1>
        <img src="/hero.png" alt="Storefront">
        <p>{copy}</p>
        </body></html>"#
    )
}

async fn serve_site(server: &mut mockito::Server) -> Vec<mockito::Mock> {
    vec![
        server
            .mock("GET", "/")
            .with_status(200)
            .with_header("Content-Type", "text/html")
            .with_body(storefront_html())
            .create_async()
            .await,
        server
            .mock("GET", "/robots.txt")
            .with_status(200)
            .with_body("User-agent: *\nDisallow:")
            .create_async()
            .await,
        server
            .mock("GET", "/sitemap.xml")
            .with_status(200)
            .with_body("<urlset><url><loc>https://a.com/</loc></url></urlset>")
            .create_async()
            .await,
    ]
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("request failed");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response was not JSON")
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request")
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn put_json(uri: &str, body: Value) -> Request<Body> {
    Request::put(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

#[tokio::test]
async fn analyze_then_fetch_the_stored_audit() {
    let (app, _dir) = setup_app().await;
    let mut server = mockito::Server::new_async().await;
    let _mocks = serve_site(&mut server).await;

    let (status, body) = send(
        &app,
        post_json("/api/audit/analyze", json!({ "url": server.url() })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["cached"], false);
    assert!(body["overall_score"].as_i64().expect("score") > 0);

    let audit_id = body["audit_id"].as_str().expect("audit id").to_string();
    let (status, report) = send(&app, get(&format!("/api/audit/{audit_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["id"], json!(audit_id));
    assert_eq!(report["status"], "completed");
    assert_eq!(report["details"]["seo"]["title_tag"]["status"], "pass");
    assert_eq!(report["seo_metrics"]["robots_txt_exists"], true);

    let (status, listing) = send(&app, get("/api/websites")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["pagination"]["total"], 1);
    assert_eq!(listing["websites"][0]["latest_audit"]["id"], json!(audit_id));
}

#[tokio::test]
async fn analyze_without_a_url_is_rejected() {
    let (app, _dir) = setup_app().await;

    let (status, body) = send(&app, post_json("/api/audit/analyze", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "URL is required");
}

#[tokio::test]
async fn unknown_audit_returns_not_found() {
    let (app, _dir) = setup_app().await;

    let (status, body) = send(&app, get("/api/audit/no-such-audit")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Audit not found: no-such-audit");
}

#[tokio::test]
async fn health_endpoint_reports_running() {
    let (app, _dir) = setup_app().await;

    let (status, body) = send(&app, get("/api/audit/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "SEO Analyzer Pro API is running");
}

#[tokio::test]
async fn plan_catalog_is_served() {
    let (app, _dir) = setup_app().await;

    let (status, body) = send(&app, get("/api/payment/plans")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["plans"]["professional"]["monthly_price"], 79);
    assert_eq!(
        body["plans"]["starter"]["features"]
            .as_array()
            .expect("features")
            .len(),
        6
    );
}

#[tokio::test]
async fn white_label_config_roundtrip_and_validation() {
    let (app, _dir) = setup_app().await;

    let (status, updated) = send(
        &app,
        put_json(
            "/api/white-label/config",
            json!({ "company_name": "Acme SEO", "primary_color": "#112233" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["company_name"], "Acme SEO");
    assert_eq!(updated["primary_color"], "#112233");

    let (status, current) = send(&app, get("/api/white-label/config")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(current["company_name"], "Acme SEO");

    let (status, rejected) = send(
        &app,
        put_json("/api/white-label/config", json!({ "primary_color": "red" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(rejected["errors"]["primary_color"].is_string());
}

#[tokio::test]
async fn lead_capture_stores_and_lists_the_lead() {
    let (app, _dir) = setup_app().await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/optimization/leads/capture",
            json!({ "email": "owner@example.com", "metadata": { "website_url": "https://example.com" } }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["lead"]["email"], "owner@example.com");
    assert_eq!(body["lead"]["source"], "website");

    let (status, listing) = send(&app, get("/api/optimization/leads")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["count"], 1);
    assert_eq!(listing["leads"][0]["email"], "owner@example.com");

    let (status, body) = send(
        &app,
        post_json("/api/optimization/leads/capture", json!({ "source": "report" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email is required");
}
