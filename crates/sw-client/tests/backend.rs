use axum::extract::{Multipart, Path, Query};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::collections::HashMap;

use sw_client::types::*;
use sw_client::{ClientError, CrudKind, WrapperClient};

const SESSION: &str = "session=tok123";

fn authed(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(|c| c.contains(SESSION))
        .unwrap_or(false)
}

async fn login(mut form: Multipart) -> Response {
    let mut fields = HashMap::new();
    while let Ok(Some(field)) = form.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let value = field.text().await.unwrap_or_default();
        fields.insert(name, value);
    }
    if fields.get("username").map(String::as_str) == Some("admin")
        && fields.get("password").map(String::as_str) == Some("secret")
    {
        (
            [(header::SET_COOKIE, "session=tok123; HttpOnly; Path=/")],
            Json(json!({ "success": true })),
        )
            .into_response()
    } else {
        Json(json!({ "success": false, "error": "Invalid credentials" })).into_response()
    }
}

async fn status(headers: HeaderMap) -> Response {
    if !authed(&headers) {
        return Redirect::to("/login").into_response();
    }
    Json(json!({
        "profiles": [{ "name": "internal", "status": "online" }],
        "gateways": [{ "name": "sipgate", "status": "online", "registered": true }],
        "registrations": [{ "user": "alice@pbx", "contact": "sip:alice@10.0.0.9", "agent": "Yealink", "status": "Registered", "host": "pbx" }],
        "fs_access": true
    }))
    .into_response()
}

async fn cdr(Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    let count: usize = q.get("count").and_then(|c| c.parse().ok()).unwrap_or(0);
    Json(json!({ "calls": [], "count": count }))
}

async fn delete_inbound(Path(did): Path<String>) -> Json<Value> {
    Json(json!({ "success": true, "message": format!("Route {did} deleted") }))
}

async fn create_gateway(Json(body): Json<Value>) -> Json<Value> {
    if body["name"].as_str().unwrap_or_default().is_empty() {
        return Json(json!({ "success": false, "message": "Name required" }));
    }
    Json(json!({ "success": true, "message": format!("Gateway {} added", body["name"].as_str().unwrap()) }))
}

async fn export() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::CONTENT_DISPOSITION, "attachment; filename=wrapper_config_20250101_120000.json"),
        ],
        r#"{"users":[],"gateways":[],"routes":{}}"#,
    )
}

async fn failed_attempts() -> Json<Value> {
    Json(json!({
        "attempts": [{ "ip": "203.0.113.7", "count": 8, "last_attempt": "2025-01-01T10:00:00" }],
        "auto_blocked": [],
        "settings": { "enabled": true, "max_attempts": 10, "time_window": 300, "block_duration": 3600 }
    }))
}

async fn teapot() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

fn backend() -> Router {
    Router::new()
        .route("/login", post(login).get(|| async { "<form>login</form>" }))
        .route("/api/status", get(status))
        .route("/api/cdr", get(cdr))
        .route("/api/logs", get(teapot))
        .route("/api/crud/routes/inbound/{did}", delete(delete_inbound))
        .route("/api/crud/gateways", post(create_gateway))
        .route("/api/config/export", get(export))
        .route("/api/security/failed-attempts", get(failed_attempts))
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn login_issues_session_cookie() {
    let base = spawn(backend()).await;
    let client = WrapperClient::new(&base).unwrap();

    let outcome = client.login("admin", "secret").await.unwrap();
    assert!(outcome.result.success);
    assert_eq!(outcome.cookie.as_deref(), Some(SESSION));
}

#[tokio::test]
async fn rejected_login_carries_server_message() {
    let base = spawn(backend()).await;
    let client = WrapperClient::new(&base).unwrap();

    let outcome = client.login("admin", "wrong").await.unwrap();
    assert!(!outcome.result.success);
    assert_eq!(outcome.result.error.as_deref(), Some("Invalid credentials"));
    assert!(outcome.cookie.is_none());
}

#[tokio::test]
async fn missing_session_is_unauthorized() {
    let base = spawn(backend()).await;
    let client = WrapperClient::new(&base).unwrap();

    let err = client.status().await.unwrap_err();
    assert!(err.is_unauthorized());

    let status = client.with_session(SESSION).status().await.unwrap();
    assert_eq!(status.gateways_online(), 1);
    assert!(status.is_registered("alice"));
}

#[tokio::test]
async fn cdr_count_is_clamped() {
    let base = spawn(backend()).await;
    let client = WrapperClient::new(&base).unwrap();

    assert_eq!(client.cdr(10).await.unwrap().count, 10);
    assert_eq!(client.cdr(0).await.unwrap().count, 1);
    assert_eq!(client.cdr(9_999).await.unwrap().count, 500);
}

#[tokio::test]
async fn server_error_is_reported() {
    let base = spawn(backend()).await;
    let client = WrapperClient::new(&base).unwrap();

    assert!(matches!(
        client.logs(10).await,
        Err(ClientError::UnexpectedStatus(500))
    ));
}

#[tokio::test]
async fn path_keys_round_trip_through_encoding() {
    let base = spawn(backend()).await;
    let client = WrapperClient::new(&base).unwrap();

    let result = client.delete_inbound_route("+49 30 123").await.unwrap();
    assert!(result.success);
    assert_eq!(result.text(""), "Route +49 30 123 deleted");
}

#[tokio::test]
async fn create_posts_json_body() {
    let base = spawn(backend()).await;
    let client = WrapperClient::new(&base).unwrap();

    let gw = Gateway {
        name: "easybell".into(),
        host: "sip.easybell.de".into(),
        ..Default::default()
    };
    let result = client.create(CrudKind::Gateways, &gw).await.unwrap();
    assert!(result.success);
    assert_eq!(result.message.as_deref(), Some("Gateway easybell added"));
}

#[tokio::test]
async fn export_keeps_backend_filename() {
    let base = spawn(backend()).await;
    let client = WrapperClient::new(&base).unwrap();

    let exported = client.export_config().await.unwrap();
    assert_eq!(exported.filename, "wrapper_config_20250101_120000.json");
    let parsed: Value = serde_json::from_slice(&exported.body).unwrap();
    assert!(parsed.get("users").is_some());
}

#[tokio::test]
async fn failed_attempts_are_typed() {
    let base = spawn(backend()).await;
    let client = WrapperClient::new(&base).unwrap();

    let attempts = client.failed_attempts().await.unwrap();
    assert_eq!(attempts.attempts[0].count, 8);
    assert_eq!(attempts.settings.unwrap().max_attempts, 10);
}

#[tokio::test]
async fn login_page_served_inline_is_unauthorized() {
    let app = Router::new().route(
        "/api/status",
        get(|| async { Html("<!DOCTYPE html><form action=\"/login\"></form>") }),
    );
    let base = spawn(app).await;
    let client = WrapperClient::new(&base).unwrap().with_session(SESSION);

    let err = client.status().await.unwrap_err();
    assert!(err.is_unauthorized());
}
