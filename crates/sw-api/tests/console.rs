use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio_stream::StreamExt;
use tower::ServiceExt;

use sw_api::{ApiState, build_router};
use sw_client::WrapperClient;
use sw_common::config::ConsoleConfig;
use sw_common::events::EventBus;
use sw_common::prefs::PreferenceStore;
use sw_landing::LandingSite;

const BACKEND_COOKIE: &str = "session=tok123";

/// Requests the fake backend received, as `"METHOD path detail"`.
#[derive(Clone, Default)]
struct Calls(Arc<Mutex<Vec<String>>>);

impl Calls {
    fn push(&self, call: String) {
        self.0.lock().unwrap().push(call);
    }

    fn all(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

fn authed(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|c| c.contains(BACKEND_COOKIE))
}

async fn login(mut form: Multipart) -> Response {
    let mut fields = HashMap::new();
    while let Ok(Some(field)) = form.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        fields.insert(name, field.text().await.unwrap_or_default());
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

async fn users(headers: HeaderMap) -> Response {
    if !authed(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!([{ "username": "alice", "extension": "101", "enabled": true }])).into_response()
}

async fn create_user(State(calls): State<Calls>, Json(body): Json<Value>) -> Json<Value> {
    calls.push(format!("POST users {}", body["username"].as_str().unwrap_or_default()));
    Json(json!({ "success": true, "message": "User created" }))
}

async fn update_user(State(calls): State<Calls>, Path(key): Path<String>) -> Json<Value> {
    calls.push(format!("PUT users {key}"));
    Json(json!({ "success": true }))
}

async fn add_blacklist(State(calls): State<Calls>, Json(body): Json<Value>) -> Json<Value> {
    calls.push(format!(
        "POST blacklist {} {}",
        body["ip"].as_str().unwrap_or_default(),
        body["comment"].as_str().unwrap_or_default()
    ));
    Json(json!({ "success": true, "message": "IP blocked" }))
}

async fn save_settings(State(calls): State<Calls>) -> Json<Value> {
    calls.push("PUT settings".into());
    Json(json!({ "success": true }))
}

async fn save_license(State(calls): State<Calls>) -> Json<Value> {
    calls.push("PUT license".into());
    Json(json!({ "success": false, "error": "Invalid key" }))
}

async fn save_defaults(State(calls): State<Calls>) -> Json<Value> {
    calls.push("PUT defaults".into());
    Json(json!({ "success": true }))
}

fn backend(calls: Calls) -> Router {
    let empty = || async { Json(json!([])) };
    let object = || async { Json(json!({})) };
    Router::new()
        .route("/login", post(login))
        .route(
            "/api/status",
            get(|| async {
                Json(json!({
                    "profiles": [{ "name": "internal", "status": "online" }],
                    "gateways": [{ "name": "sipgate", "status": "online" }],
                    "registrations": [{ "user": "alice@pbx", "contact": "sip:alice@10.0.0.9" }],
                    "fs_access": true
                }))
            }),
        )
        .route("/api/active-calls", get(|| async { Json(json!({ "calls": [], "count": 0 })) }))
        .route("/api/cdr", get(|| async { Json(json!({ "calls": [], "count": 0 })) }))
        .route("/api/logs", get(|| async { Json(json!({ "logs": [], "count": 0 })) }))
        .route("/api/crud/users", get(users).post(create_user))
        .route("/api/crud/users/{key}", put(update_user))
        .route("/api/crud/acl-users", get(empty))
        .route("/api/crud/gateways", get(empty))
        .route("/api/crud/routes", get(object))
        .route("/api/crud/settings", get(object).put(save_settings))
        .route("/api/crud/license", get(object).put(save_license))
        .route("/api/crud/defaults", get(object).put(save_defaults))
        .route("/api/security/blacklist", post(add_blacklist))
        .route(
            "/api/config/export",
            get(|| async {
                (
                    [(header::CONTENT_DISPOSITION, "attachment; filename=wrapper_config_20250101.json")],
                    r#"{"users":[]}"#,
                )
            }),
        )
        .route(
            "/api/config",
            get(|| async {
                Json(json!({
                    "users": [{ "username": "alice", "extension": "101" }],
                    "gateways": [{ "name": "sipgate" }],
                    "default_gateway": "sipgate"
                }))
            }),
        )
        .with_state(calls)
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

struct Console {
    app: Router,
    calls: Calls,
    dir: tempfile::TempDir,
}

async fn console(update_token: &str) -> Console {
    let calls = Calls::default();
    let base = spawn(backend(calls.clone())).await;
    let dir = tempfile::tempdir().unwrap();

    let mut config = ConsoleConfig::default();
    config.backend_url = base.clone();
    config.prefs_path = dir.path().join("prefs.json");
    config.landing.dir = dir.path().to_path_buf();
    config.landing.update_token = update_token.into();

    let prefs = Arc::new(PreferenceStore::open(&config.prefs_path, config.default_refresh_ms));
    let events = Arc::new(EventBus::new());
    let landing = Arc::new(LandingSite::open(dir.path(), config.public_config_url()).await);
    let backend = WrapperClient::new(&base).unwrap();
    let state = ApiState::new(config, backend, prefs, events, landing);

    Console {
        app: build_router(state),
        calls,
        dir,
    }
}

impl Console {
    async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::get(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    /// Log in and return the console cookie (`sw_session=<id>`).
    async fn login(&self) -> String {
        let res = self.post_form("/login", "username=admin&password=secret", None).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/");
        res.headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("sw_session="))
            .and_then(|v| v.split(';').next())
            .expect("session cookie")
            .to_string()
    }
}

fn location(res: &Response) -> String {
    res.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn body_text(res: Response) -> String {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn protected_pages_redirect_to_login() {
    let c = console("").await;
    for uri in ["/", "/manage", "/security"] {
        let res = c.get(uri, None).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(location(&res), "/login");
    }
    let res = c.get("/fragments/stats", None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn rejected_login_stays_on_form() {
    let c = console("").await;
    let res = c.post_form("/login", "username=admin&password=wrong", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get(header::SET_COOKIE).is_none());
    let html = body_text(res).await;
    assert!(html.contains("Invalid credentials"));
    assert!(html.contains(r#"value="admin""#));
}

#[tokio::test]
async fn dashboard_and_fragments_after_login() {
    let c = console("").await;
    let cookie = c.login().await;

    let res = c.get("/", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let html = body_text(res).await;
    assert!(html.contains("alice"));
    assert!(html.contains(r#"data-fragment="stats""#));

    let res = c.get("/fragments/gateways", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-refresh-interval"], "10000");
    assert!(body_text(res).await.contains("sipgate"));

    let res = c.get("/fragments/nope", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

/// Reads SSE frames until one carries `data: <value>`.
async fn next_interval<S>(events: &mut S) -> String
where
    S: tokio_stream::Stream<Item = Result<axum::body::Bytes, axum::Error>> + Unpin,
{
    let mut buf = String::new();
    loop {
        let chunk = tokio::time::timeout(std::time::Duration::from_secs(5), events.next())
            .await
            .expect("interval event")
            .expect("stream open")
            .unwrap();
        buf.push_str(&String::from_utf8_lossy(&chunk));
        if let Some(line) = buf.lines().find_map(|l| l.strip_prefix("data: ")) {
            return line.to_string();
        }
    }
}

#[tokio::test]
async fn interval_changes_reach_open_pages() {
    let c = console("").await;
    let res = c.get("/events/refresh-interval", None).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);

    let cookie = c.login().await;
    let res = c.get("/events/refresh-interval", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers()[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/event-stream"));
    let mut events = res.into_body().into_data_stream();
    assert_eq!(next_interval(&mut events).await, "10000");

    // pausing must still reach the page so it can resume later
    c.post_form("/prefs/refresh-interval", "interval=0", Some(&cookie)).await;
    assert_eq!(next_interval(&mut events).await, "0");

    c.post_form("/prefs/refresh-interval", "interval=30000", Some(&cookie)).await;
    assert_eq!(next_interval(&mut events).await, "30000");
}

#[tokio::test]
async fn refresh_interval_is_persisted_and_advertised() {
    let c = console("").await;
    let cookie = c.login().await;

    let res = c
        .post_form("/prefs/refresh-interval", "interval=0&return_to=%2Fsecurity", Some(&cookie))
        .await;
    assert_eq!(location(&res), "/security");
    let saved = std::fs::read_to_string(c.dir.path().join("prefs.json")).unwrap();
    assert!(saved.contains("\"refresh_interval_ms\": 0"));

    let res = c.get("/fragments/stats", Some(&cookie)).await;
    assert_eq!(res.headers()["x-refresh-interval"], "0");

    let res = c
        .post_form("/prefs/refresh-interval", "interval=500&return_to=%2F", Some(&cookie))
        .await;
    assert!(location(&res).starts_with("/?msg=error&detail="));
}

#[tokio::test]
async fn edit_marker_selects_put_over_post() {
    let c = console("").await;
    let cookie = c.login().await;

    let res = c
        .post_form("/manage/users", "edit_mode=&username=bob&password=pw&extension=102&enabled=on", Some(&cookie))
        .await;
    assert!(location(&res).starts_with("/manage?tab=users&msg="));

    c.post_form("/manage/users", "edit_mode=alice&username=alice&password=&extension=101", Some(&cookie))
        .await;

    let calls = c.calls.all();
    assert!(calls.contains(&"POST users bob".to_string()));
    assert!(calls.contains(&"PUT users alice".to_string()));
}

#[tokio::test]
async fn partial_settings_save_is_an_error() {
    let c = console("").await;
    let cookie = c.login().await;

    let res = c
        .post_form("/manage/settings", "fs_domain=pbx&internal_sip_port=5060&license_key=bad", Some(&cookie))
        .await;
    let target = location(&res);
    assert!(target.starts_with("/manage?tab=settings&msg=error"));
    assert!(target.contains("Failed"));
    let calls = c.calls.all();
    for call in ["PUT settings", "PUT license", "PUT defaults"] {
        assert!(calls.contains(&call.to_string()), "{call}");
    }
}

#[tokio::test]
async fn blank_ip_is_rejected_without_request() {
    let c = console("").await;
    let cookie = c.login().await;

    let res = c.post_form("/security/blacklist", "ip=++&comment=x", Some(&cookie)).await;
    assert!(location(&res).starts_with("/security?msg=error&detail=IP"));

    c.post_form("/security/quick-block", "ip=198.51.100.9", Some(&cookie)).await;
    assert_eq!(
        c.calls.all(),
        vec!["POST blacklist 198.51.100.9 Manually blocked from monitor".to_string()]
    );
}

#[tokio::test]
async fn export_is_an_attachment() {
    let c = console("").await;
    let cookie = c.login().await;

    let res = c.get("/manage/export", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"wrapper_config_20250101.json\""
    );
    assert_eq!(body_text(res).await, r#"{"users":[]}"#);
}

#[tokio::test]
async fn logout_ends_session() {
    let c = console("").await;
    let cookie = c.login().await;

    let res = c.get("/logout", Some(&cookie)).await;
    assert_eq!(location(&res), "/login");

    let res = c.get("/", Some(&cookie)).await;
    assert_eq!(location(&res), "/login");
}

#[tokio::test]
async fn landing_page_shows_live_config() {
    let c = console("").await;
    let html = body_text(c.get("/landing/", None).await).await;
    assert!(html.contains("integration-table"));
    assert!(html.contains("Aktuelle Konfiguration"));
    assert!(html.contains("<code>alice</code>"));
}

#[tokio::test]
async fn landing_update_requires_token() {
    let c = console("s3cret").await;
    let res = c.get("/landing/update?token=wrong", None).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_text(res).await, "Forbidden");

    let res = c.get("/landing/update", None).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let disabled = console("").await;
    let res = disabled.get("/landing/update?token=", None).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}
