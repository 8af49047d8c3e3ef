use cookie::Cookie;
use percent_encoding::percent_decode_str;
use reqwest::header::{self, HeaderMap};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::ClientError;
use crate::types::*;

const MAX_ROWS: u32 = 500;
const EXPORT_FALLBACK_NAME: &str = "wrapper_config.json";

/// Collections managed through `/api/crud/<kind>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrudKind {
    Users,
    AclUsers,
    Gateways,
}

impl CrudKind {
    pub fn segment(&self) -> &'static str {
        match self {
            CrudKind::Users => "users",
            CrudKind::AclUsers => "acl-users",
            CrudKind::Gateways => "gateways",
        }
    }
}

/// Outcome of `POST /login`.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub result: LoginResult,
    /// Backend session cookie (`name=value` pairs) when one was issued.
    pub cookie: Option<String>,
}

/// Typed client for the SIP Wrapper REST backend.
///
/// Cloning is cheap; `with_session` derives a client that forwards the
/// backend session cookie on every request.
#[derive(Debug, Clone)]
pub struct WrapperClient {
    http: Client,
    base: Url,
    session: Option<String>,
}

impl WrapperClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            http: Client::new(),
            base,
            session: None,
        })
    }

    pub fn with_session(&self, cookie: impl Into<String>) -> Self {
        Self {
            http: self.http.clone(),
            base: self.base.clone(),
            session: Some(cookie.into()),
        }
    }

    pub fn session_cookie(&self) -> Option<&str> {
        self.session.as_deref()
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.session {
            Some(cookie) => builder.header(header::COOKIE, cookie.as_str()),
            None => builder,
        }
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::RequestFailed(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ClientError::Unauthorized),
            // login_required answers with a redirect that reqwest follows to the form
            _ if response.url().path().ends_with("/login") => Err(ClientError::Unauthorized),
            // a lost session can also come back as the login page itself with 200
            status if status.is_success() && is_login_page(&response) => Err(ClientError::Unauthorized),
            status if status.is_success() => Ok(response),
            status => Err(ClientError::UnexpectedStatus(status.as_u16())),
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        response
            .json::<T>()
            .await
            .map_err(|e: reqwest::Error| ClientError::ParseError(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: Option<String>,
    ) -> Result<T, ClientError> {
        let mut url = self.endpoint(segments)?;
        url.set_query(query.as_deref());
        debug!("GET {}", url.path());
        let response = self.execute(self.request(Method::GET, url)).await?;
        Self::decode(response).await
    }

    async fn send_json<B, T>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        debug!("{} {}", method, url.path());
        let mut builder = self.request(method, url);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = self.execute(builder).await?;
        Self::decode(response).await
    }

    // ── Status poller endpoints ─────────────────────────────

    pub async fn status(&self) -> Result<SystemStatus, ClientError> {
        self.get_json(&["api", "status"], None).await
    }

    pub async fn active_calls(&self) -> Result<ActiveCalls, ClientError> {
        self.get_json(&["api", "active-calls"], None).await
    }

    pub async fn cdr(&self, count: u32) -> Result<CdrList, ClientError> {
        let count = count.clamp(1, MAX_ROWS);
        self.get_json(&["api", "cdr"], Some(format!("count={count}"))).await
    }

    pub async fn logs(&self, count: u32) -> Result<LogList, ClientError> {
        let count = count.clamp(1, MAX_ROWS);
        self.get_json(&["api", "logs"], Some(format!("count={count}"))).await
    }

    // ── Users, ACL users, gateways ──────────────────────────

    pub async fn list<T: DeserializeOwned>(&self, kind: CrudKind) -> Result<Vec<T>, ClientError> {
        self.get_json(&["api", "crud", kind.segment()], None).await
    }

    pub async fn create<T: Serialize>(&self, kind: CrudKind, item: &T) -> Result<ActionResult, ClientError> {
        self.send_json(Method::POST, &["api", "crud", kind.segment()], Some(item))
            .await
    }

    pub async fn update<T: Serialize>(
        &self,
        kind: CrudKind,
        key: &str,
        item: &T,
    ) -> Result<ActionResult, ClientError> {
        self.send_json(Method::PUT, &["api", "crud", kind.segment(), key], Some(item))
            .await
    }

    pub async fn delete(&self, kind: CrudKind, key: &str) -> Result<ActionResult, ClientError> {
        self.send_json::<Value, _>(Method::DELETE, &["api", "crud", kind.segment(), key], None)
            .await
    }

    pub async fn users(&self) -> Result<Vec<SipUser>, ClientError> {
        self.list(CrudKind::Users).await
    }

    pub async fn acl_users(&self) -> Result<Vec<AclUser>, ClientError> {
        self.list(CrudKind::AclUsers).await
    }

    pub async fn gateways(&self) -> Result<Vec<Gateway>, ClientError> {
        self.list(CrudKind::Gateways).await
    }

    // ── Routes ──────────────────────────────────────────────

    pub async fn routes(&self) -> Result<Routes, ClientError> {
        self.get_json(&["api", "crud", "routes"], None).await
    }

    pub async fn save_default_routes(&self, routes: &DefaultRoutes) -> Result<ActionResult, ClientError> {
        self.send_json(Method::PUT, &["api", "crud", "routes"], Some(routes))
            .await
    }

    pub async fn add_inbound_route(&self, route: &InboundRoute) -> Result<ActionResult, ClientError> {
        self.send_json(Method::POST, &["api", "crud", "routes", "inbound"], Some(route))
            .await
    }

    pub async fn delete_inbound_route(&self, did: &str) -> Result<ActionResult, ClientError> {
        self.send_json::<Value, _>(Method::DELETE, &["api", "crud", "routes", "inbound", did], None)
            .await
    }

    pub async fn add_user_route(&self, route: &UserRoute) -> Result<ActionResult, ClientError> {
        self.send_json(Method::POST, &["api", "crud", "routes", "user"], Some(route))
            .await
    }

    pub async fn delete_user_route(&self, username: &str) -> Result<ActionResult, ClientError> {
        self.send_json::<Value, _>(Method::DELETE, &["api", "crud", "user-routes", username], None)
            .await
    }

    // ── Settings ────────────────────────────────────────────

    pub async fn settings(&self) -> Result<Settings, ClientError> {
        self.get_json(&["api", "crud", "settings"], None).await
    }

    pub async fn save_settings(&self, settings: &Settings) -> Result<ActionResult, ClientError> {
        self.send_json(Method::PUT, &["api", "crud", "settings"], Some(settings))
            .await
    }

    pub async fn license(&self) -> Result<License, ClientError> {
        self.get_json(&["api", "crud", "license"], None).await
    }

    pub async fn save_license(&self, license: &License) -> Result<ActionResult, ClientError> {
        self.send_json(Method::PUT, &["api", "crud", "license"], Some(license))
            .await
    }

    pub async fn defaults(&self) -> Result<Defaults, ClientError> {
        self.get_json(&["api", "crud", "defaults"], None).await
    }

    pub async fn save_outbound_caller_id(&self, caller_id: &str) -> Result<ActionResult, ClientError> {
        let body = json!({ "outbound_caller_id": caller_id });
        self.send_json(Method::PUT, &["api", "crud", "defaults"], Some(&body))
            .await
    }

    /// Write the config out and reload the PBX.
    pub async fn apply_config(&self) -> Result<ActionResult, ClientError> {
        self.send_json(Method::POST, &["api", "crud", "apply"], Some(&json!({})))
            .await
    }

    pub async fn import_env(&self) -> Result<ActionResult, ClientError> {
        self.send_json(Method::POST, &["api", "crud", "import-env"], Some(&json!({})))
            .await
    }

    // ── Config file ─────────────────────────────────────────

    pub async fn export_config(&self) -> Result<ExportedConfig, ClientError> {
        let url = self.endpoint(&["api", "config", "export"])?;
        let response = self.execute(self.request(Method::GET, url)).await?;
        let filename = attachment_filename(response.headers())
            .unwrap_or_else(|| EXPORT_FALLBACK_NAME.to_string());
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::RequestFailed(e.to_string()))?;
        Ok(ExportedConfig {
            filename,
            body: body.to_vec(),
        })
    }

    pub async fn import_config(&self, config: &Value) -> Result<ImportResult, ClientError> {
        self.send_json(Method::POST, &["api", "config", "import"], Some(config))
            .await
    }

    // ── Security ────────────────────────────────────────────

    pub async fn security(&self) -> Result<SecurityOverview, ClientError> {
        self.get_json(&["api", "security"], None).await
    }

    pub async fn add_to_blacklist(&self, ip: &str, comment: &str) -> Result<ActionResult, ClientError> {
        let body = json!({ "ip": ip, "comment": comment });
        self.send_json(Method::POST, &["api", "security", "blacklist"], Some(&body))
            .await
    }

    pub async fn remove_from_blacklist(&self, ip: &str) -> Result<ActionResult, ClientError> {
        self.send_json::<Value, _>(Method::DELETE, &["api", "security", "blacklist", ip], None)
            .await
    }

    pub async fn reset_blocked_count(&self, ip: &str) -> Result<ActionResult, ClientError> {
        self.send_json(
            Method::POST,
            &["api", "security", "blacklist", ip, "reset-count"],
            Some(&json!({})),
        )
        .await
    }

    pub async fn add_to_whitelist(&self, ip: &str, comment: &str) -> Result<ActionResult, ClientError> {
        let body = json!({ "ip": ip, "comment": comment });
        self.send_json(Method::POST, &["api", "security", "whitelist"], Some(&body))
            .await
    }

    pub async fn remove_from_whitelist(&self, ip: &str) -> Result<ActionResult, ClientError> {
        self.send_json::<Value, _>(Method::DELETE, &["api", "security", "whitelist", ip], None)
            .await
    }

    pub async fn set_whitelist_enabled(&self, enabled: bool) -> Result<ActionResult, ClientError> {
        let body = json!({ "enabled": enabled });
        self.send_json(Method::POST, &["api", "security", "whitelist-enabled"], Some(&body))
            .await
    }

    pub async fn auto_blacklist(&self) -> Result<AutoBlacklistSettings, ClientError> {
        self.get_json(&["api", "security", "auto-blacklist"], None).await
    }

    pub async fn save_auto_blacklist(
        &self,
        settings: &AutoBlacklistSettings,
    ) -> Result<ActionResult, ClientError> {
        self.send_json(Method::POST, &["api", "security", "auto-blacklist"], Some(settings))
            .await
    }

    pub async fn failed_attempts(&self) -> Result<FailedAttempts, ClientError> {
        self.get_json(&["api", "security", "failed-attempts"], None).await
    }

    pub async fn check_blacklist(&self) -> Result<CheckBlacklistResult, ClientError> {
        self.send_json(Method::POST, &["api", "security", "check-blacklist"], Some(&json!({})))
            .await
    }

    pub async fn fail2ban(&self) -> Result<Fail2banInfo, ClientError> {
        self.get_json(&["api", "security", "fail2ban"], None).await
    }

    pub async fn save_fail2ban(&self, settings: &Fail2banSettings) -> Result<ActionResult, ClientError> {
        self.send_json(Method::POST, &["api", "security", "fail2ban"], Some(settings))
            .await
    }

    pub async fn fail2ban_ban(&self, ip: &str) -> Result<ActionResult, ClientError> {
        self.send_json(Method::POST, &["api", "security", "fail2ban", "ban", ip], Some(&json!({})))
            .await
    }

    pub async fn fail2ban_unban(&self, ip: &str) -> Result<ActionResult, ClientError> {
        self.send_json(Method::POST, &["api", "security", "fail2ban", "unban", ip], Some(&json!({})))
            .await
    }

    // ── Session ─────────────────────────────────────────────

    /// Submit credentials as form data. A rejected login is `Ok` with
    /// `result.success == false`.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, ClientError> {
        let url = self.endpoint(&["login"])?;
        let form = reqwest::multipart::Form::new()
            .text("username", username.to_string())
            .text("password", password.to_string());

        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClientError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ClientError::UnexpectedStatus(response.status().as_u16()));
        }

        let cookie = session_cookie(response.headers());
        let result: LoginResult = Self::decode(response).await?;
        Ok(LoginOutcome { result, cookie })
    }

    /// Switch the backend UI language. Returns the re-issued session cookie
    /// when the backend rotated it.
    pub async fn set_lang(&self, lang: &str) -> Result<Option<String>, ClientError> {
        let url = self.endpoint(&["api", "set-lang"])?;
        let response = self
            .execute(self.request(Method::POST, url).json(&json!({ "lang": lang })))
            .await?;
        Ok(session_cookie(response.headers()))
    }

    // ── Public ──────────────────────────────────────────────

    /// Read-only routing snapshot served without a session.
    pub async fn public_config(&self) -> Result<PublicConfig, ClientError> {
        self.get_json(&["api", "config"], None).await
    }

    pub async fn public_config_from(&self, url: &str) -> Result<PublicConfig, ClientError> {
        let url = Url::parse(url).map_err(|e| ClientError::InvalidUrl(format!("{url}: {e}")))?;
        let response = self.execute(self.http.get(url)).await?;
        Self::decode(response).await
    }
}

/// HTML answering a JSON endpoint under `/api/`.
fn is_login_page(response: &Response) -> bool {
    let html = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.trim_start().to_ascii_lowercase().starts_with("text/html"))
        .unwrap_or(false);
    html && response.url().path().contains("/api/")
}

/// Collapse every `Set-Cookie` header into a single `Cookie` header value.
fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let pairs: Vec<String> = headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| Cookie::parse(v).ok())
        .filter(|c| !c.value().is_empty())
        .map(|c| c.stripped().to_string())
        .collect();

    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}

/// `filename*` (RFC 5987) wins over `filename`; quoted values may contain `;`.
fn attachment_filename(headers: &HeaderMap) -> Option<String> {
    let disposition = headers.get(header::CONTENT_DISPOSITION)?.to_str().ok()?;
    let params = disposition_params(disposition);
    let extended = params
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("filename*"))
        .and_then(|(_, value)| {
            let (_charset, rest) = value.split_once('\'')?;
            let (_lang, encoded) = rest.split_once('\'')?;
            percent_decode_str(encoded).decode_utf8().ok().map(|n| n.into_owned())
        });
    extended
        .or_else(|| {
            params
                .into_iter()
                .find(|(key, _)| key.eq_ignore_ascii_case("filename"))
                .map(|(_, value)| value)
        })
        .filter(|name| !name.is_empty())
}

fn disposition_params(header: &str) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let mut chars = header.chars().peekable();
    // disposition type
    while let Some(c) = chars.next() {
        if c == ';' {
            break;
        }
    }
    loop {
        let key: String = chars.by_ref().take_while(|&c| c != '=').collect();
        let key = key.trim().to_string();
        if key.is_empty() {
            break;
        }
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        let mut value = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => value.extend(chars.next()),
                    '"' => break,
                    c => value.push(c),
                }
            }
            chars.by_ref().take_while(|&c| c != ';').for_each(drop);
        } else {
            value = chars.by_ref().take_while(|&c| c != ';').collect();
            value = value.trim().to_string();
        }
        params.push((key, value));
    }
    params
}
