//! Configuration management: users, ACL users, gateways, routes, settings
//! and the config file import/export.

use axum::extract::{Multipart, Query, State};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use serde_json::Value;
use sw_client::CrudKind;
use sw_client::types::{
    AclUser, DefaultRoutes, Gateway, InboundRoute, License, Settings, SipUser, UserRoute,
};
use sw_common::events::ConfigChangeEvent;
use sw_web::pages::{ManageData, ManageModal, ManageTab, ManageView, render_manage};
use sw_web::{Flash, Nav};
use tracing::{info, warn};

use crate::routes::{expire, flash_redirect, notify, settle};
use crate::session::{CurrentSession, Session};
use crate::state::ApiState;

const EXPORT_CONTENT_TYPE: &str = "application/json";

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/manage", get(manage_page))
        .route("/manage/users", post(save_user))
        .route("/manage/users/delete", post(delete_user))
        .route("/manage/acl-users", post(save_acl_user))
        .route("/manage/acl-users/delete", post(delete_acl_user))
        .route("/manage/gateways", post(save_gateway))
        .route("/manage/gateways/delete", post(delete_gateway))
        .route("/manage/routes/defaults", post(save_default_routes))
        .route("/manage/routes/inbound", post(add_inbound_route))
        .route("/manage/routes/inbound/delete", post(delete_inbound_route))
        .route("/manage/routes/user", post(add_user_route))
        .route("/manage/routes/user/delete", post(delete_user_route))
        .route("/manage/settings", post(save_settings))
        .route("/manage/apply", post(apply_config))
        .route("/manage/import-env", post(import_env))
        .route("/manage/export", get(export_config))
        .route("/manage/import", post(import_config))
}

fn back(tab: ManageTab, flash: &Flash) -> Response {
    flash_redirect("/manage", &[("tab", tab.slug())], flash)
}

/// Checkbox fields are only submitted when ticked.
fn is_on(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

// ── Page ────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct ManageQuery {
    tab: Option<String>,
    action: Option<String>,
    edit: Option<String>,
    delete: Option<String>,
    msg: Option<String>,
    detail: Option<String>,
}

/// A plain page load refetches everything. Opening a modal renders from the
/// session cache when it has been filled.
async fn manage_page(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<ManageQuery>,
) -> Response {
    let tab = query
        .tab
        .as_deref()
        .and_then(ManageTab::parse)
        .unwrap_or_default();
    let modal = ManageModal::from_query(
        tab,
        query.action.as_deref(),
        query.edit.as_deref(),
        query.delete.as_deref(),
    );
    let mut flash = Flash::from_query(query.msg.as_deref(), query.detail.as_deref());

    let cached = if modal.is_some() {
        session.cached().await
    } else {
        None
    };
    let data = match cached {
        Some(data) => data,
        None => match session.reload().await {
            Ok(data) => data,
            Err(e) if e.is_unauthorized() => return expire(&state, &session).await,
            Err(e) => {
                warn!("Failed to load configuration: {}", e);
                flash.get_or_insert_with(|| Flash::error(format!("Failed to load configuration: {e}")));
                ManageData::default()
            }
        },
    };

    let ctx = state
        .page(&session, Nav::Manage, flash)
        .with_return_to(tab.link(&[]));
    let view = ManageView { tab, modal };
    Html(render_manage(&ctx, &data, &view)).into_response()
}

// ── Users ───────────────────────────────────────────────────

#[derive(Deserialize)]
struct UserForm {
    #[serde(default)]
    edit_mode: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    extension: String,
    enabled: Option<String>,
}

fn change_event(kind: CrudKind) -> ConfigChangeEvent {
    match kind {
        CrudKind::Users => ConfigChangeEvent::Users,
        CrudKind::AclUsers => ConfigChangeEvent::AclUsers,
        CrudKind::Gateways => ConfigChangeEvent::Gateways,
    }
}

/// Save a collection entry: PUT on the edit key when the form carries one,
/// POST otherwise.
async fn save_entry<T: serde::Serialize>(
    state: &ApiState,
    session: &Session,
    kind: CrudKind,
    edit_mode: &str,
    item: &T,
    noun: &str,
) -> Result<Flash, Response> {
    let event = change_event(kind);
    let edit_key = edit_mode.trim();
    let (outcome, ok, fail) = if edit_key.is_empty() {
        (
            session.client.create(kind, item).await,
            format!("{noun} created"),
            format!("Failed to create {}", noun.to_lowercase()),
        )
    } else {
        (
            session.client.update(kind, edit_key, item).await,
            format!("{noun} updated"),
            format!("Failed to update {}", noun.to_lowercase()),
        )
    };
    settle(state, session, outcome, &ok, &fail, event).await
}

async fn delete_entry(
    state: &ApiState,
    session: &Session,
    kind: CrudKind,
    key: &str,
    noun: &str,
) -> Result<Flash, Response> {
    let event = change_event(kind);
    let outcome = session.client.delete(kind, key).await;
    settle(
        state,
        session,
        outcome,
        &format!("{noun} deleted"),
        &format!("Failed to delete {}", noun.to_lowercase()),
        event,
    )
    .await
}

fn flash_or(result: Result<Flash, Response>, tab: ManageTab) -> Response {
    match result {
        Ok(flash) => back(tab, &flash),
        Err(response) => response,
    }
}

async fn save_user(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<UserForm>,
) -> Response {
    let username = form.username.trim();
    if username.is_empty() {
        return back(ManageTab::Users, &Flash::error("Username required"));
    }
    let user = SipUser {
        username: username.to_string(),
        password: form.password.clone(),
        extension: form.extension.trim().to_string(),
        enabled: is_on(&form.enabled),
    };
    let result = save_entry(&state, &session, CrudKind::Users, &form.edit_mode, &user, "User").await;
    flash_or(result, ManageTab::Users)
}

#[derive(Deserialize)]
struct KeyForm {
    #[serde(default)]
    key: String,
}

async fn delete_user(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<KeyForm>,
) -> Response {
    let result = delete_entry(&state, &session, CrudKind::Users, &form.key, "User").await;
    flash_or(result, ManageTab::Users)
}

// ── ACL users ───────────────────────────────────────────────

#[derive(Deserialize)]
struct AclUserForm {
    #[serde(default)]
    edit_mode: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    ip_address: String,
    #[serde(default)]
    extension: String,
    #[serde(default)]
    caller_id: String,
}

async fn save_acl_user(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<AclUserForm>,
) -> Response {
    let username = form.username.trim();
    if username.is_empty() {
        return back(ManageTab::AclUsers, &Flash::error("Username required"));
    }
    let user = AclUser {
        username: username.to_string(),
        ip_address: form.ip_address.trim().to_string(),
        extension: form.extension.trim().to_string(),
        caller_id: form.caller_id.trim().to_string(),
    };
    let result = save_entry(&state, &session, CrudKind::AclUsers, &form.edit_mode, &user, "ACL user").await;
    flash_or(result, ManageTab::AclUsers)
}

async fn delete_acl_user(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<KeyForm>,
) -> Response {
    let result = delete_entry(&state, &session, CrudKind::AclUsers, &form.key, "ACL user").await;
    flash_or(result, ManageTab::AclUsers)
}

// ── Gateways ────────────────────────────────────────────────

#[derive(Deserialize)]
struct GatewayForm {
    #[serde(default)]
    edit_mode: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    host: String,
    #[serde(default)]
    port: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    auth_username: String,
    #[serde(default)]
    transport: String,
    register: Option<String>,
    enabled: Option<String>,
}

impl GatewayForm {
    /// Unparsable ports fall back to 5060, an empty transport to udp.
    fn to_gateway(&self) -> Gateway {
        let defaults = Gateway::default();
        let transport = self.transport.trim();
        Gateway {
            name: self.name.trim().to_string(),
            host: self.host.trim().to_string(),
            port: self.port.trim().parse().unwrap_or(defaults.port),
            username: self.username.trim().to_string(),
            password: self.password.clone(),
            auth_username: self.auth_username.trim().to_string(),
            transport: if transport.is_empty() {
                defaults.transport
            } else {
                transport.to_string()
            },
            register: is_on(&self.register),
            enabled: is_on(&self.enabled),
        }
    }
}

async fn save_gateway(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<GatewayForm>,
) -> Response {
    let gateway = form.to_gateway();
    if gateway.name.is_empty() || gateway.host.is_empty() {
        return back(ManageTab::Gateways, &Flash::error("Name and host required"));
    }
    let result = save_entry(&state, &session, CrudKind::Gateways, &form.edit_mode, &gateway, "Gateway").await;
    flash_or(result, ManageTab::Gateways)
}

async fn delete_gateway(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<KeyForm>,
) -> Response {
    let result = delete_entry(&state, &session, CrudKind::Gateways, &form.key, "Gateway").await;
    flash_or(result, ManageTab::Gateways)
}

// ── Routes ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct DefaultRoutesForm {
    #[serde(default)]
    default_gateway: String,
    #[serde(default)]
    default_extension: String,
}

async fn save_default_routes(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<DefaultRoutesForm>,
) -> Response {
    let routes = DefaultRoutes {
        default_gateway: form.default_gateway.trim().to_string(),
        default_extension: form.default_extension.trim().to_string(),
    };
    let outcome = session.client.save_default_routes(&routes).await;
    let result = settle(
        &state,
        &session,
        outcome,
        "Default routes saved",
        "Failed to save default routes",
        ConfigChangeEvent::Routes,
    )
    .await;
    flash_or(result, ManageTab::Routes)
}

#[derive(Deserialize)]
struct InboundRouteForm {
    #[serde(default)]
    did: String,
    #[serde(default)]
    destination_type: String,
    #[serde(default)]
    destination: String,
}

async fn add_inbound_route(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<InboundRouteForm>,
) -> Response {
    let did = form.did.trim();
    let destination = form.destination.trim();
    if did.is_empty() || destination.is_empty() {
        return back(ManageTab::Routes, &Flash::error("DID and destination required"));
    }
    let destination_type = match form.destination_type.trim() {
        "" => "extension",
        other => other,
    };
    let route = InboundRoute {
        did: did.to_string(),
        destination: destination.to_string(),
        destination_type: destination_type.to_string(),
    };
    let outcome = session.client.add_inbound_route(&route).await;
    let result = settle(
        &state,
        &session,
        outcome,
        "Inbound route added",
        "Failed to add inbound route",
        ConfigChangeEvent::Routes,
    )
    .await;
    flash_or(result, ManageTab::Routes)
}

#[derive(Deserialize)]
struct DidForm {
    #[serde(default)]
    did: String,
}

async fn delete_inbound_route(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<DidForm>,
) -> Response {
    let outcome = session.client.delete_inbound_route(form.did.trim()).await;
    let result = settle(
        &state,
        &session,
        outcome,
        "Inbound route deleted",
        "Failed to delete inbound route",
        ConfigChangeEvent::Routes,
    )
    .await;
    flash_or(result, ManageTab::Routes)
}

#[derive(Deserialize)]
struct UserRouteForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    gateway: String,
}

async fn add_user_route(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<UserRouteForm>,
) -> Response {
    let route = UserRoute {
        username: form.username.trim().to_string(),
        gateway: form.gateway.trim().to_string(),
    };
    if route.username.is_empty() || route.gateway.is_empty() {
        return back(ManageTab::Routes, &Flash::error("User and gateway required"));
    }
    let outcome = session.client.add_user_route(&route).await;
    let result = settle(
        &state,
        &session,
        outcome,
        "User route added",
        "Failed to add user route",
        ConfigChangeEvent::Routes,
    )
    .await;
    flash_or(result, ManageTab::Routes)
}

#[derive(Deserialize)]
struct UsernameForm {
    #[serde(default)]
    username: String,
}

async fn delete_user_route(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<UsernameForm>,
) -> Response {
    let outcome = session.client.delete_user_route(form.username.trim()).await;
    let result = settle(
        &state,
        &session,
        outcome,
        "User route removed",
        "Failed to remove user route",
        ConfigChangeEvent::Routes,
    )
    .await;
    flash_or(result, ManageTab::Routes)
}

// ── Settings ────────────────────────────────────────────────

#[derive(Deserialize)]
struct SettingsForm {
    #[serde(default)]
    fs_domain: String,
    #[serde(default)]
    external_sip_ip: String,
    #[serde(default)]
    internal_sip_port: String,
    #[serde(default)]
    external_sip_port: String,
    #[serde(default)]
    codec_prefs: String,
    #[serde(default)]
    default_country_code: String,
    #[serde(default)]
    outbound_caller_id: String,
    #[serde(default)]
    license_key: String,
    #[serde(default)]
    client_name: String,
}

impl SettingsForm {
    fn to_settings(&self) -> Settings {
        let defaults = Settings::default();
        Settings {
            fs_domain: self.fs_domain.trim().to_string(),
            external_sip_ip: self.external_sip_ip.trim().to_string(),
            internal_sip_port: self.internal_sip_port.trim().parse().unwrap_or(defaults.internal_sip_port),
            external_sip_port: self.external_sip_port.trim().parse().unwrap_or(defaults.external_sip_port),
            codec_prefs: self.codec_prefs.trim().to_string(),
            default_country_code: self.default_country_code.trim().to_string(),
        }
    }

    fn to_license(&self) -> License {
        License {
            key: self.license_key.trim().to_string(),
            client_name: self.client_name.trim().to_string(),
        }
    }
}

/// Settings, license and outbound caller id are saved together. The save
/// only counts as successful when all three requests succeed.
async fn save_settings(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<SettingsForm>,
) -> Response {
    let settings = form.to_settings();
    let license = form.to_license();
    let client = &session.client;
    let (settings_res, license_res, caller_id_res) = tokio::join!(
        client.save_settings(&settings),
        client.save_license(&license),
        client.save_outbound_caller_id(form.outbound_caller_id.trim()),
    );

    let results = [settings_res, license_res, caller_id_res];
    if results
        .iter()
        .any(|r| r.as_ref().is_err_and(|e| e.is_unauthorized()))
    {
        return expire(&state, &session).await;
    }

    let flash = if results.iter().all(|r| r.as_ref().is_ok_and(|r| r.success)) {
        notify(&state, &session, ConfigChangeEvent::Settings).await;
        Flash::success("Settings saved")
    } else {
        for r in results.iter().filter_map(|r| r.as_ref().err()) {
            warn!("Settings save failed: {}", r);
        }
        Flash::error("Failed to save some settings")
    };
    back(ManageTab::Settings, &flash)
}

// ── Apply / import ──────────────────────────────────────────

async fn apply_config(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
) -> Response {
    let outcome = session.client.apply_config().await;
    let result = settle(
        &state,
        &session,
        outcome,
        "Configuration applied",
        "Failed to apply configuration",
        ConfigChangeEvent::Applied,
    )
    .await;
    if result.is_ok() {
        info!(user = %session.username, "Configuration applied");
    }
    flash_or(result, ManageTab::default())
}

async fn import_env(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
) -> Response {
    let outcome = session.client.import_env().await;
    let result = settle(
        &state,
        &session,
        outcome,
        "Imported from ENV",
        "Failed to import from ENV",
        ConfigChangeEvent::Imported,
    )
    .await;
    flash_or(result, ManageTab::default())
}

/// Stream the backend's export back as a download.
async fn export_config(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
) -> Response {
    match session.client.export_config().await {
        Ok(export) => {
            let disposition = format!(
                "attachment; filename=\"{}\"",
                export.filename.replace(['"', '\\'], "_")
            );
            (
                [
                    ("content-type", EXPORT_CONTENT_TYPE.to_string()),
                    ("content-disposition", disposition),
                ],
                export.body,
            )
                .into_response()
        }
        Err(e) if e.is_unauthorized() => expire(&state, &session).await,
        Err(e) => {
            warn!("Config export failed: {}", e);
            back(ManageTab::Config, &Flash::error(format!("Export failed: {e}")))
        }
    }
}

/// Parsed upload of the import form.
#[derive(Debug, Default)]
struct ImportUpload {
    filename: Option<String>,
    content: Vec<u8>,
    confirmed: bool,
}

impl ImportUpload {
    async fn read(mut multipart: Multipart) -> Result<Self, String> {
        let mut upload = ImportUpload::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| format!("Upload failed: {e}"))?
        {
            match field.name() {
                Some("file") => {
                    upload.filename = field.file_name().map(str::to_string).filter(|n| !n.is_empty());
                    upload.content = field
                        .bytes()
                        .await
                        .map_err(|e| format!("Upload failed: {e}"))?
                        .to_vec();
                }
                Some("confirm") => {
                    let value = field.text().await.unwrap_or_default();
                    upload.confirmed = !value.is_empty();
                }
                _ => {}
            }
        }
        Ok(upload)
    }

    /// Checks run in order: file present, `.json` name, confirmation, JSON body.
    fn validate(&self) -> Result<Value, String> {
        let Some(name) = self.filename.as_deref() else {
            return Err("Please select a JSON file".into());
        };
        if !name.to_lowercase().ends_with(".json") {
            return Err("Please select a .json file".into());
        }
        if !self.confirmed {
            return Err("Please confirm that the import overwrites the current configuration".into());
        }
        serde_json::from_slice(&self.content).map_err(|e| format!("Invalid JSON file: {e}"))
    }
}

async fn import_config(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
    multipart: Multipart,
) -> Response {
    let config = match ImportUpload::read(multipart).await.and_then(|u| u.validate()) {
        Ok(config) => config,
        Err(e) => return back(ManageTab::Config, &Flash::error(e)),
    };

    let flash = match session.client.import_config(&config).await {
        Ok(result) if result.success => {
            notify(&state, &session, ConfigChangeEvent::Imported).await;
            info!(user = %session.username, stats = ?result.stats, "Configuration imported");
            Flash::success(
                result
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "Configuration imported".to_string()),
            )
        }
        Ok(result) => Flash::error(
            result
                .error
                .or(result.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "Import failed".to_string()),
        ),
        Err(e) if e.is_unauthorized() => return expire(&state, &session).await,
        Err(e) => {
            warn!("Config import failed: {}", e);
            Flash::error(format!("Import failed: {e}"))
        }
    };
    back(ManageTab::Config, &flash)
}
