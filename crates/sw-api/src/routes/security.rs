use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use sw_client::types::{AutoBlacklistSettings, Fail2banSettings};
use sw_client::ClientError;
use sw_common::events::ConfigChangeEvent;
use sw_web::pages::security::QUICK_BLOCK_COMMENT;
use sw_web::pages::{SecurityData, SecurityModal, render_security};
use sw_web::{Flash, Nav};
use tracing::warn;

use crate::routes::{expire, flash_redirect, settle};
use crate::session::{CurrentSession, Session};
use crate::state::ApiState;

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/security", get(security_page))
        .route("/security/blacklist", post(add_blacklist))
        .route("/security/blacklist/remove", post(remove_blacklist))
        .route("/security/blacklist/reset-count", post(reset_count))
        .route("/security/whitelist", post(add_whitelist))
        .route("/security/whitelist/remove", post(remove_whitelist))
        .route("/security/whitelist-mode", post(whitelist_mode))
        .route("/security/auto-blacklist", post(save_auto_blacklist))
        .route("/security/check-blacklist", post(check_blacklist))
        .route("/security/fail2ban", post(save_fail2ban))
        .route("/security/fail2ban/ban", post(ban))
        .route("/security/fail2ban/unban", post(unban))
        .route("/security/quick-block", post(quick_block))
}

fn back(flash: &Flash) -> Response {
    flash_redirect("/security", &[], flash)
}

fn respond(result: Result<Flash, Response>) -> Response {
    match result {
        Ok(flash) => back(&flash),
        Err(response) => response,
    }
}

#[derive(Debug, Default, Deserialize)]
struct SecurityQuery {
    action: Option<String>,
    ip: Option<String>,
    msg: Option<String>,
    detail: Option<String>,
}

/// Keep a section's default when its fetch failed, remembering the first error.
fn take_or_default<T: Default>(
    result: Result<T, ClientError>,
    what: &str,
    first_error: &mut Option<String>,
) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to load {}: {}", what, e);
            first_error.get_or_insert_with(|| format!("Failed to load {what}: {e}"));
            T::default()
        }
    }
}

async fn security_page(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<SecurityQuery>,
) -> Response {
    let client = &session.client;
    let (overview, auto, attempts, fail2ban) = tokio::join!(
        client.security(),
        client.auto_blacklist(),
        client.failed_attempts(),
        client.fail2ban(),
    );

    let unauthorized = [
        overview.as_ref().err(),
        auto.as_ref().err(),
        attempts.as_ref().err(),
        fail2ban.as_ref().err(),
    ]
    .into_iter()
    .flatten()
    .any(ClientError::is_unauthorized);
    if unauthorized {
        return expire(&state, &session).await;
    }

    let mut load_error = None;
    let data = SecurityData {
        overview: take_or_default(overview, "security overview", &mut load_error),
        auto: take_or_default(auto, "auto-blacklist settings", &mut load_error),
        attempts: take_or_default(attempts, "failed attempts", &mut load_error),
        // An unreachable Fail2Ban status renders as "Unknown", not as an error.
        fail2ban: fail2ban.unwrap_or_default(),
    };

    let flash = Flash::from_query(query.msg.as_deref(), query.detail.as_deref())
        .or_else(|| load_error.map(Flash::error));
    let modal = SecurityModal::from_query(query.action.as_deref(), query.ip.as_deref());
    let ctx = state.page(&session, Nav::Security, flash);
    Html(render_security(&ctx, &data, modal.as_ref())).into_response()
}

#[derive(Deserialize)]
struct IpForm {
    #[serde(default)]
    ip: String,
    #[serde(default)]
    comment: String,
}

impl IpForm {
    fn ip(&self) -> Option<&str> {
        Some(self.ip.trim()).filter(|ip| !ip.is_empty())
    }
}

fn ip_required() -> Response {
    back(&Flash::error("IP address required"))
}

async fn security_action(
    state: &ApiState,
    session: &Session,
    outcome: Result<sw_client::types::ActionResult, ClientError>,
    ok: &str,
    fail: &str,
) -> Response {
    respond(settle(state, session, outcome, ok, fail, ConfigChangeEvent::Security).await)
}

async fn add_blacklist(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<IpForm>,
) -> Response {
    let Some(ip) = form.ip() else {
        return ip_required();
    };
    let outcome = session.client.add_to_blacklist(ip, form.comment.trim()).await;
    security_action(&state, &session, outcome, "Added to blacklist", "Failed to add to blacklist").await
}

async fn remove_blacklist(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<IpForm>,
) -> Response {
    let Some(ip) = form.ip() else {
        return ip_required();
    };
    let outcome = session.client.remove_from_blacklist(ip).await;
    security_action(&state, &session, outcome, "Removed from blacklist", "Failed to remove from blacklist")
        .await
}

async fn reset_count(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<IpForm>,
) -> Response {
    let Some(ip) = form.ip() else {
        return ip_required();
    };
    let outcome = session.client.reset_blocked_count(ip).await;
    security_action(&state, &session, outcome, "Blocked count reset", "Failed to reset blocked count").await
}

async fn add_whitelist(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<IpForm>,
) -> Response {
    let Some(ip) = form.ip() else {
        return ip_required();
    };
    let outcome = session.client.add_to_whitelist(ip, form.comment.trim()).await;
    security_action(&state, &session, outcome, "Added to whitelist", "Failed to add to whitelist").await
}

async fn remove_whitelist(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<IpForm>,
) -> Response {
    let Some(ip) = form.ip() else {
        return ip_required();
    };
    let outcome = session.client.remove_from_whitelist(ip).await;
    security_action(&state, &session, outcome, "Removed from whitelist", "Failed to remove from whitelist")
        .await
}

#[derive(Deserialize)]
struct ToggleForm {
    enabled: Option<String>,
}

async fn whitelist_mode(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<ToggleForm>,
) -> Response {
    let enabled = form.enabled.is_some_and(|v| !v.is_empty());
    let outcome = session.client.set_whitelist_enabled(enabled).await;
    let ok = if enabled {
        "Whitelist mode enabled"
    } else {
        "Whitelist mode disabled"
    };
    security_action(&state, &session, outcome, ok, "Failed to change whitelist mode").await
}

#[derive(Deserialize)]
struct AutoBlacklistForm {
    enabled: Option<String>,
    #[serde(default)]
    max_attempts: String,
    #[serde(default)]
    time_window: String,
    #[serde(default)]
    block_duration: String,
}

impl AutoBlacklistForm {
    /// Blank or unparsable numbers keep the backend defaults.
    fn to_settings(&self) -> AutoBlacklistSettings {
        let defaults = AutoBlacklistSettings::default();
        AutoBlacklistSettings {
            enabled: self.enabled.as_deref().is_some_and(|v| !v.is_empty()),
            max_attempts: self.max_attempts.trim().parse().unwrap_or(defaults.max_attempts),
            time_window: self.time_window.trim().parse().unwrap_or(defaults.time_window),
            block_duration: self.block_duration.trim().parse().unwrap_or(defaults.block_duration),
        }
    }
}

async fn save_auto_blacklist(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<AutoBlacklistForm>,
) -> Response {
    let outcome = session.client.save_auto_blacklist(&form.to_settings()).await;
    security_action(
        &state,
        &session,
        outcome,
        "Auto-blacklist settings saved",
        "Failed to save auto-blacklist settings",
    )
    .await
}

/// Run the backend's threshold check now and report what it blocked.
async fn check_blacklist(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
) -> Response {
    let flash = match session.client.check_blacklist().await {
        Ok(result) if !result.blocked.is_empty() => {
            let _ = state.events.config_changed.send(ConfigChangeEvent::Security);
            Flash::success(format!("Blocked: {}", result.blocked.join(", ")))
        }
        Ok(result) if result.success => Flash::info("No IPs exceeded the threshold"),
        Ok(result) => Flash::error(
            result
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "Blacklist check failed".to_string()),
        ),
        Err(e) if e.is_unauthorized() => return expire(&state, &session).await,
        Err(e) => {
            warn!("Blacklist check failed: {}", e);
            Flash::error(format!("Blacklist check failed: {e}"))
        }
    };
    back(&flash)
}

#[derive(Deserialize)]
struct Fail2banForm {
    enabled: Option<String>,
    #[serde(default)]
    threshold: String,
    #[serde(default)]
    jail_name: String,
}

impl Fail2banForm {
    fn to_settings(&self) -> Fail2banSettings {
        let defaults = Fail2banSettings::default();
        let jail_name = self.jail_name.trim();
        Fail2banSettings {
            enabled: self.enabled.as_deref().is_some_and(|v| !v.is_empty()),
            threshold: self.threshold.trim().parse().unwrap_or(defaults.threshold),
            jail_name: if jail_name.is_empty() {
                defaults.jail_name
            } else {
                jail_name.to_string()
            },
        }
    }
}

async fn save_fail2ban(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<Fail2banForm>,
) -> Response {
    let outcome = session.client.save_fail2ban(&form.to_settings()).await;
    security_action(&state, &session, outcome, "Fail2Ban settings saved", "Failed to save Fail2Ban settings")
        .await
}

async fn ban(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<IpForm>,
) -> Response {
    let Some(ip) = form.ip() else {
        return ip_required();
    };
    let outcome = session.client.fail2ban_ban(ip).await;
    security_action(&state, &session, outcome, &format!("{ip} banned"), "Failed to ban IP").await
}

async fn unban(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<IpForm>,
) -> Response {
    let Some(ip) = form.ip() else {
        return ip_required();
    };
    let outcome = session.client.fail2ban_unban(ip).await;
    security_action(&state, &session, outcome, &format!("{ip} unbanned"), "Failed to unban IP").await
}

/// One-click block from the failed attempts list.
async fn quick_block(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<IpForm>,
) -> Response {
    let Some(ip) = form.ip() else {
        return ip_required();
    };
    let outcome = session.client.add_to_blacklist(ip, QUICK_BLOCK_COMMENT).await;
    security_action(&state, &session, outcome, &format!("{ip} blocked"), "Failed to block IP").await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_ip_is_rejected() {
        let form = IpForm {
            ip: "   ".into(),
            comment: String::new(),
        };
        assert_eq!(form.ip(), None);
        let form = IpForm {
            ip: " 203.0.113.5 ".into(),
            comment: String::new(),
        };
        assert_eq!(form.ip(), Some("203.0.113.5"));
    }

    #[test]
    fn auto_blacklist_form_parsing() {
        let form = AutoBlacklistForm {
            enabled: Some("on".into()),
            max_attempts: "5".into(),
            time_window: "".into(),
            block_duration: "x".into(),
        };
        let settings = form.to_settings();
        let defaults = AutoBlacklistSettings::default();
        assert!(settings.enabled);
        assert_eq!(settings.max_attempts, 5);
        assert_eq!(settings.time_window, defaults.time_window);
        assert_eq!(settings.block_duration, defaults.block_duration);
    }

    #[test]
    fn fail2ban_form_keeps_default_jail() {
        let form = Fail2banForm {
            enabled: None,
            threshold: "7".into(),
            jail_name: " ".into(),
        };
        let settings = form.to_settings();
        assert!(!settings.enabled);
        assert_eq!(settings.threshold, 7);
        assert_eq!(settings.jail_name, Fail2banSettings::default().jail_name);
    }
}
