pub mod auth;
pub mod dashboard;
pub mod fragments;
pub mod landing;
pub mod manage;
pub mod prefs;
pub mod security;

use axum::response::{IntoResponse, Redirect, Response};
use sw_client::ClientError;
use sw_client::types::ActionResult;
use sw_common::events::ConfigChangeEvent;
use sw_web::Flash;
use tracing::warn;

use crate::session::Session;
use crate::state::ApiState;

/// Redirect to `path` carrying `flash` in the query string.
pub(crate) fn flash_redirect(path: &str, extra: &[(&str, &str)], flash: &Flash) -> Response {
    Redirect::to(&flash.location(path, extra)).into_response()
}

/// Only same-site absolute paths are followed back.
pub(crate) fn safe_return(path: Option<&str>) -> &str {
    match path {
        Some(p) if p.starts_with('/') && !p.starts_with("//") => p,
        _ => "/",
    }
}

/// The backend dropped our cookie: forget the session and send the
/// operator back to the login form.
pub(crate) async fn expire(state: &ApiState, session: &Session) -> Response {
    warn!(user = %session.username, "Backend session expired");
    state.sessions.remove(&session.id).await;
    Redirect::to("/login").into_response()
}

/// Turn a mutation result into the flash to show. Successful mutations
/// are broadcast and reload the affected part of the session cache.
pub(crate) async fn settle(
    state: &ApiState,
    session: &Session,
    outcome: Result<ActionResult, ClientError>,
    ok: &str,
    fail: &str,
    event: ConfigChangeEvent,
) -> Result<Flash, Response> {
    match outcome {
        Ok(result) if result.success => {
            notify(state, session, event).await;
            Ok(Flash::success(result.text(ok)))
        }
        Ok(result) => Ok(Flash::error(result.text(fail))),
        Err(e) if e.is_unauthorized() => Err(expire(state, session).await),
        Err(e) => {
            warn!(user = %session.username, "{}: {}", fail, e);
            Ok(Flash::error(format!("{fail}: {e}")))
        }
    }
}

pub(crate) async fn notify(state: &ApiState, session: &Session, event: ConfigChangeEvent) {
    if let Err(e) = session.refresh_cache(&event).await {
        warn!(?event, "Cache reload after mutation failed: {}", e);
    }
    let _ = state.events.config_changed.send(event);
}
