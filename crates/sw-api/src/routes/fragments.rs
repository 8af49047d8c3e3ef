//! Polled page regions. These answer 401 instead of redirecting so the
//! page script can send the browser to the login form itself.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use axum_extra::extract::cookie::CookieJar;
use sw_web::error_fragment;
use sw_web::pages::dashboard;
use sw_web::pages::security::failed_attempts_fragment;
use tracing::warn;

use crate::state::ApiState;

/// Header the page script re-arms its timer from.
pub const REFRESH_HEADER: &str = "x-refresh-interval";

const FAILED_ATTEMPTS: &str = "failed-attempts";
const DEFAULT_MAX_ATTEMPTS: u32 = 10;

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/fragments/{region}", get(fragment))
        .route("/refresh", post(refresh))
}

async fn fragment(
    State(state): State<ApiState>,
    jar: CookieJar,
    Path(region): Path<String>,
) -> Response {
    let Some(session) = state.sessions.from_jar(&jar).await else {
        return StatusCode::UNAUTHORIZED.into_response();
    };

    let html = if region == FAILED_ATTEMPTS {
        match session.client.failed_attempts().await {
            Ok(attempts) => failed_attempts_fragment(&attempts, DEFAULT_MAX_ATTEMPTS),
            Err(e) if e.is_unauthorized() => {
                state.sessions.remove(&session.id).await;
                return StatusCode::UNAUTHORIZED.into_response();
            }
            Err(e) => {
                warn!("Failed attempts refresh failed: {}", e);
                error_fragment(session.lang, &e.to_string())
            }
        }
    } else {
        let snapshot = session.poller().snapshot();
        if snapshot.session_expired {
            state.sessions.remove(&session.id).await;
            return StatusCode::UNAUTHORIZED.into_response();
        }
        let users = session.cached_users().await;
        match dashboard::fragment(&region, session.lang, &users, &snapshot) {
            Some(html) => html,
            None => return StatusCode::NOT_FOUND.into_response(),
        }
    };

    (
        [
            ("cache-control", "no-store".to_string()),
            (REFRESH_HEADER, state.refresh_interval().millis().to_string()),
        ],
        Html(html),
    )
        .into_response()
}

/// Manual refresh: one full poll cycle, then the page reloads.
async fn refresh(State(state): State<ApiState>, jar: CookieJar) -> StatusCode {
    match state.sessions.from_jar(&jar).await {
        Some(session) => {
            session.poller().refresh_now().await;
            StatusCode::NO_CONTENT
        }
        None => StatusCode::UNAUTHORIZED,
    }
}
