use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use sw_web::pages::render_dashboard;
use sw_web::{Flash, Nav};
use tracing::warn;

use crate::routes::expire;
use crate::session::CurrentSession;
use crate::state::ApiState;

pub fn router() -> Router<ApiState> {
    Router::new().route("/", get(dashboard))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FlashQuery {
    pub msg: Option<String>,
    pub detail: Option<String>,
}

impl FlashQuery {
    pub fn flash(&self) -> Option<Flash> {
        Flash::from_query(self.msg.as_deref(), self.detail.as_deref())
    }
}

/// Render from the session poller's snapshot. The first visit after login
/// runs one cycle inline so the page never boots empty.
async fn dashboard(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<FlashQuery>,
) -> Response {
    let poller = session.poller();
    if poller.snapshot().updated_at.is_none() {
        poller.refresh_now().await;
    }

    let users = match session.client.users().await {
        Ok(users) => {
            session.set_users(users.clone()).await;
            users
        }
        Err(e) if e.is_unauthorized() => return expire(&state, &session).await,
        Err(e) => {
            warn!("Failed to load users: {}", e);
            session.cached_users().await
        }
    };

    let snapshot = poller.snapshot();
    if snapshot.session_expired {
        return expire(&state, &session).await;
    }

    let ctx = state.page(&session, Nav::Dashboard, query.flash());
    Html(render_dashboard(&ctx, &users, &snapshot)).into_response()
}
