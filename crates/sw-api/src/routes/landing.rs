//! Public landing page and its update webhook. No console session needed.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use sw_common::events::LandingUpdateEvent;
use tracing::warn;

use crate::state::ApiState;

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/landing", get(page))
        .route("/landing/", get(page))
        .route("/landing/update", get(update))
}

async fn page(State(state): State<ApiState>) -> Html<String> {
    Html(state.landing.page(&state.backend).await)
}

#[derive(Deserialize)]
struct UpdateQuery {
    token: Option<String>,
}

/// Pull the landing files from the configured source. The response reports
/// per-file results; a partial update is still a 200.
async fn update(State(state): State<ApiState>, Query(query): Query<UpdateQuery>) -> Response {
    if let Err(e) = state.updater.authorize(query.token.as_deref()) {
        warn!("Landing update rejected");
        return (StatusCode::FORBIDDEN, e.to_string()).into_response();
    }

    let report = state.updater.run().await;
    if !report.updated.is_empty() {
        let _ = state.events.landing_updated.send(LandingUpdateEvent {
            updated: report.updated.clone(),
        });
    }
    Json(report).into_response()
}
