use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use sw_web::Flash;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::routes::{flash_redirect, safe_return};
use crate::session::CurrentSession;
use crate::state::ApiState;

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/prefs/refresh-interval", post(set_refresh_interval))
        .route("/events/refresh-interval", get(refresh_interval_events))
}

/// Name of the SSE event carrying the interval in milliseconds.
pub const INTERVAL_EVENT: &str = "refresh-interval";

/// Server-sent stream of the interval: the current value first, then every
/// change. Open pages re-arm their timers from it, including after a pause.
async fn refresh_interval_events(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!(user = %session.username, "Refresh interval stream opened");
    let stream = WatchStream::new(state.prefs.subscribe()).map(|interval| {
        Ok(Event::default()
            .event(INTERVAL_EVENT)
            .data(interval.millis().to_string()))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[derive(Deserialize)]
struct IntervalForm {
    #[serde(default)]
    interval: String,
    return_to: Option<String>,
}

/// Persist the console-wide interval. Every poller and open page follows
/// the change through the preference store's watch channel.
async fn set_refresh_interval(
    State(state): State<ApiState>,
    CurrentSession(session): CurrentSession,
    Form(form): Form<IntervalForm>,
) -> Response {
    let target = safe_return(form.return_to.as_deref());

    let result = match form.interval.trim().parse::<u64>() {
        Ok(ms) => state
            .prefs
            .set_refresh_interval(ms)
            .await
            .map_err(|e| e.to_string()),
        Err(_) => Err(format!("Invalid refresh interval: {}", form.interval)),
    };

    match result {
        Ok(interval) => {
            info!(user = %session.username, ms = interval.millis(), "Refresh interval changed");
            Redirect::to(target).into_response()
        }
        Err(e) => {
            warn!("{}", e);
            let path = target.split_once('?').map_or(target, |(path, _)| path);
            flash_redirect(path, &[], &Flash::error(e))
        }
    }
}
