//! HTTP surface of the admin console: login, dashboard, configuration,
//! security, polled fragments and the public landing page.

pub mod routes;
pub mod session;
pub mod state;

use axum::http::Method;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use session::{Session, SessionStore};
pub use state::ApiState;

/// Build the complete router. Console pages share the session cookie; the
/// landing routes are public and readable cross-origin.
pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    let landing: Router<ApiState> = routes::landing::router().layer(cors);

    Router::new()
        .merge(routes::auth::router())
        .merge(routes::dashboard::router())
        .merge(routes::fragments::router())
        .merge(routes::prefs::router())
        .merge(routes::manage::router())
        .merge(routes::security::router())
        .merge(landing)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
