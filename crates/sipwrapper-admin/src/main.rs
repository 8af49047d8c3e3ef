use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use sw_api::session::REAP_INTERVAL;
use sw_api::{ApiState, build_router};
use sw_client::WrapperClient;
use sw_common::config::{ConsoleConfig, config_path};
use sw_common::events::EventBus;
use sw_common::prefs::PreferenceStore;
use sw_landing::LandingSite;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sipwrapper_admin=debug".into()),
        )
        .init();

    let path = config_path();
    let config = ConsoleConfig::load(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    info!(
        listen = config.listen_addr,
        backend = config.backend_url,
        "sipwrapper-admin starting"
    );

    let backend = WrapperClient::new(&config.backend_url)
        .with_context(|| format!("Invalid backend URL {}", config.backend_url))?;
    let prefs = Arc::new(PreferenceStore::open(&config.prefs_path, config.default_refresh_ms));
    info!(
        interval_ms = prefs.refresh_interval().millis(),
        "Refresh interval loaded"
    );

    let events = Arc::new(EventBus::new());

    let landing = Arc::new(LandingSite::open(&config.landing.dir, config.public_config_url()).await);
    landing
        .clone()
        .spawn_reload_listener(events.landing_updated.subscribe());

    let listen_addr = config.listen_addr.clone();
    let state = ApiState::new(config, backend, prefs, events, landing);
    state.sessions.clone().spawn_reaper(REAP_INTERVAL);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("Failed to bind {listen_addr}"))?;
    info!("Console listening on http://{}", listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("sipwrapper-admin stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
