//! Public product landing page: integrations matrix, live configuration
//! snapshot and the webhook that refreshes the page files.

pub mod integrations;
pub mod render;
pub mod snapshot;
pub mod webhook;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sw_client::WrapperClient;
use sw_common::events::LandingUpdateEvent;
use tokio::sync::{RwLock, broadcast};
use tracing::{info, warn};

pub use integrations::{IntegrationStatus, IntegrationsData};
pub use webhook::{LandingUpdater, UpdateReport, UpdateStatus};

/// Page template file in the landing directory.
pub const TEMPLATE_FILE: &str = "index.html";

#[derive(Debug, thiserror::Error)]
pub enum LandingError {
    #[error("Forbidden")]
    Forbidden,

    #[error("No data object found")]
    MissingObject,

    #[error("Invalid integrations data: {0}")]
    Parse(String),
}

/// Landing page contents cached in memory, reloaded after each webhook run.
pub struct LandingSite {
    dir: PathBuf,
    data: RwLock<Arc<IntegrationsData>>,
    template: RwLock<Option<String>>,
    public_config_url: String,
}

impl LandingSite {
    pub async fn open(dir: impl Into<PathBuf>, public_config_url: impl Into<String>) -> Self {
        let dir = dir.into();
        Self {
            data: RwLock::new(Arc::new(IntegrationsData::load(&dir).await)),
            template: RwLock::new(load_template(&dir).await),
            dir,
            public_config_url: public_config_url.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn data(&self) -> Arc<IntegrationsData> {
        self.data.read().await.clone()
    }

    /// Re-read integrations.js and index.html from disk.
    pub async fn reload(&self) {
        let data = IntegrationsData::load(&self.dir).await;
        let template = load_template(&self.dir).await;
        *self.data.write().await = Arc::new(data);
        *self.template.write().await = template;
    }

    /// Render the full page, including the live snapshot when reachable.
    pub async fn page(&self, client: &WrapperClient) -> String {
        let live = snapshot::fetch_public_config(client, &self.public_config_url).await;
        let data = self.data().await;
        let template = self.template.read().await;
        render::render_page(template.as_deref(), &data, live.as_ref())
    }

    /// Reload whenever the webhook reports new files.
    pub fn spawn_reload_listener(
        self: Arc<Self>,
        mut rx: broadcast::Receiver<LandingUpdateEvent>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if !event.updated.is_empty() {
                            self.reload().await;
                            info!(files = ?event.updated, "Landing page reloaded");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Landing listener lagged by {n} events");
                        self.reload().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

/// A template only counts when it still carries one of the placeholders;
/// anything else is served with the built-in layout.
async fn load_template(dir: &Path) -> Option<String> {
    let text = tokio::fs::read_to_string(dir.join(TEMPLATE_FILE)).await.ok()?;
    if text.contains(render::INTEGRATIONS_SLOT) || text.contains(render::LIVE_CONFIG_SLOT) {
        Some(text)
    } else {
        warn!("{TEMPLATE_FILE} has no placeholders, using built-in template");
        None
    }
}
