use std::sync::Arc;

use chrono::Utc;
use sw_client::WrapperClient;
use sw_common::config::ConsoleConfig;
use sw_common::events::EventBus;
use sw_common::prefs::{PreferenceStore, RefreshInterval};
use sw_landing::{LandingSite, LandingUpdater};
use sw_monitor::StatusPoller;
use sw_web::components::toast::Flash;
use sw_web::{Lang, Nav, PageContext};
use tracing::info;
use uuid::Uuid;

use crate::session::{Session, SessionStore};

/// Shared application state for all console routes.
#[derive(Clone)]
pub struct ApiState {
    /// Client without a backend session; login, public config and per-session clones.
    pub backend: WrapperClient,
    pub sessions: Arc<SessionStore>,
    pub prefs: Arc<PreferenceStore>,
    pub events: Arc<EventBus>,
    pub landing: Arc<LandingSite>,
    pub updater: Arc<LandingUpdater>,
    pub config: Arc<ConsoleConfig>,
}

impl ApiState {
    pub fn new(
        config: ConsoleConfig,
        backend: WrapperClient,
        prefs: Arc<PreferenceStore>,
        events: Arc<EventBus>,
        landing: Arc<LandingSite>,
    ) -> Self {
        Self {
            backend,
            sessions: Arc::new(SessionStore::new(config.session_ttl())),
            prefs,
            events,
            landing,
            updater: Arc::new(LandingUpdater::new(&config.landing)),
            config: Arc::new(config),
        }
    }

    pub fn refresh_interval(&self) -> RefreshInterval {
        self.prefs.refresh_interval()
    }

    /// Register a logged-in operator and start their dashboard poller.
    pub async fn open_session(&self, username: &str, client: WrapperClient, lang: Lang) -> Session {
        let poller = StatusPoller::new(client.clone(), self.config.cdr_count, self.config.logs_count);
        let handle = poller.spawn(self.prefs.subscribe(), self.events.config_changed.subscribe());
        let session = Session::new(
            Uuid::new_v4(),
            username.to_string(),
            client,
            lang,
            Utc::now(),
            handle,
        );
        self.sessions.insert(session.clone()).await;
        info!(user = username, "Console session opened");
        session
    }

    pub fn page(&self, session: &Session, nav: Nav, flash: Option<Flash>) -> PageContext {
        PageContext::new(session.lang, nav, self.refresh_interval()).with_flash(flash)
    }
}
