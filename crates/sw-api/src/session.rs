//! Console sessions.
//!
//! A session exists for every operator logged in through `/login`. It owns
//! the backend session cookie (inside its `WrapperClient`), the dashboard
//! poller running on that cookie and the manage page's entity cache.
//! Dropping the last clone of a session stops its poller.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::Redirect;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use sw_client::types::SipUser;
use sw_client::{ClientError, WrapperClient};
use sw_common::events::ConfigChangeEvent;
use sw_monitor::{PollerHandle, StatusPoller};
use sw_web::Lang;
use sw_web::pages::ManageData;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};
use uuid::Uuid;

use crate::state::ApiState;

pub const SESSION_COOKIE: &str = "sw_session";
/// Language picked before login, also kept after logout.
pub const LANG_COOKIE: &str = "sw_lang";

/// How often the reaper looks for expired sessions.
pub const REAP_INTERVAL: Duration = Duration::from_secs(60);

/// Manage page data kept between page loads. Modals read from here so
/// opening a dialog does not refetch every collection.
#[derive(Debug, Default)]
struct EntityCache {
    data: ManageData,
    loaded: bool,
}

#[derive(Clone)]
pub struct Session {
    pub id: Uuid,
    pub username: String,
    pub client: WrapperClient,
    pub lang: Lang,
    pub created_at: DateTime<Utc>,
    poller: Arc<PollerHandle>,
    cache: Arc<RwLock<EntityCache>>,
}

impl Session {
    pub fn new(
        id: Uuid,
        username: String,
        client: WrapperClient,
        lang: Lang,
        created_at: DateTime<Utc>,
        poller: PollerHandle,
    ) -> Self {
        Self {
            id,
            username,
            client,
            lang,
            created_at,
            poller: Arc::new(poller),
            cache: Arc::new(RwLock::new(EntityCache::default())),
        }
    }

    pub fn poller(&self) -> &Arc<StatusPoller> {
        self.poller.poller()
    }

    pub fn poller_running(&self) -> bool {
        self.poller.is_running()
    }

    /// Cached manage data, `None` until the first full load.
    pub async fn cached(&self) -> Option<ManageData> {
        let cache = self.cache.read().await;
        cache.loaded.then(|| cache.data.clone())
    }

    pub async fn cached_users(&self) -> Vec<SipUser> {
        self.cache.read().await.data.users.clone()
    }

    pub async fn set_users(&self, users: Vec<SipUser>) {
        self.cache.write().await.data.users = users;
    }

    /// Refetch every manage collection and replace the cache.
    pub async fn reload(&self) -> Result<ManageData, ClientError> {
        let data = load_manage_data(&self.client).await?;
        let mut cache = self.cache.write().await;
        cache.data = data.clone();
        cache.loaded = true;
        Ok(data)
    }

    /// Reload only what a mutation touched.
    pub async fn refresh_cache(&self, event: &ConfigChangeEvent) -> Result<(), ClientError> {
        let client = &self.client;
        match event {
            ConfigChangeEvent::Users => {
                let users = client.users().await?;
                self.cache.write().await.data.users = users;
            }
            ConfigChangeEvent::AclUsers => {
                let acl_users = client.acl_users().await?;
                self.cache.write().await.data.acl_users = acl_users;
            }
            ConfigChangeEvent::Gateways => {
                let gateways = client.gateways().await?;
                self.cache.write().await.data.gateways = gateways;
            }
            ConfigChangeEvent::Routes => {
                let routes = client.routes().await?;
                self.cache.write().await.data.routes = routes;
            }
            ConfigChangeEvent::Settings => {
                let (settings, license, defaults) =
                    tokio::try_join!(client.settings(), client.license(), client.defaults())?;
                let mut cache = self.cache.write().await;
                cache.data.settings = settings;
                cache.data.license = license;
                cache.data.defaults = defaults;
            }
            ConfigChangeEvent::Imported => {
                self.reload().await?;
            }
            ConfigChangeEvent::Security | ConfigChangeEvent::Applied => {}
        }
        debug!(user = %self.username, ?event, "Entity cache refreshed");
        Ok(())
    }
}

async fn load_manage_data(client: &WrapperClient) -> Result<ManageData, ClientError> {
    let (users, acl_users, gateways, routes, settings, license, defaults) = tokio::try_join!(
        client.users(),
        client.acl_users(),
        client.gateways(),
        client.routes(),
        client.settings(),
        client.license(),
        client.defaults(),
    )?;
    Ok(ManageData {
        users,
        acl_users,
        gateways,
        routes,
        settings,
        license,
        defaults,
    })
}

/// In-memory session table with a fixed lifetime per session.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
    ttl: chrono::Duration,
}

impl SessionStore {
    pub fn new(ttl: chrono::Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    fn is_expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
        session.created_at + self.ttl <= now
    }

    /// Store a new session, purging expired ones first.
    pub async fn insert(&self, session: Session) {
        self.purge_expired().await;
        self.sessions.write().await.insert(session.id, session);
    }

    pub async fn get(&self, id: &Uuid) -> Option<Session> {
        let session = self.sessions.read().await.get(id).cloned()?;
        if self.is_expired(&session, Utc::now()) {
            self.remove(id).await;
            return None;
        }
        Some(session)
    }

    pub async fn from_jar(&self, jar: &CookieJar) -> Option<Session> {
        let id = jar
            .get(SESSION_COOKIE)
            .and_then(|c| Uuid::parse_str(c.value()).ok())?;
        self.get(&id).await
    }

    pub async fn remove(&self, id: &Uuid) -> Option<Session> {
        let removed = self.sessions.write().await.remove(id);
        if let Some(session) = &removed {
            info!(user = %session.username, "Console session closed");
        }
        removed
    }

    /// Switch a session's language, adopting a rotated backend cookie.
    pub async fn update_lang(&self, id: &Uuid, lang: Lang, cookie: Option<String>) {
        if let Some(session) = self.sessions.write().await.get_mut(id) {
            session.lang = lang;
            if let Some(cookie) = cookie {
                session.client = session.client.with_session(cookie);
            }
        }
    }

    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !self.is_expired(s, now));
        let purged = before - sessions.len();
        if purged > 0 {
            info!("Purged {} expired session(s)", purged);
        }
        purged
    }

    /// Purge on a timer so expired sessions stop polling even when their
    /// cookie never comes back.
    pub fn spawn_reaper(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.purge_expired().await;
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

pub fn session_cookie(id: Uuid) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

pub fn lang_cookie(lang: Lang) -> Cookie<'static> {
    Cookie::build((LANG_COOKIE, lang.code()))
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

/// Language for pages rendered without a session.
pub fn jar_lang(jar: &CookieJar) -> Lang {
    jar.get(LANG_COOKIE)
        .and_then(|c| Lang::parse(c.value()))
        .unwrap_or_default()
}

/// Extractor for pages behind the login. Anonymous requests go to `/login`.
pub struct CurrentSession(pub Session);

impl FromRequestParts<ApiState> for CurrentSession {
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &ApiState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        state
            .sessions
            .from_jar(&jar)
            .await
            .map(CurrentSession)
            .ok_or_else(|| Redirect::to("/login"))
    }
}
