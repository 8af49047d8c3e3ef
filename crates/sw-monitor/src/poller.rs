//! Status poller: keeps a session's dashboard snapshot fresh.
//!
//! Each tick fires the four read endpoints as independent tasks. There is
//! no de-duplication: a slow response may land after a newer one and simply
//! overwrites its region. A failed fetch is logged and leaves the region as
//! it was until the next successful cycle.

use std::sync::Arc;
use sw_client::{ClientError, WrapperClient};
use sw_common::events::ConfigChangeEvent;
use sw_common::prefs::RefreshInterval;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::snapshot::{DashboardSnapshot, Region, RegionUpdate};

pub struct StatusPoller {
    client: WrapperClient,
    cdr_count: u32,
    logs_count: u32,
    snapshot: watch::Sender<DashboardSnapshot>,
}

impl StatusPoller {
    pub fn new(client: WrapperClient, cdr_count: u32, logs_count: u32) -> Arc<Self> {
        Arc::new(Self {
            client,
            cdr_count,
            logs_count,
            snapshot: watch::channel(DashboardSnapshot::default()).0,
        })
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.snapshot.subscribe()
    }

    async fn fetch(&self, region: Region) -> Result<RegionUpdate, ClientError> {
        Ok(match region {
            Region::Status => RegionUpdate::Status(self.client.status().await?),
            Region::ActiveCalls => RegionUpdate::ActiveCalls(self.client.active_calls().await?),
            Region::Cdr => RegionUpdate::Cdr(self.client.cdr(self.cdr_count).await?),
            Region::Logs => RegionUpdate::Logs(self.client.logs(self.logs_count).await?),
        })
    }

    async fn refresh_region(&self, region: Region) {
        match self.fetch(region).await {
            Ok(update) => self.snapshot.send_modify(|s| s.apply(update)),
            Err(e) => {
                warn!(region = region.as_str(), "Dashboard refresh failed: {}", e);
                if e.is_unauthorized() {
                    self.snapshot.send_modify(|s| s.session_expired = true);
                }
            }
        }
    }

    /// Run one full cycle inline and wait for all four regions.
    pub async fn refresh_now(&self) {
        tokio::join!(
            self.refresh_region(Region::Status),
            self.refresh_region(Region::ActiveCalls),
            self.refresh_region(Region::Cdr),
            self.refresh_region(Region::Logs),
        );
    }

    /// Fire one cycle without waiting for it.
    fn spawn_cycle(self: &Arc<Self>) {
        for region in Region::ALL {
            let poller = Arc::clone(self);
            tokio::spawn(async move {
                poller.refresh_region(region).await;
            });
        }
    }

    /// Poll on the shared interval until the interval channel closes.
    ///
    /// A paused interval parks the loop until it changes. Any change re-arms
    /// the timer at once. Dashboard-relevant config changes trigger an extra
    /// cycle while polling is active.
    pub async fn run(
        self: Arc<Self>,
        mut interval: watch::Receiver<RefreshInterval>,
        changes: broadcast::Receiver<ConfigChangeEvent>,
    ) {
        info!("Status poller started");
        let mut changes = Some(changes);

        loop {
            let current = *interval.borrow_and_update();

            let tick = async {
                match current.period() {
                    Some(period) => tokio::time::sleep(period).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                _ = tick => self.spawn_cycle(),
                res = interval.changed() => {
                    if res.is_err() {
                        break;
                    }
                    debug!("Refresh interval now {} ms", interval.borrow().millis());
                }
                event = async {
                    match changes.as_mut() {
                        Some(rx) => rx.recv().await,
                        None => std::future::pending().await,
                    }
                } => match event {
                    Ok(event) if event.affects_dashboard() && !current.is_paused() => {
                        debug!("Config changed ({:?}), refreshing dashboard", event);
                        self.spawn_cycle();
                    }
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => changes = None,
                },
            }
        }

        info!("Status poller stopped");
    }

    /// Start `run` in the background.
    pub fn spawn(
        self: &Arc<Self>,
        interval: watch::Receiver<RefreshInterval>,
        changes: broadcast::Receiver<ConfigChangeEvent>,
    ) -> PollerHandle {
        let task = tokio::spawn(Arc::clone(self).run(interval, changes));
        PollerHandle {
            poller: Arc::clone(self),
            task,
        }
    }
}

/// Owns a running poller; dropping it stops the loop.
pub struct PollerHandle {
    poller: Arc<StatusPoller>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn poller(&self) -> &Arc<StatusPoller> {
        &self.poller
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, extract::State};
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct Hits {
        status: Arc<AtomicUsize>,
        logs: Arc<AtomicUsize>,
    }

    async fn status(State(hits): State<Hits>) -> Json<Value> {
        hits.status.fetch_add(1, Ordering::SeqCst);
        Json(json!({
            "profiles": [{ "name": "internal", "status": "online" }],
            "gateways": [{ "name": "sipgate", "status": "online" }],
            "registrations": [],
            "fs_access": true
        }))
    }

    /// First call succeeds, later calls fail.
    async fn logs(State(hits): State<Hits>) -> Result<Json<Value>, StatusCode> {
        if hits.logs.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(Json(json!({ "logs": [{ "text": "boot", "level": "info" }], "count": 1 })))
        } else {
            Err(StatusCode::BAD_GATEWAY)
        }
    }

    async fn spawn_backend(hits: Hits) -> String {
        let app = Router::new()
            .route("/api/status", get(status))
            .route("/api/active-calls", get(|| async { Json(json!({ "calls": [], "count": 0 })) }))
            .route("/api/cdr", get(|| async { Json(json!({ "calls": [], "count": 0 })) }))
            .route("/api/logs", get(logs))
            .with_state(hits);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn refresh_now_fills_every_region() {
        let base = spawn_backend(Hits::default()).await;
        let poller = StatusPoller::new(WrapperClient::new(&base).unwrap(), 10, 10);

        poller.refresh_now().await;
        let snap = poller.snapshot();
        assert_eq!(snap.status.unwrap().gateways_online(), 1);
        assert!(snap.calls.is_some());
        assert!(snap.cdr.is_some());
        assert_eq!(snap.logs.unwrap().logs[0].text, "boot");
    }

    #[tokio::test]
    async fn failed_region_keeps_previous_value() {
        let hits = Hits::default();
        let base = spawn_backend(hits.clone()).await;
        let poller = StatusPoller::new(WrapperClient::new(&base).unwrap(), 10, 10);

        poller.refresh_now().await;
        poller.refresh_now().await;
        assert_eq!(hits.logs.load(Ordering::SeqCst), 2);
        assert_eq!(poller.snapshot().logs.unwrap().count, 1);
    }

    #[tokio::test]
    async fn unreachable_backend_leaves_snapshot_empty() {
        let poller = StatusPoller::new(WrapperClient::new("http://127.0.0.1:1").unwrap(), 10, 10);
        poller.refresh_now().await;
        let snap = poller.snapshot();
        assert!(snap.status.is_none());
        assert!(!snap.session_expired);
    }

    #[tokio::test]
    async fn paused_interval_does_not_poll() {
        let hits = Hits::default();
        let base = spawn_backend(hits.clone()).await;
        let poller = StatusPoller::new(WrapperClient::new(&base).unwrap(), 10, 10);

        let (interval_tx, interval_rx) = watch::channel(RefreshInterval::PAUSED);
        let (_changes_tx, changes_rx) = broadcast::channel(4);
        let handle = poller.spawn(interval_rx, changes_rx);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(hits.status.load(Ordering::SeqCst), 0);

        interval_tx.send_replace(RefreshInterval::from_millis(1_000).unwrap());
        tokio::time::sleep(Duration::from_millis(1_600)).await;
        assert!(hits.status.load(Ordering::SeqCst) >= 1);
        assert!(handle.is_running());

        drop(handle);
    }

    #[tokio::test]
    async fn config_change_triggers_cycle() {
        let hits = Hits::default();
        let base = spawn_backend(hits.clone()).await;
        let poller = StatusPoller::new(WrapperClient::new(&base).unwrap(), 10, 10);

        let (_interval_tx, interval_rx) = watch::channel(RefreshInterval::from_millis(60_000).unwrap());
        let (changes_tx, changes_rx) = broadcast::channel(4);
        let _handle = poller.spawn(interval_rx, changes_rx);

        tokio::time::sleep(Duration::from_millis(50)).await;
        changes_tx.send(ConfigChangeEvent::Gateways).unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(hits.status.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn closed_interval_channel_stops_loop() {
        let poller = StatusPoller::new(WrapperClient::new("http://127.0.0.1:1").unwrap(), 10, 10);
        let (interval_tx, interval_rx) = watch::channel(RefreshInterval::PAUSED);
        let (_changes_tx, changes_rx) = broadcast::channel(4);
        let handle = poller.spawn(interval_rx, changes_rx);

        drop(interval_tx);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!handle.is_running());
    }
}
