//! Persisted console preferences.
//!
//! Only the dashboard refresh interval lives here. It is shared by every
//! session: a change is written to disk and pushed through a `watch`
//! channel so running pollers and open pages pick it up at once.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

/// Smallest accepted non-zero interval.
pub const MIN_REFRESH_MS: u64 = 1_000;

/// Intervals offered in the refresh selector.
pub const REFRESH_CHOICES: [u64; 6] = [0, 3_000, 5_000, 10_000, 30_000, 60_000];

#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    #[error("Invalid refresh interval: {0} ms (0 pauses, minimum {MIN_REFRESH_MS} ms)")]
    InvalidInterval(u64),

    #[error("Failed to write preferences: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode preferences: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Poll interval in milliseconds; 0 means paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct RefreshInterval(u64);

impl RefreshInterval {
    pub const PAUSED: RefreshInterval = RefreshInterval(0);

    pub fn from_millis(ms: u64) -> Result<Self, PrefsError> {
        if ms != 0 && ms < MIN_REFRESH_MS {
            return Err(PrefsError::InvalidInterval(ms));
        }
        Ok(Self(ms))
    }

    pub fn millis(&self) -> u64 {
        self.0
    }

    pub fn is_paused(&self) -> bool {
        self.0 == 0
    }

    /// `None` while paused.
    pub fn period(&self) -> Option<Duration> {
        (!self.is_paused()).then(|| Duration::from_millis(self.0))
    }
}

impl TryFrom<u64> for RefreshInterval {
    type Error = PrefsError;

    fn try_from(ms: u64) -> Result<Self, Self::Error> {
        Self::from_millis(ms)
    }
}

impl From<RefreshInterval> for u64 {
    fn from(interval: RefreshInterval) -> u64 {
        interval.0
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PrefsFile {
    refresh_interval_ms: RefreshInterval,
}

pub struct PreferenceStore {
    path: PathBuf,
    tx: watch::Sender<RefreshInterval>,
}

impl PreferenceStore {
    /// Open the store at `path`. A missing or unreadable file falls back to
    /// `default_ms` (itself replaced by 10 s when invalid).
    pub fn open(path: impl Into<PathBuf>, default_ms: u64) -> Self {
        let path = path.into();
        let fallback = RefreshInterval::from_millis(default_ms).unwrap_or_else(|e| {
            warn!("{}, using 10000 ms", e);
            RefreshInterval(10_000)
        });

        let initial = match Self::read(&path) {
            Some(interval) => interval,
            None => fallback,
        };
        info!(
            "Refresh interval: {} ms{}",
            initial.millis(),
            if initial.is_paused() { " (paused)" } else { "" }
        );

        let (tx, _) = watch::channel(initial);
        Self { path, tx }
    }

    fn read(path: &Path) -> Option<RefreshInterval> {
        let data = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str::<PrefsFile>(&data) {
            Ok(file) => Some(file.refresh_interval_ms),
            Err(e) => {
                warn!("Ignoring preferences at {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn refresh_interval(&self) -> RefreshInterval {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<RefreshInterval> {
        self.tx.subscribe()
    }

    /// Validate, persist, then broadcast a new interval.
    pub async fn set_refresh_interval(&self, ms: u64) -> Result<RefreshInterval, PrefsError> {
        let interval = RefreshInterval::from_millis(ms)?;
        self.save(interval).await?;
        self.tx.send_replace(interval);
        info!("Refresh interval set to {} ms", interval.millis());
        Ok(interval)
    }

    async fn save(&self, interval: RefreshInterval) -> Result<(), PrefsError> {
        let content = serde_json::to_string_pretty(&PrefsFile {
            refresh_interval_ms: interval,
        })?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
