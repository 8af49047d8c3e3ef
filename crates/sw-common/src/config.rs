use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_PATH: &str = "/etc/sipwrapper-admin.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Address the console binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Base URL of the SIP Wrapper REST backend.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// JSON file holding the persisted refresh interval.
    #[serde(default = "default_prefs_path")]
    pub prefs_path: PathBuf,

    /// Refresh interval used until one is persisted (0 = paused).
    #[serde(default = "default_refresh_ms")]
    pub default_refresh_ms: u64,

    /// Rows requested from /api/cdr on each poll.
    #[serde(default = "default_row_count")]
    pub cdr_count: u32,

    /// Lines requested from /api/logs on each poll.
    #[serde(default = "default_row_count")]
    pub logs_count: u32,

    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: u64,

    #[serde(default)]
    pub landing: LandingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandingConfig {
    /// Directory holding index.html and integrations.js.
    #[serde(default = "default_landing_dir")]
    pub dir: PathBuf,

    /// Remote base the update webhook pulls from.
    #[serde(default = "default_source_base_url")]
    pub source_base_url: String,

    /// Shared secret for the update webhook. Empty disables it.
    #[serde(default)]
    pub update_token: String,

    /// Public read-only config endpoint. Empty = `<backend_url>/api/config`.
    #[serde(default)]
    pub public_config_url: String,

    #[serde(default = "default_landing_files")]
    pub files: Vec<LandingFile>,
}

/// One remote file mirrored by the update webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandingFile {
    pub source: String,
    pub dest: String,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8888".into()
}

fn default_backend_url() -> String {
    "http://127.0.0.1:8080".into()
}

fn default_prefs_path() -> PathBuf {
    PathBuf::from("/var/lib/sipwrapper-admin/prefs.json")
}

fn default_refresh_ms() -> u64 {
    10_000
}

fn default_row_count() -> u32 {
    10
}

fn default_session_ttl_hours() -> u64 {
    12
}

fn default_landing_dir() -> PathBuf {
    PathBuf::from("/var/www/sip-wrapper-landing")
}

fn default_source_base_url() -> String {
    "https://raw.githubusercontent.com/insidedynamic-de/sip_wrapper/main/landing/".into()
}

fn default_landing_files() -> Vec<LandingFile> {
    vec![
        LandingFile {
            source: "landing.html".into(),
            dest: "index.html".into(),
        },
        LandingFile {
            source: "integrations.js".into(),
            dest: "integrations.js".into(),
        },
    ]
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        toml::from_str("").unwrap()
    }
}

impl Default for LandingConfig {
    fn default() -> Self {
        toml::from_str("").unwrap()
    }
}

/// Config file location, overridable with `SW_CONFIG_PATH`.
pub fn config_path() -> PathBuf {
    PathBuf::from(
        std::env::var("SW_CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string()),
    )
}

impl ConsoleConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: ConsoleConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        Ok(config)
    }

    /// Load the file at `path` if present, then apply `SW_*` environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            Self::load_from_file(path)?
        } else {
            tracing::info!("No config file found at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SW_LISTEN_ADDR") {
            self.listen_addr = v;
        }
        if let Some(v) = lookup("SW_BACKEND_URL") {
            self.backend_url = v;
        }
        if let Some(v) = lookup("SW_PREFS_PATH") {
            self.prefs_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("SW_LANDING_DIR") {
            self.landing.dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("SW_UPDATE_TOKEN") {
            self.landing.update_token = v;
        }
    }

    pub fn public_config_url(&self) -> String {
        if self.landing.public_config_url.is_empty() {
            format!("{}/api/config", self.backend_url.trim_end_matches('/'))
        } else {
            self.landing.public_config_url.clone()
        }
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_ttl_hours as i64)
    }
}
