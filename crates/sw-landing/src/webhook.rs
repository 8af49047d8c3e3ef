use ring::hmac;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use sw_common::config::{LandingConfig, LandingFile};
use tracing::{info, warn};

use crate::LandingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStatus {
    Ok,
    Partial,
}

/// JSON body returned by the update webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateReport {
    pub status: UpdateStatus,
    pub updated: Vec<String>,
    pub errors: Vec<String>,
    pub time: String,
}

/// Pulls the landing files from the remote source into the landing directory.
#[derive(Debug, Clone)]
pub struct LandingUpdater {
    http: reqwest::Client,
    source_base: String,
    dir: PathBuf,
    files: Vec<LandingFile>,
    token: String,
}

impl LandingUpdater {
    pub fn new(config: &LandingConfig) -> Self {
        let mut source_base = config.source_base_url.clone();
        if !source_base.ends_with('/') {
            source_base.push('/');
        }
        Self {
            http: reqwest::Client::new(),
            source_base,
            dir: config.dir.clone(),
            files: config.files.clone(),
            token: config.update_token.clone(),
        }
    }

    /// An empty configured token disables the webhook entirely.
    pub fn authorize(&self, token: Option<&str>) -> Result<(), LandingError> {
        match token {
            Some(t) if !self.token.is_empty() && token_matches(&self.token, t) => Ok(()),
            _ => Err(LandingError::Forbidden),
        }
    }

    async fn fetch(&self, source: &str) -> Result<Vec<u8>, reqwest::Error> {
        let url = format!("{}{}", self.source_base, source);
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Fetch and write every configured file. Failures are collected, never
    /// fatal: the report says `partial` when any file failed.
    pub async fn run(&self) -> UpdateReport {
        let mut updated = Vec::new();
        let mut errors = Vec::new();

        for file in &self.files {
            let content = match self.fetch(&file.source).await {
                Ok(content) => content,
                Err(e) => {
                    warn!(source = %file.source, "Landing fetch failed: {e}");
                    errors.push(format!("Failed to fetch: {}", file.source));
                    continue;
                }
            };
            match tokio::fs::write(self.dir.join(&file.dest), &content).await {
                Ok(()) => updated.push(file.dest.clone()),
                Err(e) => {
                    warn!(dest = %file.dest, "Landing write failed: {e}");
                    errors.push(format!("Failed to write: {}", file.dest));
                }
            }
        }

        let status = if errors.is_empty() {
            UpdateStatus::Ok
        } else {
            UpdateStatus::Partial
        };
        info!(?status, updated = updated.len(), errors = errors.len(), "Landing update finished");

        UpdateReport {
            status,
            updated,
            errors,
            time: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Constant-time: only HMAC tags are compared.
fn token_matches(expected: &str, provided: &str) -> bool {
    let key = hmac::Key::new(hmac::HMAC_SHA256, expected.as_bytes());
    let tag = hmac::sign(&key, expected.as_bytes());
    hmac::verify(&key, provided.as_bytes(), tag.as_ref()).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn updater(token: &str) -> LandingUpdater {
        let config = LandingConfig {
            update_token: token.into(),
            ..Default::default()
        };
        LandingUpdater::new(&config)
    }

    #[test]
    fn token_check() {
        let u = updater("s3cret");
        assert!(u.authorize(Some("s3cret")).is_ok());
        assert!(matches!(u.authorize(Some("wrong")), Err(LandingError::Forbidden)));
        assert!(matches!(u.authorize(None), Err(LandingError::Forbidden)));
    }

    #[test]
    fn token_prefix_and_extension_are_rejected() {
        let u = updater("s3cret");
        assert!(u.authorize(Some("s3cre")).is_err());
        assert!(u.authorize(Some("s3cret ")).is_err());
        assert!(u.authorize(Some("S3CRET")).is_err());
    }

    #[test]
    fn empty_token_disables_webhook() {
        let u = updater("");
        assert!(u.authorize(Some("")).is_err());
        assert!(u.authorize(None).is_err());
    }

    #[test]
    fn report_wire_format() {
        let report = UpdateReport {
            status: UpdateStatus::Partial,
            updated: vec!["index.html".into()],
            errors: vec!["Failed to fetch: integrations.js".into()],
            time: "2025-01-31 14:05:09".into(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "partial");
        assert_eq!(json["errors"][0], "Failed to fetch: integrations.js");
    }
}
