use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

use crate::LandingError;

/// File in the landing directory that overrides the built-in matrix.
pub const INTEGRATIONS_FILE: &str = "integrations.js";

const BUILTIN_JSON: &str = include_str!("../data/integrations.json");

/// Test state of one integration direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrationStatus {
    Productive,
    InTest,
    InProgress,
    Planned,
    /// Anything else, kept verbatim.
    Other(String),
}

impl IntegrationStatus {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "produktiv" => IntegrationStatus::Productive,
            "im_test" => IntegrationStatus::InTest,
            "in_arbeit" => IntegrationStatus::InProgress,
            "geplant" => IntegrationStatus::Planned,
            other => IntegrationStatus::Other(other.to_string()),
        }
    }

    pub fn wire_name(&self) -> &str {
        match self {
            IntegrationStatus::Productive => "produktiv",
            IntegrationStatus::InTest => "im_test",
            IntegrationStatus::InProgress => "in_arbeit",
            IntegrationStatus::Planned => "geplant",
            IntegrationStatus::Other(s) => s,
        }
    }

    /// Label and CSS class used when the data carries no label table entry.
    pub fn default_label(&self) -> StatusLabel {
        let (label, class, description) = match self {
            IntegrationStatus::Productive => ("Produktiv", "status-ok", "Getestet & stabil"),
            IntegrationStatus::InTest => ("Im Test", "status-test", "In Testphase"),
            IntegrationStatus::InProgress => ("In Arbeit", "status-wip", "Aktuell in Entwicklung"),
            IntegrationStatus::Planned => ("Geplant", "status-pending", "Noch nicht getestet"),
            IntegrationStatus::Other(raw) => (raw.as_str(), "status-pending", ""),
        };
        StatusLabel {
            label: label.to_string(),
            class: class.to_string(),
            description: description.to_string(),
        }
    }
}

impl Serialize for IntegrationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_name())
    }
}

impl<'de> Deserialize<'de> for IntegrationStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(IntegrationStatus::from_wire(&raw))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLabel {
    pub label: String,
    pub class: String,
    #[serde(default)]
    pub description: String,
}

/// One row of the matrix: a SIP provider or an AI platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Integration {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    pub outbound_wrapper: IntegrationStatus,
    pub outbound_ai: IntegrationStatus,
    pub inbound_wrapper: IntegrationStatus,
    pub inbound_ai: IntegrationStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationsData {
    #[serde(default)]
    pub providers: Vec<Integration>,
    #[serde(default)]
    pub ai_platforms: Vec<Integration>,
    #[serde(default)]
    pub status_labels: BTreeMap<String, StatusLabel>,
}

impl IntegrationsData {
    /// Matrix compiled into the binary.
    pub fn builtin() -> Self {
        serde_json::from_str(BUILTIN_JSON).expect("embedded integrations.json is valid")
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty() && self.ai_platforms.is_empty()
    }

    /// Label for a status: the data's own table first, then the defaults.
    /// Unknown states show their raw name with the pending class.
    pub fn label_for(&self, status: &IntegrationStatus) -> StatusLabel {
        self.status_labels
            .get(status.wire_name())
            .cloned()
            .unwrap_or_else(|| status.default_label())
    }

    /// Parse `window.INTEGRATIONS_DATA = {...};`. The object between the
    /// first `{` and the last `}` must be plain JSON.
    pub fn parse_js(source: &str) -> Result<Self, LandingError> {
        let start = source.find('{').ok_or(LandingError::MissingObject)?;
        let end = source.rfind('}').ok_or(LandingError::MissingObject)?;
        if end < start {
            return Err(LandingError::MissingObject);
        }
        serde_json::from_str(&source[start..=end]).map_err(|e| LandingError::Parse(e.to_string()))
    }

    /// Load the override from `dir`, falling back to the built-in matrix.
    pub async fn load(dir: &Path) -> Self {
        let path = dir.join(INTEGRATIONS_FILE);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => match Self::parse_js(&text) {
                Ok(data) => {
                    debug!(path = %path.display(), providers = data.providers.len(), "Loaded integrations");
                    data
                }
                Err(e) => {
                    warn!(path = %path.display(), "Ignoring integrations file: {e}");
                    Self::builtin()
                }
            },
            Err(_) => Self::builtin(),
        }
    }
}
